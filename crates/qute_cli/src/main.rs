//! Qute CLI
//!
//! Command-line tools for Qute log segment directories.
//!
//! # Commands
//!
//! - `inspect` - List segments with offsets and sizes
//! - `verify` - Check store framing and index consistency
//! - `dump` - Print the records of one segment

mod commands;

use clap::{Parser, Subcommand};
use qute_log::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Qute command-line log tools.
#[derive(Parser)]
#[command(name = "qute")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the segment directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Store size limit used to report whether segments are full
    #[arg(global = true, long)]
    max_store_bytes: Option<u64>,

    /// Index capacity used to report whether segments are full
    #[arg(global = true, long)]
    max_index_bytes: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List segments with offsets and sizes
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check store framing and index consistency
    Verify,

    /// Print the records of one segment
    Dump {
        /// Base offset of the segment to dump
        #[arg(short, long)]
        base_offset: u64,

        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Start from this absolute offset
        #[arg(long)]
        from: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(bytes) = self.max_store_bytes {
            config = config.max_store_bytes(bytes);
        }
        if let Some(bytes) = self.max_index_bytes {
            config = config.max_index_bytes(bytes);
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.config();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Segment directory required for inspect")?;
            commands::inspect::run(&path, &config, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Segment directory required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Dump {
            base_offset,
            limit,
            from,
            format,
        } => {
            let path = cli.path.ok_or("Segment directory required for dump")?;
            commands::dump::run(&path, base_offset, from, limit, &format)?;
        }
        Commands::Version => {
            println!("Qute CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Qute Log v{}", qute_log::VERSION);
        }
    }

    Ok(())
}
