//! Benchmark utilities for the Qute commit log.

use rand::Rng;

/// Generate random payload bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a batch of random payloads.
pub fn random_payloads(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count).map(|_| random_data(size)).collect()
}
