//! Default log record.

use crate::error::{CodecError, CodecResult};
use crate::{Decode, Encode, LogRecord};
use ciborium::value::Value;

const VALUE_KEY: &str = "value";
const OFFSET_KEY: &str = "offset";

/// A record with an opaque payload and its absolute log offset.
///
/// Encoded as a CBOR map `{ "value": bytes, "offset": uint }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Opaque payload.
    pub value: Vec<u8>,
    /// Absolute offset, assigned by the log on write.
    pub offset: u64,
}

impl Record {
    /// Creates a record with the given payload and offset 0.
    #[must_use]
    pub fn new(value: Vec<u8>) -> Self {
        Self { value, offset: 0 }
    }
}

impl Encode for Record {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        // Shorter key first, as canonical CBOR orders map keys.
        let map = Value::Map(vec![
            (
                Value::Text(VALUE_KEY.to_string()),
                Value::Bytes(self.value.clone()),
            ),
            (
                Value::Text(OFFSET_KEY.to_string()),
                Value::Integer(self.offset.into()),
            ),
        ]);

        let mut buf = Vec::with_capacity(self.value.len() + 24);
        ciborium::ser::into_writer(&map, &mut buf)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(buf)
    }
}

impl Decode for Record {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = bytes;
        let value: Value = ciborium::de::from_reader(&mut reader)
            .map_err(|e| CodecError::decoding_failed(e.to_string()))?;

        if !reader.is_empty() {
            return Err(CodecError::TrailingBytes {
                count: reader.len(),
            });
        }

        let Value::Map(pairs) = value else {
            return Err(CodecError::decoding_failed("record is not a CBOR map"));
        };

        let mut payload = None;
        let mut offset = None;

        for (key, field) in pairs {
            let Value::Text(key) = key else {
                continue;
            };
            match key.as_str() {
                VALUE_KEY => match field {
                    Value::Bytes(b) => payload = Some(b),
                    _ => return Err(CodecError::UnexpectedType { field: VALUE_KEY }),
                },
                OFFSET_KEY => match field {
                    Value::Integer(n) => {
                        let n = u64::try_from(n)
                            .map_err(|_| CodecError::UnexpectedType { field: OFFSET_KEY })?;
                        offset = Some(n);
                    }
                    _ => return Err(CodecError::UnexpectedType { field: OFFSET_KEY }),
                },
                // Unknown keys are skipped for forward compatibility.
                _ => {}
            }
        }

        Ok(Self {
            value: payload.ok_or(CodecError::MissingField { field: VALUE_KEY })?,
            offset: offset.ok_or(CodecError::MissingField { field: OFFSET_KEY })?,
        })
    }
}

impl LogRecord for Record {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }
}
