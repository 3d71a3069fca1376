//! Byte-string primitives for the JSON wire.
//!
//! Binary payloads are carried as "binary strings": one char per byte, so
//! every char is in U+0000..=U+00FF. JSON text escapes the control range,
//! which keeps the payload intact through any conforming JSON encoder.

use crate::error::DecodeError;

/// Encodes bytes as a binary string.
pub fn bytes_to_binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes a binary string back to bytes.
///
/// `tag` names the node being decoded, for the error.
pub fn binary_string_to_bytes(s: &str, tag: &'static str) -> Result<Vec<u8>, DecodeError> {
    s.chars()
        .map(|c| u8::try_from(c).map_err(|_| DecodeError::InvalidByteString { tag }))
        .collect()
}
