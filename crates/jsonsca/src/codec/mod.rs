//! Encoding and decoding between value graphs, node trees and JSON.
//!
//! - [`encode`]/[`decode`]: value graph to node tree and back
//! - [`wire`]: node tree to JSON wire value and back
//! - [`text`]: one-call value graph to JSON text and back
//! - [`source`]: byte acquisition for binary leaves

pub mod decode;
pub mod encode;
pub mod primitives;
pub mod source;
pub mod text;
pub mod wire;

pub use decode::{decode, decode_with, decode_with_options, DecodeOptions};
pub use encode::{encode, encode_with, encode_with_options, EncodeOptions};
pub use primitives::{binary_string_to_bytes, bytes_to_binary_string};
pub use source::{ByteSource, InlineSource};
pub use text::{from_json, parse, stringify, to_json};
pub use wire::{node_from_json, node_from_json_with_depth, node_to_json};
