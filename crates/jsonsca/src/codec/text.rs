//! One-call conversions between value graphs and JSON text.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::codec::decode::decode;
use crate::codec::encode::encode;
use crate::codec::wire::{node_from_json, node_to_json};
use crate::codec::ByteSource;
use crate::error::{DecodeError, EncodeError};
use crate::limits::MAX_DEPTH;
use crate::model::{Graph, Heap, Value};

/// Encodes `value` and renders the tree as a JSON value.
pub async fn to_json<S>(heap: &Heap, value: &Value, source: &S) -> Result<JsonValue, EncodeError>
where
    S: ByteSource + ?Sized,
{
    let node = encode(heap, value, source).await?;
    Ok(node_to_json(&node))
}

/// Encodes `value` to JSON text.
pub async fn stringify<S>(heap: &Heap, value: &Value, source: &S) -> Result<String, EncodeError>
where
    S: ByteSource + ?Sized,
{
    let json = to_json(heap, value, source).await?;
    serde_json::to_string(&json).map_err(|e| EncodeError::Json(e.to_string()))
}

/// Decodes a JSON wire value into a fresh graph.
pub fn from_json(json: &JsonValue) -> Result<Graph, DecodeError> {
    decode(&node_from_json(json)?)
}

/// Decodes JSON text into a fresh graph.
///
/// Accepts everything [`stringify`] produces, up to [`MAX_DEPTH`] nested
/// composites. Deeper text is rejected before any JSON value is built.
pub fn parse(text: &str) -> Result<Graph, DecodeError> {
    check_nesting(text, text_depth_limit(MAX_DEPTH))?;

    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let json = JsonValue::deserialize(&mut deserializer).map_err(json_error)?;
    deserializer.end().map_err(json_error)?;
    from_json(&json)
}

fn json_error(err: serde_json::Error) -> DecodeError {
    DecodeError::Json(err.to_string())
}

/// JSON nesting of a tree with `max_depth` nested composites.
///
/// Each composite opens two levels (the node object and its body); a
/// binary leaf below the deepest composite opens three.
fn text_depth_limit(max_depth: usize) -> usize {
    max_depth.saturating_mul(2).saturating_add(3)
}

/// Rejects text whose `[`/`{` nesting exceeds `limit`.
fn check_nesting(text: &str, limit: usize) -> Result<(), DecodeError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return Err(DecodeError::DepthExceeded { max: MAX_DEPTH });
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}
