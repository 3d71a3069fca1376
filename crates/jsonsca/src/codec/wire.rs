//! JSON wire mapping for node trees.
//!
//! Atoms are bare JSON strings, numbers and booleans. Every other node is a
//! JSON object discriminated by which one of the recognized tag fields it
//! carries; composites also carry an `id` string:
//!
//! ```text
//! {"reference": "2"}
//! {"id": "1", "array": [...]}
//! {"id": "1", "object": {"key": ...}}
//! {"id": "1", "file": {"contents": "...", "properties": {"type": "...", "name": "..."}}}
//! {"id": "1", "blob": {"contents": "...", "properties": {"type": "..."}}}
//! {"id": "1", "imagedata": {"width": 2, "height": 2, "data": "..."}}
//! {"date": 450576000000}
//! {"regexp": {"source": "..."}}
//! {"null": true}
//! {"undefined": true}
//! ```
//!
//! Object key order matters: decoding resolves a reference only if its
//! composite was defined earlier in traversal order, so text round trips
//! must preserve the order keys were written in.

use serde_json::{Map, Value as JsonValue};

use crate::codec::primitives::{binary_string_to_bytes, bytes_to_binary_string};
use crate::error::DecodeError;
use crate::limits::MAX_DEPTH;
use crate::model::{format_id, parse_id, BlobKind, Node, NodeId};

/// Tag fields, in the order they are checked.
const TAGS: [&str; 10] = [
    "reference",
    "null",
    "undefined",
    "date",
    "regexp",
    "imagedata",
    "file",
    "blob",
    "array",
    "object",
];

// =============================================================================
// ENCODING
// =============================================================================

/// Converts a node tree to its JSON wire form.
pub fn node_to_json(node: &Node) -> JsonValue {
    match node {
        Node::Bool(b) => JsonValue::Bool(*b),
        Node::Number(n) => JsonValue::Number(n.clone()),
        Node::String(s) => JsonValue::String(s.clone()),
        Node::Null => tagged("null", JsonValue::Bool(true)),
        Node::Undefined => tagged("undefined", JsonValue::Bool(true)),
        Node::Date(epoch_ms) => tagged("date", JsonValue::from(*epoch_ms)),
        Node::Regexp { source } => {
            let mut body = Map::new();
            body.insert("source".to_string(), JsonValue::String(source.clone()));
            tagged("regexp", JsonValue::Object(body))
        }
        Node::Reference(id) => tagged("reference", JsonValue::String(format_id(*id))),
        Node::Blob {
            id,
            kind,
            mime_type,
            name,
            contents,
        } => {
            let mut properties = Map::new();
            properties.insert("type".to_string(), JsonValue::String(mime_type.clone()));
            if let (BlobKind::File, Some(name)) = (kind, name) {
                properties.insert("name".to_string(), JsonValue::String(name.clone()));
            }
            let mut body = Map::new();
            body.insert(
                "contents".to_string(),
                JsonValue::String(bytes_to_binary_string(contents)),
            );
            body.insert("properties".to_string(), JsonValue::Object(properties));
            composite(*id, kind.tag(), JsonValue::Object(body))
        }
        Node::ImageData {
            id,
            width,
            height,
            data,
        } => {
            let mut body = Map::new();
            body.insert("width".to_string(), JsonValue::from(*width));
            body.insert("height".to_string(), JsonValue::from(*height));
            body.insert("data".to_string(), JsonValue::String(bytes_to_binary_string(data)));
            composite(*id, "imagedata", JsonValue::Object(body))
        }
        Node::Array { id, elements } => {
            let elements = elements.iter().map(node_to_json).collect();
            composite(*id, "array", JsonValue::Array(elements))
        }
        Node::Object { id, properties } => {
            let mut body = Map::with_capacity(properties.len());
            for (key, child) in properties {
                body.insert(key.clone(), node_to_json(child));
            }
            composite(*id, "object", JsonValue::Object(body))
        }
    }
}

fn tagged(tag: &str, body: JsonValue) -> JsonValue {
    let mut map = Map::with_capacity(1);
    map.insert(tag.to_string(), body);
    JsonValue::Object(map)
}

fn composite(id: NodeId, tag: &str, body: JsonValue) -> JsonValue {
    let mut map = Map::with_capacity(2);
    map.insert("id".to_string(), JsonValue::String(format_id(id)));
    map.insert(tag.to_string(), body);
    JsonValue::Object(map)
}

// =============================================================================
// DECODING
// =============================================================================

/// Parses a JSON wire value into a node tree.
pub fn node_from_json(json: &JsonValue) -> Result<Node, DecodeError> {
    node_from_json_with_depth(json, MAX_DEPTH)
}

/// Parses a JSON wire value, bounding composite nesting to `max_depth`.
pub fn node_from_json_with_depth(json: &JsonValue, max_depth: usize) -> Result<Node, DecodeError> {
    WireReader { max_depth, depth: 0 }.read(json)
}

struct WireReader {
    max_depth: usize,
    depth: usize,
}

impl WireReader {
    fn read(&mut self, json: &JsonValue) -> Result<Node, DecodeError> {
        let map = match json {
            JsonValue::Bool(b) => return Ok(Node::Bool(*b)),
            JsonValue::Number(n) => return Ok(Node::Number(n.clone())),
            JsonValue::String(s) => return Ok(Node::String(s.clone())),
            JsonValue::Null => return Err(DecodeError::UnexpectedJson { kind: "null" }),
            JsonValue::Array(_) => return Err(DecodeError::UnexpectedJson { kind: "array" }),
            JsonValue::Object(map) => map,
        };

        let tag = find_tag(map)?;
        let body = &map[tag];
        match tag {
            "reference" => {
                let id = body.as_str().ok_or(DecodeError::InvalidField {
                    tag,
                    field: "reference",
                    expected: "id string",
                })?;
                Ok(Node::Reference(parse_id(id)?))
            }
            "null" => expect_true(tag, body).map(|_| Node::Null),
            "undefined" => expect_true(tag, body).map(|_| Node::Undefined),
            "date" => body.as_i64().map(Node::Date).ok_or(DecodeError::InvalidField {
                tag,
                field: "date",
                expected: "integer milliseconds",
            }),
            "regexp" => {
                let source = str_field(tag, body, "source")?;
                Ok(Node::Regexp {
                    source: source.to_string(),
                })
            }
            "imagedata" => {
                let id = read_id(tag, map)?;
                let width = u32_field(tag, body, "width")?;
                let height = u32_field(tag, body, "height")?;
                let data = binary_string_to_bytes(str_field(tag, body, "data")?, "imagedata")?;
                Ok(Node::ImageData {
                    id,
                    width,
                    height,
                    data,
                })
            }
            "file" | "blob" => {
                let kind = if tag == "file" { BlobKind::File } else { BlobKind::Blob };
                let id = read_id(tag, map)?;
                let contents =
                    binary_string_to_bytes(str_field(tag, body, "contents")?, kind.tag())?;
                let properties = body.get("properties").ok_or(DecodeError::MissingField {
                    tag,
                    field: "properties",
                })?;
                let mime_type = str_field(tag, properties, "type")?.to_string();
                let name = match kind {
                    BlobKind::File => Some(str_field(tag, properties, "name")?.to_string()),
                    BlobKind::Blob => None,
                };
                Ok(Node::Blob {
                    id,
                    kind,
                    mime_type,
                    name,
                    contents,
                })
            }
            "array" => {
                let id = read_id(tag, map)?;
                let items = body.as_array().ok_or(DecodeError::InvalidField {
                    tag,
                    field: "array",
                    expected: "JSON array",
                })?;
                self.enter()?;
                let elements = items
                    .iter()
                    .map(|item| self.read(item))
                    .collect::<Result<Vec<_>, _>>()?;
                self.depth -= 1;
                Ok(Node::Array { id, elements })
            }
            _ => {
                let id = read_id(tag, map)?;
                let fields = body.as_object().ok_or(DecodeError::InvalidField {
                    tag,
                    field: "object",
                    expected: "JSON object",
                })?;
                self.enter()?;
                let properties = fields
                    .iter()
                    .map(|(key, child)| Ok((key.clone(), self.read(child)?)))
                    .collect::<Result<Vec<_>, DecodeError>>()?;
                self.depth -= 1;
                Ok(Node::Object { id, properties })
            }
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(DecodeError::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Finds the single tag field present on a node object.
fn find_tag(map: &Map<String, JsonValue>) -> Result<&'static str, DecodeError> {
    let mut present = TAGS.iter().copied().filter(|tag| map.contains_key(*tag));
    let first = present.next().ok_or(DecodeError::UnknownTag)?;
    if let Some(second) = present.next() {
        return Err(DecodeError::AmbiguousTags { first, second });
    }
    Ok(first)
}

fn read_id(tag: &'static str, map: &Map<String, JsonValue>) -> Result<NodeId, DecodeError> {
    match map.get("id") {
        None => Err(DecodeError::MissingField { tag, field: "id" }),
        Some(JsonValue::String(s)) => parse_id(s),
        Some(other) => Err(DecodeError::InvalidId {
            found: other.to_string(),
        }),
    }
}

fn expect_true(tag: &'static str, body: &JsonValue) -> Result<(), DecodeError> {
    match body {
        JsonValue::Bool(true) => Ok(()),
        _ => Err(DecodeError::InvalidField {
            tag,
            field: tag,
            expected: "true",
        }),
    }
}

fn str_field<'a>(
    tag: &'static str,
    body: &'a JsonValue,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    match body.get(field) {
        None => Err(DecodeError::MissingField { tag, field }),
        Some(value) => value.as_str().ok_or(DecodeError::InvalidField {
            tag,
            field,
            expected: "string",
        }),
    }
}

fn u32_field(tag: &'static str, body: &JsonValue, field: &'static str) -> Result<u32, DecodeError> {
    match body.get(field) {
        None => Err(DecodeError::MissingField { tag, field }),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(DecodeError::InvalidField {
                tag,
                field,
                expected: "unsigned 32-bit integer",
            }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    #[test]
    fn test_atoms_are_bare() {
        assert_eq!(node_to_json(&Node::from(42)), json!(42));
        assert_eq!(node_to_json(&Node::from("42")), json!("42"));
        assert_eq!(node_to_json(&Node::Bool(true)), json!(true));
        assert_eq!(node_from_json(&json!(42)).unwrap(), Node::from(42));
    }

    #[test]
    fn test_tagged_leaves() {
        assert_eq!(node_to_json(&Node::Null), json!({"null": true}));
        assert_eq!(node_to_json(&Node::Undefined), json!({"undefined": true}));
        assert_eq!(node_to_json(&Node::Date(1000)), json!({"date": 1000}));
        assert_eq!(
            node_to_json(&Node::Regexp { source: "a|b".to_string() }),
            json!({"regexp": {"source": "a|b"}})
        );
        assert_eq!(node_to_json(&Node::Reference(id(2))), json!({"reference": "2"}));
    }

    #[test]
    fn test_shared_reference_layout() {
        let node = Node::Array {
            id: id(1),
            elements: vec![
                Node::Object {
                    id: id(2),
                    properties: vec![("x".to_string(), Node::from(1))],
                },
                Node::Reference(id(2)),
            ],
        };
        let expected = json!({
            "id": "1",
            "array": [{"id": "2", "object": {"x": 1}}, {"reference": "2"}]
        });
        assert_eq!(node_to_json(&node), expected);
        assert_eq!(node_from_json(&expected).unwrap(), node);
    }

    #[test]
    fn test_binary_layout() {
        let file = Node::Blob {
            id: id(1),
            kind: BlobKind::File,
            mime_type: "text/plain".to_string(),
            name: Some("a.txt".to_string()),
            contents: vec![104, 105, 0xFF],
        };
        let expected = json!({
            "id": "1",
            "file": {"contents": "hi\u{ff}", "properties": {"type": "text/plain", "name": "a.txt"}}
        });
        assert_eq!(node_to_json(&file), expected);
        assert_eq!(node_from_json(&expected).unwrap(), file);

        let image = json!({
            "id": "3",
            "imagedata": {"width": 1, "height": 1, "data": "\u{0}\u{1}\u{2}\u{3}"}
        });
        assert_eq!(
            node_from_json(&image).unwrap(),
            Node::ImageData { id: id(3), width: 1, height: 1, data: vec![0, 1, 2, 3] }
        );
    }

    #[test]
    fn test_blob_ignores_name() {
        let json = json!({
            "id": "4",
            "blob": {"contents": "", "properties": {"type": "x/y", "name": "n"}}
        });
        let Node::Blob { name, kind, .. } = node_from_json(&json).unwrap() else {
            panic!("expected blob")
        };
        assert_eq!(kind, BlobKind::Blob);
        assert_eq!(name, None);
    }

    #[test]
    fn test_regexp_flags_dropped() {
        let json = json!({"regexp": {"source": "a+", "flags": "gi"}});
        let node = node_from_json(&json).unwrap();
        assert_eq!(node, Node::Regexp { source: "a+".to_string() });
        assert_eq!(node_to_json(&node), json!({"regexp": {"source": "a+"}}));
    }

    #[test]
    fn test_epoch_date_is_not_falsy() {
        assert_eq!(node_from_json(&json!({"date": 0})).unwrap(), Node::Date(0));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        assert_eq!(
            node_from_json(&json!({"array": [1, 2]})),
            Err(DecodeError::MissingField { tag: "array", field: "id" })
        );
        assert_eq!(
            node_from_json(&json!({"object": {}})),
            Err(DecodeError::MissingField { tag: "object", field: "id" })
        );
        assert!(matches!(
            node_from_json(&json!({"id": 1, "array": []})),
            Err(DecodeError::InvalidId { .. })
        ));
        assert!(matches!(
            node_from_json(&json!({"id": "0", "array": []})),
            Err(DecodeError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_tag_discrimination() {
        assert_eq!(node_from_json(&json!({"id": "1"})), Err(DecodeError::UnknownTag));
        assert_eq!(node_from_json(&json!({})), Err(DecodeError::UnknownTag));
        assert_eq!(
            node_from_json(&json!({"null": true, "undefined": true})),
            Err(DecodeError::AmbiguousTags { first: "null", second: "undefined" })
        );
        assert_eq!(
            node_from_json(&json!(null)),
            Err(DecodeError::UnexpectedJson { kind: "null" })
        );
        assert_eq!(
            node_from_json(&json!([1])),
            Err(DecodeError::UnexpectedJson { kind: "array" })
        );
        assert!(node_from_json(&json!({"null": false})).is_err());
    }

    #[test]
    fn test_malformed_fields() {
        assert!(matches!(
            node_from_json(&json!({
                "id": "1",
                "file": {"contents": "", "properties": {"type": "t"}}
            })),
            Err(DecodeError::MissingField { tag: "file", field: "name" })
        ));
        assert!(matches!(
            node_from_json(&json!({"id": "1", "blob": {"contents": ""}})),
            Err(DecodeError::MissingField { tag: "blob", field: "properties" })
        ));
        assert!(matches!(
            node_from_json(&json!({
                "id": "1",
                "imagedata": {"width": -1, "height": 1, "data": ""}
            })),
            Err(DecodeError::InvalidField { field: "width", .. })
        ));
        assert!(matches!(
            node_from_json(&json!({"date": 1.5})),
            Err(DecodeError::InvalidField { tag: "date", .. })
        ));
        assert!(matches!(
            node_from_json(&json!({
                "id": "1",
                "blob": {"contents": "\u{100}", "properties": {"type": "t"}}
            })),
            Err(DecodeError::InvalidByteString { tag: "blob" })
        ));
    }

    #[test]
    fn test_property_order_preserved() {
        let text = r#"{"id":"1","object":{"b":{"id":"2","array":[]},"a":{"reference":"2"}}}"#;
        let json: JsonValue = serde_json::from_str(text).unwrap();
        let node = node_from_json(&json).unwrap();
        let Node::Object { properties, .. } = &node else { panic!("expected object") };
        assert_eq!(properties[0].0, "b");
        assert_eq!(properties[1].0, "a");
        assert_eq!(serde_json::to_string(&node_to_json(&node)).unwrap(), text);
    }

    #[test]
    fn test_depth_limit() {
        let mut json = json!({"id": "1", "array": []});
        for _ in 0..5 {
            json = json!({"id": "1", "array": [json]});
        }
        assert_eq!(
            node_from_json_with_depth(&json, 3),
            Err(DecodeError::DepthExceeded { max: 3 })
        );
        assert!(node_from_json_with_depth(&json, 6).is_ok());
    }
}
