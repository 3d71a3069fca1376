//! Graph reconstruction: node tree to value graph.
//!
//! Every composite is allocated and bound to its id before any of its
//! children are decoded, so a child referring back to an ancestor resolves
//! to the ancestor's handle even though the ancestor is still being filled.
//! Children are appended to the bound entity as each one is decoded.

use tracing::debug;

use crate::error::DecodeError;
use crate::limits::MAX_DEPTH;
use crate::model::{
    Blob, BlobKind, Date, Entity, Graph, Handle, Heap, ImageData, Node, NodeId, Object, Payload,
    RegExp, Value,
};
use crate::registry::DecodeRegistry;

/// Options for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting of arrays and objects.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_depth: MAX_DEPTH }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Decodes a node tree into a fresh heap.
pub fn decode(node: &Node) -> Result<Graph, DecodeError> {
    let mut heap = Heap::new();
    let mut registry = DecodeRegistry::new();
    let root = decode_with(node, &mut heap, &mut registry)?;
    Ok(Graph::new(heap, root))
}

/// Decodes a node tree into `heap`, resolving references through `registry`.
///
/// Threading one heap and registry through several calls decodes trees
/// produced by encoding against a shared registry: references in later
/// trees resolve to composites built by earlier calls.
pub fn decode_with(
    node: &Node,
    heap: &mut Heap,
    registry: &mut DecodeRegistry,
) -> Result<Value, DecodeError> {
    decode_with_options(node, heap, registry, DecodeOptions::default())
}

/// Decodes a node tree with options.
pub fn decode_with_options(
    node: &Node,
    heap: &mut Heap,
    registry: &mut DecodeRegistry,
    options: DecodeOptions,
) -> Result<Value, DecodeError> {
    let mut rebuilder = Rebuilder {
        heap,
        registry,
        max_depth: options.max_depth,
        depth: 0,
        composites: 0,
        references: 0,
    };
    let value = rebuilder.rebuild(node)?;
    debug!(
        composites = rebuilder.composites,
        references = rebuilder.references,
        "decoded node tree"
    );
    Ok(value)
}

struct Rebuilder<'h, 'r> {
    heap: &'h mut Heap,
    registry: &'r mut DecodeRegistry,
    max_depth: usize,
    depth: usize,
    composites: usize,
    references: usize,
}

impl Rebuilder<'_, '_> {
    fn rebuild(&mut self, node: &Node) -> Result<Value, DecodeError> {
        match node {
            Node::Bool(b) => Ok(Value::Bool(*b)),
            Node::Number(n) => Ok(Value::Number(n.clone())),
            Node::String(s) => Ok(Value::String(s.clone())),
            Node::Reference(id) => {
                self.references += 1;
                Ok(Value::Entity(self.registry.lookup(*id)?))
            }
            Node::Null => Ok(Value::Null),
            Node::Undefined => Ok(Value::Undefined),
            Node::Date(epoch_ms) => Ok(Value::Date(Date::from_epoch_millis(*epoch_ms))),
            Node::Regexp { source } => Ok(Value::RegExp(RegExp::new(source.clone()))),
            Node::Blob {
                id,
                kind,
                mime_type,
                name,
                contents,
            } => {
                let name = match kind {
                    BlobKind::File => Some(name.clone().ok_or(DecodeError::MissingField {
                        tag: "file",
                        field: "name",
                    })?),
                    BlobKind::Blob => None,
                };
                let blob = Blob {
                    mime_type: mime_type.clone(),
                    name,
                    payload: Payload::Inline(contents.clone()),
                };
                self.allocate(*id, Entity::Blob(blob))
            }
            Node::ImageData {
                id,
                width,
                height,
                data,
            } => {
                let image = ImageData::new(*width, *height, data.clone());
                self.allocate(*id, Entity::ImageData(image))
            }
            Node::Array { id, elements } => {
                let placeholder = Entity::Array(Vec::with_capacity(elements.len()));
                let handle = self.bind(*id, placeholder)?;
                self.enter()?;
                for element in elements {
                    let value = self.rebuild(element)?;
                    if let Some(items) = self.heap.get_array_mut(handle) {
                        items.push(value);
                    }
                }
                self.depth -= 1;
                Ok(Value::Entity(handle))
            }
            Node::Object { id, properties } => {
                let placeholder = Entity::Object(Object::with_capacity(properties.len()));
                let handle = self.bind(*id, placeholder)?;
                self.enter()?;
                for (key, child) in properties {
                    let value = self.rebuild(child)?;
                    if let Some(object) = self.heap.get_object_mut(handle) {
                        object.insert(key.clone(), value);
                    }
                }
                self.depth -= 1;
                Ok(Value::Entity(handle))
            }
        }
    }

    /// Allocates a placeholder and binds it to `id` before any child is decoded.
    fn bind(&mut self, id: NodeId, placeholder: Entity) -> Result<Handle, DecodeError> {
        let handle = self.heap.alloc(placeholder);
        self.registry.bind(id, handle)?;
        self.composites += 1;
        Ok(handle)
    }

    fn allocate(&mut self, id: NodeId, entity: Entity) -> Result<Value, DecodeError> {
        self.bind(id, entity).map(Value::Entity)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    #[test]
    fn test_atoms() {
        assert_eq!(decode(&Node::from(42)).unwrap().root, Value::from(42));
        assert_eq!(decode(&Node::from("foo")).unwrap().root, Value::from("foo"));
        assert_eq!(decode(&Node::Bool(true)).unwrap().root, Value::Bool(true));
        assert_eq!(decode(&Node::Null).unwrap().root, Value::Null);
        assert_eq!(decode(&Node::Undefined).unwrap().root, Value::Undefined);
        assert_eq!(
            decode(&Node::Date(0)).unwrap().root,
            Value::Date(Date::from_epoch_millis(0))
        );
    }

    #[test]
    fn test_shared_references_in_arrays() {
        // [a, a] with a = {x: 1}
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
        let mut graph = decode(&node).unwrap();
        let items = graph.heap.get_array(graph.root.as_handle().unwrap()).unwrap().clone();
        assert_eq!(items[0], items[1]);

        let first = items[0].as_handle().unwrap();
        graph.heap.get_object_mut(first).unwrap().insert("x", Value::from(2));
        let second = items[1].as_handle().unwrap();
        assert_eq!(graph.heap.get_object(second).unwrap().get("x"), Some(&Value::from(2)));
    }

    #[test]
    fn test_cycle_resolves_to_ancestor() {
        // a.next = b; b.prev = a
        let node = Node::Object {
            id: id(1),
            properties: vec![(
                "next".to_string(),
                Node::Object {
                    id: id(2),
                    properties: vec![("prev".to_string(), Node::Reference(id(1)))],
                },
            )],
        };
        let graph = decode(&node).unwrap();
        let a = graph.root.as_handle().unwrap();
        let b = graph.heap.get_object(a).unwrap().get("next").unwrap().as_handle().unwrap();
        assert_eq!(graph.heap.get_object(b).unwrap().get("prev"), Some(&Value::Entity(a)));
    }

    #[test]
    fn test_array_containing_itself() {
        let node = Node::Array {
            id: id(1),
            elements: vec![Node::from(1), Node::Reference(id(1))],
        };
        let graph = decode(&node).unwrap();
        let root = graph.root.as_handle().unwrap();
        let items = graph.heap.get_array(root).unwrap();
        assert_eq!(items[1], Value::Entity(root));
    }

    #[test]
    fn test_dangling_reference() {
        let node = Node::Array {
            id: id(1),
            elements: vec![Node::Reference(id(9))],
        };
        assert_eq!(decode(&node), Err(DecodeError::DanglingReference { id: id(9) }));
    }

    #[test]
    fn test_duplicate_id() {
        let node = Node::Array {
            id: id(1),
            elements: vec![Node::Array { id: id(1), elements: vec![] }],
        };
        assert_eq!(decode(&node), Err(DecodeError::DuplicateId { id: id(1) }));
    }

    #[test]
    fn test_binary_leaves() {
        let node = Node::Array {
            id: id(1),
            elements: vec![
                Node::Blob {
                    id: id(2),
                    kind: BlobKind::File,
                    mime_type: "text/plain".to_string(),
                    name: Some("a.txt".to_string()),
                    contents: b"hello".to_vec(),
                },
                Node::ImageData {
                    id: id(3),
                    width: 1,
                    height: 1,
                    data: vec![255, 0, 0, 255],
                },
                Node::Reference(id(2)),
            ],
        };
        let graph = decode(&node).unwrap();
        let items = graph.heap.get_array(graph.root.as_handle().unwrap()).unwrap();
        let file = graph.heap.get_blob(items[0].as_handle().unwrap()).unwrap();
        assert_eq!(file, &Blob::file("a.txt", "text/plain", b"hello".to_vec()));
        let image = graph.heap.get_image_data(items[1].as_handle().unwrap()).unwrap();
        assert_eq!(image.pixels.inline_bytes(), Some(&[255u8, 0, 0, 255][..]));
        assert_eq!(items[2], items[0]);
    }

    #[test]
    fn test_file_without_name() {
        let node = Node::Blob {
            id: id(1),
            kind: BlobKind::File,
            mime_type: "text/plain".to_string(),
            name: None,
            contents: Vec::new(),
        };
        assert_eq!(
            decode(&node),
            Err(DecodeError::MissingField { tag: "file", field: "name" })
        );
    }

    #[test]
    fn test_children_fill_bound_entity() {
        // [1, {n: 2}, <dangling>]
        let node = Node::Array {
            id: id(1),
            elements: vec![
                Node::from(1),
                Node::Object {
                    id: id(2),
                    properties: vec![("n".to_string(), Node::from(2))],
                },
                Node::Reference(id(9)),
            ],
        };
        let mut heap = Heap::new();
        let mut registry = DecodeRegistry::new();
        let err = decode_with(&node, &mut heap, &mut registry).unwrap_err();
        assert_eq!(err, DecodeError::DanglingReference { id: id(9) });

        let root = registry.lookup(id(1)).unwrap();
        let items = heap.get_array(root).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Value::from(1));
        assert_eq!(items[1], Value::Entity(registry.lookup(id(2)).unwrap()));
    }

    #[test]
    fn test_wide_object() {
        let properties: Vec<_> = (0..50_000)
            .map(|i| (format!("key{}", i), Node::from(i as i64)))
            .collect();
        let node = Node::Object { id: id(1), properties };
        let graph = decode(&node).unwrap();
        let object = graph.heap.get_object(graph.root.as_handle().unwrap()).unwrap();
        assert_eq!(object.len(), 50_000);
        assert_eq!(object.get("key49999"), Some(&Value::from(49_999i64)));
        assert_eq!(object.iter().next().map(|(k, _)| k), Some("key0"));
    }

    #[test]
    fn test_shared_registry_across_calls() {
        let first = Node::Array {
            id: id(1),
            elements: vec![Node::Object { id: id(2), properties: vec![] }],
        };
        let second = Node::Array {
            id: id(3),
            elements: vec![Node::Reference(id(2))],
        };
        let mut heap = Heap::new();
        let mut registry = DecodeRegistry::new();
        let a = decode_with(&first, &mut heap, &mut registry).unwrap();
        let b = decode_with(&second, &mut heap, &mut registry).unwrap();

        let shared_a = heap.get_array(a.as_handle().unwrap()).unwrap()[0].clone();
        let shared_b = heap.get_array(b.as_handle().unwrap()).unwrap()[0].clone();
        assert_eq!(shared_a, shared_b);
    }

    #[test]
    fn test_depth_limit() {
        let mut node = Node::Array { id: id(100), elements: vec![] };
        for i in 1..=10 {
            node = Node::Array { id: id(i), elements: vec![node] };
        }
        let mut heap = Heap::new();
        let mut registry = DecodeRegistry::new();
        let options = DecodeOptions::new().with_max_depth(4);
        assert_eq!(
            decode_with_options(&node, &mut heap, &mut registry, options),
            Err(DecodeError::DepthExceeded { max: 4 })
        );
        assert!(decode(&node).is_ok());
    }
}
