//! Graph flattening: value graph to node tree.
//!
//! Encoding runs in two steps. A synchronous depth-first walk assigns ids
//! in first-encounter order, turns repeated composites into references and
//! queues every binary leaf. The queued leaves are then read concurrently
//! from the [`ByteSource`] and written back into the tree by position, so
//! ids never depend on the order in which reads complete.

use futures::future::try_join_all;
use tracing::debug;

use crate::codec::ByteSource;
use crate::error::EncodeError;
use crate::limits::MAX_DEPTH;
use crate::model::{BlobKind, Entity, Handle, Heap, Node, NodeId, Payload, Value};
use crate::registry::{EncodeRegistry, Reference};

/// Options for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Maximum nesting of arrays and objects.
    ///
    /// Back-references do not count towards depth, so cyclic graphs are
    /// bounded by their acyclic extent only.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { max_depth: MAX_DEPTH }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Encodes `value` with a fresh registry.
///
/// Composites are looked up in `heap`; binary leaves are read through
/// `source`. Any failure aborts the whole pass.
pub async fn encode<S>(heap: &Heap, value: &Value, source: &S) -> Result<Node, EncodeError>
where
    S: ByteSource + ?Sized,
{
    let mut registry = EncodeRegistry::new();
    encode_with_options(heap, value, &mut registry, source, EncodeOptions::default()).await
}

/// Encodes `value` against a caller-supplied registry.
///
/// Encoding several values from the same heap against one registry gives
/// each shared composite a single id: later occurrences, even in later
/// calls, become references.
pub async fn encode_with<S>(
    heap: &Heap,
    value: &Value,
    registry: &mut EncodeRegistry,
    source: &S,
) -> Result<Node, EncodeError>
where
    S: ByteSource + ?Sized,
{
    encode_with_options(heap, value, registry, source, EncodeOptions::default()).await
}

/// Encodes `value` against a caller-supplied registry with options.
///
/// If the pass fails, ids it assigned stay reserved in `registry`.
pub async fn encode_with_options<S>(
    heap: &Heap,
    value: &Value,
    registry: &mut EncodeRegistry,
    source: &S,
    options: EncodeOptions,
) -> Result<Node, EncodeError>
where
    S: ByteSource + ?Sized,
{
    let mut walker = Walker {
        heap,
        registry,
        max_depth: options.max_depth,
        depth: 0,
        composites: 0,
        references: 0,
        leaves: Vec::new(),
    };
    let mut node = walker.walk(value)?;
    let Walker {
        composites,
        references,
        leaves,
        ..
    } = walker;

    let reads = leaves.iter().map(|leaf| async move {
        source
            .read_bytes(leaf.payload)
            .await
            .map_err(|err| EncodeError::LeafExtraction {
                id: leaf.id,
                reason: err.message,
            })
    });
    let contents = try_join_all(reads).await?;
    fill_leaves(&mut node, &mut contents.into_iter());

    debug!(composites, references, leaves = leaves.len(), "encoded value graph");
    Ok(node)
}

/// A binary leaf waiting for its bytes.
struct Leaf<'a> {
    id: NodeId,
    payload: &'a Payload,
}

struct Walker<'a, 'r> {
    heap: &'a Heap,
    registry: &'r mut EncodeRegistry,
    max_depth: usize,
    depth: usize,
    composites: usize,
    references: usize,
    /// Binary leaves in traversal order.
    leaves: Vec<Leaf<'a>>,
}

impl<'a> Walker<'a, '_> {
    fn walk(&mut self, value: &'a Value) -> Result<Node, EncodeError> {
        let handle = match value {
            Value::Bool(b) => return Ok(Node::Bool(*b)),
            Value::Number(n) => return Ok(Node::Number(n.clone())),
            Value::String(s) => return Ok(Node::String(s.clone())),
            Value::Undefined => return Ok(Node::Undefined),
            Value::Null => return Ok(Node::Null),
            Value::Date(date) => return Ok(Node::Date(date.epoch_millis())),
            Value::RegExp(regexp) => {
                return Ok(Node::Regexp {
                    source: regexp.source.clone(),
                });
            }
            Value::Entity(handle) => *handle,
        };
        self.walk_entity(handle)
    }

    fn walk_entity(&mut self, handle: Handle) -> Result<Node, EncodeError> {
        let entity = self
            .heap
            .get(handle)
            .ok_or(EncodeError::UnknownHandle { handle })?;

        let id = match self.registry.reference_handle(handle)? {
            Reference::Seen(id) => {
                self.references += 1;
                return Ok(Node::Reference(id));
            }
            Reference::New(id) => id,
        };
        self.composites += 1;

        match entity {
            Entity::Blob(blob) => {
                self.leaves.push(Leaf {
                    id,
                    payload: &blob.payload,
                });
                let kind = if blob.is_file() { BlobKind::File } else { BlobKind::Blob };
                Ok(Node::Blob {
                    id,
                    kind,
                    mime_type: blob.mime_type.clone(),
                    name: blob.name.clone(),
                    contents: Vec::new(),
                })
            }
            Entity::ImageData(image) => {
                self.leaves.push(Leaf {
                    id,
                    payload: &image.pixels,
                });
                Ok(Node::ImageData {
                    id,
                    width: image.width,
                    height: image.height,
                    data: Vec::new(),
                })
            }
            Entity::Array(items) => {
                self.enter()?;
                let elements = items
                    .iter()
                    .map(|item| self.walk(item))
                    .collect::<Result<Vec<_>, _>>()?;
                self.depth -= 1;
                Ok(Node::Array { id, elements })
            }
            Entity::Object(object) => {
                self.enter()?;
                let properties = object
                    .iter()
                    .map(|(key, item)| Ok((key.to_string(), self.walk(item)?)))
                    .collect::<Result<Vec<_>, EncodeError>>()?;
                self.depth -= 1;
                Ok(Node::Object { id, properties })
            }
        }
    }

    fn enter(&mut self) -> Result<(), EncodeError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(EncodeError::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Writes leaf bytes back into the tree, visiting leaves in the same order
/// the walker queued them.
fn fill_leaves(node: &mut Node, slots: &mut impl Iterator<Item = Vec<u8>>) {
    match node {
        Node::Blob { contents, .. } => {
            if let Some(bytes) = slots.next() {
                *contents = bytes;
            }
        }
        Node::ImageData { data, .. } => {
            if let Some(bytes) = slots.next() {
                *data = bytes;
            }
        }
        Node::Array { elements, .. } => {
            for element in elements {
                fill_leaves(element, slots);
            }
        }
        Node::Object { properties, .. } => {
            for (_, child) in properties {
                fill_leaves(child, slots);
            }
        }
        _ => {}
    }
}
