//! JSON/SCA: JSON encoding for value graphs with shared references and cycles.
//!
//! This crate flattens an in-memory value graph into a tree of tagged nodes
//! that plain JSON can carry, and rebuilds an equivalent graph from it.
//!
//! # Overview
//!
//! JSON/SCA extends JSON with:
//! - **Identity**: a composite reachable from several places is encoded once;
//!   later occurrences become references to its id
//! - **Cycles**: a back-reference is just another reference, so cyclic graphs
//!   encode to finite trees
//! - **Extra leaf types**: `undefined`, dates, regular expressions, blobs,
//!   files and image buffers
//!
//! # Quick Start
//!
//! ```rust
//! use jsonsca::{decode, encode, Heap, InlineSource, Node, NodeId, Value};
//!
//! # futures::executor::block_on(async {
//! let mut heap = Heap::new();
//! let a = heap.object([("x", Value::from(1))]);
//! let root = heap.array(vec![a.clone(), a]);
//!
//! // Encode: the second occurrence of `a` becomes a reference
//! let node = encode(&heap, &root, &InlineSource).await.unwrap();
//! let Node::Array { elements, .. } = &node else { unreachable!() };
//! assert_eq!(elements[1], Node::Reference(NodeId::new(2).unwrap()));
//!
//! // Decode: both positions hold the same entity
//! let graph = decode(&node).unwrap();
//! let items = graph.heap.get_array(graph.root.as_handle().unwrap()).unwrap();
//! assert_eq!(items[0], items[1]);
//! # });
//! ```
//!
//! # Modules
//!
//! - [`model`]: Values, the heap arena, wire nodes, builders
//! - [`registry`]: Per-pass identity tables
//! - [`codec`]: Encoding, decoding, JSON wire mapping, byte sources
//! - [`validate`]: Structural validation of node trees
//! - [`error`]: Error types
//! - [`limits`]: Nesting limits
//!
//! # Wire Format
//!
//! Atoms are bare JSON. Other nodes are JSON objects discriminated by one tag
//! field (`reference`, `null`, `undefined`, `date`, `regexp`, `imagedata`,
//! `file`, `blob`, `array`, `object`); composites carry a decimal-string `id`.
//! Binary payloads travel as binary strings (one char per byte).
//!
//! # Limitations
//!
//! - Regular expressions keep their source only; flags are dropped.
//! - Image buffers keep width, height and pixels; colour space is dropped.
//! - Handles are only meaningful in the heap that issued them; a registry
//!   shared across calls must only see values from one heap.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod registry;
pub mod util;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{
    decode, decode_with, decode_with_options, encode, encode_with, encode_with_options, from_json,
    node_from_json, node_to_json, parse, stringify, to_json, ByteSource, DecodeOptions,
    EncodeOptions, InlineSource,
};
pub use error::{DecodeError, EncodeError, ErrorCode, SourceError, ValidationError};
pub use model::{
    Blob, BlobKind, Date, Entity, Graph, Handle, Heap, ImageData, Node, NodeId, Object, Payload,
    RegExp, Value,
};
pub use registry::{DecodeRegistry, EncodeRegistry, Reference};
pub use validate::{validate_node, ValidationContext};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates an empty encode registry, for sharing ids across encode calls.
pub fn registry_new() -> EncodeRegistry {
    EncodeRegistry::new()
}
