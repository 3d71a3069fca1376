//! Data model types for JSON/SCA.
//!
//! This module contains the two sides of the codec:
//! - Values (in-memory graphs, composites stored in a heap arena)
//! - Nodes (the tagged, acyclic wire tree)
//! - Identifiers (per-pass composite ids)
//! - Builders (ergonomic graph construction)

pub mod builder;
pub mod heap;
pub mod id;
pub mod node;
pub mod value;

pub use builder::{ArrayBuilder, ObjectBuilder};
pub use heap::{Blob, Entity, Graph, Handle, Heap, ImageData, Object, Payload};
pub use id::{format_id, parse_id, NodeId};
pub use node::{BlobKind, Node};
pub use value::{Date, RegExp, Value};
