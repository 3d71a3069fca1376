//! Per-pass identity tables.
//!
//! An [`EncodeRegistry`] maps composite identity (heap handles) to ids as a
//! graph is flattened; a [`DecodeRegistry`] maps ids back to the handles of
//! reconstructed composites. Both are created fresh for each pass unless the
//! caller threads one through several passes explicitly.
//!
//! Passes borrow their registry mutably for their whole duration, so one
//! registry can never serve two in-flight passes at once.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{DecodeError, EncodeError};
use crate::model::{Handle, NodeId, Value};

/// Outcome of asking the encode registry about a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// First encounter; the composite was assigned this id.
    New(NodeId),
    /// The composite was already assigned this id.
    Seen(NodeId),
}

impl Reference {
    pub fn id(self) -> NodeId {
        match self {
            Reference::New(id) | Reference::Seen(id) => id,
        }
    }
}

/// Encode-side registry: composite handle to id.
///
/// Ids are handed out 1, 2, 3, ... in the order composites are first seen.
/// Lookup is keyed by handle, so two structurally equal composites at
/// different handles get different ids.
#[derive(Debug, Clone)]
pub struct EncodeRegistry {
    ids: FxHashMap<Handle, NodeId>,
    /// `None` once every id up to `u64::MAX` has been issued.
    next_id: Option<NodeId>,
}

impl Default for EncodeRegistry {
    fn default() -> Self {
        Self::with_next_id(NodeId::FIRST)
    }
}

impl EncodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose first assigned id is `next`.
    ///
    /// Used to continue numbering after ids issued by some other registry.
    pub fn with_next_id(next: NodeId) -> Self {
        Self {
            ids: FxHashMap::default(),
            next_id: Some(next),
        }
    }

    /// Looks up or assigns the id for a value.
    ///
    /// Returns `None` for non-composites, which are never deduplicated.
    pub fn reference(&mut self, value: &Value) -> Result<Option<Reference>, EncodeError> {
        value
            .as_handle()
            .map(|handle| self.reference_handle(handle))
            .transpose()
    }

    /// Looks up or assigns the id for a composite handle.
    ///
    /// Fails once the id space is exhausted; an id is never issued twice.
    pub fn reference_handle(&mut self, handle: Handle) -> Result<Reference, EncodeError> {
        if let Some(&id) = self.ids.get(&handle) {
            trace!(%id, ?handle, "composite seen before");
            return Ok(Reference::Seen(id));
        }
        let id = self.next_id.ok_or(EncodeError::IdsExhausted)?;
        self.next_id = id.next();
        self.ids.insert(handle, id);
        Ok(Reference::New(id))
    }

    /// Returns the id already assigned to `handle`, without assigning one.
    pub fn get(&self, handle: Handle) -> Option<NodeId> {
        self.ids.get(&handle).copied()
    }

    /// Number of composites registered.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Decode-side registry: id to reconstructed composite.
#[derive(Debug, Clone, Default)]
pub struct DecodeRegistry {
    bound: FxHashMap<NodeId, Handle>,
}

impl DecodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly allocated (possibly still empty) composite under `id`.
    ///
    /// Each id may be bound once; a second binding means the input assigned
    /// one id to two composites.
    pub fn bind(&mut self, id: NodeId, handle: Handle) -> Result<(), DecodeError> {
        if self.bound.contains_key(&id) {
            return Err(DecodeError::DuplicateId { id });
        }
        self.bound.insert(id, handle);
        Ok(())
    }

    /// Returns the composite bound to `id`.
    pub fn lookup(&self, id: NodeId) -> Result<Handle, DecodeError> {
        let handle = self
            .bound
            .get(&id)
            .copied()
            .ok_or(DecodeError::DanglingReference { id })?;
        trace!(%id, ?handle, "reference resolved");
        Ok(handle)
    }

    /// Number of composites bound.
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
