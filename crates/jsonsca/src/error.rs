//! Error types for JSON/SCA encoding, decoding and validation.

use thiserror::Error;

use crate::model::{Handle, NodeId};

/// The three failure kinds every error maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Byte acquisition for a binary leaf failed
    LeafExtraction,
    /// E002: Reference to an id that was never bound
    DanglingReference,
    /// E003: Node is missing a required field or is otherwise malformed
    MalformedNode,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::LeafExtraction => "E001",
            ErrorCode::DanglingReference => "E002",
            ErrorCode::MalformedNode => "E003",
        }
    }
}

/// Failure reported by a [`ByteSource`](crate::codec::ByteSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Error during encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    // === E001: Leaf extraction ===
    #[error("[E001] could not read bytes for binary leaf {id}: {reason}")]
    LeafExtraction { id: NodeId, reason: String },

    // === E003: Malformed input graph ===
    #[error("[E003] handle {handle:?} does not belong to this heap")]
    UnknownHandle { handle: Handle },

    #[error("[E003] composite nesting exceeds maximum depth {max}")]
    DepthExceeded { max: usize },

    #[error("[E003] every id up to {max} has been assigned", max = u64::MAX)]
    IdsExhausted,

    #[error("[E003] JSON serialization failed: {0}")]
    Json(String),
}

impl EncodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EncodeError::LeafExtraction { .. } => ErrorCode::LeafExtraction,
            _ => ErrorCode::MalformedNode,
        }
    }
}

/// Error during decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === E002: Dangling reference ===
    #[error("[E002] reference to unbound id {id}")]
    DanglingReference { id: NodeId },

    // === E003: Malformed node ===
    #[error("[E003] {tag} node is missing field `{field}`")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },

    #[error("[E003] invalid {field} in {tag} node: expected {expected}")]
    InvalidField {
        tag: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("[E003] invalid id {found:?}: expected a positive decimal integer string")]
    InvalidId { found: String },

    #[error("[E003] node has no recognized tag")]
    UnknownTag,

    #[error("[E003] node carries more than one tag: {first} and {second}")]
    AmbiguousTags {
        first: &'static str,
        second: &'static str,
    },

    #[error("[E003] bare JSON {kind} is not a valid node")]
    UnexpectedJson { kind: &'static str },

    #[error("[E003] {tag} byte string contains a char above U+00FF")]
    InvalidByteString { tag: &'static str },

    #[error("[E003] id {id} is bound more than once")]
    DuplicateId { id: NodeId },

    #[error("[E003] composite nesting exceeds maximum depth {max}")]
    DepthExceeded { max: usize },

    #[error("[E003] JSON parsing failed: {0}")]
    Json(String),
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::DanglingReference { .. } => ErrorCode::DanglingReference,
            _ => ErrorCode::MalformedNode,
        }
    }
}

/// Error during structural validation of a node tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("id {id} is assigned to more than one composite")]
    DuplicateId { id: NodeId },

    #[error("id {id} follows {previous} out of traversal order")]
    NonMonotonicId { id: NodeId, previous: NodeId },

    #[error("reference to id {id} that is not defined earlier in the traversal")]
    UnresolvedReference { id: NodeId },
}
