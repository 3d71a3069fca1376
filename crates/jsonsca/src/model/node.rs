//! Tagged wire nodes.
//!
//! A [`Node`] tree is acyclic: every repeated occurrence of a composite is a
//! [`Node::Reference`] to the id assigned where the composite was first met.

use serde_json::Number;

use crate::model::NodeId;

/// Which wire tag a binary node uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    /// Named binary (`file`).
    File,
    /// Anonymous binary (`blob`).
    Blob,
}

impl BlobKind {
    /// The wire tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            BlobKind::File => "file",
            BlobKind::Blob => "blob",
        }
    }
}

/// One element of the wire tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // Atoms, carried as bare JSON.
    Bool(bool),
    Number(Number),
    String(String),

    Null,
    Undefined,
    /// Milliseconds since the Unix epoch.
    Date(i64),
    Regexp {
        source: String,
    },
    /// Stands in for a composite encoded earlier under `id`.
    Reference(NodeId),

    Blob {
        id: NodeId,
        kind: BlobKind,
        mime_type: String,
        /// Present for [`BlobKind::File`].
        name: Option<String>,
        contents: Vec<u8>,
    },
    ImageData {
        id: NodeId,
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    Array {
        id: NodeId,
        elements: Vec<Node>,
    },
    Object {
        id: NodeId,
        properties: Vec<(String, Node)>,
    },
}

impl Node {
    /// Returns the id of a composite node.
    ///
    /// References return `None`: they point at an id, they don't carry one.
    pub fn id(&self) -> Option<NodeId> {
        match self {
            Node::Blob { id, .. }
            | Node::ImageData { id, .. }
            | Node::Array { id, .. }
            | Node::Object { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Returns true for atoms, which are passed through the wire verbatim.
    pub fn is_atom(&self) -> bool {
        matches!(self, Node::Bool(_) | Node::Number(_) | Node::String(_))
    }

    /// Returns the wire tag, or `None` for atoms.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Node::Bool(_) | Node::Number(_) | Node::String(_) => None,
            Node::Null => Some("null"),
            Node::Undefined => Some("undefined"),
            Node::Date(_) => Some("date"),
            Node::Regexp { .. } => Some("regexp"),
            Node::Reference(_) => Some("reference"),
            Node::Blob { kind, .. } => Some(kind.tag()),
            Node::ImageData { .. } => Some("imagedata"),
            Node::Array { .. } => Some("array"),
            Node::Object { .. } => Some("object"),
        }
    }

    /// Iterates direct children in traversal order.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match self {
            Node::Array { elements, .. } => Box::new(elements.iter()),
            Node::Object { properties, .. } => Box::new(properties.iter().map(|(_, n)| n)),
            _ => Box::new(std::iter::empty()),
        }
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Number(value.into())
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_string())
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}
