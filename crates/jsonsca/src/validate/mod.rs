//! Structural validation for node trees.
//!
//! Decoding already rejects dangling references and duplicate ids as it
//! meets them. This module checks a tree without building anything, and
//! also checks what decode does not: that ids were assigned in traversal
//! order, as a conforming encoder assigns them.
//!
//! Trees produced by encoding against a shared registry refer to ids from
//! earlier trees. Validating them in sequence against one
//! [`ValidationContext`] carries those ids forward.

use rustc_hash::FxHashSet;

use crate::error::ValidationError;
use crate::model::{Node, NodeId};

/// Ids seen so far across one or more validated trees.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    defined: FxHashSet<NodeId>,
    last_id: Option<NodeId>,
}

impl ValidationContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `id` was defined by a validated tree.
    pub fn is_defined(&self, id: NodeId) -> bool {
        self.defined.contains(&id)
    }

    /// The highest id defined so far.
    pub fn last_id(&self) -> Option<NodeId> {
        self.last_id
    }
}

/// Validates a node tree, recording its ids in `context`.
///
/// Checks, in depth-first order:
/// - every composite id is new and greater than every id before it
/// - every reference names an id defined earlier (in this tree or a
///   previously validated one)
pub fn validate_node(node: &Node, context: &mut ValidationContext) -> Result<(), ValidationError> {
    if let Node::Reference(id) = node {
        if !context.defined.contains(id) {
            return Err(ValidationError::UnresolvedReference { id: *id });
        }
        return Ok(());
    }

    if let Some(id) = node.id() {
        if context.defined.contains(&id) {
            return Err(ValidationError::DuplicateId { id });
        }
        if let Some(previous) = context.last_id {
            if id <= previous {
                return Err(ValidationError::NonMonotonicId { id, previous });
            }
        }
        context.defined.insert(id);
        context.last_id = Some(id);
    }

    for child in node.children() {
        validate_node(child, context)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    #[test]
    fn test_valid_tree() {
        let node = Node::Array {
            id: id(1),
            elements: vec![
                Node::Object {
                    id: id(2),
                    properties: vec![("self".to_string(), Node::Reference(id(2)))],
                },
                Node::Reference(id(2)),
                Node::Reference(id(1)),
                Node::from(3),
            ],
        };
        let mut context = ValidationContext::new();
        validate_node(&node, &mut context).unwrap();
        assert!(context.is_defined(id(1)));
        assert_eq!(context.last_id(), Some(id(2)));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let node = Node::Array {
            id: id(1),
            elements: vec![
                Node::Reference(id(2)),
                Node::Array { id: id(2), elements: vec![] },
            ],
        };
        assert_eq!(
            validate_node(&node, &mut ValidationContext::new()),
            Err(ValidationError::UnresolvedReference { id: id(2) })
        );
    }

    #[test]
    fn test_out_of_order_ids_rejected() {
        let node = Node::Array {
            id: id(2),
            elements: vec![Node::Array { id: id(1), elements: vec![] }],
        };
        assert_eq!(
            validate_node(&node, &mut ValidationContext::new()),
            Err(ValidationError::NonMonotonicId { id: id(1), previous: id(2) })
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let node = Node::Array {
            id: id(1),
            elements: vec![Node::Array { id: id(1), elements: vec![] }],
        };
        assert_eq!(
            validate_node(&node, &mut ValidationContext::new()),
            Err(ValidationError::DuplicateId { id: id(1) })
        );
    }

    #[test]
    fn test_context_carries_across_trees() {
        let first = Node::Array {
            id: id(1),
            elements: vec![Node::Object { id: id(2), properties: vec![] }],
        };
        let second = Node::Array {
            id: id(3),
            elements: vec![Node::Reference(id(2))],
        };
        let mut context = ValidationContext::new();
        validate_node(&first, &mut context).unwrap();
        validate_node(&second, &mut context).unwrap();

        assert!(validate_node(&second, &mut ValidationContext::new()).is_err());
    }
}
