//! DOM operation errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node was destroyed or never existed
    #[error("node {0:?} not found")]
    NotFound(NodeId),
    /// Inserting would create a cycle or put a node under a non-container
    #[error("hierarchy request error")]
    HierarchyRequest,
    /// Operation needs an element
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    /// Reference node is not a child of the given parent
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    /// The document node cannot be moved or destroyed
    #[error("invalid node type for this operation")]
    InvalidNodeType,
}
