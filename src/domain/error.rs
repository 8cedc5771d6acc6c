//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeHandle;

/// Domain errors represent violations of the tree model.
/// These are independent of storage concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeHandle),

    #[error("invalid parent: {0}")]
    InvalidParent(NodeHandle),

    #[error("cannot move {node} into itself or its descendant {target}")]
    CyclicMove { node: NodeHandle, target: NodeHandle },

    #[error("malformed xml: {message}")]
    MalformedXml { message: String },

    #[error("invalid node path: {0}")]
    InvalidPath(String),

    #[error("invalid document handle: {0}")]
    InvalidHandle(String),
}

impl DomainError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedXml {
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
