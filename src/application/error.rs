//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DocumentId, DomainError};

/// Application errors wrap domain errors and add storage-level failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("remote document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("server rejected request (HTTP {status}): {message}")]
    ServerRejected { status: u16, message: String },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{store} cannot open document {handle}")]
    InvalidHandle { store: &'static str, handle: String },

    #[error("config error: {message}")]
    Config { message: String },
}

/// Failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidParent,
    CyclicMove,
    MalformedXml,
    IoError,
    ServerRejected,
    /// Caller passed something unusable (bad path, wrong handle kind)
    Usage,
    Config,
}

impl ApplicationError {
    pub fn io(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Io {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(e) => match e {
                DomainError::NodeNotFound(_) => ErrorKind::NotFound,
                DomainError::InvalidParent(_) => ErrorKind::InvalidParent,
                DomainError::CyclicMove { .. } => ErrorKind::CyclicMove,
                DomainError::MalformedXml { .. } => ErrorKind::MalformedXml,
                DomainError::InvalidPath(_) | DomainError::InvalidHandle(_) => ErrorKind::Usage,
            },
            Self::DocumentNotFound(_) => ErrorKind::NotFound,
            Self::ServerRejected { .. } => ErrorKind::ServerRejected,
            Self::Io { .. } => ErrorKind::IoError,
            Self::InvalidHandle { .. } => ErrorKind::Usage,
            Self::Config { .. } => ErrorKind::Config,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
