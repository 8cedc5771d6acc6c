//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::{ApplicationError, ErrorKind};
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Application(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Application(e) => match e.kind() {
                ErrorKind::NotFound => crate::exitcode::NOINPUT,
                ErrorKind::InvalidParent | ErrorKind::CyclicMove | ErrorKind::Usage => {
                    crate::exitcode::USAGE
                }
                ErrorKind::MalformedXml => crate::exitcode::DATAERR,
                ErrorKind::IoError => crate::exitcode::IOERR,
                ErrorKind::ServerRejected => crate::exitcode::UNAVAILABLE,
                ErrorKind::Config => crate::exitcode::CONFIG,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentId;

    #[test]
    fn given_errors_when_mapping_exit_codes_then_follows_sysexits() {
        let err: CliError = DomainError::malformed("eof").into();
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);

        let err: CliError = ApplicationError::DocumentNotFound(DocumentId(1)).into();
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);

        let err = CliError::Usage("no document".into());
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }
}
