//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storefront library error
    #[error("{0}")]
    Store(#[from] storefront::StoreError),
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront::StoreError;

    #[test]
    fn test_store_error_passes_through() {
        let err: CliError = StoreError::assertion("badge 3 != 4").into();
        assert_eq!(err.to_string(), "Assertion failed: badge 3 != 4");
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(
            CliError::invalid_argument("x"),
            CliError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_io_error_converts() {
        let err: CliError = std::io::Error::other("no threads").into();
        assert!(matches!(err, CliError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: no threads");
    }
}
