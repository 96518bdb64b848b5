//! Result and error types for the storefront suite.

use thiserror::Error;

/// Result type for storefront operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while driving or verifying the storefront
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller passed an argument that violates a precondition.
    /// Raised before any interaction with the page.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// A verification did not hold
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// A rendered readout did not match its expected pattern
    #[error("Could not parse {what} from {text:?}")]
    Parse {
        /// Which readout was being parsed
        what: &'static str,
        /// The text that failed to parse
        text: String,
    },

    /// No element matched the locator before the timeout
    #[error("No element matches {locator} after {timeout_ms}ms")]
    ElementNotFound {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// More than one element matched a locator that requires a single match
    #[error("Strict mode violation: {locator} resolved to {count} elements")]
    StrictModeViolation {
        /// Locator description
        locator: String,
        /// Number of matches
        count: usize,
    },

    /// A condition wait expired
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waited_for: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// In-page script evaluation failed
    #[error("Script evaluation failed: {message}")]
    ScriptError {
        /// Error message
        message: String,
    },

    /// A locator could not be interpreted
    #[error("Unsupported selector {selector:?}: {message}")]
    UnsupportedSelector {
        /// The offending selector
        selector: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl StoreError {
    /// Create an invalid-argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a parse error for a readout
    #[must_use]
    pub fn parse(what: &'static str, text: impl Into<String>) -> Self {
        Self::Parse {
            what,
            text: text.into(),
        }
    }

    /// Whether this error is a precondition violation
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Whether this error is a failed verification
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = StoreError::invalid_argument("times must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid argument: times must be greater than 0"
        );

        let err = StoreError::parse("price", "free");
        assert_eq!(err.to_string(), "Could not parse price from \"free\"");

        let err = StoreError::StrictModeViolation {
            locator: "css(button)".to_string(),
            count: 3,
        };
        assert!(err.to_string().contains("3 elements"));
    }

    #[test]
    fn test_classification() {
        assert!(StoreError::invalid_argument("x").is_precondition());
        assert!(!StoreError::invalid_argument("x").is_assertion());
        assert!(StoreError::assertion("x").is_assertion());
        assert!(!StoreError::Timeout {
            ms: 10,
            waited_for: "quantity".to_string()
        }
        .is_assertion());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
