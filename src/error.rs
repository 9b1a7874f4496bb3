//! Error types for cache repositories and pipelines.

use crate::serialization::ValueKind;
use std::fmt;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cache repository.
///
/// A missing key or hash field is never an error: lookups return `Ok(None)`
/// (or an empty collection) so "not found" and "failed" stay distinguishable.
#[derive(Debug, Clone)]
pub enum Error {
    /// Encoding a value for storage failed.
    ///
    /// Only structured (JSON) values can fail here, e.g. a map with
    /// non-string keys.
    SerializationError(String),

    /// Stored bytes could not be decoded as JSON into the target type.
    ///
    /// **Recovery:** the entry is malformed; delete and rewrite it.
    DeserializationError(String),

    /// An identifier or argument was rejected before any I/O took place.
    ///
    /// Raised for empty keys, empty hash fields and empty
    /// field maps.
    ValidationError(String),

    /// The declared value type does not match the stored representation.
    ///
    /// Raised when a primitive repository reads text that does not parse as
    /// its type, or when a value is decoded with the wrong [`ValueKind`].
    TypeMismatch {
        /// Kind or type the caller declared
        expected: String,
        /// What was actually found
        found: String,
    },

    /// Store transport or protocol failure (Redis down, pool exhausted,
    /// WRONGTYPE, ...).
    ///
    /// **Recovery:** the caller decides whether to retry; repositories never do.
    BackendError(String),

    /// The bound context was cancelled or its deadline passed.
    Cancelled(String),

    /// Configuration or connection bootstrap failure.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

/// Coarse classification of [`Error`] for callers that only care about the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StoreUnavailable,
    Encoding,
    Decoding,
    TypeMismatch,
    Cancellation,
    Config,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SerializationError(_) => ErrorKind::Encoding,
            Error::DeserializationError(_) => ErrorKind::Decoding,
            Error::ValidationError(_) => ErrorKind::Validation,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::BackendError(_) => ErrorKind::StoreUnavailable,
            Error::Cancelled(_) => ErrorKind::Cancellation,
            Error::ConfigError(_) => ErrorKind::Config,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    pub(crate) fn kind_mismatch(expected: ValueKind, found: ValueKind) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_eof() || e.is_data() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::redis::RedisError> for Error {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ValidationError("Test".to_string());
        assert_eq!(err.to_string(), "Validation error: Test");
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::BackendError("down".into()).kind(),
            ErrorKind::StoreUnavailable
        );
        assert_eq!(
            Error::Cancelled("deadline exceeded".into()).kind(),
            ErrorKind::Cancellation
        );
        assert!(Error::Cancelled("context cancelled".into()).is_cancelled());
        assert!(!Error::Other("x".into()).is_cancelled());
    }

    #[test]
    fn test_kind_mismatch_display() {
        let err = Error::kind_mismatch(ValueKind::Primitive, ValueKind::Structured);
        assert_eq!(
            err.to_string(),
            "Type mismatch: expected primitive, found structured"
        );
    }

    #[test]
    fn test_json_syntax_error_is_decoding() {
        let e = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = e.into();
        assert_eq!(err.kind(), ErrorKind::Decoding);
    }
}
