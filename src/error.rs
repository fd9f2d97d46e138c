//! Error types for background-upload
//!
//! Errors fall into four groups:
//! - Native call failures: the provider rejected `start`, `cancel` or `list`
//! - Usage errors: calling an operation the task is not ready for
//! - Decoding failures at the native event boundary
//! - Configuration and parameter validation
//!
//! A failed upload is *not* an error here. Terminal `error` events resolve the
//! upload outcome with [`UploadStatus::Error`](crate::types::UploadStatus::Error),
//! so "the upload failed" and "the call failed" stay observably different.

use thiserror::Error;

/// Result type alias for background-upload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for background-upload
///
/// `Error` is `Clone` so a single start failure can be delivered both to the
/// caller of `start()` and to every clone of the upload's outcome future.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "event_prefix")
        key: Option<String>,
    },

    /// The native upload provider rejected a call
    #[error("native provider error: {0}")]
    Native(String),

    /// Upload task usage error
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),

    /// Invalid parameter passed to an operation
    #[error("invalid parameter {parameter}: {message}")]
    InvalidParameter {
        /// Name of the offending parameter
        parameter: String,
        /// Why the value was rejected
        message: String,
    },

    /// Malformed payload received from the native side
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Operation not supported by the configured provider
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Upload task usage errors
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The task has no native id yet, so there is nothing to cancel
    #[error("upload not started")]
    NotStarted,

    /// The task was torn down before its outcome was resolved
    #[error("upload was dropped before reaching a terminal state")]
    OutcomeDropped,

    /// An event arrived on a stream name this crate does not know
    #[error("unknown upload event stream: {name}")]
    UnknownEvent {
        /// The full stream name that was received
        name: String,
    },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Shorthand for an [`Error::InvalidParameter`]
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::Native`]
    pub fn native(message: impl Into<String>) -> Self {
        Error::Native(message.into())
    }

    /// Machine-readable error code, stable across releases
    ///
    /// Bridges that marshal errors back to a UI layer use this instead of
    /// matching on display strings.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Native(_) => "native_error",
            Error::Upload(UploadError::NotStarted) => "upload_not_started",
            Error::Upload(UploadError::OutcomeDropped) => "outcome_dropped",
            Error::Upload(UploadError::UnknownEvent { .. }) => "unknown_event",
            Error::InvalidParameter { .. } => "invalid_parameter",
            Error::Serialization(_) => "serialization_error",
            Error::NotSupported(_) => "not_supported",
            Error::Other(_) => "internal_error",
        }
    }

    /// Whether this error was raised before any native call was attempted
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::Upload(UploadError::NotStarted) | Error::InvalidParameter { .. }
        )
    }
}
