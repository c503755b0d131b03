//! Common error type used throughout mediaconv.
//!
//! Every failure the registry, the option compiler, the geometry engine and
//! the conversion orchestrator can produce is a variant of [`Error`].
//! [`Error::category`] groups the variants into the four kinds callers
//! usually branch on.

use std::time::Duration;

use crate::media::StreamKind;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The request itself is malformed or names something unknown.
    Configuration,
    /// The source file is missing, unreadable or unusable.
    Input,
    /// An invariant inside the library was broken by its caller.
    Internal,
    /// The external engine failed, timed out or is not installed.
    Engine,
    /// Filesystem or serialization failure.
    Io,
}

/// Common error type for mediaconv.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested container format is not registered.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// The requested codec is not registered for the stream kind.
    #[error("Unknown {kind} codec: {name}")]
    UnknownCodec { kind: StreamKind, name: String },

    /// A second descriptor tried to claim an already registered name.
    #[error("Duplicate {kind} descriptor: {name}")]
    DuplicateDescriptor { kind: String, name: String },

    /// A stream specification does not match the descriptor compiling it.
    #[error("Invalid codec specification: {0}")]
    InvalidCodecSpecification(String),

    /// A format specification does not match the descriptor compiling it.
    #[error("Invalid format specification: {0}")]
    InvalidFormatSpecification(String),

    /// The conversion request is structurally invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The source media cannot be converted.
    #[error("Input error: {0}")]
    Input(String),

    /// Geometry was requested with values outside its contract.
    #[error("Geometry contract violation: {0}")]
    GeometryContractViolation(String),

    /// A required external tool could not be located.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The engine process failed.
    #[error("Engine error: {tool}: {message}")]
    Engine { tool: String, message: String },

    /// The engine produced no progress update within the allowed window.
    #[error("Engine timed out after {0:?} without progress")]
    EngineTimeout(Duration),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new UnknownFormat error.
    pub fn unknown_format<S: Into<String>>(name: S) -> Self {
        Self::UnknownFormat(name.into())
    }

    /// Create a new UnknownCodec error.
    pub fn unknown_codec<S: Into<String>>(kind: StreamKind, name: S) -> Self {
        Self::UnknownCodec {
            kind,
            name: name.into(),
        }
    }

    /// Create a new DuplicateDescriptor error.
    pub fn duplicate<K: Into<String>, S: Into<String>>(kind: K, name: S) -> Self {
        Self::DuplicateDescriptor {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a new InvalidCodecSpecification error.
    pub fn invalid_codec<S: Into<String>>(msg: S) -> Self {
        Self::InvalidCodecSpecification(msg.into())
    }

    /// Create a new InvalidFormatSpecification error.
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFormatSpecification(msg.into())
    }

    /// Create a new Configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new Input error.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        Self::Input(msg.into())
    }

    /// Create a new GeometryContractViolation error.
    pub fn geometry<S: Into<String>>(msg: S) -> Self {
        Self::GeometryContractViolation(msg.into())
    }

    /// Create a new ToolNotFound error.
    pub fn tool_not_found<S: Into<String>>(tool: S) -> Self {
        Self::ToolNotFound(tool.into())
    }

    /// Create a new Engine error.
    pub fn engine<T: Into<String>, S: Into<String>>(tool: T, msg: S) -> Self {
        Self::Engine {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownFormat(_)
            | Error::UnknownCodec { .. }
            | Error::DuplicateDescriptor { .. }
            | Error::InvalidCodecSpecification(_)
            | Error::InvalidFormatSpecification(_)
            | Error::Configuration(_) => ErrorCategory::Configuration,
            Error::Input(_) => ErrorCategory::Input,
            Error::GeometryContractViolation(_) => ErrorCategory::Internal,
            Error::ToolNotFound(_) | Error::Engine { .. } | Error::EngineTimeout(_) => {
                ErrorCategory::Engine
            }
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_format("xyz");
        assert_eq!(err.to_string(), "Unknown format: xyz");

        let err = Error::unknown_codec(StreamKind::Video, "h265");
        assert_eq!(err.to_string(), "Unknown video codec: h265");

        let err = Error::duplicate("audio", "aac");
        assert_eq!(err.to_string(), "Duplicate audio descriptor: aac");

        let err = Error::configuration("Neither audio nor video streams requested");
        assert_eq!(
            err.to_string(),
            "Configuration error: Neither audio nor video streams requested"
        );

        let err = Error::engine("ffmpeg", "exit status 1");
        assert_eq!(err.to_string(), "Engine error: ffmpeg: exit status 1");

        let err = Error::EngineTimeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Engine timed out after 10s without progress");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::unknown_format("x").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            Error::invalid_codec("mismatch").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            Error::invalid_format("mismatch").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(Error::input("missing").category(), ErrorCategory::Input);
        assert_eq!(Error::geometry("bad").category(), ErrorCategory::Internal);
        assert_eq!(
            Error::tool_not_found("ffmpeg").category(),
            ErrorCategory::Engine
        );
        assert_eq!(
            Error::EngineTimeout(Duration::from_secs(1)).category(),
            ErrorCategory::Engine
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Json(_)));
    }
}
