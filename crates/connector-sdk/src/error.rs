//! Unified error types for connector plugins.
//!
//! Every failure that crosses the activity boundary is a [`ConnectorError`]
//! carrying a kind, an optional stable catalog code, a formatted message,
//! and the original cause. [`ExecutionError`] additionally distinguishes a
//! failure of the operation itself from a failure while releasing resources.

use std::fmt;

use thiserror::Error;

/// Top-level error kind categorization used across the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Establishing the backend connection failed.
    Connection,
    /// Loading schema metadata or listing discoverable objects failed.
    Discovery,
    /// Downloading an object from the backend failed.
    Download,
    /// Uploading an object to the backend failed.
    Upload,
    /// The requested object or resource was not found.
    NotFound,
    /// Authentication failed (invalid or expired credentials).
    Authentication,
    /// The credentials do not permit the requested action.
    Authorization,
    /// Input validation failed (missing or malformed parameters).
    Validation,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// The backend service reported a transport or server error.
    ExternalService,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "CONNECTION"),
            Self::Discovery => write!(f, "DISCOVERY"),
            Self::Download => write!(f, "DOWNLOAD"),
            Self::Upload => write!(f, "UPLOAD"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified connector error.
///
/// Crate-specific errors are mapped into `ConnectorError` using `From`
/// impls or explicit `.map_err()` calls so that a single error type
/// crosses the host-runtime boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ConnectorError {
    /// The category of error.
    pub kind: ErrorKind,
    /// Stable message-catalog code (e.g. "Dropbox03"), when assigned.
    pub code: Option<String>,
    /// A human-readable, already-formatted error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConnectorError {
    /// Create a new connector error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new connector error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Attach a stable catalog code to this error.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Create a connection-establishment error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Create a discovery error.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Discovery, message)
    }

    /// Create a download error.
    pub fn download(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Download, message)
    }

    /// Create an upload error.
    pub fn upload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upload, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

/// Result of a full activity execution, separating the operation's own
/// failure from a failure while releasing the response payload and the
/// connection. A cleanup failure is unrecoverable and supersedes the
/// operation outcome.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The activity operation failed; resources were still released.
    #[error("activity failed: {0}")]
    Operation(#[source] ConnectorError),
    /// Releasing the response payload or connection failed.
    #[error("resource release failed: {cleanup}")]
    Cleanup {
        /// The operation failure that preceded the cleanup failure, if any.
        operation: Option<ConnectorError>,
        /// The cleanup failure itself.
        #[source]
        cleanup: ConnectorError,
    },
}

impl ExecutionError {
    /// Combine an operation outcome with a cleanup outcome.
    ///
    /// Cleanup failures take precedence; the operation failure, if any, is
    /// preserved inside [`ExecutionError::Cleanup`].
    pub fn resolve(
        operation: Result<(), ConnectorError>,
        cleanup: Result<(), ConnectorError>,
    ) -> Result<(), ExecutionError> {
        match (operation, cleanup) {
            (Ok(()), Ok(())) => Ok(()),
            (op, Err(cleanup)) => Err(ExecutionError::Cleanup {
                operation: op.err(),
                cleanup,
            }),
            (Err(op), Ok(())) => Err(ExecutionError::Operation(op)),
        }
    }

    /// The operation failure, when one occurred.
    pub fn operation_error(&self) -> Option<&ConnectorError> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Cleanup { operation, .. } => operation.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_is_stable() {
        assert_eq!(ErrorKind::Download.to_string(), "DOWNLOAD");
        assert_eq!(ErrorKind::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn code_is_carried() {
        let err = ConnectorError::download("Error downloading /a.xml").with_code("Dropbox03");
        assert_eq!(err.code.as_deref(), Some("Dropbox03"));
        assert!(err.to_string().contains("/a.xml"));
    }

    #[test]
    fn cleanup_failure_supersedes_operation_failure() {
        let resolved = ExecutionError::resolve(
            Err(ConnectorError::download("op failed")),
            Err(ConnectorError::internal("close failed")),
        );
        match resolved {
            Err(ExecutionError::Cleanup { operation, cleanup }) => {
                assert_eq!(operation.unwrap().kind, ErrorKind::Download);
                assert_eq!(cleanup.kind, ErrorKind::Internal);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn operation_failure_survives_successful_cleanup() {
        let resolved =
            ExecutionError::resolve(Err(ConnectorError::upload("op failed")), Ok(()));
        match resolved {
            Err(ExecutionError::Operation(e)) => assert_eq!(e.kind, ErrorKind::Upload),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
