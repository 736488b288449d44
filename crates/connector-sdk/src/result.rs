//! Convenience result type alias for connector code.

use crate::error::ConnectorError;

/// A specialized `Result` type for connector operations.
///
/// Defined as a convenience so that every crate does not need to write
/// `Result<T, ConnectorError>` explicitly.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
