//! Connection contract between the host runtime and a connector.
//!
//! The host creates one connection per activity invocation from
//! string properties; there is no pooling or sharing across invocations.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::result::ConnectorResult;

/// A connection to a backend endpoint.
#[async_trait]
pub trait Connection: Send {
    /// Establish the connection, performing one validation call against
    /// the backend. A no-op when already open.
    async fn open(&mut self) -> ConnectorResult<()>;

    /// Discard the connection handle. Idempotent.
    async fn close(&mut self);
}

/// Creates [`Connection`] values from host-supplied properties.
///
/// Implementations must validate the supplied credentials before any
/// backend call is attempted.
pub trait ConnectionFactory: Send + Sync {
    /// The connection type produced by this factory.
    type Conn: Connection;

    /// Build a connection from host-supplied key/value properties.
    fn create_connection(&self, props: &HashMap<String, String>) -> ConnectorResult<Self::Conn>;
}
