//! Request and response payload abstraction.
//!
//! The host runtime hands each activity invocation an immutable request
//! payload and a writable response payload. The response payload must be
//! closed exactly once on every exit path; [`InMemoryPayload`] enforces
//! and records that so harnesses and tests can assert on it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ConnectorError;
use crate::result::ConnectorResult;

/// The raw request body supplied by the host for one invocation.
#[derive(Debug, Clone, Default)]
pub struct RequestPayload {
    data: Bytes,
}

impl RequestPayload {
    /// Create a request payload from raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// An empty request payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The raw request bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Whether the host supplied no request body.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Writable response stream owned by the host runtime.
#[async_trait]
pub trait ResponsePayload: Send {
    /// Append bytes to the response.
    async fn write_all(&mut self, data: &[u8]) -> ConnectorResult<()>;

    /// Flush and close the response. Closing twice is an error.
    async fn close(&mut self) -> ConnectorResult<()>;
}

/// In-memory response payload used by host harnesses and tests.
#[derive(Debug, Default)]
pub struct InMemoryPayload {
    buffer: Vec<u8>,
    close_count: usize,
}

impl InMemoryPayload {
    /// Create an empty in-memory payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes written so far.
    pub fn contents(&self) -> &[u8] {
        &self.buffer
    }

    /// How many times `close` has been called.
    pub fn close_count(&self) -> usize {
        self.close_count
    }

    /// Whether the payload has been closed.
    pub fn is_closed(&self) -> bool {
        self.close_count > 0
    }
}

#[async_trait]
impl ResponsePayload for InMemoryPayload {
    async fn write_all(&mut self, data: &[u8]) -> ConnectorResult<()> {
        if self.is_closed() {
            return Err(ConnectorError::internal(
                "write to a closed response payload",
            ));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) -> ConnectorResult<()> {
        if self.is_closed() {
            return Err(ConnectorError::internal(
                "response payload closed more than once",
            ));
        }
        self.close_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_close() {
        let mut payload = InMemoryPayload::new();
        payload.write_all(b"<r/>").await.unwrap();
        payload.close().await.unwrap();
        assert_eq!(payload.contents(), b"<r/>");
        assert_eq!(payload.close_count(), 1);
    }

    #[tokio::test]
    async fn double_close_is_an_error() {
        let mut payload = InMemoryPayload::new();
        payload.close().await.unwrap();
        assert!(payload.close().await.is_err());
        assert_eq!(payload.close_count(), 1);
    }

    #[tokio::test]
    async fn write_after_close_is_an_error() {
        let mut payload = InMemoryPayload::new();
        payload.close().await.unwrap();
        assert!(payload.write_all(b"late").await.is_err());
    }
}
