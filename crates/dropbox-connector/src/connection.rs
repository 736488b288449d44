//! Dropbox connection holder and factory.
//!
//! One connection per activity invocation, no pooling. The client handle
//! is an explicit two-state value: `Unopened` until the first use, then
//! `Opened` after one successful validation call against the backend.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use connector_sdk::connection::{Connection, ConnectionFactory};
use connector_sdk::{ConnectorError, ConnectorResult, ErrorKind};
use tracing::{debug, info};

use crate::client::{DropboxFiles, DropboxHttpClient};
use crate::config::ConnectorConfig;
use crate::messages;

/// Host property key for the Dropbox app key.
pub const APP_KEY: &str = "app-key";
/// Host property key for the OAuth 2 access token.
pub const ACCESS_TOKEN: &str = "access-token";
/// Host property key for the response locale.
pub const LOCALE: &str = "locale";

const DEFAULT_LOCALE: &str = "en_US";

/// Validated connection properties.
#[derive(Debug, Clone)]
pub struct ConnectionProps {
    /// App key of the registered Dropbox application.
    pub app_key: String,
    /// OAuth 2 access token.
    pub access_token: String,
    /// IETF BCP 47 locale tag for user-visible text in responses.
    pub locale: String,
}

impl ConnectionProps {
    /// Parse and validate host-supplied properties. Fails before any
    /// backend call when the access token or app key is empty or missing.
    pub fn from_map(props: &HashMap<String, String>) -> ConnectorResult<Self> {
        let access_token = props.get(ACCESS_TOKEN).map(String::as_str).unwrap_or("");
        if access_token.is_empty() {
            return Err(ConnectorError::validation(
                "Access Token property cannot be empty. Specify the access token \
                 associated with the registered Dropbox application.",
            ));
        }
        let app_key = props.get(APP_KEY).map(String::as_str).unwrap_or("");
        if app_key.is_empty() {
            return Err(ConnectorError::validation(
                "App Key property cannot be empty. Specify the app key associated \
                 with the registered Dropbox application.",
            ));
        }
        let locale = props
            .get(LOCALE)
            .filter(|l| !l.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Ok(Self {
            app_key: app_key.to_string(),
            access_token: access_token.to_string(),
            locale,
        })
    }
}

/// Builds the backend client for a set of connection properties.
///
/// Injected into the connection so tests can substitute an in-memory
/// backend for the HTTP client.
pub trait ClientFactory: Send + Sync {
    /// Create a client bound to the given properties.
    fn create(&self, props: &ConnectionProps) -> ConnectorResult<Arc<dyn DropboxFiles>>;
}

/// Default factory producing [`DropboxHttpClient`] instances.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: ConnectorConfig,
}

impl HttpClientFactory {
    /// Create a factory for the given connector configuration.
    pub fn new(config: ConnectorConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, props: &ConnectionProps) -> ConnectorResult<Arc<dyn DropboxFiles>> {
        Ok(Arc::new(DropboxHttpClient::new(&self.config, props)?))
    }
}

/// The lazily-created client handle.
enum ClientState {
    Unopened,
    Opened(Arc<dyn DropboxFiles>),
}

impl fmt::Debug for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Unopened => write!(f, "Unopened"),
            ClientState::Opened(_) => write!(f, "Opened"),
        }
    }
}

/// Connection to a Dropbox endpoint, owned exclusively by one activity
/// invocation.
pub struct DropboxConnection {
    props: ConnectionProps,
    factory: Arc<dyn ClientFactory>,
    state: ClientState,
}

impl fmt::Debug for DropboxConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxConnection")
            .field("app_key", &self.props.app_key)
            .field("state", &self.state)
            .finish()
    }
}

impl DropboxConnection {
    /// Create an unopened connection.
    pub fn new(props: ConnectionProps, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            props,
            factory,
            state: ClientState::Unopened,
        }
    }

    /// Establish the connection: build the client and validate it with
    /// one root-listing call. A no-op when already open. A failed
    /// validation never exposes the partially-constructed client.
    pub async fn open(&mut self) -> ConnectorResult<()> {
        if let ClientState::Opened(_) = self.state {
            return Ok(());
        }
        let client = self.factory.create(&self.props)?;
        client.list_folder("").await.map_err(|e| {
            ConnectorError::with_source(
                ErrorKind::Connection,
                messages::message(messages::DROPBOX_CODE07, &[&e.to_string()]),
                e,
            )
            .with_code(messages::DROPBOX_CODE07)
        })?;
        info!(app_key = %self.props.app_key, "Dropbox connection established");
        self.state = ClientState::Opened(client);
        Ok(())
    }

    /// The backend client, opening the connection on first use.
    pub async fn client(&mut self) -> ConnectorResult<Arc<dyn DropboxFiles>> {
        if let ClientState::Unopened = self.state {
            self.open().await?;
        }
        match &self.state {
            ClientState::Opened(client) => Ok(Arc::clone(client)),
            ClientState::Unopened => Err(ConnectorError::internal(
                "connection state invariant violated",
            )),
        }
    }
}

#[async_trait]
impl Connection for DropboxConnection {
    async fn open(&mut self) -> ConnectorResult<()> {
        DropboxConnection::open(self).await
    }

    async fn close(&mut self) {
        debug!(app_key = %self.props.app_key, "closing Dropbox connection");
        self.state = ClientState::Unopened;
    }
}

/// Factory the host runtime uses to create per-invocation connections.
pub struct DropboxConnectionFactory {
    client_factory: Arc<dyn ClientFactory>,
}

impl DropboxConnectionFactory {
    /// Factory backed by the HTTP client.
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            client_factory: Arc::new(HttpClientFactory::new(config)),
        }
    }

    /// Factory with an injected client factory (used by tests).
    pub fn with_client_factory(client_factory: Arc<dyn ClientFactory>) -> Self {
        Self { client_factory }
    }
}

impl ConnectionFactory for DropboxConnectionFactory {
    type Conn = DropboxConnection;

    fn create_connection(&self, props: &HashMap<String, String>) -> ConnectorResult<Self::Conn> {
        let props = ConnectionProps::from_map(props)?;
        Ok(DropboxConnection::new(
            props,
            Arc::clone(&self.client_factory),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connector_sdk::ErrorKind;

    fn props(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_access_token_fails_validation() {
        let err = ConnectionProps::from_map(&props(&[(APP_KEY, "key")])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("Access Token"));
    }

    #[test]
    fn empty_app_key_fails_validation() {
        let err = ConnectionProps::from_map(&props(&[
            (ACCESS_TOKEN, "token"),
            (APP_KEY, ""),
        ]))
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("App Key"));
    }

    #[test]
    fn locale_defaults_when_absent() {
        let parsed = ConnectionProps::from_map(&props(&[
            (ACCESS_TOKEN, "token"),
            (APP_KEY, "key"),
        ]))
        .unwrap();
        assert_eq!(parsed.locale, "en_US");

        let parsed = ConnectionProps::from_map(&props(&[
            (ACCESS_TOKEN, "token"),
            (APP_KEY, "key"),
            (LOCALE, "de_DE"),
        ]))
        .unwrap();
        assert_eq!(parsed.locale, "de_DE");
    }
}
