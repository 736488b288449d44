//! Connector root: the activity registry and connection factory the host
//! runtime binds to.

use std::collections::HashMap;
use std::sync::Arc;

use connector_sdk::activity::Activity;
use connector_sdk::connection::ConnectionFactory;
use connector_sdk::ConnectorResult;
use tracing::info;

use crate::activities::{FetchFileActivity, GetFileActivity, ProcessFileActivity, PutFileActivity};
use crate::config::ConnectorConfig;
use crate::connection::{ClientFactory, DropboxConnection, DropboxConnectionFactory};
use crate::resources::{BundledResources, ResourceLoader};
use crate::verbose::Verbose;
use crate::CONNECTOR_NAME;

/// A registered activity handle.
pub type ActivityHandle = Arc<dyn Activity<Conn = DropboxConnection>>;

/// The Dropbox connector as registered with the host runtime: a
/// connection factory plus the four activities, constructed with their
/// dependencies passed in explicitly.
pub struct DropboxConnector {
    connection_factory: DropboxConnectionFactory,
    activities: Vec<ActivityHandle>,
}

impl DropboxConnector {
    /// Build the connector with the HTTP backend and bundled resources.
    pub fn new(config: ConnectorConfig) -> Self {
        info!(
            connector = CONNECTOR_NAME,
            api_base_url = %config.api_base_url,
            verbose_logging = config.verbose_logging,
            "initializing connector"
        );
        let verbose = Verbose::new(config.verbose_logging);
        let factory = DropboxConnectionFactory::new(config);
        Self::assemble(factory, Arc::new(BundledResources), verbose)
    }

    /// Build the connector with an injected backend client factory.
    /// Verbose payload logging stays off.
    pub fn with_client_factory(client_factory: Arc<dyn ClientFactory>) -> Self {
        let factory = DropboxConnectionFactory::with_client_factory(client_factory);
        Self::assemble(factory, Arc::new(BundledResources), Verbose::default())
    }

    fn assemble(
        connection_factory: DropboxConnectionFactory,
        resources: Arc<dyn ResourceLoader>,
        verbose: Verbose,
    ) -> Self {
        let activities: Vec<ActivityHandle> = vec![
            Arc::new(FetchFileActivity::new(Arc::clone(&resources), verbose)),
            Arc::new(GetFileActivity::new()),
            Arc::new(ProcessFileActivity::new(Arc::clone(&resources))),
            Arc::new(PutFileActivity::new(resources, verbose)),
        ];
        Self {
            connection_factory,
            activities,
        }
    }

    /// Connector name as registered with the host.
    pub fn name(&self) -> &'static str {
        CONNECTOR_NAME
    }

    /// Look up a registered activity by name.
    pub fn activity(&self, name: &str) -> Option<&ActivityHandle> {
        self.activities.iter().find(|a| a.name() == name)
    }

    /// Names of all registered activities, in registration order.
    pub fn activity_names(&self) -> Vec<&str> {
        self.activities.iter().map(|a| a.name()).collect()
    }

    /// Create a connection from host-supplied properties.
    pub fn create_connection(
        &self,
        properties: &HashMap<String, String>,
    ) -> ConnectorResult<DropboxConnection> {
        self.connection_factory.create_connection(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FETCH_FILE, GET_FILE, PROCESS_FILE, PUT_FILE};

    #[test]
    fn all_four_activities_are_registered() {
        let connector = DropboxConnector::new(ConnectorConfig::default());
        assert_eq!(
            connector.activity_names(),
            [FETCH_FILE, GET_FILE, PROCESS_FILE, PUT_FILE]
        );
        assert!(connector.activity("fetch").is_some());
        assert!(connector.activity("rename").is_none());
    }

    #[test]
    fn connection_creation_validates_properties() {
        let connector = DropboxConnector::new(ConnectorConfig::default());
        let err = connector
            .create_connection(&HashMap::new())
            .unwrap_err();
        assert_eq!(err.kind, connector_sdk::ErrorKind::Validation);
    }
}
