//! # dropbox-connector
//!
//! Dropbox connector plugin for an integration-platform host runtime.
//! Exposes four activities: fetch (download with metadata), get (download
//! a discovered object), process (download raw against a bundled schema),
//! and put (upload). The host drives everything: it supplies connection
//! properties, dispatches execution with a request/response payload pair,
//! and queries schema metadata for its configuration UI.

pub mod activities;
pub mod client;
pub mod config;
pub mod connection;
pub mod connector;
pub mod messages;
pub mod path;
pub mod records;
pub mod resources;
pub mod verbose;

pub use config::ConnectorConfig;
pub use connector::DropboxConnector;

/// Connector name as registered with the host runtime.
pub const CONNECTOR_NAME: &str = "Dropbox";

/// Activity names as declared in the connector manifest.
pub const FETCH_FILE: &str = "fetch";
pub const GET_FILE: &str = "get";
pub const PROCESS_FILE: &str = "process";
pub const PUT_FILE: &str = "put";

/// XML namespaces of the activity request/response documents.
pub const FETCH_FILE_NAMESPACE: &str = "http://org.connector/dropbox/fetchfile";
pub const PUT_FILE_NAMESPACE: &str = "http://org.connector/dropbox/putfile";
