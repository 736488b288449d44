//! # connector-sdk
//!
//! Contract between an integration-platform host runtime and a connector
//! plugin. The host creates connections from key/value properties, drives
//! activity execution with a request/response payload pair, asks activities
//! for schema metadata and discoverable objects, and invokes lifecycle
//! callbacks on deploy/undeploy/start/stop.
//!
//! This crate has **no** dependencies on any concrete connector.

pub mod activity;
pub mod connection;
pub mod error;
pub mod messages;
pub mod metadata;
pub mod payload;
pub mod result;

pub use error::{ConnectorError, ErrorKind, ExecutionError};
pub use result::ConnectorResult;

/// Prelude for convenient imports in connector crates.
pub mod prelude {
    pub use async_trait::async_trait;

    pub use crate::activity::{
        Activity, ActivityState, DeployedEntity, ExecutionContext, LifecycleState,
    };
    pub use crate::connection::{Connection, ConnectionFactory};
    pub use crate::error::{ConnectorError, ErrorKind, ExecutionError};
    pub use crate::metadata::{
        ActivityMetadata, DiscoverContext, DiscoverableObject, SchemaContentType, SchemaMetadata,
    };
    pub use crate::payload::{RequestPayload, ResponsePayload};
    pub use crate::result::ConnectorResult;
}
