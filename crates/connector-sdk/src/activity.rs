//! The activity capability interface and its execution context.
//!
//! An activity is one operation a connector exposes to the host runtime.
//! Each variant implements [`Activity`] independently; shared lifecycle
//! bookkeeping lives in [`LifecycleState`], a value the activity embeds
//! rather than a base class it inherits from.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::connection::Connection;
use crate::error::ExecutionError;
use crate::metadata::{ActivityMetadata, DiscoverContext, DiscoverableObject};
use crate::payload::{RequestPayload, ResponsePayload};
use crate::result::ConnectorResult;

/// The entity (operation/workflow) an activity was deployed into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployedEntity {
    /// Name of the deployed entity.
    pub name: String,
    /// GUID of the enclosing operation, when the host supplies one.
    pub operation_guid: Option<String>,
}

impl DeployedEntity {
    /// Create a deployed-entity record.
    pub fn new(name: impl Into<String>, operation_guid: Option<String>) -> Self {
        Self {
            name: name.into(),
            operation_guid,
        }
    }
}

/// Lifecycle flag of an activity instance. Set once by the deploy
/// callback and only read afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityState {
    /// Constructed, not yet deployed.
    #[default]
    Init,
    /// Deployed by the host runtime.
    Started,
}

/// Shared lifecycle bookkeeping embedded by every activity.
#[derive(Debug, Default)]
pub struct LifecycleState {
    inner: Mutex<LifecycleInner>,
}

#[derive(Debug, Default)]
struct LifecycleInner {
    state: ActivityState,
    entity: Option<DeployedEntity>,
}

impl LifecycleState {
    /// Create lifecycle state in the `Init` state.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LifecycleInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the deploy callback: stores the entity and marks the
    /// activity `Started`.
    pub fn deploy(&self, activity: &str, entity: DeployedEntity) {
        info!(activity, entity = ?entity, "activity deployed");
        let mut inner = self.lock();
        inner.state = ActivityState::Started;
        inner.entity = Some(entity);
    }

    /// Record the undeploy callback.
    pub fn undeploy(&self, activity: &str, entity: &DeployedEntity) {
        info!(activity, entity = ?entity, "activity undeployed");
    }

    /// Record the start callback.
    pub fn start(&self, activity: &str) {
        info!(activity, entity = ?self.lock().entity, "activity started");
    }

    /// Record the stop callback.
    pub fn stop(&self, activity: &str) {
        info!(activity, entity = ?self.lock().entity, "activity stopped");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ActivityState {
        self.lock().state
    }

    /// GUID of the enclosing operation, or empty when not deployed.
    pub fn operation_guid(&self) -> String {
        self.lock()
            .entity
            .as_ref()
            .and_then(|e| e.operation_guid.clone())
            .unwrap_or_default()
    }
}

/// Everything the host runtime supplies for one activity invocation.
///
/// The context owns the response payload and the connection; calling
/// [`ExecutionContext::release`] consumes it, guaranteeing both are
/// released exactly once on every exit path.
pub struct ExecutionContext<C> {
    /// Function parameters configured in the host UI.
    pub parameters: HashMap<String, String>,
    /// The raw request body, possibly empty.
    pub request: RequestPayload,
    /// The response payload the activity writes its result to.
    pub response: Box<dyn ResponsePayload>,
    /// The connection to the backend, owned exclusively by this call.
    pub connection: C,
}

impl<C: Connection> ExecutionContext<C> {
    /// Create an execution context.
    pub fn new(
        parameters: HashMap<String, String>,
        request: RequestPayload,
        response: Box<dyn ResponsePayload>,
        connection: C,
    ) -> Self {
        Self {
            parameters,
            request,
            response,
            connection,
        }
    }

    /// Look up a function parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Close the response payload, release the connection, and consume
    /// the context. Returns the response-close failure, if any; the
    /// connection is released regardless.
    pub async fn release(mut self) -> ConnectorResult<()> {
        let closed = self.response.close().await;
        self.connection.close().await;
        closed
    }
}

/// Capability interface implemented by every connector activity.
///
/// Lifecycle hooks have no return value: the host treats them as
/// notifications. Discovery calls default to an empty object list for
/// activities that are not listing-capable.
#[async_trait]
pub trait Activity: Send + Sync {
    /// The connection type this activity operates on.
    type Conn: Connection;

    /// Stable activity name, as registered with the host.
    fn name(&self) -> &str;

    /// Execute the activity. Implementations must release the context on
    /// every exit path and report cleanup failures distinctly.
    async fn execute(&self, ctx: ExecutionContext<Self::Conn>) -> Result<(), ExecutionError>;

    /// Request/response schema metadata for the host configuration UI.
    async fn request_response_metadata(
        &self,
        ctx: DiscoverContext<Self::Conn>,
    ) -> ConnectorResult<ActivityMetadata>;

    /// Candidate objects for user selection in the host UI.
    async fn object_list(
        &self,
        _ctx: DiscoverContext<Self::Conn>,
    ) -> ConnectorResult<Vec<DiscoverableObject>> {
        Ok(Vec::new())
    }

    /// Deploy callback.
    fn on_deploy(&self, entity: DeployedEntity);

    /// Undeploy callback.
    fn on_undeploy(&self, entity: &DeployedEntity);

    /// Start callback.
    fn on_start(&self);

    /// Stop callback.
    fn on_stop(&self);

    /// Current lifecycle state.
    fn state(&self) -> ActivityState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_transitions_init_to_started() {
        let lifecycle = LifecycleState::new();
        assert_eq!(lifecycle.state(), ActivityState::Init);
        assert_eq!(lifecycle.operation_guid(), "");

        lifecycle.deploy(
            "fetch",
            DeployedEntity::new("op-1", Some("guid-123".to_string())),
        );
        assert_eq!(lifecycle.state(), ActivityState::Started);
        assert_eq!(lifecycle.operation_guid(), "guid-123");
    }

    #[test]
    fn start_stop_do_not_change_state() {
        let lifecycle = LifecycleState::new();
        lifecycle.start("fetch");
        lifecycle.stop("fetch");
        assert_eq!(lifecycle.state(), ActivityState::Init);
    }
}
