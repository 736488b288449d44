//! Get activity: download a previously discovered object verbatim.
//!
//! Discovery lists the XML and JSON files of a folder; the host then
//! passes the user's selection back as the `list-object` parameter and
//! execution streams that file's bytes into the response unchanged.

use async_trait::async_trait;
use connector_sdk::activity::{
    Activity, ActivityState, DeployedEntity, ExecutionContext, LifecycleState,
};
use connector_sdk::connection::Connection;
use connector_sdk::metadata::{
    ActivityMetadata, DiscoverContext, DiscoverableObject, SchemaContentType, SchemaMetadata,
};
use connector_sdk::{ConnectorError, ConnectorResult, ErrorKind, ExecutionError};
use serde::Deserialize;
use tracing::debug;

use crate::activities::{PARAM_FOLDER, PARAM_LIST_OBJECT};
use crate::connection::DropboxConnection;
use crate::path::build_path;
use crate::{messages, GET_FILE};

/// The selected list object, as the host serializes it.
#[derive(Debug, Deserialize)]
struct ListObject {
    name: String,
}

/// Downloads a discovered XML or JSON file without transformation.
#[derive(Default)]
pub struct GetFileActivity {
    lifecycle: LifecycleState,
}

impl GetFileActivity {
    /// Create the activity.
    pub fn new() -> Self {
        Self::default()
    }

    fn selected_object(ctx: &ExecutionContext<DropboxConnection>) -> ConnectorResult<ListObject> {
        let raw = ctx
            .parameter(PARAM_LIST_OBJECT)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ConnectorError::validation(format!(
                    "the {PARAM_LIST_OBJECT} parameter is required for the {GET_FILE} activity"
                ))
            })?;
        let object: ListObject = serde_json::from_str(raw)?;
        if object.name.is_empty() {
            return Err(ConnectorError::validation(format!(
                "the {PARAM_LIST_OBJECT} parameter names no object"
            )));
        }
        Ok(object)
    }

    async fn run(&self, ctx: &mut ExecutionContext<DropboxConnection>) -> ConnectorResult<()> {
        let folder = ctx.parameter(PARAM_FOLDER).unwrap_or("").to_string();
        let object = Self::selected_object(ctx)?;
        let path = build_path(&folder, &object.name);

        let downloaded = async {
            let client = ctx.connection.client().await?;
            let (_, content) = client.download(&path).await?;
            debug!(path, size = content.len(), "object downloaded");
            ctx.response.write_all(&content).await
        }
        .await;

        downloaded.map_err(|e| {
            ConnectorError::with_source(
                ErrorKind::Download,
                messages::message(messages::DROPBOX_CODE06, &[&path, &e.to_string()]),
                e,
            )
            .with_code(messages::DROPBOX_CODE06)
        })
    }

    /// Whether a folder entry is offered for selection: files with an
    /// `.xml` or `.json` suffix, case-insensitively.
    fn discoverable_type(name: &str) -> Option<&'static str> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".json") {
            Some("JSON")
        } else if lower.ends_with(".xml") {
            Some("XML")
        } else {
            None
        }
    }
}

#[async_trait]
impl Activity for GetFileActivity {
    type Conn = DropboxConnection;

    fn name(&self) -> &str {
        GET_FILE
    }

    async fn execute(
        &self,
        mut ctx: ExecutionContext<DropboxConnection>,
    ) -> Result<(), ExecutionError> {
        let outcome = self.run(&mut ctx).await;
        let cleanup = ctx.release().await;
        ExecutionError::resolve(outcome, cleanup)
    }

    async fn request_response_metadata(
        &self,
        mut ctx: DiscoverContext<DropboxConnection>,
    ) -> ConnectorResult<ActivityMetadata> {
        let object_name = ctx
            .object_name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ConnectorError::validation(format!(
                    "no object selected for the {GET_FILE} activity"
                ))
            })?;
        let folder = ctx.property(PARAM_FOLDER).unwrap_or("").to_string();
        let path = build_path(&folder, &object_name);

        let downloaded = async {
            let client = ctx.connection.client().await?;
            let (_, content) = client.download(&path).await?;
            Ok(content)
        }
        .await;
        ctx.connection.close().await;

        let content = downloaded.map_err(|e: ConnectorError| {
            ConnectorError::with_source(
                ErrorKind::Discovery,
                messages::message(messages::DROPBOX_CODE02, &[&object_name]),
                e,
            )
            .with_code(messages::DROPBOX_CODE02)
        })?;

        let content_type = match Self::discoverable_type(&object_name) {
            Some("JSON") => SchemaContentType::Json,
            _ => SchemaContentType::Xml,
        };
        let content = String::from_utf8(content.to_vec()).map_err(|e| {
            ConnectorError::with_source(
                ErrorKind::Serialization,
                format!("object {object_name} is not valid UTF-8"),
                e,
            )
        })?;

        Ok(ActivityMetadata {
            request_schema: None,
            response_schema: Some(SchemaMetadata::new(
                format!("{object_name}.xsd"),
                content_type,
                content,
            )),
            request_root: None,
            response_root: None,
        })
    }

    async fn object_list(
        &self,
        mut ctx: DiscoverContext<DropboxConnection>,
    ) -> ConnectorResult<Vec<DiscoverableObject>> {
        let folder = ctx.property(PARAM_FOLDER).unwrap_or("").to_string();

        let listed = async {
            let client = ctx.connection.client().await?;
            client.list_folder(&folder).await
        }
        .await;
        ctx.connection.close().await;

        let entries = listed.map_err(|e| {
            let shown = if folder.is_empty() { "/" } else { folder.as_str() };
            ConnectorError::with_source(
                ErrorKind::Discovery,
                messages::message(messages::DROPBOX_CODE05, &[shown, &e.to_string()]),
                e,
            )
            .with_code(messages::DROPBOX_CODE05)
        })?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.is_file())
            .filter_map(|entry| {
                Self::discoverable_type(&entry.name).map(|object_type| DiscoverableObject {
                    name: entry.name.clone(),
                    description: entry
                        .server_modified
                        .clone()
                        .unwrap_or_else(|| "modification time unknown".to_string()),
                    object_type: object_type.to_string(),
                    parent_id: entry.parent_shared_folder_id.clone(),
                })
            })
            .collect())
    }

    fn on_deploy(&self, entity: DeployedEntity) {
        self.lifecycle.deploy(GET_FILE, entity);
    }

    fn on_undeploy(&self, entity: &DeployedEntity) {
        self.lifecycle.undeploy(GET_FILE, entity);
    }

    fn on_start(&self) {
        self.lifecycle.start(GET_FILE);
    }

    fn on_stop(&self) {
        self.lifecycle.stop(GET_FILE);
    }

    fn state(&self) -> ActivityState {
        self.lifecycle.state()
    }
}
