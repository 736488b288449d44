//! Fetch activity: download a file and return its metadata with the
//! content embedded in the response document.

use std::sync::Arc;

use async_trait::async_trait;
use connector_sdk::activity::{
    Activity, ActivityState, DeployedEntity, ExecutionContext, LifecycleState,
};
use connector_sdk::metadata::{
    ActivityMetadata, DiscoverContext, SchemaContentType, SchemaMetadata,
};
use connector_sdk::{ConnectorError, ConnectorResult, ErrorKind, ExecutionError};
use tracing::debug;

use crate::activities::{PARAM_FILE_NAME, PARAM_FOLDER};
use crate::connection::DropboxConnection;
use crate::path::build_path;
use crate::records::{self, FetchFileRequest, FetchFileResponse, SharingInfo};
use crate::resources::ResourceLoader;
use crate::verbose::Verbose;
use crate::{messages, FETCH_FILE, FETCH_FILE_NAMESPACE};

/// Downloads one file and responds with metadata plus base64 content.
pub struct FetchFileActivity {
    lifecycle: LifecycleState,
    resources: Arc<dyn ResourceLoader>,
    verbose: Verbose,
}

impl FetchFileActivity {
    /// Create the activity over the given schema resources.
    pub fn new(resources: Arc<dyn ResourceLoader>, verbose: Verbose) -> Self {
        Self {
            lifecycle: LifecycleState::new(),
            resources,
            verbose,
        }
    }

    async fn run(&self, ctx: &mut ExecutionContext<DropboxConnection>) -> ConnectorResult<()> {
        let folder = ctx.parameter(PARAM_FOLDER).unwrap_or("").to_string();
        let file_name = ctx
            .parameter(PARAM_FILE_NAME)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ConnectorError::validation(format!(
                    "the {PARAM_FILE_NAME} parameter is required for the {FETCH_FILE} activity"
                ))
            })?
            .to_string();
        let path = build_path(&folder, &file_name);

        self.fetch_file(ctx, &path).await.map_err(|e| {
            ConnectorError::with_source(
                ErrorKind::Download,
                messages::message(messages::DROPBOX_CODE03, &[&path]),
                e,
            )
            .with_code(messages::DROPBOX_CODE03)
        })
    }

    async fn fetch_file(
        &self,
        ctx: &mut ExecutionContext<DropboxConnection>,
        path: &str,
    ) -> ConnectorResult<()> {
        if !ctx.request.is_empty() {
            let request: FetchFileRequest = records::from_xml(ctx.request.bytes())?;
            self.verbose.payload(
                FETCH_FILE,
                "execute",
                "request",
                &serde_json::to_value(&request)?,
            );
        }

        let client = ctx.connection.client().await?;
        let (metadata, content) = client.download(path).await?;
        debug!(path, size = content.len(), "file downloaded");

        let response = FetchFileResponse {
            name: metadata.name,
            client_modified: metadata
                .client_modified
                .as_deref()
                .map(records::parse_timestamp)
                .transpose()?,
            server_modified: metadata
                .server_modified
                .as_deref()
                .map(records::parse_timestamp)
                .transpose()?,
            rev: metadata.rev.unwrap_or_default(),
            size: metadata.size.unwrap_or(0),
            sharing_info: metadata.sharing_info.map(|s| SharingInfo {
                read_only: s.read_only.unwrap_or(false),
                parent_shared_folder_id: s.parent_shared_folder_id,
                modified_by: s.modified_by,
            }),
            content: content.to_vec(),
        };

        self.verbose.payload(
            FETCH_FILE,
            "execute",
            "response",
            &serde_json::to_value(&response)?,
        );
        let xml = records::to_xml(&response)?;
        ctx.response.write_all(xml.as_bytes()).await
    }
}

#[async_trait]
impl Activity for FetchFileActivity {
    type Conn = DropboxConnection;

    fn name(&self) -> &str {
        FETCH_FILE
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
        _ctx: DiscoverContext<DropboxConnection>,
    ) -> ConnectorResult<ActivityMetadata> {
        let wrap = |e: ConnectorError| {
            ConnectorError::with_source(
                ErrorKind::Discovery,
                messages::message(messages::DROPBOX_CODE02, &[FETCH_FILE]),
                e,
            )
            .with_code(messages::DROPBOX_CODE02)
        };
        let request = self
            .resources
            .load("xsds/fetch-file-request.xsd")
            .map_err(wrap)?;
        let response = self
            .resources
            .load("xsds/fetch-file-response.xsd")
            .map_err(wrap)?;

        Ok(ActivityMetadata {
            request_schema: Some(SchemaMetadata::new(
                "Dropbox_fetch_request",
                SchemaContentType::Xsd,
                request,
            )),
            response_schema: Some(SchemaMetadata::new(
                "Dropbox_fetch_response",
                SchemaContentType::Xsd,
                response,
            )),
            request_root: Some(format!("{{{FETCH_FILE_NAMESPACE}}}fetchFileRequest")),
            response_root: Some(format!("{{{FETCH_FILE_NAMESPACE}}}fetchFileResponse")),
        })
    }

    fn on_deploy(&self, entity: DeployedEntity) {
        self.lifecycle.deploy(FETCH_FILE, entity);
    }

    fn on_undeploy(&self, entity: &DeployedEntity) {
        self.lifecycle.undeploy(FETCH_FILE, entity);
    }

    fn on_start(&self) {
        self.lifecycle.start(FETCH_FILE);
    }

    fn on_stop(&self) {
        self.lifecycle.stop(FETCH_FILE);
    }

    fn state(&self) -> ActivityState {
        self.lifecycle.state()
    }
}
