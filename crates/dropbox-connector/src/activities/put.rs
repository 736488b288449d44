//! Put activity: upload content to Dropbox and respond with the stored
//! file's metadata.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use connector_sdk::activity::{
    Activity, ActivityState, DeployedEntity, ExecutionContext, LifecycleState,
};
use connector_sdk::metadata::{
    ActivityMetadata, DiscoverContext, SchemaContentType, SchemaMetadata,
};
use connector_sdk::{ConnectorError, ConnectorResult, ErrorKind, ExecutionError};
use tracing::debug;

use crate::activities::{PARAM_FILE_NAME, PARAM_FOLDER};
use crate::client::{UploadArgs, WriteMode};
use crate::connection::DropboxConnection;
use crate::path::resolve_put_path;
use crate::records::{self, PutFileRequest, PutFileResponse};
use crate::resources::ResourceLoader;
use crate::verbose::Verbose;
use crate::{messages, PUT_FILE, PUT_FILE_NAMESPACE};

/// Uploads the request document's content to a resolved destination path.
pub struct PutFileActivity {
    lifecycle: LifecycleState,
    resources: Arc<dyn ResourceLoader>,
    verbose: Verbose,
}

impl PutFileActivity {
    /// Create the activity over the given schema resources.
    pub fn new(resources: Arc<dyn ResourceLoader>, verbose: Verbose) -> Self {
        Self {
            lifecycle: LifecycleState::new(),
            resources,
            verbose,
        }
    }

    async fn run(&self, ctx: &mut ExecutionContext<DropboxConnection>) -> ConnectorResult<()> {
        if ctx.request.is_empty() {
            return Err(ConnectorError::validation(format!(
                "a request document is required for the {PUT_FILE} activity"
            )));
        }
        let request: PutFileRequest = records::from_xml(ctx.request.bytes())?;
        self.verbose.payload(
            PUT_FILE,
            "execute",
            "request",
            &serde_json::to_value(&request)?,
        );

        let folder = ctx.parameter(PARAM_FOLDER).unwrap_or("").to_string();
        let file_name = ctx.parameter(PARAM_FILE_NAME).unwrap_or("").to_string();
        let path = resolve_put_path(&file_name, &folder, &request);
        if path.is_empty() {
            return Err(ConnectorError::validation(format!(
                "no destination path: the {PUT_FILE} activity needs a path in the request \
                 document or a {PARAM_FILE_NAME} parameter"
            )));
        }

        self.upload_file(ctx, &path, request).await.map_err(|e| {
            ConnectorError::with_source(
                ErrorKind::Upload,
                messages::message(messages::DROPBOX_CODE04, &[&path]),
                e,
            )
            .with_code(messages::DROPBOX_CODE04)
        })
    }

    async fn upload_file(
        &self,
        ctx: &mut ExecutionContext<DropboxConnection>,
        path: &str,
        request: PutFileRequest,
    ) -> ConnectorResult<()> {
        let mode = match request.mode.as_deref().filter(|m| !m.is_empty()) {
            Some(rev) => WriteMode::Update(rev.to_string()),
            None => WriteMode::Overwrite,
        };
        let args = UploadArgs {
            mode,
            autorename: request.autorename,
            mute: request.mute,
            ..UploadArgs::new(path)
        };

        let client = ctx.connection.client().await?;
        let metadata = client.upload(&args, Bytes::from(request.content)).await?;
        debug!(path, rev = ?metadata.rev, "file uploaded");

        let response = PutFileResponse {
            name: metadata.name,
            path_lower: metadata.path_lower,
            content_hash: metadata.content_hash,
            id: metadata.id,
            rev: metadata.rev.unwrap_or_default(),
            size: metadata.size.unwrap_or(0),
        };
        self.verbose.payload(
            PUT_FILE,
            "execute",
            "response",
            &serde_json::to_value(&response)?,
        );
        let xml = records::to_xml(&response)?;
        ctx.response.write_all(xml.as_bytes()).await
    }
}

#[async_trait]
impl Activity for PutFileActivity {
    type Conn = DropboxConnection;

    fn name(&self) -> &str {
        PUT_FILE
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
                messages::message(messages::DROPBOX_CODE01, &[PUT_FILE]),
                e,
            )
            .with_code(messages::DROPBOX_CODE01)
        };
        let request = self
            .resources
            .load("xsds/put-file-request.xsd")
            .map_err(wrap)?;
        let response = self
            .resources
            .load("xsds/put-file-response.xsd")
            .map_err(wrap)?;

        Ok(ActivityMetadata {
            request_schema: Some(SchemaMetadata::new(
                "Dropbox_put_request",
                SchemaContentType::Xsd,
                request,
            )),
            response_schema: Some(SchemaMetadata::new(
                "Dropbox_put_response",
                SchemaContentType::Xsd,
                response,
            )),
            request_root: Some(format!("{{{PUT_FILE_NAMESPACE}}}putFileRequest")),
            response_root: Some(format!("{{{PUT_FILE_NAMESPACE}}}putFileResponse")),
        })
    }

    fn on_deploy(&self, entity: DeployedEntity) {
        self.lifecycle.deploy(PUT_FILE, entity);
    }

    fn on_undeploy(&self, entity: &DeployedEntity) {
        self.lifecycle.undeploy(PUT_FILE, entity);
    }

    fn on_start(&self) {
        self.lifecycle.start(PUT_FILE);
    }

    fn on_stop(&self) {
        self.lifecycle.stop(PUT_FILE);
    }

    fn state(&self) -> ActivityState {
        self.lifecycle.state()
    }
}
