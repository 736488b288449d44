//! End-to-end activity tests against an in-memory Dropbox backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use connector_sdk::activity::{Activity, ExecutionContext};
use connector_sdk::connection::ConnectionFactory;
use connector_sdk::metadata::{DiscoverContext, SchemaContentType};
use connector_sdk::payload::{RequestPayload, ResponsePayload};
use connector_sdk::{ConnectorError, ConnectorResult, ErrorKind, ExecutionError};

use dropbox_connector::activities::{
    FetchFileActivity, GetFileActivity, ProcessFileActivity, PutFileActivity,
};
use dropbox_connector::client::{
    DropboxFiles, EntryMetadata, FileMetadata, UploadArgs, WriteMode,
};
use dropbox_connector::connection::{
    ClientFactory, ConnectionProps, DropboxConnection, DropboxConnectionFactory, ACCESS_TOKEN,
    APP_KEY,
};
use dropbox_connector::resources::BundledResources;
use dropbox_connector::verbose::Verbose;

/// In-memory stand-in for the Dropbox backend.
#[derive(Default)]
struct MockFiles {
    files: HashMap<String, (FileMetadata, Bytes)>,
    entries: Vec<EntryMetadata>,
    uploads: Mutex<Vec<(UploadArgs, Bytes)>>,
    upload_result: FileMetadata,
    fail_listing: bool,
}

#[async_trait]
impl DropboxFiles for MockFiles {
    async fn list_folder(&self, _path: &str) -> ConnectorResult<Vec<EntryMetadata>> {
        if self.fail_listing {
            return Err(ConnectorError::new(
                ErrorKind::Authentication,
                "invalid_access_token/",
            ));
        }
        Ok(self.entries.clone())
    }

    async fn download(&self, path: &str) -> ConnectorResult<(FileMetadata, Bytes)> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ConnectorError::not_found(format!("path/not_found: {path}")))
    }

    async fn upload(&self, args: &UploadArgs, content: Bytes) -> ConnectorResult<FileMetadata> {
        self.uploads
            .lock()
            .unwrap()
            .push((args.clone(), content));
        Ok(self.upload_result.clone())
    }
}

struct MockFactory(Arc<MockFiles>);

impl ClientFactory for MockFactory {
    fn create(&self, _props: &ConnectionProps) -> ConnectorResult<Arc<dyn DropboxFiles>> {
        Ok(Arc::clone(&self.0) as Arc<dyn DropboxFiles>)
    }
}

/// Response payload observable after the execution context is consumed.
#[derive(Clone, Default)]
struct SharedPayload {
    inner: Arc<Mutex<PayloadState>>,
}

#[derive(Default)]
struct PayloadState {
    buffer: Vec<u8>,
    close_count: usize,
}

impl SharedPayload {
    fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap().buffer.clone()
    }

    fn close_count(&self) -> usize {
        self.inner.lock().unwrap().close_count
    }
}

#[async_trait]
impl ResponsePayload for SharedPayload {
    async fn write_all(&mut self, data: &[u8]) -> ConnectorResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.close_count > 0 {
            return Err(ConnectorError::internal("write to a closed payload"));
        }
        state.buffer.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) -> ConnectorResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.close_count > 0 {
            return Err(ConnectorError::internal("payload closed more than once"));
        }
        state.close_count += 1;
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn connection_props() -> HashMap<String, String> {
    [
        (APP_KEY.to_string(), "test-app".to_string()),
        (ACCESS_TOKEN.to_string(), "test-token".to_string()),
    ]
    .into()
}

fn connection(files: &Arc<MockFiles>) -> DropboxConnection {
    DropboxConnectionFactory::with_client_factory(Arc::new(MockFactory(Arc::clone(files))))
        .create_connection(&connection_props())
        .unwrap()
}

fn file_meta(name: &str, rev: &str, size: u64) -> FileMetadata {
    FileMetadata {
        name: name.to_string(),
        id: format!("id:{name}"),
        server_modified: Some("2024-03-01T08:00:00Z".to_string()),
        rev: Some(rev.to_string()),
        size: Some(size),
        ..Default::default()
    }
}

fn file_entry(name: &str) -> EntryMetadata {
    EntryMetadata {
        tag: "file".to_string(),
        name: name.to_string(),
        server_modified: Some("2024-03-01T08:00:00Z".to_string()),
        ..Default::default()
    }
}

fn execution_context(
    files: &Arc<MockFiles>,
    parameters: &[(&str, &str)],
    request: RequestPayload,
) -> (ExecutionContext<DropboxConnection>, SharedPayload) {
    let payload = SharedPayload::default();
    let ctx = ExecutionContext::new(
        parameters
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        request,
        Box::new(payload.clone()),
        connection(files),
    );
    (ctx, payload)
}

fn discover_context(
    files: &Arc<MockFiles>,
    properties: &[(&str, &str)],
    object_name: Option<&str>,
) -> DiscoverContext<DropboxConnection> {
    DiscoverContext::new(
        properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        object_name.map(str::to_string),
        connection(files),
    )
}

#[tokio::test]
async fn fetch_writes_metadata_and_base64_content() {
    init_tracing();
    let files = Arc::new(MockFiles {
        files: [(
            "/reports/a.xml".to_string(),
            (file_meta("a.xml", "rev-1", 7), Bytes::from_static(b"<data/>")),
        )]
        .into(),
        ..Default::default()
    });
    let (ctx, payload) = execution_context(
        &files,
        &[("folder", "/reports"), ("fileName", "a.xml")],
        RequestPayload::empty(),
    );

    let activity = FetchFileActivity::new(Arc::new(BundledResources), Verbose::default());
    activity.execute(ctx).await.unwrap();

    let body = String::from_utf8(payload.contents()).unwrap();
    assert!(body.starts_with("<fetchFileResponse>"));
    assert!(body.contains("<name>a.xml</name>"));
    assert!(body.contains("<rev>rev-1</rev>"));
    assert!(body.contains("<content>PGRhdGEvPg==</content>"));
    assert_eq!(payload.close_count(), 1);
}

#[tokio::test]
async fn fetch_failure_reports_download_error_and_still_releases() {
    let files = Arc::new(MockFiles::default());
    let (ctx, payload) = execution_context(
        &files,
        &[("folder", "/reports"), ("fileName", "missing.xml")],
        RequestPayload::empty(),
    );

    let activity = FetchFileActivity::new(Arc::new(BundledResources), Verbose::default());
    let err = activity.execute(ctx).await.unwrap_err();

    match err {
        ExecutionError::Operation(e) => {
            assert_eq!(e.kind, ErrorKind::Download);
            assert_eq!(e.code.as_deref(), Some("Dropbox03"));
            assert!(e.message.contains("/reports/missing.xml"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(payload.close_count(), 1);
}

#[tokio::test]
async fn fetch_without_file_name_is_a_validation_error() {
    let files = Arc::new(MockFiles::default());
    let (ctx, payload) = execution_context(&files, &[("folder", "/r")], RequestPayload::empty());

    let activity = FetchFileActivity::new(Arc::new(BundledResources), Verbose::default());
    let err = activity.execute(ctx).await.unwrap_err();
    assert_eq!(
        err.operation_error().unwrap().kind,
        ErrorKind::Validation
    );
    assert_eq!(payload.close_count(), 1);
}

#[tokio::test]
async fn put_resolves_folder_path_and_defaults_to_overwrite() {
    let files = Arc::new(MockFiles {
        upload_result: file_meta("out.txt", "rev-9", 5),
        ..Default::default()
    });
    let request = RequestPayload::new(
        "<putFileRequest>\
         <content>aGVsbG8=</content>\
         <mute>true</mute>\
         <autorename>false</autorename>\
         </putFileRequest>",
    );
    let (ctx, payload) = execution_context(
        &files,
        &[("folder", "/dest"), ("fileName", "out.txt")],
        request,
    );

    let activity = PutFileActivity::new(Arc::new(BundledResources), Verbose::default());
    activity.execute(ctx).await.unwrap();

    let uploads = files.uploads.lock().unwrap();
    let (args, content) = &uploads[0];
    assert_eq!(args.path, "/dest/out.txt");
    assert_eq!(args.mode, WriteMode::Overwrite);
    assert!(args.mute);
    assert_eq!(content.as_ref(), b"hello");

    let body = String::from_utf8(payload.contents()).unwrap();
    assert!(body.starts_with("<putFileResponse>"));
    assert!(body.contains("<rev>rev-9</rev>"));
    assert_eq!(payload.close_count(), 1);
}

#[tokio::test]
async fn put_honors_explicit_path_and_update_mode() {
    let files = Arc::new(MockFiles {
        upload_result: file_meta("y.txt", "rev-10", 5),
        ..Default::default()
    });
    let request = RequestPayload::new(
        "<putFileRequest>\
         <content>aGVsbG8=</content>\
         <path>/x/y.txt</path>\
         <mode>rev-old</mode>\
         <mute>false</mute>\
         <autorename>true</autorename>\
         </putFileRequest>",
    );
    let (ctx, _payload) = execution_context(
        &files,
        &[("folder", "/ignored"), ("fileName", "ignored.txt")],
        request,
    );

    let activity = PutFileActivity::new(Arc::new(BundledResources), Verbose::default());
    activity.execute(ctx).await.unwrap();

    let uploads = files.uploads.lock().unwrap();
    let (args, _) = &uploads[0];
    assert_eq!(args.path, "/x/y.txt");
    assert_eq!(args.mode, WriteMode::Update("rev-old".to_string()));
    assert!(args.autorename);
    assert!(!args.mute);
}

#[tokio::test]
async fn put_without_request_document_is_a_validation_error() {
    let files = Arc::new(MockFiles::default());
    let (ctx, payload) = execution_context(
        &files,
        &[("fileName", "out.txt")],
        RequestPayload::empty(),
    );

    let activity = PutFileActivity::new(Arc::new(BundledResources), Verbose::default());
    let err = activity.execute(ctx).await.unwrap_err();
    assert_eq!(
        err.operation_error().unwrap().kind,
        ErrorKind::Validation
    );
    assert!(files.uploads.lock().unwrap().is_empty());
    assert_eq!(payload.close_count(), 1);
}

#[tokio::test]
async fn get_execute_streams_the_selected_object_verbatim() {
    let files = Arc::new(MockFiles {
        files: [(
            "/a.xml".to_string(),
            (file_meta("a.xml", "rev-2", 9), Bytes::from_static(b"<orders/>")),
        )]
        .into(),
        ..Default::default()
    });
    let (ctx, payload) = execution_context(
        &files,
        &[("list-object", r#"{"name":"a.xml"}"#)],
        RequestPayload::empty(),
    );

    let activity = GetFileActivity::new();
    activity.execute(ctx).await.unwrap();

    assert_eq!(payload.contents(), b"<orders/>");
    assert_eq!(payload.close_count(), 1);
}

#[tokio::test]
async fn get_failure_carries_path_and_cause() {
    let files = Arc::new(MockFiles::default());
    let (ctx, _payload) = execution_context(
        &files,
        &[("folder", "/f"), ("list-object", r#"{"name":"gone.xml"}"#)],
        RequestPayload::empty(),
    );

    let activity = GetFileActivity::new();
    let err = activity.execute(ctx).await.unwrap_err();
    let e = err.operation_error().unwrap();
    assert_eq!(e.code.as_deref(), Some("Dropbox06"));
    assert!(e.message.contains("/f/gone.xml"));
}

#[tokio::test]
async fn get_object_list_offers_only_xml_and_json_files() {
    let folder_entry = EntryMetadata {
        tag: "folder".to_string(),
        name: "sub".to_string(),
        ..Default::default()
    };

    let files = Arc::new(MockFiles {
        entries: vec![
            file_entry("a.xml"),
            file_entry("b.JSON"),
            file_entry("notes.txt"),
            file_entry("json"),
            folder_entry,
        ],
        ..Default::default()
    });

    let activity = GetFileActivity::new();
    let objects = activity
        .object_list(discover_context(&files, &[("folder", "/f")], None))
        .await
        .unwrap();

    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].name, "a.xml");
    assert_eq!(objects[0].object_type, "XML");
    assert_eq!(objects[1].name, "b.JSON");
    assert_eq!(objects[1].object_type, "JSON");
}

#[tokio::test]
async fn get_metadata_returns_the_document_verbatim() {
    let files = Arc::new(MockFiles {
        files: [(
            "/f/a.json".to_string(),
            (
                file_meta("a.json", "rev-3", 8),
                Bytes::from_static(br#"{"a": 1}"#),
            ),
        )]
        .into(),
        ..Default::default()
    });

    let activity = GetFileActivity::new();
    let metadata = activity
        .request_response_metadata(discover_context(&files, &[("folder", "/f")], Some("a.json")))
        .await
        .unwrap();

    let schema = metadata.response_schema.unwrap();
    assert_eq!(schema.name, "a.json.xsd");
    assert_eq!(schema.content_type, SchemaContentType::Json);
    assert_eq!(schema.content, r#"{"a": 1}"#);
    assert!(metadata.response_root.is_none());
}

#[tokio::test]
async fn process_object_list_is_the_bundled_catalog() {
    let files = Arc::new(MockFiles::default());
    let activity = ProcessFileActivity::new(Arc::new(BundledResources));

    let objects = activity
        .object_list(discover_context(&files, &[], None))
        .await
        .unwrap();
    let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["account", "customers", "contacts", "root", "root2"]);
}

#[tokio::test]
async fn process_metadata_carries_referenced_schemas() {
    let files = Arc::new(MockFiles::default());
    let activity = ProcessFileActivity::new(Arc::new(BundledResources));

    let root = activity
        .request_response_metadata(discover_context(&files, &[], Some("root")))
        .await
        .unwrap();
    let schema = root.response_schema.unwrap();
    assert_eq!(schema.references.len(), 1);
    assert_eq!(schema.references[0].name, "common.xsd");

    let files = Arc::new(MockFiles::default());
    let root2 = activity
        .request_response_metadata(discover_context(&files, &[], Some("root2")))
        .await
        .unwrap();
    assert_eq!(root2.response_schema.unwrap().references.len(), 3);

    let files = Arc::new(MockFiles::default());
    let account = activity
        .request_response_metadata(discover_context(&files, &[], Some("account")))
        .await
        .unwrap();
    assert!(account.response_schema.unwrap().references.is_empty());
}

#[tokio::test]
async fn process_metadata_for_unknown_object_is_not_found() {
    let files = Arc::new(MockFiles::default());
    let activity = ProcessFileActivity::new(Arc::new(BundledResources));

    let err = activity
        .request_response_metadata(discover_context(&files, &[], Some("ledger")))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(err.message.contains("ledger"));
}

#[tokio::test]
async fn process_execute_streams_raw_content() {
    let files = Arc::new(MockFiles {
        files: [(
            "/in/orders.xml".to_string(),
            (
                file_meta("orders.xml", "rev-4", 9),
                Bytes::from_static(b"<orders/>"),
            ),
        )]
        .into(),
        ..Default::default()
    });
    let (ctx, payload) = execution_context(
        &files,
        &[("folder", "/in"), ("fileName", "orders.xml")],
        RequestPayload::empty(),
    );

    let activity = ProcessFileActivity::new(Arc::new(BundledResources));
    activity.execute(ctx).await.unwrap();

    assert_eq!(payload.contents(), b"<orders/>");
    assert_eq!(payload.close_count(), 1);
}

#[tokio::test]
async fn connection_validation_failure_carries_the_connection_code() {
    let files = Arc::new(MockFiles {
        fail_listing: true,
        ..Default::default()
    });
    let mut conn = connection(&files);

    let err = conn.open().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Connection);
    assert_eq!(err.code.as_deref(), Some("Dropbox07"));
    assert!(err.message.starts_with("Error creating connection:"));
}
