//! Dropbox HTTP API v2 client.
//!
//! Speaks the same wire protocol the official SDK does: RPC endpoints on
//! the api host, upload/download on the content host with arguments in
//! the `Dropbox-API-Arg` header and download metadata returned in the
//! `Dropbox-API-Result` header. The [`DropboxFiles`] trait is the seam
//! the activities program against; tests substitute an in-memory
//! implementation. No retry or backoff: failures surface to the caller.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use connector_sdk::{ConnectorError, ConnectorResult, ErrorKind};
use reqwest::StatusCode;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::config::ConnectorConfig;
use crate::connection::ConnectionProps;
use crate::verbose::{self, Verbose};

/// File-operations surface of the Dropbox backend.
#[async_trait]
pub trait DropboxFiles: Send + Sync {
    /// List the entries of a folder. The empty path lists the root.
    async fn list_folder(&self, path: &str) -> ConnectorResult<Vec<EntryMetadata>>;

    /// Download a file, returning its metadata and full content.
    async fn download(&self, path: &str) -> ConnectorResult<(FileMetadata, Bytes)>;

    /// Upload content to a path, returning the stored file's metadata.
    async fn upload(&self, args: &UploadArgs, content: Bytes) -> ConnectorResult<FileMetadata>;
}

/// One entry of a folder listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntryMetadata {
    /// Union tag: "file" or "folder".
    #[serde(rename = ".tag")]
    pub tag: String,
    /// Entry name.
    pub name: String,
    /// Server-side modification timestamp (files only).
    pub server_modified: Option<String>,
    /// Identifier of the containing shared folder, when shared.
    pub parent_shared_folder_id: Option<String>,
    /// Size in bytes (files only).
    pub size: Option<u64>,
}

impl EntryMetadata {
    /// Whether this entry is a file (as opposed to a folder).
    pub fn is_file(&self) -> bool {
        self.tag == "file"
    }
}

/// Metadata of a downloaded or uploaded file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileMetadata {
    /// File name.
    pub name: String,
    /// Dropbox file id.
    pub id: String,
    /// Client-side modification timestamp, RFC 3339.
    pub client_modified: Option<String>,
    /// Server-side modification timestamp, RFC 3339.
    pub server_modified: Option<String>,
    /// Revision tag.
    pub rev: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Lower-cased full path.
    pub path_lower: Option<String>,
    /// Dropbox content hash.
    pub content_hash: Option<String>,
    /// Sharing details, present only for shared files.
    pub sharing_info: Option<SharingInfoMetadata>,
}

/// Sharing details on a file metadata record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SharingInfoMetadata {
    /// Whether the file is read-only for the current account.
    pub read_only: Option<bool>,
    /// Identifier of the containing shared folder.
    pub parent_shared_folder_id: Option<String>,
    /// Account that last modified the file.
    pub modified_by: Option<String>,
}

/// Write mode of an upload: overwrite by default, or update a specific
/// revision when the request names one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace whatever is at the destination.
    #[default]
    Overwrite,
    /// Update the named revision, conflicting otherwise.
    Update(String),
}

impl Serialize for WriteMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WriteMode::Overwrite => serializer.serialize_str("overwrite"),
            WriteMode::Update(rev) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(".tag", "update")?;
                map.serialize_entry("update", rev)?;
                map.end()
            }
        }
    }
}

/// Arguments of an upload call, sent in the `Dropbox-API-Arg` header.
#[derive(Debug, Clone, Serialize)]
pub struct UploadArgs {
    /// Destination path.
    pub path: String,
    /// Write mode.
    pub mode: WriteMode,
    /// Rename on conflict instead of failing.
    pub autorename: bool,
    /// Suppress user notifications.
    pub mute: bool,
    /// Fail instead of renaming when the mode conflicts.
    pub strict_conflict: bool,
}

impl UploadArgs {
    /// Upload arguments with overwrite semantics for a destination path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: WriteMode::Overwrite,
            autorename: false,
            mute: true,
            strict_conflict: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListFolderResult {
    entries: Vec<EntryMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiErrorResponse {
    error_summary: String,
}

/// Classify a Dropbox API failure from the HTTP status and the
/// `error_summary` of the response body.
///
/// Endpoint-specific errors come back as 409 with the specifics only in
/// the summary, so the summary decides between not-found and the rest.
fn classify(status: StatusCode, summary: &str) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => {
            if summary.contains("path/not_found") || summary.contains("path_lookup/not_found") {
                ErrorKind::NotFound
            } else {
                ErrorKind::ExternalService
            }
        }
        s if s.is_server_error() => ErrorKind::ExternalService,
        _ => ErrorKind::ExternalService,
    }
}

/// Client bound to one set of connection credentials.
pub struct DropboxHttpClient {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
    content_base: String,
    verbose: Verbose,
}

impl fmt::Debug for DropboxHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxHttpClient")
            .field("api_base", &self.api_base)
            .field("access_token", &verbose::REDACTED)
            .finish()
    }
}

impl DropboxHttpClient {
    /// Build a client from connector configuration and connection
    /// properties. The app key and locale identify the client in the
    /// user agent, as the official SDK's request config does.
    pub fn new(config: &ConnectorConfig, props: &ConnectionProps) -> ConnectorResult<Self> {
        let user_agent = format!(
            "{}/dropbox-connector ({})",
            props.app_key, props.locale
        );
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ConnectorError::with_source(
                    ErrorKind::Configuration,
                    format!("failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            http,
            access_token: props.access_token.clone(),
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            content_base: config.content_base_url.trim_end_matches('/').to_string(),
            verbose: Verbose::new(config.verbose_logging),
        })
    }

    /// Dropbox expects "" for the root folder, never "/".
    fn api_path(path: &str) -> &str {
        if path == "/" {
            ""
        } else {
            path
        }
    }

    fn transport_error(e: reqwest::Error, what: &str) -> ConnectorError {
        ConnectorError::with_source(
            ErrorKind::ExternalService,
            format!("request to Dropbox failed during {what}: {e}"),
            e,
        )
    }

    async fn api_error(response: reqwest::Response, path: &str) -> ConnectorError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let summary = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error_summary)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        debug!(%status, summary, path, "Dropbox API call failed");
        ConnectorError::new(
            classify(status, &summary),
            format!("Dropbox API error for {path}: {summary} (status {status})"),
        )
    }
}

#[async_trait]
impl DropboxFiles for DropboxHttpClient {
    async fn list_folder(&self, path: &str) -> ConnectorResult<Vec<EntryMetadata>> {
        let url = format!("{}/2/files/list_folder", self.api_base);
        self.verbose.request("POST", &url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "path": Self::api_path(path),
                "recursive": false,
            }))
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "list_folder"))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, path).await);
        }

        let result: ListFolderResult = response
            .json()
            .await
            .map_err(|e| Self::transport_error(e, "list_folder"))?;
        Ok(result.entries)
    }

    async fn download(&self, path: &str) -> ConnectorResult<(FileMetadata, Bytes)> {
        let url = format!("{}/2/files/download", self.content_base);
        self.verbose.request("POST", &url);
        let arg = serde_json::to_string(&serde_json::json!({ "path": path }))?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", arg)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "download"))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, path).await);
        }

        let metadata = response
            .headers()
            .get("Dropbox-API-Result")
            .and_then(|v| v.to_str().ok())
            .map(serde_json::from_str::<FileMetadata>)
            .transpose()?
            .ok_or_else(|| {
                ConnectorError::serialization(format!(
                    "download of {path} returned no Dropbox-API-Result metadata"
                ))
            })?;

        let content = response
            .bytes()
            .await
            .map_err(|e| Self::transport_error(e, "download"))?;
        Ok((metadata, content))
    }

    async fn upload(&self, args: &UploadArgs, content: Bytes) -> ConnectorResult<FileMetadata> {
        let url = format!("{}/2/files/upload", self.content_base);
        self.verbose.request("POST", &url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", serde_json::to_string(args)?)
            .header("Content-Type", "application/octet-stream")
            .body(content)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "upload"))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, &args.path).await);
        }

        response
            .json()
            .await
            .map_err(|e| Self::transport_error(e, "upload"))
    }
}
