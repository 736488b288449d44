//! Activity request/response records and their XML binding.
//!
//! These mirror the bundled XSDs: the host maps user data onto the
//! request documents and reads activity results from the response
//! documents. Content bytes travel base64-encoded, timestamps as RFC 3339.

use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use connector_sdk::{ConnectorError, ConnectorResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Request document for the fetch activity. Parsed only for verbose
/// logging; the folder/filename parameters drive the behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "fetchFileRequest", default)]
pub struct FetchFileRequest {
    /// Folder the file lives in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Name of the file to fetch.
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Response document for the fetch activity: file metadata plus content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "fetchFileResponse", default)]
pub struct FetchFileResponse {
    /// File name as reported by Dropbox.
    pub name: String,
    /// Client-side modification timestamp.
    #[serde(rename = "clientModified", skip_serializing_if = "Option::is_none")]
    pub client_modified: Option<DateTime<Utc>>,
    /// Server-side modification timestamp.
    #[serde(rename = "serverModified", skip_serializing_if = "Option::is_none")]
    pub server_modified: Option<DateTime<Utc>>,
    /// Revision tag.
    pub rev: String,
    /// Size in bytes.
    pub size: u64,
    /// Sharing details, present only for shared files.
    #[serde(rename = "sharingInfo", skip_serializing_if = "Option::is_none")]
    pub sharing_info: Option<SharingInfo>,
    /// File content, base64-encoded on the wire.
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

/// Sharing details of a fetched file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingInfo {
    /// Whether the file is read-only for the current account.
    #[serde(rename = "readOnly")]
    pub read_only: bool,
    /// Identifier of the containing shared folder.
    #[serde(
        rename = "parentSharedFolderId",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_shared_folder_id: Option<String>,
    /// Account that last modified the file.
    #[serde(rename = "modifiedBy", skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

/// Request document for the put activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "putFileRequest", default)]
pub struct PutFileRequest {
    /// Content to upload, base64-encoded on the wire.
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    /// Explicit destination path; wins over folder/filename when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Revision to update; absent means overwrite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Suppress user notifications for this upload.
    pub mute: bool,
    /// Let Dropbox rename on conflict instead of failing.
    pub autorename: bool,
}

/// Response document for the put activity, from the upload confirmation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "putFileResponse", default)]
pub struct PutFileResponse {
    /// File name as stored.
    pub name: String,
    /// Lower-cased full path.
    #[serde(rename = "pathLower", skip_serializing_if = "Option::is_none")]
    pub path_lower: Option<String>,
    /// Dropbox content hash.
    #[serde(rename = "contentHash", skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Dropbox file id.
    pub id: String,
    /// Revision tag after the upload.
    pub rev: String,
    /// Size in bytes.
    pub size: u64,
}

/// Marshal a record into its XML document.
pub fn to_xml<T: Serialize>(value: &T) -> ConnectorResult<String> {
    quick_xml::se::to_string(value).map_err(|e| {
        ConnectorError::with_source(
            connector_sdk::ErrorKind::Serialization,
            format!("XML marshalling error: {e}"),
            e,
        )
    })
}

/// Unmarshal a record from XML bytes.
pub fn from_xml<T: DeserializeOwned>(bytes: &[u8]) -> ConnectorResult<T> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ConnectorError::with_source(
            connector_sdk::ErrorKind::Serialization,
            "request payload is not valid UTF-8",
            e,
        )
    })?;
    quick_xml::de::from_str(text).map_err(|e| {
        ConnectorError::with_source(
            connector_sdk::ErrorKind::Serialization,
            format!("XML unmarshalling error: {e}"),
            e,
        )
    })
}

/// Parse an RFC 3339 timestamp from the Dropbox wire format.
pub fn parse_timestamp(value: &str) -> ConnectorResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            ConnectorError::with_source(
                connector_sdk::ErrorKind::Serialization,
                format!("invalid timestamp {value:?}"),
                e,
            )
        })
}

mod base64_bytes {
    use base64::Engine as _;

    use super::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.trim())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_request_round_trips_through_xml() {
        let xml = "<putFileRequest>\
                   <content>aGVsbG8=</content>\
                   <path>/x/y.txt</path>\
                   <mute>true</mute>\
                   <autorename>false</autorename>\
                   </putFileRequest>";
        let request: PutFileRequest = from_xml(xml.as_bytes()).unwrap();
        assert_eq!(request.content, b"hello");
        assert_eq!(request.path.as_deref(), Some("/x/y.txt"));
        assert!(request.mute);
        assert!(request.mode.is_none());
    }

    #[test]
    fn fetch_response_marshals_content_as_base64() {
        let response = FetchFileResponse {
            name: "a.xml".to_string(),
            rev: "0123abc".to_string(),
            size: 5,
            content: b"hello".to_vec(),
            ..Default::default()
        };
        let xml = to_xml(&response).unwrap();
        assert!(xml.starts_with("<fetchFileResponse>"));
        assert!(xml.contains("<content>aGVsbG8=</content>"));
        assert!(xml.contains("<rev>0123abc</rev>"));
        assert!(!xml.contains("sharingInfo"));
    }

    #[test]
    fn fetch_response_includes_sharing_info_when_present() {
        let response = FetchFileResponse {
            name: "a.xml".to_string(),
            sharing_info: Some(SharingInfo {
                read_only: true,
                parent_shared_folder_id: Some("pf-1".to_string()),
                modified_by: Some("dbid:user".to_string()),
            }),
            ..Default::default()
        };
        let xml = to_xml(&response).unwrap();
        assert!(xml.contains("<readOnly>true</readOnly>"));
        assert!(xml.contains("<parentSharedFolderId>pf-1</parentSharedFolderId>"));
    }

    #[test]
    fn malformed_request_is_a_serialization_error() {
        let err = from_xml::<PutFileRequest>(b"<putFileRequest><content>").unwrap_err();
        assert_eq!(err.kind, connector_sdk::ErrorKind::Serialization);
    }

    #[test]
    fn timestamps_parse_from_rfc3339() {
        let parsed = parse_timestamp("2020-01-15T10:30:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2020-01-15T10:30:00+00:00");
        assert!(parse_timestamp("not-a-date").is_err());
    }
}
