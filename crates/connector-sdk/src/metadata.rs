//! Schema and discovery metadata consumed by the host configuration UI.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Content type of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaContentType {
    /// An XML document or sample.
    Xml,
    /// A JSON document or sample.
    Json,
    /// An XML Schema Definition.
    Xsd,
}

/// A schema document returned to the host for UI configuration.
///
/// `references` carries auxiliary schema documents that the primary
/// document depends on, for responses composed of multiple interdependent
/// schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMetadata {
    /// Logical name of the schema.
    pub name: String,
    /// Content type of `content`.
    pub content_type: SchemaContentType,
    /// Raw schema text.
    pub content: String,
    /// Auxiliary referenced schema documents, if any.
    #[serde(default)]
    pub references: Vec<SchemaMetadata>,
}

impl SchemaMetadata {
    /// Create a schema descriptor without references.
    pub fn new(
        name: impl Into<String>,
        content_type: SchemaContentType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type,
            content: content.into(),
            references: Vec::new(),
        }
    }

    /// Attach auxiliary referenced schemas.
    pub fn with_references(mut self, references: Vec<SchemaMetadata>) -> Self {
        self.references = references;
        self
    }
}

/// Request/response schema metadata for one activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityMetadata {
    /// Schema describing the activity request document.
    pub request_schema: Option<SchemaMetadata>,
    /// Schema describing the activity response document.
    pub response_schema: Option<SchemaMetadata>,
    /// Qualified root element of the request document, `{namespace}local`.
    pub request_root: Option<String>,
    /// Qualified root element of the response document, `{namespace}local`.
    pub response_root: Option<String>,
}

/// A remote or bundled object offered for selection in the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverableObject {
    /// Object name presented to the user.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Type tag, e.g. "XML" or "JSON".
    pub object_type: String,
    /// Identifier of the parent container, when known.
    pub parent_id: Option<String>,
}

/// Context for a discovery call (`object_list` or
/// `request_response_metadata`): selection properties, the object the user
/// picked (if any), and a connection the activity may open.
#[derive(Debug)]
pub struct DiscoverContext<C> {
    /// Selection properties from the host UI (e.g. "folder").
    pub properties: HashMap<String, String>,
    /// Name of the object selected by the user, when discovery has
    /// already narrowed the choice.
    pub object_name: Option<String>,
    /// Connection supplied by the host for backend-derived discovery.
    pub connection: C,
}

impl<C> DiscoverContext<C> {
    /// Create a discovery context.
    pub fn new(
        properties: HashMap<String, String>,
        object_name: Option<String>,
        connection: C,
    ) -> Self {
        Self {
            properties,
            object_name,
            connection,
        }
    }

    /// Look up a selection property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}
