//! Process activity: download a file whose structure is described by one
//! of the schema documents bundled with the connector.
//!
//! The object catalog is static. Two of the entries carry auxiliary
//! referenced schemas, which exercises the host UI's multi-document
//! schema rendering.

use std::sync::Arc;

use async_trait::async_trait;
use connector_sdk::activity::{
    Activity, ActivityState, DeployedEntity, ExecutionContext, LifecycleState,
};
use connector_sdk::metadata::{
    ActivityMetadata, DiscoverContext, DiscoverableObject, SchemaContentType, SchemaMetadata,
};
use connector_sdk::{ConnectorError, ConnectorResult, ErrorKind, ExecutionError};
use tracing::debug;

use crate::activities::{PARAM_FILE_NAME, PARAM_FOLDER};
use crate::connection::DropboxConnection;
use crate::path::build_path;
use crate::resources::ResourceLoader;
use crate::{messages, PROCESS_FILE};

/// One entry of the bundled-schema catalog.
#[derive(Debug)]
struct CatalogEntry {
    name: &'static str,
    description: &'static str,
    content_type: SchemaContentType,
    resource: &'static str,
    references: &'static [&'static str],
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "account",
        description: "XML Schema Structure associated with Account objects",
        content_type: SchemaContentType::Xsd,
        resource: "support-xsds/account.xsd",
        references: &[],
    },
    CatalogEntry {
        name: "customers",
        description: "JSON Schema Structure associated with Customers objects",
        content_type: SchemaContentType::Json,
        resource: "sample-json/customers.json",
        references: &[],
    },
    CatalogEntry {
        name: "contacts",
        description: "XML Sample Structure associated with Contacts objects",
        content_type: SchemaContentType::Xml,
        resource: "sample-xml/contacts.xml",
        references: &[],
    },
    CatalogEntry {
        name: "root",
        description: "XML Schema Structure associated with Root objects",
        content_type: SchemaContentType::Xsd,
        resource: "support-xsds/root.xsd",
        references: &["support-xsds/common.xsd"],
    },
    CatalogEntry {
        name: "root2",
        description: "XML Schema Structure associated with Root2 objects",
        content_type: SchemaContentType::Xsd,
        resource: "support-xsds/root2.xsd",
        references: &[
            "support-xsds/customer.xsd",
            "support-xsds/product.xsd",
            "support-xsds/address.xsd",
        ],
    },
];

/// Resource-path stem, used as the schema name in the host UI.
fn resource_stem(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Downloads a file against one of the bundled schema objects.
pub struct ProcessFileActivity {
    lifecycle: LifecycleState,
    resources: Arc<dyn ResourceLoader>,
}

impl ProcessFileActivity {
    /// Create the activity over the given schema resources.
    pub fn new(resources: Arc<dyn ResourceLoader>) -> Self {
        Self {
            lifecycle: LifecycleState::new(),
            resources,
        }
    }

    async fn run(&self, ctx: &mut ExecutionContext<DropboxConnection>) -> ConnectorResult<()> {
        let folder = ctx.parameter(PARAM_FOLDER).unwrap_or("").to_string();
        let file_name = ctx
            .parameter(PARAM_FILE_NAME)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ConnectorError::validation(format!(
                    "the {PARAM_FILE_NAME} parameter is required for the {PROCESS_FILE} activity"
                ))
            })?
            .to_string();
        let path = build_path(&folder, &file_name);

        let downloaded = async {
            let client = ctx.connection.client().await?;
            let (_, content) = client.download(&path).await?;
            debug!(path, size = content.len(), "file downloaded for processing");
            ctx.response.write_all(&content).await
        }
        .await;

        downloaded.map_err(|e| {
            ConnectorError::with_source(
                ErrorKind::Download,
                messages::message(messages::DROPBOX_CODE03, &[&path]),
                e,
            )
            .with_code(messages::DROPBOX_CODE03)
        })
    }

    fn catalog_entry(name: &str) -> ConnectorResult<&'static CatalogEntry> {
        CATALOG
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ConnectorError::not_found(format!("Object {name} could not be found")))
    }
}

#[async_trait]
impl Activity for ProcessFileActivity {
    type Conn = DropboxConnection;

    fn name(&self) -> &str {
        PROCESS_FILE
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
        ctx: DiscoverContext<DropboxConnection>,
    ) -> ConnectorResult<ActivityMetadata> {
        let object_name = ctx
            .object_name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ConnectorError::validation(format!(
                    "no object selected for the {PROCESS_FILE} activity"
                ))
            })?;
        let entry = Self::catalog_entry(&object_name)?;

        let wrap = |e: ConnectorError| {
            ConnectorError::with_source(
                ErrorKind::Discovery,
                messages::message(messages::DROPBOX_CODE02, &[&object_name]),
                e,
            )
            .with_code(messages::DROPBOX_CODE02)
        };
        let primary = self.resources.load(entry.resource).map_err(wrap)?;
        let mut references = Vec::with_capacity(entry.references.len());
        for reference in entry.references {
            let content = self.resources.load(reference).map_err(wrap)?;
            references.push(SchemaMetadata::new(
                resource_stem(reference),
                SchemaContentType::Xsd,
                content,
            ));
        }

        let schema = SchemaMetadata::new(resource_stem(entry.resource), entry.content_type, primary)
            .with_references(references);

        Ok(ActivityMetadata {
            request_schema: None,
            response_schema: Some(schema),
            request_root: None,
            response_root: Some(object_name),
        })
    }

    async fn object_list(
        &self,
        _ctx: DiscoverContext<DropboxConnection>,
    ) -> ConnectorResult<Vec<DiscoverableObject>> {
        Ok(CATALOG
            .iter()
            .map(|entry| DiscoverableObject {
                name: entry.name.to_string(),
                description: entry.description.to_string(),
                object_type: match entry.content_type {
                    SchemaContentType::Json => "JSON".to_string(),
                    _ => "XML".to_string(),
                },
                parent_id: None,
            })
            .collect())
    }

    fn on_deploy(&self, entity: DeployedEntity) {
        self.lifecycle.deploy(PROCESS_FILE, entity);
    }

    fn on_undeploy(&self, entity: &DeployedEntity) {
        self.lifecycle.undeploy(PROCESS_FILE, entity);
    }

    fn on_start(&self) {
        self.lifecycle.start(PROCESS_FILE);
    }

    fn on_stop(&self) {
        self.lifecycle.stop(PROCESS_FILE);
    }

    fn state(&self) -> ActivityState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_stable() {
        let names: Vec<&str> = CATALOG.iter().map(|e| e.name).collect();
        assert_eq!(names, ["account", "customers", "contacts", "root", "root2"]);
    }

    #[test]
    fn catalog_descriptions_name_the_structure_and_object() {
        assert_eq!(
            ProcessFileActivity::catalog_entry("account").unwrap().description,
            "XML Schema Structure associated with Account objects"
        );
        assert_eq!(
            ProcessFileActivity::catalog_entry("customers").unwrap().description,
            "JSON Schema Structure associated with Customers objects"
        );
        assert_eq!(
            ProcessFileActivity::catalog_entry("contacts").unwrap().description,
            "XML Sample Structure associated with Contacts objects"
        );
    }

    #[test]
    fn root_objects_carry_their_references() {
        assert_eq!(
            ProcessFileActivity::catalog_entry("root")
                .unwrap()
                .references
                .len(),
            1
        );
        assert_eq!(
            ProcessFileActivity::catalog_entry("root2")
                .unwrap()
                .references
                .len(),
            3
        );
    }

    #[test]
    fn unknown_object_is_not_found() {
        let err = ProcessFileActivity::catalog_entry("nope").unwrap_err();
        assert_eq!(err.kind, connector_sdk::ErrorKind::NotFound);
        assert_eq!(err.message, "Object nope could not be found");
    }

    #[test]
    fn resource_stem_drops_the_directory() {
        assert_eq!(resource_stem("support-xsds/common.xsd"), "common.xsd");
        assert_eq!(resource_stem("contacts.xml"), "contacts.xml");
    }
}
