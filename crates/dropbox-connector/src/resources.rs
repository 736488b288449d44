//! Bundled schema resources.
//!
//! The schema and sample documents shipped with the connector are
//! embedded at build time and addressed by their logical resource path.
//! Activities receive the loader as an explicit capability so tests can
//! substitute their own documents.

use connector_sdk::{ConnectorError, ConnectorResult};

/// Loads named schema/sample resources.
pub trait ResourceLoader: Send + Sync {
    /// Load a resource by its logical path, e.g. `xsds/put-file-request.xsd`.
    fn load(&self, path: &str) -> ConnectorResult<String>;
}

/// Loader over the documents embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledResources;

impl ResourceLoader for BundledResources {
    fn load(&self, path: &str) -> ConnectorResult<String> {
        let content = match path {
            "xsds/fetch-file-request.xsd" => {
                include_str!("../resources/xsds/fetch-file-request.xsd")
            }
            "xsds/fetch-file-response.xsd" => {
                include_str!("../resources/xsds/fetch-file-response.xsd")
            }
            "xsds/put-file-request.xsd" => {
                include_str!("../resources/xsds/put-file-request.xsd")
            }
            "xsds/put-file-response.xsd" => {
                include_str!("../resources/xsds/put-file-response.xsd")
            }
            "support-xsds/account.xsd" => {
                include_str!("../resources/support-xsds/account.xsd")
            }
            "support-xsds/root.xsd" => include_str!("../resources/support-xsds/root.xsd"),
            "support-xsds/common.xsd" => include_str!("../resources/support-xsds/common.xsd"),
            "support-xsds/root2.xsd" => include_str!("../resources/support-xsds/root2.xsd"),
            "support-xsds/customer.xsd" => {
                include_str!("../resources/support-xsds/customer.xsd")
            }
            "support-xsds/product.xsd" => {
                include_str!("../resources/support-xsds/product.xsd")
            }
            "support-xsds/address.xsd" => {
                include_str!("../resources/support-xsds/address.xsd")
            }
            "sample-json/customers.json" => {
                include_str!("../resources/sample-json/customers.json")
            }
            "sample-xml/contacts.xml" => include_str!("../resources/sample-xml/contacts.xml"),
            _ => {
                return Err(ConnectorError::not_found(format!(
                    "bundled resource {path} does not exist"
                )))
            }
        };
        Ok(content.to_string())
    }
}
