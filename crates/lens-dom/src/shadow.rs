//! Private shadow host for transient overlay elements.

use std::rc::Rc;

use ego_tree::NodeId;
use tracing::debug;

use crate::document::{Document, ShadowRootMode};
use crate::error::{DomError, Result};

pub const DEFAULT_SHADOW_HOST_ID: &str = "insights-shadow-host";

/// Hands out the shadow root that overlay elements are mounted in, creating
/// the host element on first use.
#[derive(Clone)]
pub struct ShadowUtils {
    document: Rc<Document>,
    host_id: String,
}

impl ShadowUtils {
    pub fn new(document: Rc<Document>) -> Self {
        Self::with_host_id(document, DEFAULT_SHADOW_HOST_ID)
    }

    pub fn with_host_id(document: Rc<Document>, host_id: impl Into<String>) -> Self {
        Self {
            document,
            host_id: host_id.into(),
        }
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// The host element, if it has been created.
    pub fn host(&self) -> Option<NodeId> {
        self.document
            .get_element_by_id(self.document.root(), &self.host_id)
    }

    pub fn shadow_container(&self) -> Result<NodeId> {
        let doc = &self.document;
        if let Some(host) = self.host() {
            return match doc.attached_shadow_root(host) {
                Some(root) => Ok(root),
                None => doc.attach_shadow(host, ShadowRootMode::Open),
            };
        }

        let mount = doc
            .body()
            .or_else(|| doc.document_element())
            .ok_or(DomError::NoMountPoint)?;
        let host = doc.create_element("div");
        doc.set_attribute(host, "id", &self.host_id)?;
        doc.append_child(mount, host)?;
        let root = doc.attach_shadow(host, ShadowRootMode::Open)?;
        debug!(host_id = %self.host_id, "created shadow host");
        Ok(root)
    }
}
