//! Element-finder-by-position: viewport coordinate → selector path.

use std::rc::Rc;

use ego_tree::NodeId;
use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::document::Document;
use crate::geometry::Point;
use crate::hit_test::HitIndex;
use crate::selector::{unique_selector, SelectorPath};
use crate::shadow::DEFAULT_SHADOW_HOST_ID;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementFinderMessage {
    pub x: f32,
    pub y: f32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinderError {
    #[error("no element at ({x}, {y})")]
    NoElementAtPoint { x: f32, y: f32 },

    #[error("element {0:?} has no unique selector in its scope")]
    Unresolvable(NodeId),
}

/// Resolves the selector path of the topmost element at a position.
pub trait ElementFinder {
    fn process_request(
        &self,
        message: ElementFinderMessage,
    ) -> LocalBoxFuture<'static, Result<SelectorPath, FinderError>>;
}

/// Hit-tests the page model. The private shadow host and everything mounted
/// in it are invisible to the finder.
#[derive(Clone)]
pub struct ElementFinderByPosition {
    document: Rc<Document>,
    excluded_host_id: String,
}

impl ElementFinderByPosition {
    pub fn new(document: Rc<Document>) -> Self {
        Self::with_excluded_host(document, DEFAULT_SHADOW_HOST_ID)
    }

    pub fn with_excluded_host(document: Rc<Document>, host_id: impl Into<String>) -> Self {
        Self {
            document,
            excluded_host_id: host_id.into(),
        }
    }

    /// Synchronous resolution; `process_request` defers this until polled.
    pub fn find(&self, message: ElementFinderMessage) -> Result<SelectorPath, FinderError> {
        let doc = &self.document;
        let point = Point::new(message.x, message.y);
        let excluded: Vec<NodeId> = doc
            .get_element_by_id(doc.root(), &self.excluded_host_id)
            .into_iter()
            .collect();

        let mut scope = doc.root();
        let mut parts = Vec::new();
        loop {
            let index = HitIndex::build(doc, scope, &excluded);
            let Some(hit) = index.topmost(point) else {
                // Over a host but none of its shadow content: the host is the target.
                if parts.is_empty() {
                    return Err(FinderError::NoElementAtPoint {
                        x: message.x,
                        y: message.y,
                    });
                }
                break;
            };
            parts.push(unique_selector(doc, hit).ok_or(FinderError::Unresolvable(hit))?);
            match doc.shadow_root(hit) {
                Some(root) => scope = root,
                None => break,
            }
        }

        let path = SelectorPath::from(parts);
        trace!(x = message.x, y = message.y, %path, "resolved element");
        Ok(path)
    }
}

impl ElementFinder for ElementFinderByPosition {
    fn process_request(
        &self,
        message: ElementFinderMessage,
    ) -> LocalBoxFuture<'static, Result<SelectorPath, FinderError>> {
        let finder = self.clone();
        async move { finder.find(message) }.boxed_local()
    }
}
