//! Error types for the page model.

use ego_tree::NodeId;
use thiserror::Error;

/// Result type for page model operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors that can occur while reading or mutating the page.
#[derive(Error, Debug)]
pub enum DomError {
    /// The node id does not belong to this document.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The node exists but is not an element.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// `remove_child` was given a node that is not a child of the parent.
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Appending would make a node its own ancestor.
    #[error("cannot append {child:?} into its own subtree")]
    HierarchyRequest { child: NodeId },

    /// The element already hosts a shadow root.
    #[error("element {0:?} already has a shadow root")]
    ShadowRootExists(NodeId),

    /// The document has no element to mount into.
    #[error("document has no body or document element")]
    NoMountPoint,

    /// Selector failed to parse.
    #[error(transparent)]
    Selector(#[from] crate::selector::SelectorError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
