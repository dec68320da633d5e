//! In-process page model for the inspection overlay.
//!
//! Holds a mutable element tree parsed from HTML, with inline-style geometry,
//! open shadow roots and document-level mouse listeners, plus the collaborators
//! the inspector consumes: hit testing, the element finder and the private
//! shadow host.

pub mod document;
pub mod error;
pub mod events;
pub mod finder;
pub mod geometry;
pub mod html;
pub mod selector;
pub mod shadow;
pub mod style;

pub use document::{Document, ElementData, NodeKind, ShadowRootMode};
pub use ego_tree::NodeId;
pub use error::{DomError, Result};
pub use events::{EventKind, EventListener, ListenerId, MouseEvent};
pub use finder::{ElementFinder, ElementFinderByPosition, ElementFinderMessage, FinderError};
pub use geometry::{Point, Rect, Size};
pub use hit_test::HitIndex;
pub use html::{document_from_file, document_from_html, HtmlOptions};
pub use selector::{selector_path, unique_selector, SelectorError, SelectorPath};
pub use shadow::{ShadowUtils, DEFAULT_SHADOW_HOST_ID};
pub use style::{InlineStyle, Length};
