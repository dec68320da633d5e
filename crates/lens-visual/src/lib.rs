//! Visualization overlays drawn over inspected pages.

pub mod formatter;
pub mod hover_highlighter;

pub use formatter::{
    DialogRenderer, DrawerConfiguration, FailureBoxConfig, FailureInstanceFormatter, Formatter,
    HighlightBoxFormatter, VisualizationInstance, DEFAULT_BORDER_COLOR,
};
pub use hover_highlighter::{HoverHighlighter, DEFAULT_HOVER_BOX_ID};
