//! Single replaceable highlight box for the hovered element.

use std::cell::Cell;

use lens_dom::{DomError, InlineStyle, NodeId, Rect, SelectorPath, ShadowUtils};
use tracing::{debug, warn};

use crate::formatter::{DrawerConfiguration, Formatter, HighlightBoxFormatter, VisualizationInstance};

pub const DEFAULT_HOVER_BOX_ID: &str = "insights-hover-highlight";

pub struct HoverHighlighter {
    shadow: ShadowUtils,
    formatter: HighlightBoxFormatter,
    box_id: String,
    current: Cell<Option<NodeId>>,
}

impl HoverHighlighter {
    pub fn new(shadow: ShadowUtils, formatter: HighlightBoxFormatter) -> Self {
        Self::with_box_id(shadow, formatter, DEFAULT_HOVER_BOX_ID)
    }

    pub fn with_box_id(
        shadow: ShadowUtils,
        formatter: HighlightBoxFormatter,
        box_id: impl Into<String>,
    ) -> Self {
        Self {
            shadow,
            formatter,
            box_id: box_id.into(),
            current: Cell::new(None),
        }
    }

    /// The highlight element currently drawn.
    pub fn current(&self) -> Option<NodeId> {
        self.current.get()
    }

    pub fn highlight(&self, path: &SelectorPath) -> Result<Option<NodeId>, DomError> {
        self.draw(path, None)
    }

    /// Replace the highlight with a box around the element at `path`. Paths
    /// that do not resolve to a laid-out element clear the highlight.
    pub fn draw(
        &self,
        path: &SelectorPath,
        data: Option<&VisualizationInstance>,
    ) -> Result<Option<NodeId>, DomError> {
        self.clear();
        let document = self.shadow.document();
        let target = match document.query_selector_path(path) {
            Ok(Some(element)) => element,
            Ok(None) => {
                debug!(%path, "hovered selector no longer resolves");
                return Ok(None);
            }
            Err(err) => {
                debug!(%path, %err, "hovered selector is not valid");
                return Ok(None);
            }
        };
        let Some(rect) = document.bounding_rect(target) else {
            debug!(%path, "hovered element has no box");
            return Ok(None);
        };

        let config = self.formatter.drawer_configuration(target, data);
        if !config.show_visualization {
            return Ok(None);
        }
        let container = self.shadow.shadow_container()?;
        let highlight = document.create_element("div");
        document.set_attribute(highlight, "id", &self.box_id)?;
        document.set_style(highlight, box_style(rect, &config))?;
        if let Some(failure) = &config.failure_box_config {
            let badge = document.create_element("div");
            let mut style = InlineStyle::new();
            style.set("background", failure.background.as_str());
            style.set("color", failure.font_color.as_str());
            style.set("pointer-events", "none");
            document.set_style(badge, style)?;
            let text = document.create_text(&failure.text);
            document.append_child(badge, text)?;
            document.append_child(highlight, badge)?;
        }
        document.append_child(container, highlight)?;
        self.current.set(Some(highlight));
        Ok(Some(highlight))
    }

    pub fn clear(&self) {
        let Some(highlight) = self.current.take() else {
            return;
        };
        let document = self.shadow.document();
        if let Some(parent) = document.parent(highlight) {
            if let Err(err) = document.remove_child(parent, highlight) {
                warn!(%err, "failed to remove hover highlight");
            }
        }
    }
}

fn box_style(rect: Rect, config: &DrawerConfiguration) -> InlineStyle {
    let mut style = InlineStyle::new();
    style.set("position", "absolute");
    style.set("left", format!("{}px", rect.x));
    style.set("top", format!("{}px", rect.y));
    style.set("width", format!("{}px", rect.w));
    style.set("height", format!("{}px", rect.h));
    style.set("outline", format!("2px solid {}", config.border_color));
    style.set("text-align", config.text_align.as_str());
    style.set("pointer-events", "none");
    style
}
