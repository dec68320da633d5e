use lens_config::HighlightConfig;
use lens_dom::NodeId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BORDER_COLOR: &str = "#CC0000";

/// Per-instance data attached to a highlighted element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationInstance {
    pub is_failure: bool,
}

/// Badge drawn on failing instances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBoxConfig {
    pub background: String,
    pub font_color: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawerConfiguration {
    pub border_color: String,
    pub text_align: String,
    pub show_visualization: bool,
    pub failure_box_config: Option<FailureBoxConfig>,
}

/// Renders the details dialog for a clicked highlight.
pub trait DialogRenderer {
    fn render(&self, element: NodeId);
}

pub trait Formatter {
    fn drawer_configuration(
        &self,
        element: NodeId,
        data: Option<&VisualizationInstance>,
    ) -> DrawerConfiguration;

    fn dialog_renderer(&self) -> Option<Box<dyn DialogRenderer>>;
}

pub struct FailureInstanceFormatter;

impl FailureInstanceFormatter {
    pub fn failure_box_config() -> FailureBoxConfig {
        FailureBoxConfig {
            background: "#E81123".to_string(),
            font_color: "#FFFFFF".to_string(),
            text: "!".to_string(),
        }
    }
}

/// Plain bordered box around each element.
#[derive(Clone, Debug)]
pub struct HighlightBoxFormatter {
    border_color: String,
}

impl Default for HighlightBoxFormatter {
    fn default() -> Self {
        Self {
            border_color: DEFAULT_BORDER_COLOR.to_string(),
        }
    }
}

impl HighlightBoxFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &HighlightConfig) -> Self {
        Self {
            border_color: config.border_color.clone(),
        }
    }

    pub fn border_color(&self) -> &str {
        &self.border_color
    }
}

impl Formatter for HighlightBoxFormatter {
    fn drawer_configuration(
        &self,
        _element: NodeId,
        data: Option<&VisualizationInstance>,
    ) -> DrawerConfiguration {
        let failure_box_config = data
            .filter(|instance| instance.is_failure)
            .map(|_| FailureInstanceFormatter::failure_box_config());
        DrawerConfiguration {
            border_color: self.border_color.clone(),
            text_align: "center".to_string(),
            show_visualization: true,
            failure_box_config,
        }
    }

    fn dialog_renderer(&self) -> Option<Box<dyn DialogRenderer>> {
        None
    }
}
