use std::fmt;
use std::str::FromStr;

use lens_dom::SelectorPath;
use serde::{Deserialize, Serialize};

use crate::error::InspectError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InspectMode {
    #[default]
    Off,
    Element,
    ScopingAddInclude,
    ScopingAddExclude,
}

impl InspectMode {
    pub const ALL: [InspectMode; 4] = [
        InspectMode::Off,
        InspectMode::Element,
        InspectMode::ScopingAddInclude,
        InspectMode::ScopingAddExclude,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InspectMode::Off => "off",
            InspectMode::Element => "element",
            InspectMode::ScopingAddInclude => "scopingAddInclude",
            InspectMode::ScopingAddExclude => "scopingAddExclude",
        }
    }

    pub fn is_active(self) -> bool {
        self != InspectMode::Off
    }

    pub fn is_scoping(self) -> bool {
        matches!(
            self,
            InspectMode::ScopingAddInclude | InspectMode::ScopingAddExclude
        )
    }
}

impl fmt::Display for InspectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InspectMode {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InspectMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InspectError::UnknownMode(s.to_string()))
    }
}

/// State of the inspect store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectStoreData {
    pub inspect_mode: InspectMode,
    pub hovered_over_selector: Option<SelectorPath>,
}
