//! Feature flag registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureFlag {
    ExportResult,
    ShadowDialog,
    NewAssessmentExperience,
    ShowAllAssessments,
    LogTelemetryToConsole,
    ShowAllFeatureFlags,
    Scoping,
    ShowBugFiling,
    ShowInstanceVisibility,
    HighContrastMode,
}

/// Human readable description of a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlagDetail {
    pub id: FeatureFlag,
    pub displayable_name: &'static str,
    pub displayable_description: &'static str,
    pub default_value: bool,
}

impl FeatureFlag {
    pub const ALL: [FeatureFlag; 10] = [
        FeatureFlag::ExportResult,
        FeatureFlag::ShadowDialog,
        FeatureFlag::NewAssessmentExperience,
        FeatureFlag::ShowAllAssessments,
        FeatureFlag::LogTelemetryToConsole,
        FeatureFlag::ShowAllFeatureFlags,
        FeatureFlag::Scoping,
        FeatureFlag::ShowBugFiling,
        FeatureFlag::ShowInstanceVisibility,
        FeatureFlag::HighContrastMode,
    ];

    /// Identifier used in configuration files.
    pub fn id(self) -> &'static str {
        match self {
            FeatureFlag::ExportResult => "exportResult",
            FeatureFlag::ShadowDialog => "shadowDialog",
            FeatureFlag::NewAssessmentExperience => "newAssessmentExperience",
            FeatureFlag::ShowAllAssessments => "showAllAssessments",
            FeatureFlag::LogTelemetryToConsole => "logTelemetryToConsole",
            FeatureFlag::ShowAllFeatureFlags => "showAllFeatureFlags",
            FeatureFlag::Scoping => "scoping",
            FeatureFlag::ShowBugFiling => "showBugFiling",
            FeatureFlag::ShowInstanceVisibility => "showInstanceVisibility",
            FeatureFlag::HighContrastMode => "highContrastMode",
        }
    }

    /// Environment variable overriding this flag, e.g. `LENS_FEATURE_EXPORT_RESULT`.
    pub fn env_var(self) -> String {
        let mut name = String::from("LENS_FEATURE_");
        for (i, ch) in self.id().chars().enumerate() {
            if ch.is_ascii_uppercase() && i > 0 {
                name.push('_');
            }
            name.push(ch.to_ascii_uppercase());
        }
        name
    }

    pub fn detail(self) -> FeatureFlagDetail {
        let (displayable_name, displayable_description) = match self {
            FeatureFlag::ExportResult => (
                "Export result",
                "Allow exporting assessment results as an HTML report.",
            ),
            FeatureFlag::ShadowDialog => (
                "Shadow dialog",
                "Render the failure details dialog inside the private shadow root.",
            ),
            FeatureFlag::NewAssessmentExperience => (
                "New assessment experience",
                "Use the guided assessment navigation.",
            ),
            FeatureFlag::ShowAllAssessments => (
                "Show all assessments",
                "List assessments that are still under development.",
            ),
            FeatureFlag::LogTelemetryToConsole => (
                "Log telemetry to console",
                "Echo telemetry events to the log instead of sending them.",
            ),
            FeatureFlag::ShowAllFeatureFlags => (
                "Show all feature flags",
                "Show internal feature flags in the preview features panel.",
            ),
            FeatureFlag::Scoping => (
                "Scoping",
                "Enable picking elements to include in or exclude from a scan.",
            ),
            FeatureFlag::ShowBugFiling => (
                "Show bug filing",
                "Offer a bug filing button on failure instances.",
            ),
            FeatureFlag::ShowInstanceVisibility => (
                "Show instance visibility",
                "Show whether each failing instance is currently visible.",
            ),
            FeatureFlag::HighContrastMode => (
                "High contrast mode",
                "Use high contrast colours for highlight boxes.",
            ),
        };
        FeatureFlagDetail {
            id: self,
            displayable_name,
            displayable_description,
            default_value: FeatureFlags::default().is_enabled(self),
        }
    }

    pub fn all_details() -> Vec<FeatureFlagDetail> {
        Self::ALL.iter().map(|flag| flag.detail()).collect()
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FeatureFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.id() == s)
            .ok_or_else(|| format!("unknown feature flag: {s}"))
    }
}

/// Feature flag values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    pub export_result: bool,
    pub shadow_dialog: bool,
    pub new_assessment_experience: bool,
    pub show_all_assessments: bool,
    pub log_telemetry_to_console: bool,
    pub show_all_feature_flags: bool,
    pub scoping: bool,
    pub show_bug_filing: bool,
    pub show_instance_visibility: bool,
    pub high_contrast_mode: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            export_result: true,
            shadow_dialog: false,
            new_assessment_experience: true,
            show_all_assessments: false,
            log_telemetry_to_console: false,
            show_all_feature_flags: false,
            scoping: false,
            show_bug_filing: true,
            show_instance_visibility: false,
            high_contrast_mode: true,
        }
    }
}

impl FeatureFlags {
    fn slot(&mut self, flag: FeatureFlag) -> &mut bool {
        match flag {
            FeatureFlag::ExportResult => &mut self.export_result,
            FeatureFlag::ShadowDialog => &mut self.shadow_dialog,
            FeatureFlag::NewAssessmentExperience => &mut self.new_assessment_experience,
            FeatureFlag::ShowAllAssessments => &mut self.show_all_assessments,
            FeatureFlag::LogTelemetryToConsole => &mut self.log_telemetry_to_console,
            FeatureFlag::ShowAllFeatureFlags => &mut self.show_all_feature_flags,
            FeatureFlag::Scoping => &mut self.scoping,
            FeatureFlag::ShowBugFiling => &mut self.show_bug_filing,
            FeatureFlag::ShowInstanceVisibility => &mut self.show_instance_visibility,
            FeatureFlag::HighContrastMode => &mut self.high_contrast_mode,
        }
    }

    pub fn is_enabled(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::ExportResult => self.export_result,
            FeatureFlag::ShadowDialog => self.shadow_dialog,
            FeatureFlag::NewAssessmentExperience => self.new_assessment_experience,
            FeatureFlag::ShowAllAssessments => self.show_all_assessments,
            FeatureFlag::LogTelemetryToConsole => self.log_telemetry_to_console,
            FeatureFlag::ShowAllFeatureFlags => self.show_all_feature_flags,
            FeatureFlag::Scoping => self.scoping,
            FeatureFlag::ShowBugFiling => self.show_bug_filing,
            FeatureFlag::ShowInstanceVisibility => self.show_instance_visibility,
            FeatureFlag::HighContrastMode => self.high_contrast_mode,
        }
    }

    pub fn set(&mut self, flag: FeatureFlag, value: bool) {
        *self.slot(flag) = value;
    }

    /// `(flag, value)` pairs in registry order.
    pub fn values(&self) -> Vec<(FeatureFlag, bool)> {
        FeatureFlag::ALL
            .into_iter()
            .map(|flag| (flag, self.is_enabled(flag)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let flags = FeatureFlags::default();
        let expected = [
            (FeatureFlag::ExportResult, true),
            (FeatureFlag::ShadowDialog, false),
            (FeatureFlag::NewAssessmentExperience, true),
            (FeatureFlag::ShowAllAssessments, false),
            (FeatureFlag::LogTelemetryToConsole, false),
            (FeatureFlag::ShowAllFeatureFlags, false),
            (FeatureFlag::Scoping, false),
            (FeatureFlag::ShowBugFiling, true),
            (FeatureFlag::ShowInstanceVisibility, false),
            (FeatureFlag::HighContrastMode, true),
        ];
        assert_eq!(flags.values(), expected.to_vec());
    }

    #[test]
    fn ids_round_trip_and_serialize_as_field_names() {
        let serialized = toml::to_string(&FeatureFlags::default()).unwrap();
        for flag in FeatureFlag::ALL {
            assert_eq!(flag.id().parse::<FeatureFlag>().unwrap(), flag);
            assert!(
                serialized.contains(&format!("{} =", flag.id())),
                "missing key for {flag}"
            );
        }
        assert!("notAFlag".parse::<FeatureFlag>().is_err());
    }

    #[test]
    fn every_flag_has_named_details() {
        let details = FeatureFlag::all_details();
        assert_eq!(details.len(), FeatureFlag::ALL.len());
        for detail in details {
            assert!(!detail.displayable_name.is_empty());
            assert!(!detail.displayable_description.is_empty());
            assert_eq!(
                detail.default_value,
                FeatureFlags::default().is_enabled(detail.id)
            );
        }
    }

    #[test]
    fn env_var_names() {
        assert_eq!(FeatureFlag::Scoping.env_var(), "LENS_FEATURE_SCOPING");
        assert_eq!(
            FeatureFlag::LogTelemetryToConsole.env_var(),
            "LENS_FEATURE_LOG_TELEMETRY_TO_CONSOLE"
        );
    }
}
