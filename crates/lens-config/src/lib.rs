//! Lens configuration system
//!
//! This crate provides centralized configuration for the inspection tooling,
//! loading settings from `lens.toml` with environment variable overrides.

mod features;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use features::{FeatureFlag, FeatureFlagDetail, FeatureFlags};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "lens.toml";

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LensConfig {
    /// Debounce settings for the scoping listener
    pub scoping: ScopingConfig,
    /// Crosshair overlay settings
    pub overlay: OverlayConfig,
    /// Highlight box settings
    pub highlight: HighlightConfig,
    /// Feature flag values
    pub features: FeatureFlags,
}

/// Scoping listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopingConfig {
    /// Debounce applied to click events before resolving the target element
    pub click_debounce_ms: u64,
    /// Debounce applied to mouse moves; usually much shorter than the click one
    pub hover_debounce_ms: u64,
}

/// Overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Id of the full-viewport crosshair container
    pub container_id: String,
    /// Id of the element hosting the private shadow root
    pub shadow_host_id: String,
    /// Cursor shown while inspecting
    pub cursor: String,
}

/// Highlight box configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Border colour of highlight boxes (CSS colour string)
    pub border_color: String,
    /// Id of the hover highlight element
    pub hover_box_id: String,
}

impl Default for ScopingConfig {
    fn default() -> Self {
        Self {
            click_debounce_ms: 300,
            hover_debounce_ms: 50,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            container_id: "insights-scoping-container".to_string(),
            shadow_host_id: "insights-shadow-host".to_string(),
            cursor: "crosshair".to_string(),
        }
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            border_color: "#CC0000".to_string(),
            hover_box_id: "insights-hover-highlight".to_string(),
        }
    }
}

impl ScopingConfig {
    pub fn click_debounce(&self) -> Duration {
        Duration::from_millis(self.click_debounce_ms)
    }

    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }
}

impl LensConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `lens.toml` in the current directory, or return
    /// the defaults if the file doesn't exist or can't be parsed
    pub fn load_or_default() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn merge_with_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Scoping settings
        if let Some(ms) = lookup("LENS_CLICK_DEBOUNCE_MS").and_then(|v| v.parse::<u64>().ok()) {
            self.scoping.click_debounce_ms = ms;
        }
        if let Some(ms) = lookup("LENS_HOVER_DEBOUNCE_MS").and_then(|v| v.parse::<u64>().ok()) {
            self.scoping.hover_debounce_ms = ms;
        }

        // Overlay settings
        if let Some(id) = lookup("LENS_OVERLAY_CONTAINER_ID").filter(|v| !v.is_empty()) {
            self.overlay.container_id = id;
        }
        if let Some(id) = lookup("LENS_SHADOW_HOST_ID").filter(|v| !v.is_empty()) {
            self.overlay.shadow_host_id = id;
        }

        // Highlight settings
        if let Some(color) = lookup("LENS_HIGHLIGHT_BORDER_COLOR").filter(|v| !v.is_empty()) {
            self.highlight.border_color = color;
        }

        for flag in FeatureFlag::ALL {
            if let Some(val) = lookup(&flag.env_var()) {
                self.features
                    .set(flag, val == "1" || val.eq_ignore_ascii_case("true"));
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from lens.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
