//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/doccanvas/doccanvas.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `DOCCANVAS_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{ContainerSize, FitConfig, LayoutConfig};

/// Zoom step factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Scale multiplier per mouse-wheel notch
    pub wheel_zoom_factor: f64,
    /// Scale multiplier of the zoom in/out buttons
    pub button_zoom_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_factor: 1.05,
            button_zoom_factor: 1.2,
        }
    }
}

/// Container geometry assumed when no live surface reports one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl From<ContainerConfig> for ContainerSize {
    fn from(c: ContainerConfig) -> Self {
        ContainerSize::new(c.width, c.height)
    }
}

/// Unified configuration for doccanvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory of the persisted view state (default: XDG data dir)
    pub state_dir: PathBuf,
    /// User the view state is scoped to
    pub user: String,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    pub fit: FitConfig,
    pub container: ContainerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            user: "anonymous".to_string(),
            layout: LayoutConfig::default(),
            viewport: ViewportConfig::default(),
            fit: FitConfig::default(),
            container: ContainerConfig::default(),
        }
    }
}

/// Raw settings for intermediate parsing: every field optional so that a
/// layer only overrides what it names.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub state_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub layout: RawLayoutConfig,
    pub viewport: RawViewportConfig,
    pub fit: RawFitConfig,
    pub container: RawContainerConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutConfig {
    pub min_node_spacing: Option<f64>,
    pub level_height: Option<f64>,
    pub connector_offset: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawViewportConfig {
    pub wheel_zoom_factor: Option<f64>,
    pub button_zoom_factor: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFitConfig {
    pub node_half_width: Option<f64>,
    pub node_top: Option<f64>,
    pub node_bottom: Option<f64>,
    pub padding: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawContainerConfig {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Default state directory (~/.local/share/doccanvas on Linux).
fn default_state_dir() -> PathBuf {
    ProjectDirs::from("", "", "doccanvas")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.doccanvas"))
}

/// Get the XDG config directory for doccanvas.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "doccanvas").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("doccanvas.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; leaves the input alone on failure.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let l = &overlay.layout;
        let v = &overlay.viewport;
        let f = &overlay.fit;
        let c = &overlay.container;
        Self {
            state_dir: overlay
                .state_dir
                .clone()
                .unwrap_or_else(|| self.state_dir.clone()),
            user: overlay.user.clone().unwrap_or_else(|| self.user.clone()),
            layout: LayoutConfig {
                min_node_spacing: l.min_node_spacing.unwrap_or(self.layout.min_node_spacing),
                level_height: l.level_height.unwrap_or(self.layout.level_height),
                connector_offset: l.connector_offset.unwrap_or(self.layout.connector_offset),
            },
            viewport: ViewportConfig {
                wheel_zoom_factor: v.wheel_zoom_factor.unwrap_or(self.viewport.wheel_zoom_factor),
                button_zoom_factor: v.button_zoom_factor.unwrap_or(self.viewport.button_zoom_factor),
            },
            fit: FitConfig {
                node_half_width: f.node_half_width.unwrap_or(self.fit.node_half_width),
                node_top: f.node_top.unwrap_or(self.fit.node_top),
                node_bottom: f.node_bottom.unwrap_or(self.fit.node_bottom),
                padding: f.padding.unwrap_or(self.fit.padding),
            },
            container: ContainerConfig {
                width: c.width.unwrap_or(self.container.width),
                height: c.height.unwrap_or(self.container.height),
            },
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.state_dir.to_string_lossy().as_ref());
        self.state_dir = PathBuf::from(expanded);
    }

    /// Reject values the layout and viewport math cannot work with.
    fn validate(&self) -> Result<(), ApplicationError> {
        let positive = [
            ("layout.min_node_spacing", self.layout.min_node_spacing),
            ("layout.level_height", self.layout.level_height),
            ("viewport.wheel_zoom_factor", self.viewport.wheel_zoom_factor),
            ("viewport.button_zoom_factor", self.viewport.button_zoom_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ApplicationError::Config {
                    message: format!("{name} must be a positive number, got {value}"),
                });
            }
        }
        if self.user.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "user must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file, applied after the global one
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit config file: must exist when given
        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply DOCCANVAS_* environment variables as explicit overrides.
    ///
    /// Nested keys use a double underscore: `DOCCANVAS_LAYOUT__LEVEL_HEIGHT=200`.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("DOCCANVAS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        let float = |key: &str| config.get_float(key).ok();
        let raw = RawSettings {
            state_dir: config.get_string("state_dir").ok().map(PathBuf::from),
            user: config.get_string("user").ok(),
            layout: RawLayoutConfig {
                min_node_spacing: float("layout.min_node_spacing"),
                level_height: float("layout.level_height"),
                connector_offset: float("layout.connector_offset"),
            },
            viewport: RawViewportConfig {
                wheel_zoom_factor: float("viewport.wheel_zoom_factor"),
                button_zoom_factor: float("viewport.button_zoom_factor"),
            },
            fit: RawFitConfig {
                node_half_width: float("fit.node_half_width"),
                node_top: float("fit.node_top"),
                node_bottom: float("fit.node_bottom"),
                padding: float("fit.padding"),
            },
            container: RawContainerConfig {
                width: float("container.width"),
                height: float("container.height"),
            },
        };
        Ok(settings.merge_with(&raw))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# doccanvas configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/doccanvas/doccanvas.toml
#   Explicit: --config <file>
#   Env:      DOCCANVAS_* environment variables (DOCCANVAS_LAYOUT__LEVEL_HEIGHT=200)

# Directory of the persisted view state
# state_dir = "~/.local/share/doccanvas"

# User the view state is scoped to
# user = "anonymous"

[layout]
# min_node_spacing = 280.0
# level_height = 180.0
# connector_offset = 50.0

[viewport]
# wheel_zoom_factor = 1.05
# button_zoom_factor = 1.2

[fit]
# node_half_width = 130.0
# node_top = 50.0
# node_bottom = 150.0
# padding = 40.0

[container]
# width = 1280.0
# height = 800.0
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_when_created_then_has_layout_constants() {
        let settings = Settings::default();
        assert_eq!(settings.layout.min_node_spacing, 280.0);
        assert_eq!(settings.layout.level_height, 180.0);
        assert_eq!(settings.fit.node_half_width, 130.0);
        assert_eq!(settings.user, "anonymous");
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_named_fields_change() {
        let base = Settings::default();
        let overlay: RawSettings = toml::from_str(
            r#"
user = "bob"
[layout]
level_height = 200.0
"#,
        )
        .unwrap();

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.user, "bob");
        assert_eq!(merged.layout.level_height, 200.0);
        assert_eq!(merged.layout.min_node_spacing, 280.0);
        assert_eq!(merged.viewport, ViewportConfig::default());
    }

    #[test]
    fn given_tilde_in_state_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            state_dir: PathBuf::from("~/.doccanvas"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.state_dir.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_zero_level_height_when_validating_then_rejected() {
        let mut settings = Settings::default();
        settings.layout.level_height = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_template_when_parsing_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.user.is_none());
    }
}
