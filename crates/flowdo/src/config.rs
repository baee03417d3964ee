use flowcanvas::CanvasConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "flowdo.json";
pub const API_KEY_ENV: &str = "FLOWDO_API_KEY";

/// Key value that selects the canned generator even when set.
pub const DEMO_KEY: &str = "demo";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid zoom bounds in {path}: min {min}, max {max}")]
    ZoomBounds { path: PathBuf, min: f64, max: f64 },
}

fn default_state_path() -> PathBuf {
    PathBuf::from("flowdo-state.json")
}

fn default_debounce_ms() -> u64 {
    200
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: String,
}

impl AiConfig {
    pub fn uses_demo(&self) -> bool {
        let key = self.api_key.trim();
        key.is_empty() || key == DEMO_KEY
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
    /// Quiet time after the last change before the document is written.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Settings for the whole application, handed to each collaborator when it
/// is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas: CanvasConfig,
    pub ai: AiConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Read `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let zoom = config.canvas.zoom;
        if !zoom.is_valid() {
            return Err(ConfigError::ZoomBounds {
                path: path.to_path_buf(),
                min: zoom.min,
                max: zoom.max,
            });
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let text = serde_json::to_string_pretty(self).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, text).map_err(io_err)
    }

    /// A non-empty `key` replaces the configured API key.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.ai.api_key = key;
        }
        self
    }

    /// Settings for the native binary: `flowdo.json` in the working
    /// directory plus the environment override. Errors fall back to the
    /// defaults.
    pub fn from_environment() -> Self {
        let path = Path::new(CONFIG_FILE);
        let config = match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default settings");
                Self::default()
            }
        };
        let config =
            config.with_api_key_override(std::env::var(API_KEY_ENV).ok());
        info!(
            demo_ai = config.ai.uses_demo(),
            state = %config.storage.path.display(),
            "settings loaded"
        );
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", true)]
    #[case("   ", true)]
    #[case("demo", true)]
    #[case("sk-123", false)]
    fn test_demo_key_detection(#[case] key: &str, #[case] demo: bool) {
        let ai = AiConfig {
            api_key: key.to_string(),
        };
        assert_eq!(ai.uses_demo(), demo);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "ai": { "api_key": "k" }, "canvas": { "pan_threshold": 2.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.ai.api_key, "k");
        assert_eq!(config.canvas.pan_threshold, 2.0);
        assert_eq!(config.canvas.node_drag_threshold, 8.0);
        assert_eq!(config.storage.debounce_ms, 200);
    }

    #[test]
    fn test_env_override_ignores_blank() {
        let base = AppConfig::default().with_api_key_override(Some("a".into()));
        assert_eq!(base.ai.api_key, "a");
        let kept = base.clone().with_api_key_override(Some("  ".into()));
        assert_eq!(kept.ai.api_key, "a");
        assert_eq!(kept.with_api_key_override(None).ai.api_key, "a");
    }

    #[test]
    fn test_load_missing_and_round_trip() {
        let dir = std::env::temp_dir();
        let missing = dir.join("flowdo_config_missing_test.json");
        std::fs::remove_file(&missing).ok();
        assert_eq!(AppConfig::load(&missing).unwrap(), AppConfig::default());

        let path = dir.join("flowdo_config_round_trip_test.json");
        let mut config = AppConfig::default();
        config.ai.api_key = "xyz".into();
        config.storage.debounce_ms = 50;
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_reversed_zoom_bounds() {
        let path = std::env::temp_dir().join("flowdo_config_zoom_bounds_test.json");
        std::fs::write(&path, r#"{ "canvas": { "zoom": { "max": 0.1 } } }"#).unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::ZoomBounds { max, .. }) if max == 0.1
        ));
        std::fs::remove_file(&path).ok();
    }
}
