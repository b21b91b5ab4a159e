use std::path::Path;
use std::time::Duration;

use hearth_core::Placement;
use serde::Deserialize;

use crate::error::ManagerError;
use crate::loader::LoaderTiming;

#[derive(Debug, Default, Deserialize)]
pub struct HearthConfig {
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
}

#[derive(Debug, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}

#[derive(Debug, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_load_deadline_ms")]
    pub load_deadline_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            load_deadline_ms: default_load_deadline_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}
fn default_load_deadline_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "default_origin")]
    pub origin_x: f64,
    #[serde(default = "default_origin")]
    pub origin_y: f64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            origin_x: default_origin(),
            origin_y: default_origin(),
            jitter: default_jitter(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_origin() -> f64 {
    100.0
}
fn default_jitter() -> f64 {
    100.0
}
fn default_width() -> f64 {
    300.0
}
fn default_height() -> f64 {
    200.0
}

impl HearthConfig {
    pub fn from_file(path: &Path) -> Result<Self, ManagerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ManagerError::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| ManagerError::Config(format!("parse config: {e}")))
    }

    pub fn loader_timing(&self) -> LoaderTiming {
        LoaderTiming {
            poll_interval: Duration::from_millis(self.loader.poll_interval_ms),
            load_deadline: Duration::from_millis(self.loader.load_deadline_ms),
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            origin_x: self.placement.origin_x,
            origin_y: self.placement.origin_y,
            jitter: self.placement.jitter,
            width: self.placement.width,
            height: self.placement.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: HearthConfig = toml::from_str("").unwrap();
        assert_eq!(config.persistence.base_url, "http://localhost:8000");
        assert_eq!(config.loader.poll_interval_ms, 500);
        assert_eq!(config.loader.load_deadline_ms, 5000);
        assert_eq!(config.placement.width, 300.0);
    }

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
[persistence]
base_url = "http://dash.local:9000"

[loader]
poll_interval_ms = 250
load_deadline_ms = 2000

[placement]
origin_x = 40.0
origin_y = 60.0
jitter = 20.0
width = 400.0
height = 250.0
"#;
        let config: HearthConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.persistence.base_url, "http://dash.local:9000");

        let timing = config.loader_timing();
        assert_eq!(timing.poll_interval, Duration::from_millis(250));
        assert_eq!(timing.load_deadline, Duration::from_millis(2000));

        let placement = config.placement();
        assert_eq!(placement.origin_x, 40.0);
        assert_eq!(placement.height, 250.0);
    }

    #[test]
    fn from_file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hearth.toml");
        std::fs::write(&path, "[loader]\npoll_interval_ms = 100\n").unwrap();

        let config = HearthConfig::from_file(&path).unwrap();
        assert_eq!(config.loader.poll_interval_ms, 100);
        assert_eq!(config.loader.load_deadline_ms, 5000);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = HearthConfig::from_file(Path::new("/nonexistent/hearth.toml"));
        assert!(matches!(result, Err(ManagerError::Config(_))));
    }
}
