use std::{fs, path::Path};

use serde::Deserialize;

use crate::{Result, StateflowError, projection::DEFAULT_CANVAS_SIZE};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// store config
    pub store: StoreConfig,
    /// canvas config
    pub canvas: CanvasConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// store type
    pub store_type: StoreType,
    /// http store config, required when `store_type = "http"`
    pub http: Option<HttpConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    #[default]
    Mem,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// store root, e.g. `http://localhost:8080`
    pub base_url: String,
    /// request timeout in milliseconds, defaults to 5000
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// width of the region unplaced states are drawn in
    pub width: f64,
    /// height of the region unplaced states are drawn in
    pub height: f64,
    /// placement seed, random when absent
    pub seed: Option<u64>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_SIZE,
            height: DEFAULT_CANVAS_SIZE,
            seed: None,
        }
    }
}

fn default_timeout() -> u64 {
    5000
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| StateflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        if config.canvas.width <= 0.0 || config.canvas.height <= 0.0 {
            return Err(StateflowError::Config(format!("canvas must have a positive size, got {}x{}", config.canvas.width, config.canvas.height)));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use crate::{Config, ErrorKind, StoreType};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        [store]
        store_type = "http"

        [store.http]
        base_url = "http://localhost:8080"

        [canvas]
        width = 800.0
        seed = 7
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.store.store_type, StoreType::Http);
        let http = config.store.http.unwrap();
        assert_eq!(http.base_url, "http://localhost:8080");
        assert_eq!(http.timeout, 5000);
        assert_eq!(config.canvas.width, 800.0);
        assert_eq!(config.canvas.height, 500.0);
        assert_eq!(config.canvas.seed, Some(7));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.store.store_type, StoreType::Mem);
        assert!(config.store.http.is_none());
        assert_eq!(config.canvas.width, 500.0);
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::load_from_str("[store]\nstore_type = \"postgres\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = Config::load_from_str("[canvas]\nwidth = 0.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        assert!(Config::create("/nonexistent/stateflow.toml").is_err());
    }
}
