use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::credentials::DEFAULT_REGION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub bedrock: BedrockConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn with_env_overrides(&self) -> Self {
        let bind_addr = env::var("PLUGIN_BIND_ADDR").unwrap_or_else(|_| self.bind_addr.clone());
        Self { bind_addr }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedrockConfig {
    pub default_region: String,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            default_region: DEFAULT_REGION.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:3000".to_string(),
            },
            cache: CacheConfig::default(),
            bedrock: BedrockConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| Self::default_config_path());
        let mut config = Self::load(Path::new(&config_path))?;
        config.server = config.server.with_env_overrides();
        Ok(config)
    }

    pub fn default_config_path() -> String {
        "./config.toml".to_string()
    }
}
