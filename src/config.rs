use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::errors::ConfigError;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ServerConfig {
    pub listen_ip: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub price_url: String,
    pub asset_id: String,
    pub currency: String,
    pub price_timeout_ms: u64,
    pub pools_url: String,
    pub pools_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn price_timeout(&self) -> Duration {
        Duration::from_millis(self.price_timeout_ms)
    }

    pub fn pools_timeout(&self) -> Duration {
        Duration::from_millis(self.pools_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            price_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            asset_id: "bitcoin".to_string(),
            currency: "usd".to_string(),
            price_timeout_ms: 5_000,
            pools_url: "https://mempool.space/api/v1/mining/pools/24h".to_string(),
            pools_timeout_ms: 10_000,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Reads the TOML config at `path`. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: AppConfig = toml::from_str(&config_str)?;
    Ok(config)
}
