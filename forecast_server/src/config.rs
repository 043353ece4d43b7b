//! Server configuration read from the environment

use forecast_eval::{ForecastError, StrategyConfig};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATA_DIR: &str = "./data";

/// Settings for one server process
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding one `<table>.csv` per table
    pub data_dir: PathBuf,
    /// Per-strategy budget during evaluation
    pub strategy_timeout: Option<Duration>,
    pub strategies: StrategyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            strategy_timeout: None,
            strategies: StrategyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `DATA_DIR`, `STRATEGY_TIMEOUT_SECS`,
    /// `STRATEGY_CONFIG` and `MAX_HORIZON`, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, ForecastError> {
        // Load .env file (optional - won't fail if missing)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForecastError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ForecastError::Config(format!("PORT must be a valid number, got '{}'", port)))?;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("STRATEGY_TIMEOUT_SECS") {
            let secs: f64 = secs.trim().parse().map_err(|_| {
                ForecastError::Config(format!("STRATEGY_TIMEOUT_SECS must be a number, got '{}'", secs))
            })?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ForecastError::Config(
                    "STRATEGY_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.strategy_timeout = Some(Duration::from_secs_f64(secs));
        }
        if let Some(path) = lookup("STRATEGY_CONFIG") {
            config.strategies = StrategyConfig::from_json_file(path)?;
        }
        if let Some(max) = lookup("MAX_HORIZON") {
            config.strategies.max_horizon = max
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|max| *max > 0)
                .ok_or_else(|| ForecastError::Config(format!("MAX_HORIZON must be a positive integer, got '{}'", max)))?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> Result<SocketAddr, ForecastError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ForecastError::Config(format!("Invalid HOST:PORT configuration {}:{}", self.host, self.port)))
    }
}
