// src/config.rs
use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheBackend {
    Memory,
    Redis,
    None,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            "none" | "off" => Ok(CacheBackend::None),
            other => bail!("unknown CACHE_BACKEND '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub portfolio_file: PathBuf,
    pub cache_backend: CacheBackend,
    pub cache_ttl: Duration,
    pub redis_url: String,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub quotes_only_when_market_open: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 3001,
            portfolio_file: PathBuf::from("config/portfolio.json"),
            cache_backend: CacheBackend::Memory,
            cache_ttl: Duration::from_secs(60),
            redis_url: "redis://localhost:6379".to_string(),
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
            quotes_only_when_market_open: false,
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv().ok()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let port = match lookup("PORT") {
            Some(v) => v.parse::<u16>().context("PORT must be a number")?,
            None => {
                warn!("$PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let portfolio_file = lookup("PORTFOLIO_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.portfolio_file);

        let cache_backend = match lookup("CACHE_BACKEND") {
            Some(v) => v.parse()?,
            None => defaults.cache_backend,
        };

        let cache_ttl = match lookup("CACHE_TTL_SECS") {
            Some(v) => Duration::from_secs(v.parse().context("CACHE_TTL_SECS must be a number")?),
            None => defaults.cache_ttl,
        };

        let redis_url = match lookup("REDIS_URL") {
            Some(url) => url,
            None => {
                let host = lookup("REDIS_HOST").unwrap_or_else(|| "localhost".to_string());
                let port: u16 = match lookup("REDIS_PORT") {
                    Some(v) => v.parse().context("REDIS_PORT must be a number")?,
                    None => 6379,
                };
                match lookup("REDIS_PASSWORD") {
                    Some(password) => format!("redis://:{}@{}:{}", password, host, port),
                    None => format!("redis://{}:{}", host, port),
                }
            }
        };

        let rate_limit_max = match lookup("RATE_LIMIT_MAX") {
            Some(v) => v.parse().context("RATE_LIMIT_MAX must be a number")?,
            None => defaults.rate_limit_max,
        };

        let rate_limit_window = match lookup("RATE_LIMIT_WINDOW_SECS") {
            Some(v) => {
                let secs: u64 = v.parse().context("RATE_LIMIT_WINDOW_SECS must be a number")?;
                if secs == 0 {
                    bail!("RATE_LIMIT_WINDOW_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => defaults.rate_limit_window,
        };

        let quotes_only_when_market_open = lookup("QUOTES_ONLY_WHEN_MARKET_OPEN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = AppConfig {
            port,
            portfolio_file,
            cache_backend,
            cache_ttl,
            redis_url,
            rate_limit_max,
            rate_limit_window,
            quotes_only_when_market_open,
        };
        info!(
            "Configuration loaded: port={}, portfolio={}, cache={:?} (ttl {:?}), rate limit {}/{:?}",
            config.port,
            config.portfolio_file.display(),
            config.cache_backend,
            config.cache_ttl,
            config.rate_limit_max,
            config.rate_limit_window
        );
        Ok(config)
    }
}
