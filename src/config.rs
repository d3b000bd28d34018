//! Environment-driven configuration (spec §6.1, §9.3).
//!
//! Loaded once per process via [`Config::from_env`]. Nothing else in this
//! crate reads `std::env` directly — every binary constructs the subset of
//! `Config` it needs and fails fast if a required variable is absent, so
//! missing credentials surface before any work is accepted.

use crate::error::PipelineError;

/// Default opening-range duration in seconds (`D` in spec §3/§4.1).
pub const DEFAULT_OPENING_RANGE_SECONDS: i64 = 30;

/// Default width of the intraday query window, 6.5 trading hours.
pub const DEFAULT_MARKET_OPEN_DURATION_SECONDS: i64 = 23_400;

fn env_var(key: &str) -> Result<String, PipelineError> {
    std::env::var(key).map_err(|_| PipelineError::ConfigAbsent(key.to_string()))
}

fn env_var_or(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Redis broker/cache connection settings (§6.1, §6.3).
///
/// | Env Var | Default | Purpose |
/// |---|---|---|
/// | `REDIS_ENDPOINT` | (required) | Broker/cache host, port fixed at 6379 |
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub endpoint: String,
}

impl RedisConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            endpoint: env_var("REDIS_ENDPOINT")?,
        })
    }

    /// Connection URL for the given logical database index (§6.3).
    pub fn url(&self, db: u8) -> String {
        format!("redis://{}:6379/{db}", self.endpoint)
    }
}

/// Durable-store credentials (§6.1, §6.4). Absence is fatal at reaper
/// startup and must surface before any work is attempted (§4.6, §7).
///
/// | Env Var | Purpose |
/// |---|---|
/// | `DB_USERNAME` | durable store user |
/// | `DB_PASSWORD` | durable store password |
/// | `DB_ENDPOINT` | durable store host |
/// | `DB_NAME` | durable store schema/database name |
/// | `DB_TABLE` | durable store results table name |
#[derive(Debug, Clone)]
pub struct DurableStoreConfig {
    pub username: String,
    pub password: String,
    pub endpoint: String,
    pub database: String,
    pub table: String,
}

impl DurableStoreConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            username: env_var("DB_USERNAME")?,
            password: env_var("DB_PASSWORD")?,
            endpoint: env_var("DB_ENDPOINT")?,
            database: env_var("DB_NAME")?,
            table: env_var("DB_TABLE")?,
        })
    }

    pub fn connection_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}/{}",
            self.username, self.password, self.endpoint, self.database
        )
    }
}

/// Historical warehouse connection settings (§6.5).
///
/// | Env Var | Purpose |
/// |---|---|
/// | `WAREHOUSE_URL` | connection string for the read-only historical store |
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub url: String,
}

impl WarehouseConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            url: env_var("WAREHOUSE_URL")?,
        })
    }
}

/// Parameters governing the data-preparation stage (§4.1).
///
/// | Env Var | Default | Purpose |
/// |---|---|---|
/// | `OPENING_RANGE_SECONDS` | 30 | Opening-range duration `D` |
/// | `MARKET_OPEN_DURATION_SECONDS` | 23400 | Width of the intraday query window |
#[derive(Debug, Clone, Copy)]
pub struct PrepConfig {
    pub opening_range_seconds: i64,
    pub market_open_duration_seconds: i64,
}

impl PrepConfig {
    pub fn from_env() -> Self {
        Self {
            opening_range_seconds: env_var_or(
                "OPENING_RANGE_SECONDS",
                DEFAULT_OPENING_RANGE_SECONDS,
            ),
            market_open_duration_seconds: env_var_or(
                "MARKET_OPEN_DURATION_SECONDS",
                DEFAULT_MARKET_OPEN_DURATION_SECONDS,
            ),
        }
    }
}

/// Load a `.env` file if present; missing `.env` is not an error. Call once
/// at the top of `main`, before any `Config`/`*Config::from_env` call.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Initialize the global `tracing` subscriber (§9.2). Writes to stderr so
/// stdout stays free for any piped tool output; defaults to `info` when
/// `RUST_LOG` is unset.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn redis_config_requires_endpoint() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("REDIS_ENDPOINT");
        assert!(RedisConfig::from_env().is_err());

        std::env::set_var("REDIS_ENDPOINT", "cache.example.internal");
        let cfg = RedisConfig::from_env().unwrap();
        assert_eq!(cfg.url(1), "redis://cache.example.internal:6379/1");
        std::env::remove_var("REDIS_ENDPOINT");
    }

    #[test]
    fn durable_store_config_is_fatal_when_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        for key in ["DB_USERNAME", "DB_PASSWORD", "DB_ENDPOINT", "DB_NAME", "DB_TABLE"] {
            std::env::remove_var(key);
        }
        assert!(DurableStoreConfig::from_env().is_err());
    }

    #[test]
    fn prep_config_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("OPENING_RANGE_SECONDS");
        std::env::remove_var("MARKET_OPEN_DURATION_SECONDS");
        let cfg = PrepConfig::from_env();
        assert_eq!(cfg.opening_range_seconds, DEFAULT_OPENING_RANGE_SECONDS);
        assert_eq!(
            cfg.market_open_duration_seconds,
            DEFAULT_MARKET_OPEN_DURATION_SECONDS
        );
    }
}
