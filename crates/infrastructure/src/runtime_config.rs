use std::env;

use flowtrail_core::{AppError, AppResult};
use tracing::debug;

/// Runtime configuration for the change log adapters, loaded from the
/// environment.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Redis connection string; absent means the in-memory cache is used.
    pub redis_url: Option<String>,
    /// Base URL of the identity service used for name lookups.
    pub directory_url: String,
    /// TTL for cached log pages, seconds.
    pub log_page_ttl_seconds: u32,
    /// TTL for cached statistics, seconds.
    pub stats_ttl_seconds: u32,
}

impl RuntimeConfig {
    /// Loads configuration from the process environment, reading a local
    /// `.env` file first when present.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = required_env("DATABASE_URL")?;
        let redis_url = env::var("REDIS_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        if redis_url.is_none() {
            debug!("REDIS_URL not set, the in-memory cache will be used");
        }
        let directory_url =
            env::var("DIRECTORY_URL").unwrap_or_else(|_| "http://localhost:3002".to_owned());

        let log_page_ttl_seconds = env_u32("LOG_PAGE_TTL_SECONDS", 900)?;
        let stats_ttl_seconds = env_u32("STATS_TTL_SECONDS", 1800)?;

        Ok(Self {
            database_url,
            redis_url,
            directory_url,
            log_page_ttl_seconds,
            stats_ttl_seconds,
        })
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u32>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        Err(_) => Ok(default),
    }
}
