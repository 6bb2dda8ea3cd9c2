use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub log_dir: String,
    pub leave_type_cache_ttl: Duration,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api/v1".to_string()),
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            leave_type_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "LEAVE_TYPE_CACHE_TTL_SECS",
                300,
            )?),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
