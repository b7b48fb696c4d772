use std::{env, fmt::Display, str::FromStr};

use anyhow::Context;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub client_origins: Vec<String>,
    pub session_inactivity_days: i64,
}

impl Config {
    /// Reads the environment, after loading `.env` if there is one.
    pub fn load() -> anyhow::Result<Self> {
        if dotenv::dotenv().is_err() {
            info!("no .env file, reading the process environment only");
        }

        Ok(Self {
            port: try_load("PORT", "5001")?,
            database_url: try_load("DATABASE_URL", "sqlite://tandem.db")?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "16")?,
            client_origins: try_load::<String>("CLIENT_ORIGINS", "http://localhost:5173,http://localhost:5174")?
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            session_inactivity_days: try_load("SESSION_INACTIVITY_DAYS", "7")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow::anyhow!("{e}")
        })
        .with_context(|| format!("environment misconfigured: {key}"))
}
