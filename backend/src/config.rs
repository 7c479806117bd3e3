use anyhow::{Context, Result};
use std::env;
use std::num::NonZeroUsize;

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub port: u16,
    pub workers: Option<NonZeroUsize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match var("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {port}"))?,
            None => 8080,
        };
        let workers = match var("HTTP_WORKERS") {
            Some(n) => Some(
                n.parse::<NonZeroUsize>()
                    .with_context(|| format!("HTTP_WORKERS is not a positive number: {n}"))?,
            ),
            None => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "weather.db".to_string()),
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            workers,
        })
    }
}
