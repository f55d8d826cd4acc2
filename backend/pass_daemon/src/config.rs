//! Application configuration loaded from environment variables.

use std::net::IpAddr;

use crate::errors::{DaemonError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Interface to bind; loopback unless explicitly overridden
    pub bind_addr: IpAddr,
    /// Port for the REST API server
    pub api_port: u16,
    /// Analytics collector endpoint. Events stay in the outbox when unset.
    pub analytics_url: Option<String>,
    /// How often (in seconds) to drain the outbox
    pub dispatch_interval_secs: u64,
    /// Maximum number of outbox rows sent per tick
    pub dispatch_batch_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./creator_pass.db".to_string()),
            bind_addr: env_var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1".to_string())
                .parse()
                .map_err(|_| DaemonError::Config("Invalid BIND_ADDR".to_string()))?,
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| DaemonError::Config("Invalid API_PORT".to_string()))?,
            analytics_url: env_var("ANALYTICS_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            dispatch_interval_secs: env_var("DISPATCH_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| DaemonError::Config("Invalid DISPATCH_INTERVAL_SECS".to_string()))?,
            dispatch_batch_size: env_var("DISPATCH_BATCH_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| DaemonError::Config("Invalid DISPATCH_BATCH_SIZE".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| DaemonError::Config(format!("Missing env var: {key}")))
}
