//! Configuration management for StockCount
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with STOCKCOUNT_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// External POS API configuration
    pub pos: PosConfig,

    /// Report tuning knobs
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying bearer tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PosConfig {
    /// POS API base URL
    pub base_url: String,

    /// Credential triple for the authentication endpoint
    pub access_type: String,
    pub client_id: String,
    pub client_secret: String,

    /// Rows per bulk-orders page
    pub page_size: u32,

    /// Delay between page requests, in milliseconds
    pub page_delay_ms: u64,

    /// Hard ceiling on pages fetched for one business date
    pub max_pages: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Flag the store when the latest count is older than this many days
    pub stale_after_days: i64,

    /// Trailing window length for the item detail view
    pub detail_window_days: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STOCKCOUNT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("pos.page_size", 100)?
            .set_default("pos.page_delay_ms", 200)?
            .set_default("pos.max_pages", 50)?
            .set_default("report.stale_after_days", 2)?
            .set_default("report.detail_window_days", 7)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STOCKCOUNT_ prefix)
            .add_source(
                Environment::with_prefix("STOCKCOUNT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            host: "0.0.0.0".to_string(),
        }
    }
}
