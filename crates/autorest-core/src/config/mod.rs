//! Configuration types for autorest.
//!
//! All settings live in one TOML file (`autorest.toml` by default):
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [upstream]
//! database_url_env = "DATABASE_URL"
//!
//! [access]
//! allowed_schemas = ["sales"]
//! excluded_tables = ["sales.audit_log"]
//!
//! [pagination]
//! default_page_size = 100
//! max_page_size = 1000
//!
//! [auth]
//! tokens = [{ token_env = "AUTOREST_TOKEN", identity = "grid-ui" }]
//! ```

pub mod access;
pub mod auth;
pub mod server;
pub mod upstream;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use access::AccessConfig;
pub use auth::{AuthConfig, StaticToken};
pub use server::{CatalogConfig, PAGE_SIZE_LIMIT, PaginationConfig, ServerConfig};
pub use upstream::{ConnectionPoolConfig, SslMode, UpstreamConfig};

/// Complete autorest configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Postgres connection.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Which discovered schemas and tables are exposed.
    #[serde(default)]
    pub access: AccessConfig,

    /// Page size defaults and cap.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Catalog discovery behavior.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Bearer token gate.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pagination;
        if p.max_page_size == 0 || p.max_page_size > PAGE_SIZE_LIMIT {
            return Err(ConfigError::Config(format!(
                "pagination.max_page_size must be between 1 and {}",
                PAGE_SIZE_LIMIT
            )));
        }
        if p.default_page_size == 0 || p.default_page_size > p.max_page_size {
            return Err(ConfigError::Config(format!(
                "pagination.default_page_size must be between 1 and {}",
                p.max_page_size
            )));
        }
        for (i, token) in self.auth.tokens.iter().enumerate() {
            if token.token.is_none() && token.token_env.is_none() {
                return Err(ConfigError::Config(format!(
                    "auth.tokens[{}] needs either `token` or `token_env`",
                    i
                )));
            }
        }
        Ok(())
    }
}
