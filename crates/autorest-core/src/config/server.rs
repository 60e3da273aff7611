//! Listener, pagination and catalog settings.

use serde::{Deserialize, Serialize};

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed by CORS. Empty disables the CORS layer.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Upper bound for `max_page_size`; no request can exceed it.
pub const PAGE_SIZE_LIMIT: u32 = 1000;

/// Page size defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when the request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Cap for requested page sizes, at most [`PAGE_SIZE_LIMIT`]. Larger
    /// requests are clamped to it.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_page_size() -> u32 {
    100
}

fn default_max_page_size() -> u32 {
    PAGE_SIZE_LIMIT
}

impl PaginationConfig {
    /// The cap actually applied to requests.
    pub fn effective_max(&self) -> u32 {
        self.max_page_size.min(PAGE_SIZE_LIMIT)
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Catalog discovery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Discover at startup instead of on the first request.
    #[serde(default)]
    pub eager: bool,
}
