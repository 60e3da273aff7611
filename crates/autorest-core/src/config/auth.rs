//! Bearer token configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the bearer-token gate in front of `/api`.
///
/// Enabled unless turned off explicitly; startup fails when no token
/// resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether requests must carry a known bearer token.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Accepted tokens and the identity each one maps to.
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

fn default_enabled() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tokens: Vec::new(),
        }
    }
}

/// A single accepted bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    /// Token value (or use `token_env`).
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable containing the token.
    #[serde(default)]
    pub token_env: Option<String>,

    /// Identity reported for requests carrying this token.
    pub identity: String,
}

impl StaticToken {
    /// Get the token, checking token_env first.
    pub fn resolve(&self) -> Option<String> {
        if let Some(env_var) = &self.token_env
            && let Ok(token) = std::env::var(env_var)
            && !token.is_empty()
        {
            return Some(token);
        }
        self.token.clone().filter(|t| !t.is_empty())
    }
}
