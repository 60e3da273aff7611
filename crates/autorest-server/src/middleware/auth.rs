use crate::error::ApiError;
use crate::state::AppState;
use async_trait::async_trait;
use autorest_core::AuthConfig;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Caller resolved from a bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

/// Resolves bearer tokens to identities.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Option<Identity>;
}

/// Tokens listed in `[auth]`.
#[derive(Debug, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenAuthenticator {
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut tokens = HashMap::new();
        for entry in &config.tokens {
            match entry.resolve() {
                Some(token) => {
                    tokens.insert(
                        token,
                        Identity {
                            name: entry.identity.clone(),
                        },
                    );
                }
                None => tracing::warn!(
                    identity = %entry.identity,
                    token_env = entry.token_env.as_deref().unwrap_or(""),
                    "Token for identity did not resolve; skipping"
                ),
            }
        }
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).cloned()
    }
}

/// Axum middleware gating `/api`.
///
/// Passes through when no authenticator is configured. Otherwise the
/// request needs `Authorization: Bearer <token>` with a known token; the
/// resolved [`Identity`] is stored in the request extensions.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(authenticator) = state.authenticator.as_ref() else {
        return Ok(next.run(req).await);
    };

    let token = extract_bearer(req.headers()).ok_or(ApiError::Unauthorized)?;
    let identity = authenticator
        .authenticate(&token)
        .await
        .ok_or(ApiError::Unauthorized)?;

    tracing::debug!(identity = %identity.name, "Authenticated request");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
