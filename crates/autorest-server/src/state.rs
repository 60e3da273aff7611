use crate::middleware::{Authenticator, StaticTokenAuthenticator};
use anyhow::Context;
use autorest_adapter_pg::PgAdapter;
use autorest_catalog::SchemaCatalog;
use autorest_core::AppConfig;
use autorest_policy::AccessPolicy;
use autorest_runtime::Engine;
use std::sync::Arc;

/// Shared state handed to every handler.
pub struct AppState {
    pub engine: Engine,
    /// `None` leaves `/api` open.
    pub authenticator: Option<Arc<dyn Authenticator>>,
}

impl AppState {
    pub fn new(engine: Engine, authenticator: Option<Arc<dyn Authenticator>>) -> Self {
        Self {
            engine,
            authenticator,
        }
    }
}

/// Connect to PostgreSQL and wire the engine described by `cfg`.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<Arc<AppState>> {
    let adapter = PgAdapter::connect(&cfg.upstream)
        .await
        .with_context(|| format!("failed to connect to {}", cfg.upstream.display_target()))?;
    tracing::info!(
        upstream = %cfg.upstream.display_target(),
        max_connections = cfg.upstream.pool.max_connections,
        "Connected to upstream database"
    );

    let catalog = Arc::new(SchemaCatalog::new(Arc::new(adapter.metadata_source())));
    let policy = AccessPolicy::from_config(&cfg.access);
    let engine = Engine::new(catalog, policy, Arc::new(adapter), cfg.pagination);

    if cfg.catalog.eager {
        let exposed = engine
            .exposed_tables()
            .await
            .context("initial schema discovery failed")?;
        tracing::info!(tables = exposed.len(), "Schema discovery complete");
    }

    Ok(Arc::new(AppState::new(engine, build_authenticator(cfg)?)))
}

fn build_authenticator(cfg: &AppConfig) -> anyhow::Result<Option<Arc<dyn Authenticator>>> {
    if !cfg.auth.enabled {
        tracing::warn!("Bearer authentication is disabled; /api is open");
        return Ok(None);
    }
    let authenticator = StaticTokenAuthenticator::from_config(&cfg.auth);
    if authenticator.is_empty() {
        anyhow::bail!(
            "auth is enabled but no token resolved; configure [auth].tokens or set [auth] enabled = false"
        );
    }
    tracing::info!(tokens = authenticator.len(), "Bearer authentication enabled");
    Ok(Some(Arc::new(authenticator)))
}
