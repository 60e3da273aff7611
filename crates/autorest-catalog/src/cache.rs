//! Single-flight catalog cache.

use crate::MetadataSource;
use crate::description::TableDescription;
use crate::snapshot::{CatalogSnapshot, TableRef};
use autorest_core::EngineError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<CatalogSnapshot>>,
    descriptions: HashMap<TableRef, Arc<TableDescription>>,
    /// Bumped on every invalidate/refresh so a load that started earlier
    /// cannot repopulate a cleared cache.
    generation: u64,
    /// Number of finished discovery attempts.
    attempts: u64,
    /// Error of the most recent attempt, tagged with its attempt number.
    last_failure: Option<(u64, String)>,
}

/// Owns the cached [`CatalogSnapshot`] and per-table column lists.
///
/// Reads take a short `RwLock` read guard and never wait on I/O. The refresh
/// path is serialized by an async mutex, so concurrent callers that find no
/// snapshot collapse onto a single metadata query and share its outcome,
/// including a failure. Failures are not cached beyond the callers that
/// were waiting on that attempt.
pub struct SchemaCatalog {
    source: Arc<dyn MetadataSource>,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
}

impl SchemaCatalog {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            state: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The cached snapshot, if discovery has run.
    pub fn current(&self) -> Option<Arc<CatalogSnapshot>> {
        self.read_state(|state| state.snapshot.clone())
    }

    /// Return the cached snapshot, running discovery if there is none.
    pub async fn discover(&self) -> Result<Arc<CatalogSnapshot>, EngineError> {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }

        let seen = self.read_state(|state| state.attempts);
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have finished discovery while we waited.
        let (current, failure) = self.read_state(|state| {
            let failure = match &state.last_failure {
                Some((attempt, message)) if *attempt > seen => Some(message.clone()),
                _ => None,
            };
            (state.snapshot.clone(), failure)
        });
        if let Some(snapshot) = current {
            debug!("Reusing catalog discovered by a concurrent caller");
            return Ok(snapshot);
        }
        if let Some(message) = failure {
            debug!("Reusing failure of a concurrent discovery attempt");
            return Err(EngineError::Discovery(message));
        }

        let generation = self.read_state(|state| state.generation);
        let result = self.load().await;
        self.write_state(|state| {
            state.attempts += 1;
            match &result {
                Ok(snapshot) if state.generation == generation => {
                    state.snapshot = Some(snapshot.clone());
                    state.last_failure = None;
                }
                Ok(_) => debug!("Catalog invalidated during discovery; result not cached"),
                Err(EngineError::Discovery(message)) => {
                    state.last_failure = Some((state.attempts, message.clone()));
                }
                Err(e) => state.last_failure = Some((state.attempts, e.to_string())),
            }
        });
        result
    }

    /// Re-query the metadata source and swap the new snapshot in.
    ///
    /// Readers keep seeing the previous snapshot until the swap. On failure
    /// the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<CatalogSnapshot>, EngineError> {
        let _guard = self.refresh_lock.lock().await;
        let snapshot = self.load().await?;
        self.write_state(|state| {
            state.snapshot = Some(snapshot.clone());
            state.descriptions.clear();
            state.generation += 1;
        });
        Ok(snapshot)
    }

    /// Drop the cached snapshot and column lists. The next
    /// [`discover`](Self::discover) re-queries.
    pub fn invalidate(&self) {
        self.write_state(|state| {
            state.snapshot = None;
            state.descriptions.clear();
            state.generation += 1;
        });
        info!("Catalog cache invalidated");
    }

    /// Columns of a resolved table, fetched once and cached.
    ///
    /// Returns `NotFound` when the table has no columns, which is how a table
    /// dropped since discovery shows up.
    pub async fn describe(&self, table: &TableRef) -> Result<Arc<TableDescription>, EngineError> {
        let (cached, generation) =
            self.read_state(|state| (state.descriptions.get(table).cloned(), state.generation));
        if let Some(desc) = cached {
            return Ok(desc);
        }

        let columns = self.source.describe_table(table).await.map_err(|e| {
            warn!(schema = table.schema(), table = table.table(), error = %e, "Column lookup failed");
            EngineError::Discovery(e.to_string())
        })?;
        if columns.is_empty() {
            return Err(EngineError::not_found(format!("Table {} not found", table)));
        }

        let desc = Arc::new(TableDescription::new(table.clone(), columns));
        self.write_state(|state| {
            if state.generation == generation {
                state.descriptions.insert(table.clone(), desc.clone());
            }
        });
        Ok(desc)
    }

    async fn load(&self) -> Result<Arc<CatalogSnapshot>, EngineError> {
        let entries = self.source.list_tables().await.map_err(|e| {
            warn!(error = %e, "Schema discovery failed");
            EngineError::Discovery(e.to_string())
        })?;
        let raw = entries.len();
        let snapshot = CatalogSnapshot::from_entries(entries);
        info!(
            tables = snapshot.len(),
            filtered = raw.saturating_sub(snapshot.len()),
            "Discovered database catalog"
        );
        Ok(Arc::new(snapshot))
    }

    fn read_state<T>(&self, f: impl FnOnce(&CacheState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write_state<T>(&self, f: impl FnOnce(&mut CacheState) -> T) -> T {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
