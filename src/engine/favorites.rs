// Bulk favorites resolution — independent per-id lookups joined at completion.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::stats::{StatsCollector, StatsSnapshot};
use crate::source::traits::{Character, CharacterSource};

/// Coordinator-facing view of the favorites state.
#[derive(Debug, Clone)]
pub struct FavoritesSnapshot {
    pub entries: Vec<Character>,
    pub loading: bool,
    pub error: Option<String>,
}

struct FavoritesState {
    /// Last identifier snapshot given to the engine; `None` until the first
    /// `set_ids` so an initial empty set still applies.
    ids: Option<Vec<String>>,
    entries: Vec<Character>,
    loading: bool,
    last_error: Option<String>,
    generation: u64,
}

pub struct FavoritesEngine {
    source: Arc<dyn CharacterSource>,
    stats: Arc<StatsCollector>,
    state: Mutex<FavoritesState>,
    shutdown_token: CancellationToken,
}

impl FavoritesEngine {
    pub fn new(source: Arc<dyn CharacterSource>) -> Self {
        Self {
            source,
            stats: Arc::new(StatsCollector::new()),
            state: Mutex::new(FavoritesState {
                ids: None,
                entries: Vec::new(),
                loading: false,
                last_error: None,
                generation: 0,
            }),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Resolve a new identifier snapshot.
    ///
    /// An unchanged snapshot is a no-op. A changed one replaces the whole
    /// operation: any outstanding resolution is superseded, and an empty set
    /// resolves immediately without touching the transport.
    pub async fn set_ids(&self, ids: Vec<String>) {
        if self.shutdown_token.is_cancelled() {
            return;
        }

        let generation = {
            let mut state = self.state.lock();
            if state.ids.as_ref() == Some(&ids) {
                debug!("favorites snapshot unchanged, skipping resolve");
                return;
            }
            state.ids = Some(ids.clone());
            state.generation += 1;
            if ids.is_empty() {
                state.entries.clear();
                state.loading = false;
                state.last_error = None;
                return;
            }
            state.loading = true;
            state.last_error = None;
            state.generation
        };

        self.run_resolve(ids, generation).await;
    }

    /// Re-resolve the stored snapshot. Already-resolved entries stay in
    /// place until the new resolution lands.
    pub async fn retry(&self) {
        if self.shutdown_token.is_cancelled() {
            return;
        }

        let (ids, generation) = {
            let mut state = self.state.lock();
            let Some(ids) = state.ids.clone() else {
                return;
            };
            if ids.is_empty() {
                return;
            }
            state.loading = true;
            state.last_error = None;
            state.generation += 1;
            (ids, state.generation)
        };

        self.run_resolve(ids, generation).await;
    }

    async fn run_resolve(&self, ids: Vec<String>, generation: u64) {
        self.stats.begin_request();
        let lookups = ids.iter().map(|id| {
            let source = Arc::clone(&self.source);
            async move {
                // Individual failures degrade to omission: a favorite
                // pointing at a deleted entity must not fail the whole view.
                match source.fetch_by_id(id).await {
                    Ok(Some(character)) => Some(character),
                    Ok(None) => {
                        debug!("favorite {} no longer resolves, omitting", id);
                        None
                    }
                    Err(e) => {
                        debug!("favorite {} lookup failed: {}", id, e);
                        None
                    }
                }
            }
        });
        let resolved: Vec<Character> = join_all(lookups).await.into_iter().flatten().collect();
        self.stats.end_request();

        let mut state = self.state.lock();
        if state.generation != generation {
            self.stats.record_superseded();
            debug!("dropping superseded favorites resolution");
            return;
        }
        if self.shutdown_token.is_cancelled() {
            return;
        }

        self.stats.record_lookups(
            resolved.len() as u64,
            (ids.len() - resolved.len()) as u64,
        );
        debug!("resolved {} of {} favorites", resolved.len(), ids.len());
        state.entries = resolved;
        state.loading = false;
        state.last_error = None;
    }

    pub fn snapshot(&self) -> FavoritesSnapshot {
        let state = self.state.lock();
        FavoritesSnapshot {
            entries: state.entries.clone(),
            loading: state.loading,
            error: state.last_error.clone(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop applying results: in-flight completions are dropped and no new
    /// resolutions dispatch.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

impl Drop for FavoritesEngine {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
