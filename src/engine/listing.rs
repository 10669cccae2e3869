// Paged listing state machine — accumulates filtered catalog pages.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::merge::merge_dedup;
use super::stats::{StatsCollector, StatsSnapshot};
use crate::source::traits::{Character, CharacterSource, Criteria};

/// Coordinator-facing view of the listing state.
#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    pub entries: Vec<Character>,
    /// Current 1-based page number. Never decreases while the criteria is
    /// unchanged; resets to 1 on any criteria change.
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

struct ListingState {
    criteria: Option<Criteria>,
    entries: Vec<Character>,
    /// Number of pages applied under the current criteria. The next fetch
    /// always targets `pages_applied + 1`, so a failed page is retried at
    /// the same position.
    pages_applied: u32,
    has_more: bool,
    loading: bool,
    last_error: Option<String>,
    /// Supersession token: every dispatch bumps this and a completion is
    /// applied only if its minted value is still current.
    generation: u64,
}

pub struct ListingEngine {
    source: Arc<dyn CharacterSource>,
    stats: Arc<StatsCollector>,
    state: Mutex<ListingState>,
    shutdown_token: CancellationToken,
}

impl ListingEngine {
    pub fn new(source: Arc<dyn CharacterSource>) -> Self {
        Self {
            source,
            stats: Arc::new(StatsCollector::new()),
            state: Mutex::new(ListingState {
                criteria: None,
                entries: Vec::new(),
                pages_applied: 0,
                has_more: true,
                loading: false,
                last_error: None,
                generation: 0,
            }),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Establish new filter criteria.
    ///
    /// Structurally identical criteria are a no-op: no fetch, no reset.
    /// A change clears the accumulated sequence, resets the cursor to page 1
    /// and fetches the first page under the new criteria; any response still
    /// in flight for the old criteria is discarded on arrival.
    pub async fn set_criteria(&self, criteria: Criteria) {
        if self.shutdown_token.is_cancelled() {
            return;
        }

        let generation = {
            let mut state = self.state.lock();
            if state.criteria.as_ref() == Some(&criteria) {
                debug!("criteria unchanged, skipping fetch");
                return;
            }
            state.criteria = Some(criteria.clone());
            state.entries.clear();
            state.pages_applied = 0;
            state.has_more = true;
            state.last_error = None;
            state.loading = true;
            state.generation += 1;
            state.generation
        };

        self.run_page_fetch(criteria, 1, generation).await;
    }

    /// Fetch the next page under the current criteria.
    ///
    /// No-op while a fetch is in flight, before any criteria is set, or once
    /// the backend has signalled the last page. After a failure the page
    /// counter was never advanced, so the same page is re-issued.
    pub async fn load_next_page(&self) {
        if self.shutdown_token.is_cancelled() {
            return;
        }

        let (criteria, target, generation) = {
            let mut state = self.state.lock();
            if state.loading {
                return;
            }
            let Some(criteria) = state.criteria.clone() else {
                debug!("load_next_page before criteria established");
                return;
            };
            let retrying = state.last_error.is_some();
            if !retrying && !state.has_more {
                return;
            }
            state.last_error = None;
            state.loading = true;
            state.generation += 1;
            (criteria, state.pages_applied + 1, state.generation)
        };

        self.run_page_fetch(criteria, target, generation).await;
    }

    /// Re-issue the operation that failed. No-op when no error is pending.
    pub async fn retry(&self) {
        let pending = self.state.lock().last_error.is_some();
        if !pending {
            return;
        }
        self.load_next_page().await;
    }

    async fn run_page_fetch(&self, criteria: Criteria, target: u32, generation: u64) {
        self.stats.begin_request();
        let result = self.source.fetch_page(&criteria, target).await;
        self.stats.end_request();

        let mut state = self.state.lock();
        if state.generation != generation {
            self.stats.record_superseded();
            debug!("dropping superseded response for page {}", target);
            return;
        }
        if self.shutdown_token.is_cancelled() {
            return;
        }

        match result {
            Ok(page) => {
                let incoming = page.results.len();
                state.has_more = page.info.next.is_some();
                if target == 1 {
                    // Reset path: the first page replaces the sequence.
                    state.entries = page.results;
                    self.stats.record_page(state.entries.len() as u64, 0);
                } else {
                    let before = state.entries.len();
                    let existing = std::mem::take(&mut state.entries);
                    state.entries = merge_dedup(existing, page.results);
                    let appended = state.entries.len() - before;
                    self.stats
                        .record_page(appended as u64, (incoming - appended) as u64);
                }
                state.pages_applied = target;
                state.loading = false;
                state.last_error = None;
                debug!(
                    "applied page {}: {} incoming, {} accumulated, has_more={}",
                    target,
                    incoming,
                    state.entries.len(),
                    state.has_more
                );
            }
            Err(e) => {
                // Accumulated entries and the page counter stay untouched so
                // a retry resumes from the same page.
                state.loading = false;
                state.last_error = Some(e.to_string());
                warn!("page {} fetch failed: {}", target, e);
            }
        }
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        let state = self.state.lock();
        ListingSnapshot {
            entries: state.entries.clone(),
            page: state.pages_applied.max(1),
            has_more: state.has_more,
            loading: state.loading,
            error: state.last_error.clone(),
        }
    }

    pub fn criteria(&self) -> Option<Criteria> {
        self.state.lock().criteria.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop applying results: in-flight completions are dropped and no new
    /// fetches dispatch.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

impl Drop for ListingEngine {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
