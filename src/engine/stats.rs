// Live statistics aggregation — page fetches, merge outcomes, bulk lookups.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub pages_fetched: u64,
    pub entities_merged: u64,
    pub duplicates_dropped: u64,
    pub lookups_resolved: u64,
    pub lookups_failed: u64,
    pub requests_superseded: u64,
    pub inflight_requests: u32,
}

pub struct StatsCollector {
    pages_fetched: AtomicU64,
    entities_merged: AtomicU64,
    duplicates_dropped: AtomicU64,
    lookups_resolved: AtomicU64,
    lookups_failed: AtomicU64,
    requests_superseded: AtomicU64,
    inflight_requests: AtomicU32,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            pages_fetched: AtomicU64::new(0),
            entities_merged: AtomicU64::new(0),
            duplicates_dropped: AtomicU64::new(0),
            lookups_resolved: AtomicU64::new(0),
            lookups_failed: AtomicU64::new(0),
            requests_superseded: AtomicU64::new(0),
            inflight_requests: AtomicU32::new(0),
        }
    }

    /// Record an applied page: `merged` entries were added to the sequence,
    /// `duplicates` were dropped by the merge.
    pub fn record_page(&self, merged: u64, duplicates: u64) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.entities_merged.fetch_add(merged, Ordering::Relaxed);
        self.duplicates_dropped
            .fetch_add(duplicates, Ordering::Relaxed);
    }

    /// Record a completed bulk resolution: `resolved` lookups produced an
    /// entity, `failed` were dropped (error or missing id).
    pub fn record_lookups(&self, resolved: u64, failed: u64) {
        self.lookups_resolved.fetch_add(resolved, Ordering::Relaxed);
        self.lookups_failed.fetch_add(failed, Ordering::Relaxed);
    }

    /// Record a completion dropped because a newer request superseded it.
    pub fn record_superseded(&self) {
        self.requests_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn begin_request(&self) {
        self.inflight_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn end_request(&self) {
        self.inflight_requests.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            entities_merged: self.entities_merged.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            lookups_resolved: self.lookups_resolved.load(Ordering::Relaxed),
            lookups_failed: self.lookups_failed.load(Ordering::Relaxed),
            requests_superseded: self.requests_superseded.load(Ordering::Relaxed),
            inflight_requests: self.inflight_requests.load(Ordering::Relaxed),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
