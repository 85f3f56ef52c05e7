// src/core/cache.rs

//! In-memory cache of finished reports, keyed by normalized target URL.

use crate::core::models::ScanReport;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedReport {
    report: ScanReport,
    cached_at: DateTime<Utc>,
}

/// Thread-safe report cache. `ttl: None` keeps entries for the lifetime of the
/// process.
#[derive(Debug)]
pub struct ReportCache {
    entries: RwLock<HashMap<String, CachedReport>>,
    ttl: Option<Duration>,
}

impl ReportCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns a fresh copy of the cached report for `key`, if one exists and
    /// has not expired. An expired entry is removed.
    pub fn get(&self, key: &str) -> Option<ScanReport> {
        {
            let entries = self.entries.read().ok()?;
            let cached = entries.get(key)?;
            if !self.is_expired(cached, Utc::now()) {
                return Some(cached.report.clone());
            }
        }
        debug!(key, "Cached report expired.");
        if let Ok(mut entries) = self.entries.write() {
            // Another writer may have refreshed the entry in between.
            if entries.get(key).is_some_and(|c| self.is_expired(c, Utc::now())) {
                entries.remove(key);
            }
        }
        None
    }

    /// Stores a report, sweeping expired entries first.
    pub fn insert(&self, key: String, report: ScanReport) {
        let purged = self.purge_expired();
        if purged > 0 {
            debug!(purged, "Purged expired cached reports.");
        }
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                CachedReport {
                    report,
                    cached_at: Utc::now(),
                },
            );
        }
    }

    /// Drops expired entries and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, cached| !self.is_expired(cached, now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, cached: &CachedReport, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now - cached.cached_at >= ttl,
            None => false,
        }
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(None)
    }
}
