//! Run statistics accumulator
//!
//! Every in-flight task updates the same accumulator, so counters are
//! atomic. The block flag is sticky: once a run observes a block it stays
//! reported as blocked.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Concurrency-safe statistics updated by every handler during a run
#[derive(Debug)]
pub struct RunStats {
    start_time: DateTime<Utc>,
    jobs_found: AtomicU64,
    jobs_scraped: AtomicU64,
    errors: AtomicU64,
    ip_blocked: AtomicBool,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            jobs_found: AtomicU64::new(0),
            jobs_scraped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            ip_blocked: AtomicBool::new(false),
        }
    }

    /// Adds listings observed on a search page.
    pub fn add_jobs_found(&self, count: u64) {
        self.jobs_found.fetch_add(count, Ordering::Relaxed);
    }

    /// Counts one persisted detail record.
    pub fn record_scraped(&self) {
        self.jobs_scraped.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one failed handler attempt.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Sticky: once set, the flag is never cleared for the rest of the run.
    pub fn mark_blocked(&self) {
        self.ip_blocked.store(true, Ordering::Relaxed);
    }

    pub fn jobs_found(&self) -> u64 {
        self.jobs_found.load(Ordering::Relaxed)
    }

    pub fn jobs_scraped(&self) -> u64 {
        self.jobs_scraped.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn ip_blocked(&self) -> bool {
        self.ip_blocked.load(Ordering::Relaxed)
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Freezes the current counters into an immutable snapshot.
    pub fn snapshot(&self, end_time: DateTime<Utc>) -> StatsSnapshot {
        StatsSnapshot {
            start_time: self.start_time,
            end_time,
            duration_ms: (end_time - self.start_time).num_milliseconds().max(0),
            jobs_found: self.jobs_found(),
            jobs_scraped: self.jobs_scraped(),
            errors: self.errors(),
            ip_blocked: self.ip_blocked(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable view persisted at run end, and in reduced form on fatal abort
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
    pub jobs_found: u64,
    pub jobs_scraped: u64,
    pub errors: u64,
    pub ip_blocked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = RunStats::new();
        stats.add_jobs_found(25);
        stats.add_jobs_found(10);
        stats.record_scraped();
        stats.record_error();
        stats.record_error();

        assert_eq!(stats.jobs_found(), 35);
        assert_eq!(stats.jobs_scraped(), 1);
        assert_eq!(stats.errors(), 2);
    }

    #[test]
    fn test_blocked_flag_is_sticky() {
        let stats = RunStats::new();
        assert!(!stats.ip_blocked());
        stats.mark_blocked();
        stats.mark_blocked();
        assert!(stats.ip_blocked());
    }

    #[test]
    fn test_snapshot_freezes_counts() {
        let stats = RunStats::new();
        stats.add_jobs_found(3);
        stats.record_scraped();

        let snapshot = stats.snapshot(Utc::now());
        assert_eq!(snapshot.jobs_found, 3);
        assert_eq!(snapshot.jobs_scraped, 1);
        assert_eq!(snapshot.errors, 0);
        assert!(snapshot.duration_ms >= 0);
        assert!(!snapshot.ip_blocked);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = RunStats::new().snapshot(Utc::now());
        let value = serde_json::to_value(&snapshot).expect("serializable");
        assert!(value.get("jobsFound").is_some());
        assert!(value.get("ipBlocked").is_some());
        assert!(value.get("durationMs").is_some());
    }
}
