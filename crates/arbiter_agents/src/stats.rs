//! Self-reported agent counters.
//!
//! Agents run concurrently in parallel workflows, so the counters are atomics
//! and the last-run timestamp sits behind a mutex.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thread-safe usage counters an agent embeds.
#[derive(Debug, Default)]
pub struct AgentStats {
    analyses: AtomicU64,
    failures: AtomicU64,
    issues_reported: AtomicU64,
    chats: AtomicU64,
    tests_generated: AtomicU64,
    last_run: Mutex<Option<DateTime<Utc>>>,
}

impl AgentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_analysis(&self, issues: usize) {
        self.analyses.fetch_add(1, Ordering::Relaxed);
        self.issues_reported.fetch_add(issues as u64, Ordering::Relaxed);
        self.touch();
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub fn record_chat(&self) {
        self.chats.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub fn record_test_generation(&self) {
        self.tests_generated.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    fn touch(&self) {
        if let Ok(mut last) = self.last_run.lock() {
            *last = Some(Utc::now());
        }
    }

    pub fn snapshot(&self) -> AgentStatsSnapshot {
        AgentStatsSnapshot {
            analyses: self.analyses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            issues_reported: self.issues_reported.load(Ordering::Relaxed),
            chats: self.chats.load(Ordering::Relaxed),
            tests_generated: self.tests_generated.load(Ordering::Relaxed),
            last_run: self.last_run.lock().ok().and_then(|l| *l),
        }
    }
}

/// Point-in-time copy of [`AgentStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatsSnapshot {
    pub analyses: u64,
    pub failures: u64,
    pub issues_reported: u64,
    pub chats: u64,
    pub tests_generated: u64,
    pub last_run: Option<DateTime<Utc>>,
}
