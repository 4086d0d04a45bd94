//! Pass/failure tallies for a run

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Process-wide pass and failure counters.
///
/// Tests are serialized, so Relaxed ordering is enough; the atomics only make
/// the counters shareable with the test thread.
#[derive(Debug, Default)]
pub struct RunStats {
    passes: AtomicU32,
    failures: AtomicU32,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn passes(&self) -> u32 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Snapshot of the counters
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            passes: self.passes(),
            failures: self.failures(),
        }
    }
}

/// Frozen view of [`RunStats`] used for the end-of-run line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSummary {
    pub passes: u32,
    pub failures: u32,
}

impl StatsSummary {
    pub fn total(&self) -> u64 {
        u64::from(self.passes) + u64::from(self.failures)
    }

    /// Pass rate as a percentage, or `None` when nothing ran
    pub fn pass_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(f64::from(self.passes) / total as f64 * 100.0),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total tests: {},  Failures: {},  Pass rate: ",
            self.total(),
            self.failures
        )?;
        match self.pass_rate() {
            Some(rate) => write!(f, "{:.2}%", rate),
            None => write!(f, "--"),
        }
    }
}
