//! Process-wide harness state, gathered into one object per run

use crate::logging::{LogHandle, LogSlot};
use crate::reporter::{OutputMode, Reporter, SharedBuffer};
use crate::stats::RunStats;
use std::path::Path;
use std::sync::Arc;

/// Tallies, the active log session and the reporter for a run.
///
/// The orchestrator, the isolator and the tests themselves all share one of
/// these. Harness tests build a fresh one per scenario.
pub struct HarnessContext {
    stats: Arc<RunStats>,
    logs: Arc<LogSlot>,
    reporter: Reporter,
}

impl HarnessContext {
    /// Context reporting to the console in the given mode
    pub fn new(mode: OutputMode) -> Arc<Self> {
        let stats = Arc::new(RunStats::new());
        let logs = Arc::new(LogSlot::new());
        let reporter = Reporter::console(mode, Arc::clone(&logs), Arc::clone(&stats));
        Arc::new(Self {
            stats,
            logs,
            reporter,
        })
    }

    /// Context rendering into `buffer` instead of the console
    pub fn buffered(mode: OutputMode, buffer: SharedBuffer) -> Arc<Self> {
        let stats = Arc::new(RunStats::new());
        let reporter = Reporter::buffered(mode, buffer, Arc::clone(&stats));
        Arc::new(Self {
            stats,
            logs: Arc::new(LogSlot::new()),
            reporter,
        })
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn logs(&self) -> &LogSlot {
        &self.logs
    }

    /// Redirect stdout into `path`; see [`LogSlot::begin_log`]
    pub fn begin_log(&self, path: impl AsRef<Path>) -> Option<LogHandle> {
        self.logs.begin_log(path)
    }

    /// Stop a session started with [`HarnessContext::begin_log`]
    pub fn end_log(&self, handle: Option<LogHandle>) {
        self.logs.end_log(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;

    #[test]
    fn test_reporter_shares_context_stats() {
        let ctx = HarnessContext::buffered(OutputMode::Plain, SharedBuffer::new());
        ctx.reporter().report_result(&Outcome::Success);
        ctx.reporter().report_result(&Outcome::Failure("no".to_string()));
        assert_eq!(ctx.stats().passes(), 1);
        assert_eq!(ctx.stats().failures(), 1);
    }

    #[test]
    fn test_fresh_context_has_no_log() {
        let ctx = HarnessContext::buffered(OutputMode::Plain, SharedBuffer::new());
        assert!(!ctx.logs().is_active());
        ctx.end_log(None);
        assert!(ctx.begin_log("").is_none());
    }
}
