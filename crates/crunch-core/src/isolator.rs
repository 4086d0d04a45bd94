//! Per-test execution isolator
//!
//! Each test body runs on its own freshly spawned thread, which is joined
//! before the next test starts. The body's [`Interruption`], if any, is
//! classified into exactly one reported [`Outcome`]:
//!
//! - normal return: Success
//! - [`TestExit`] carrying Success/Failure/Skip: that outcome, reported once
//! - [`TestExit`] carrying Abort, or any other panic: a Failure, followed by
//!   the ABORTED banner and [`HarnessError::Aborted`], which ends the run
//!
//! Hardware faults are not recoverable here; see [`crate::fault`].

use crate::context::HarnessContext;
use crate::error::{HarnessError, HarnessResult};
use crate::logging::LogHandle;
use crate::outcome::{panic_message, Interruption, Outcome, TestExit};
use crate::registry::TestCase;
use std::panic;
use std::sync::{Arc, Once};
use std::thread;
use tracing::{debug, trace, warn};

static PANIC_HOOK: Once = Once::new();

/// Silence the default panic message for [`TestExit`] signals.
///
/// Other panics still go to the previously installed hook, so an unexpected
/// panic inside a test keeps its location and backtrace on stderr.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<TestExit>().is_some() {
                return;
            }
            previous(info);
        }));
    });
}

/// Lifecycle of one test execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TestPhase {
    NotStarted,
    Running,
    Joining,
    Classified,
}

struct TestExecution<'a> {
    test: &'a TestCase,
    phase: TestPhase,
}

impl<'a> TestExecution<'a> {
    fn new(test: &'a TestCase) -> Self {
        Self {
            test,
            phase: TestPhase::NotStarted,
        }
    }

    fn advance(&mut self, next: TestPhase) {
        debug_assert!(next > self.phase, "{:?} -> {:?}", self.phase, next);
        trace!(test = self.test.name(), from = ?self.phase, to = ?next, "test phase");
        self.phase = next;
    }
}

/// Runs tests one at a time on dedicated threads
pub struct Isolator {
    context: Arc<HarnessContext>,
    /// Log session owned by the caller rather than by any test
    baseline: Option<LogHandle>,
}

impl Isolator {
    pub fn new(context: Arc<HarnessContext>) -> Self {
        install_panic_hook();
        Self {
            context,
            baseline: None,
        }
    }

    /// Mark `handle` as the run's own log so it survives between tests
    pub fn with_baseline_log(mut self, handle: Option<LogHandle>) -> Self {
        self.baseline = handle;
        self
    }

    /// Run one test and report its outcome.
    ///
    /// Returns `Err(HarnessError::Aborted)` when the test aborted or panicked;
    /// the caller must stop running tests.
    pub fn run(&self, test: &TestCase) -> HarnessResult<Outcome> {
        let reporter = self.context.reporter();
        let mut execution = TestExecution::new(test);

        reporter.report_running(test.name());
        self.reclaim_stray_log();

        let func = test.func();
        let spawned = thread::Builder::new()
            .name(test.name().to_string())
            .spawn(move || func());
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!(test = test.name(), error = %e, "cannot spawn test thread");
                return self.abort_run(format!("Failure: could not start test thread: {}", e));
            }
        };
        execution.advance(TestPhase::Running);

        execution.advance(TestPhase::Joining);
        let joined = handle.join();
        self.reclaim_stray_log();
        execution.advance(TestPhase::Classified);

        let interrupted = match joined {
            Ok(Ok(())) => return Ok(self.report(Outcome::Success)),
            Ok(Err(interruption)) => interruption,
            // unwound past the test's own guard, e.g. from a destructor
            Err(payload) => Interruption::Panic(panic_message(payload.as_ref())),
        };
        match interrupted {
            Interruption::Exit(Outcome::Abort(reason)) => {
                self.abort_run(format!("Failure: test aborted the run: {}", reason))
            }
            Interruption::Exit(outcome) => Ok(self.report(outcome)),
            Interruption::Panic(message) => {
                self.abort_run(format!("Failure: panic caught by crunch: {}", message))
            }
        }
    }

    /// Run `tests` in order, stopping at the first abort
    pub fn run_all<'a>(&self, tests: impl IntoIterator<Item = &'a TestCase>) -> HarnessResult<()> {
        for test in tests {
            self.run(test)?;
        }
        Ok(())
    }

    fn report(&self, outcome: Outcome) -> Outcome {
        self.context.reporter().report_result(&outcome);
        outcome
    }

    fn abort_run(&self, message: String) -> HarnessResult<Outcome> {
        let reporter = self.context.reporter();
        reporter.report_result(&Outcome::Failure(message));
        reporter.report_aborted();
        Err(HarnessError::Aborted)
    }

    /// Stop a log session that a test started and never stopped
    fn reclaim_stray_log(&self) {
        let active = self.context.logs().active();
        if active.is_some() && active != self.baseline {
            debug!("stopping log session left running by a test");
            self.context.end_log(active);
        }
    }
}
