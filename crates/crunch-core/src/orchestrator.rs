//! Suite/run orchestrator
//!
//! Drives a whole run: providers in the order given, suites in registration
//! order, tests one at a time through the [`Isolator`]. A provider that cannot
//! be loaded, or a suite whose registration fails, is reported and skipped;
//! an aborted test ends the run.

use crate::context::HarnessContext;
use crate::error::{HarnessError, HarnessResult, LoadError};
use crate::isolator::Isolator;
use crate::logging::LogHandle;
use crate::outcome::ExitStatus;
use crate::provider::SuiteProvider;
use crate::registry::SuiteSet;
use crate::stats::StatsSummary;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a complete run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: StatsSummary,
    /// A test aborted and the remaining tests were not run
    pub aborted: bool,
    /// Providers that registered their suites
    pub loaded: usize,
}

impl RunSummary {
    pub fn status(&self) -> ExitStatus {
        if self.aborted || self.loaded == 0 {
            ExitStatus::Abort
        } else if self.stats.failures > 0 {
            ExitStatus::Finished
        } else {
            ExitStatus::Clean
        }
    }

    /// Process exit code: 0 clean, 1 failures, 2 aborted or nothing loaded
    pub fn exit_code(&self) -> i32 {
        self.status() as i32
    }
}

pub struct Orchestrator {
    context: Arc<HarnessContext>,
    log_path: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(context: Arc<HarnessContext>) -> Self {
        Self {
            context,
            log_path: None,
        }
    }

    /// Capture the run's stdout into `path` as well
    pub fn with_log(mut self, path: Option<PathBuf>) -> Self {
        self.log_path = path;
        self
    }

    pub fn context(&self) -> &Arc<HarnessContext> {
        &self.context
    }

    /// Run every provider's suites and print the summary line
    pub fn run(&self, providers: Vec<Box<dyn SuiteProvider>>) -> RunSummary {
        let user_log = self.begin_user_log();
        let isolator = Isolator::new(Arc::clone(&self.context)).with_baseline_log(user_log);

        let mut loaded = 0;
        let mut aborted = false;
        for mut provider in providers {
            match self.run_provider(provider.as_mut(), &isolator, &mut loaded) {
                Ok(()) => {}
                Err(HarnessError::Load(err)) => {
                    warn!(provider = provider.name(), error = %err, "skipping test library");
                    self.report_load_error(provider.name(), &err);
                }
                Err(HarnessError::Aborted) => {
                    aborted = true;
                    break;
                }
            }
        }

        let stats = self.context.reporter().report_summary();
        self.context.end_log(user_log);
        debug!(loaded, aborted, "run finished");
        RunSummary {
            stats,
            aborted,
            loaded,
        }
    }

    fn begin_user_log(&self) -> Option<LogHandle> {
        let path = self.log_path.as_ref()?;
        let handle = self.context.begin_log(path);
        if handle.is_none() {
            self.context
                .reporter()
                .report_error(&format!("Could not start logging to {}", path.display()));
        }
        handle
    }

    fn run_provider(
        &self,
        provider: &mut dyn SuiteProvider,
        isolator: &Isolator,
        loaded: &mut usize,
    ) -> HarnessResult<()> {
        let reporter = self.context.reporter();
        // Test closures may live in the provider's library; they are dropped
        // here, before the caller drops the provider and unloads it.
        let mut suites = SuiteSet::new(Arc::clone(&self.context));
        provider.provide(&mut suites)?;
        *loaded += 1;

        reporter.report_library(provider.name());
        for suite in suites.suites_mut() {
            reporter.report_suite(suite.name());
            if let Err(err) = suite.populate() {
                warn!(suite = suite.name(), error = %err, "suite registration failed");
                reporter.report_error(&err.to_string());
                continue;
            }
            isolator.run_all(suite.tests())?;
        }
        Ok(())
    }

    fn report_load_error(&self, name: &str, err: &LoadError) {
        let text = match err {
            LoadError::SymbolNotFound { .. } | LoadError::IncompatibleAbi { .. } => {
                format!("Test library {} was not a valid library, skipping", name)
            }
            other => other.to_string(),
        };
        self.context.reporter().report_error(&text);
    }
}
