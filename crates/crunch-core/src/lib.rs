//! crunch core - a native unit-test harness
//!
//! This library provides everything a test run needs:
//! - Assertions that end a test immediately with a definite outcome
//! - Suite and test registration, in run order
//! - Per-test isolation on dedicated threads
//! - Live console reporting and end-of-run statistics
//! - Loading of test suites from shared libraries
//! - Optional capture of stdout into a log file

/// crunch core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identity a suite library must share with the runner: crunch-core version
/// and the compiler that built it
pub const ABI_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "/",
    env!("CRUNCH_RUSTC_VERSION")
);

#[macro_use]
mod macros;

pub mod assertions;
pub mod context;
pub mod error;
pub mod fault;
pub mod isolator;
pub mod loader;
pub mod logging;
pub mod orchestrator;
pub mod outcome;
pub mod provider;
pub mod registry;
pub mod reporter;
pub mod stats;

// Re-export commonly used types
pub use assertions::{
    abort, assert_c_str_equal, assert_c_str_not_equal, assert_equal, assert_false,
    assert_greater_than, assert_less_than, assert_mem_equal, assert_mem_not_equal,
    assert_not_equal, assert_not_null, assert_null, assert_true, fail, finish, should_fail, skip,
    Comparable, Nullable, DOUBLE_DELTA,
};
pub use context::HarnessContext;
pub use error::{HarnessError, HarnessResult, LoadError, RegistrationError};
pub use isolator::Isolator;
pub use loader::{LibraryProvider, ABI_SYMBOL, REGISTER_SYMBOL};
pub use logging::LogHandle;
pub use orchestrator::{Orchestrator, RunSummary};
pub use outcome::{guard, ExitStatus, Interruption, Outcome, TestExit};
pub use provider::{StaticProvider, SuiteProvider};
pub use registry::{SuiteSet, TestCase, TestRegistry, TestSuite};
pub use reporter::{OutputMode, SharedBuffer};
pub use stats::{RunStats, StatsSummary};
