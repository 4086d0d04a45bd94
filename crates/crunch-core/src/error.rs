/// Harness error types
use std::path::PathBuf;
use thiserror::Error;

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised while resolving or loading a test-suite library
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Test library {name} not found in {}", dir.display())]
    LibraryNotFound { name: String, dir: PathBuf },

    #[error("Could not open test library: {0}")]
    LoadFailed(String),

    #[error("Symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },

    #[error("Test library {library} was built for crunch ABI {found}, expected {expected}")]
    IncompatibleAbi {
        library: String,
        found: String,
        expected: String,
    },

    #[error("Test library {library} failed to register its suites: {reason}")]
    RegisterFailed { library: String, reason: String },
}

impl LoadError {
    /// Create a library-not-found error
    pub fn not_found(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::LibraryNotFound {
            name: name.into(),
            dir: dir.into(),
        }
    }

    /// Create a missing-symbol error
    pub fn missing_symbol(library: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            library: library.into(),
            symbol: symbol.into(),
        }
    }

    /// Create an ABI-mismatch error against this build's [`crate::ABI_VERSION`]
    pub fn incompatible(library: impl Into<String>, found: impl Into<String>) -> Self {
        Self::IncompatibleAbi {
            library: library.into(),
            found: found.into(),
            expected: crate::ABI_VERSION.to_string(),
        }
    }
}

/// Reasons a suite's registration callback can fail before any test runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("registration of suite {suite} was refused: {reason}")]
    Rejected { suite: String, reason: String },

    #[error("registration of suite {suite} panicked: {reason}")]
    Panicked { suite: String, reason: String },

    #[error("out of memory registering test {test} in suite {suite}")]
    OutOfMemory { suite: String, test: String },
}

/// Errors that escape a single test and end the run
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("test run aborted")]
    Aborted,

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl HarnessError {
    /// True for the run-fatal abort signal
    pub fn is_abort(&self) -> bool {
        matches!(self, HarnessError::Aborted)
    }
}
