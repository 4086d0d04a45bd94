//! CLI configuration via environment variables
//!
//! crunch uses environment variables for optional configuration.
//! Command-line flags always take precedence.

use std::env;
use std::path::PathBuf;

/// Filter used when CRUNCH_TRACE is unset
pub const DEFAULT_TRACE: &str = "warn";

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Disable colored output (CRUNCH_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Capture test output into this file (CRUNCH_LOG=/path/to/file)
    pub log_file: Option<PathBuf>,
    /// Directory searched for test libraries (CRUNCH_LIB_DIR=/path/to/dir)
    pub lib_dir: Option<PathBuf>,
    /// tracing filter for harness diagnostics (CRUNCH_TRACE=debug)
    pub trace: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("CRUNCH_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some(),
            log_file: non_empty("CRUNCH_LOG").map(PathBuf::from),
            lib_dir: non_empty("CRUNCH_LIB_DIR").map(PathBuf::from),
            trace: non_empty("CRUNCH_TRACE").unwrap_or_else(|| DEFAULT_TRACE.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for name in [
            "CRUNCH_NO_COLOR",
            "NO_COLOR",
            "CRUNCH_LOG",
            "CRUNCH_LIB_DIR",
            "CRUNCH_TRACE",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear();
        let config = Config::from_env();
        assert!(!config.no_color);
        assert!(config.log_file.is_none());
        assert!(config.lib_dir.is_none());
        assert_eq!(config.trace, DEFAULT_TRACE);
    }

    #[test]
    #[serial]
    fn test_config_no_color() {
        clear();
        env::set_var("CRUNCH_NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        env::remove_var("CRUNCH_NO_COLOR");

        // Also the cross-tool convention, which only cares about presence
        env::set_var("NO_COLOR", "");
        assert!(Config::from_env().no_color);
        env::remove_var("NO_COLOR");
    }

    #[test]
    #[serial]
    fn test_config_paths() {
        clear();
        env::set_var("CRUNCH_LOG", "/tmp/crunch.log");
        env::set_var("CRUNCH_LIB_DIR", "/opt/tests");
        let config = Config::from_env();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/crunch.log")));
        assert_eq!(config.lib_dir, Some(PathBuf::from("/opt/tests")));
        clear();
    }

    #[test]
    #[serial]
    fn test_empty_values_are_ignored() {
        clear();
        env::set_var("CRUNCH_LOG", "");
        env::set_var("CRUNCH_TRACE", "");
        let config = Config::from_env();
        assert!(config.log_file.is_none());
        assert_eq!(config.trace, DEFAULT_TRACE);
        clear();
    }
}
