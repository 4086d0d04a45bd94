//! CLI integration tests
//!
//! Tests the `crunch` binary end to end:
//! - Help and version output
//! - The no-libraries fatal error
//! - Library resolution failures and exit codes
//! - Log capture
//! - Full runs of the demo suite library, built once for this test binary

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tempfile::tempdir;

fn crunch_cmd() -> Command {
    let mut cmd = Command::cargo_bin("crunch").unwrap();
    for name in [
        "CRUNCH_LOG",
        "CRUNCH_LIB_DIR",
        "CRUNCH_TRACE",
        "CRUNCH_NO_COLOR",
    ] {
        cmd.env_remove(name);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Build the demo suite cdylib into its own target dir and return the
/// directory holding it. Nothing depends on the cdylib, so a plain
/// `cargo test` never builds it.
fn demo_suite_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let target = Path::new(env!("CARGO_TARGET_TMPDIR")).join("demo-suite");
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../Cargo.toml");
        let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        let status = Command::new(cargo)
            .args(["build", "--quiet", "-p", "crunch-demo-suite", "--manifest-path"])
            .arg(&manifest)
            .arg("--target-dir")
            .arg(&target)
            .status()
            .expect("failed to run cargo");
        assert!(status.success(), "building crunch-demo-suite failed");

        let dir = target.join("debug");
        let name = format!(
            "{}crunch_demo_suite{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        );
        assert!(dir.join(&name).is_file(), "{} was not built", name);
        dir
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// HELP AND VERSION
// ══════════════════════════════════════════════════════════════════════════════

mod help_and_version {
    use super::*;

    #[test]
    fn test_help_shows_usage_and_environment() {
        crunch_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("LIBRARIES"))
            .stdout(predicate::str::contains("--lib-dir"))
            .stdout(predicate::str::contains("EXIT STATUS"))
            .stdout(predicate::str::contains("same rustc"))
            .stdout(predicate::str::contains("CRUNCH_LOG"));
    }

    #[test]
    fn test_version_flags() {
        for flag in ["--version", "-v"] {
            crunch_cmd()
                .arg(flag)
                .assert()
                .success()
                .stdout(predicate::str::starts_with(format!(
                    "crunch {}",
                    env!("CARGO_PKG_VERSION")
                )))
                .stdout(predicate::str::contains(std::env::consts::OS));
        }
    }

    #[test]
    fn test_version_wins_over_libraries() {
        crunch_cmd()
            .args(["-v", "someSuite"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Running").not());
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// ERRORS AND EXIT CODES
// ══════════════════════════════════════════════════════════════════════════════

mod exit_codes {
    use super::*;

    #[test]
    fn test_no_libraries_is_fatal() {
        crunch_cmd()
            .assert()
            .code(2)
            .stdout(predicate::str::contains(
                "Fatal error: There are no tests to run given on the command line!",
            ))
            .stdout(predicate::str::contains("Total tests").not());
    }

    #[test]
    fn test_missing_library_exits_two() {
        let dir = tempdir().unwrap();
        crunch_cmd()
            .arg("doesNotExist")
            .arg("--lib-dir")
            .arg(dir.path())
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Test library doesNotExist not found"))
            .stdout(predicate::str::contains(
                "Total tests: 0,  Failures: 0,  Pass rate: --",
            ));
    }

    #[test]
    fn test_invalid_library_is_skipped() {
        let dir = tempdir().unwrap();
        let ext = std::env::consts::DLL_EXTENSION;
        std::fs::write(dir.path().join(format!("broken.{}", ext)), b"not a library").unwrap();

        crunch_cmd()
            .arg("broken")
            .env("CRUNCH_LIB_DIR", dir.path())
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Could not open test library"));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        crunch_cmd()
            .arg("--frobnicate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--frobnicate"));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// LOGGING
// ══════════════════════════════════════════════════════════════════════════════

#[cfg(unix)]
mod logging {
    use super::*;

    #[test]
    fn test_log_file_is_created() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("run.log");
        crunch_cmd()
            .arg("missing")
            .arg("--lib-dir")
            .arg(dir.path())
            .arg("--log")
            .arg(&log)
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Total tests: 0"));
        assert!(log.is_file());
    }

    #[test]
    fn test_unwritable_log_is_reported() {
        let dir = tempdir().unwrap();
        crunch_cmd()
            .arg("missing")
            .arg("--lib-dir")
            .arg(dir.path())
            .env("CRUNCH_LOG", dir.path().join("no/such/dir/run.log"))
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Could not start logging"));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// DEMO SUITE
// ══════════════════════════════════════════════════════════════════════════════

mod demo_suite {
    use super::*;

    #[test]
    fn test_demo_suite_passes() {
        crunch_cmd()
            .arg("crunch_demo_suite")
            .arg("--lib-dir")
            .arg(demo_suite_dir())
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Running test suite crunch_demo_suite..."))
            .stdout(predicate::str::contains("testAssertTrue...  [  OK  ]"))
            .stdout(predicate::str::contains("[ SKIP ]"))
            .stdout(predicate::str::contains("[ FAIL ]").not())
            .stdout(predicate::str::contains("Failures: 0"));
    }

    #[test]
    fn test_missing_library_does_not_stop_the_run() {
        crunch_cmd()
            .args(["notThere", "crunch_demo_suite"])
            .arg("--lib-dir")
            .arg(demo_suite_dir())
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Test library notThere not found"))
            .stdout(predicate::str::contains("Running tests in suite assertions..."));
    }

    #[cfg(unix)]
    #[test]
    fn test_demo_suite_under_user_log() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("run.log");
        crunch_cmd()
            .arg("crunch_demo_suite")
            .arg("--lib-dir")
            .arg(demo_suite_dir())
            .arg("--log")
            .arg(&log)
            .assert()
            .code(0)
            .stdout(predicate::str::contains(
                "testLogging... Skipping: stdout is already being logged [ SKIP ]",
            ))
            .stdout(predicate::str::contains("[ FAIL ]").not());
        assert!(log.is_file());
    }
}
