//! Example test-suite library for the `crunch` runner
//!
//! Built as a `cdylib`, so `crunch crunch_demo_suite --lib-dir target/debug`
//! loads and runs it. Every test here is expected to pass.

use crunch_core::{
    assert_c_str_equal, assert_c_str_not_equal, assert_equal, assert_false, assert_greater_than,
    assert_less_than, assert_mem_equal, assert_mem_not_equal, assert_not_equal, assert_not_null,
    assert_null, assert_true, fail, finish, should_fail, skip, SuiteSet,
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Register every suite in this library
pub fn register(suites: &mut SuiteSet) {
    suites.add("assertions", register_assertions);
    suites.add("expected_failures", register_expected_failures);
    suites.add("control_flow", register_control_flow);

    let ctx = suites.context();
    suites.add("logging", move |tests| {
        tests.register("testLogging", move || {
            if ctx.logs().is_active() {
                skip("stdout is already being logged");
            }
            let path =
                std::env::temp_dir().join(format!("crunch-demo-{}.log", std::process::id()));
            let mut stdout = io::stdout();
            assert_true(writeln!(stdout, "Print to console test").is_ok());

            let log = ctx.begin_log(&path);
            assert_true(log.is_some());
            assert_true(writeln!(stdout, "Print to file test").is_ok());
            let _ = stdout.flush();
            ctx.end_log(log);

            let logged = std::fs::read_to_string(&path).unwrap_or_default();
            let removed = std::fs::remove_file(&path).is_ok();
            assert_equal(logged.as_str(), "Print to file test\n");
            assert_true(removed);
        });
    });
}

crunch_core::export_suites!(register);

fn register_assertions(tests: &mut crunch_core::TestRegistry) {
    tests.register("testAssertTrue", || assert_true(true));
    tests.register("testAssertFalse", || assert_false(false));
    tests.register("testAssertIntEqual", || {
        let num32 = std::process::id() as i32;
        let num64 = (i64::from(num32) << 32) | 0x5a5a;
        assert_equal(num32, num32);
        assert_equal(num64, num64);
    });
    tests.register("testAssertIntNotEqual", || {
        assert_not_equal(std::process::id().max(1), 0);
        assert_not_equal(-1i64, 0);
    });
    tests.register("testAssertFloatEqual", || {
        assert_equal(1.0f64, 1.00000005);
        assert_not_equal(1.0f64, 1.1);
        assert_equal(0.5f32, 0.5);
    });
    tests.register("testAssertPtrEqual", || {
        let value = 42u64;
        let ptr: *const u64 = &value;
        assert_equal(ptr, ptr);
    });
    tests.register("testAssertPtrNotEqual", || {
        let values = [1u8, 2u8];
        assert_not_equal(&values[0] as *const u8, &values[1] as *const u8);
    });
    tests.register("testAssertStrEqual", || {
        assert_equal(LOWER, LOWER);
        assert_equal(UPPER.to_string(), UPPER.to_string());
    });
    tests.register("testAssertStrNotEqual", || assert_not_equal(LOWER, UPPER));
    tests.register("testAssertCStrEqual", || {
        assert_c_str_equal(b"crunch\0trailing", b"crunch\0other");
        assert_c_str_not_equal("crunch", "crunch++");
        assert_c_str_equal(c"crunch".to_bytes(), "crunch");
    });
    tests.register("testAssertMemEqual", || {
        assert_mem_equal(LOWER.as_bytes(), LOWER.as_bytes(), 26);
        assert_mem_equal(UPPER.as_bytes(), UPPER.as_bytes(), 26);
    });
    tests.register("testAssertMemNotEqual", || {
        assert_mem_not_equal(LOWER.as_bytes(), UPPER.as_bytes(), 26);
    });
    tests.register("testAssertNull", || {
        assert_null(std::ptr::null::<u8>());
        assert_null(std::ptr::null_mut::<u8>());
        assert_null(None::<&str>);
    });
    tests.register("testAssertNotNull", || {
        let value = 7i32;
        assert_not_null(&value as *const i32);
        assert_not_null(Some(&value));
    });
    tests.register("testAssertGreaterThan", || {
        let value = 1u8;
        assert_greater_than(&value as *const u8 as usize, 0);
    });
    tests.register("testAssertLessThan", || {
        let value = 1u8;
        assert_less_than(0, &value as *const u8 as usize);
    });
}

fn register_expected_failures(tests: &mut crunch_core::TestRegistry) {
    tests.register("testShouldFailEqual", || should_fail(|| assert_equal(5, 6)));
    tests.register("testShouldFailTrue", || should_fail(|| assert_true(false)));
    tests.register("testShouldFailMem", || {
        should_fail(|| assert_mem_equal(LOWER.as_bytes(), UPPER.as_bytes(), 26))
    });
    tests.register("testShouldFailNull", || {
        let value = 3u16;
        should_fail(|| assert_null(&value as *const u16));
    });
    tests.register("testShouldFailExplicit", || {
        should_fail(|| fail("This is only a test"))
    });
    tests.register("testShouldFailRequiresFailure", || {
        should_fail(|| should_fail(|| {}));
    });
}

fn register_control_flow(tests: &mut crunch_core::TestRegistry) {
    static REACHED: AtomicUsize = AtomicUsize::new(0);

    tests.register("testFinishEndsEarly", || {
        if REACHED.load(Ordering::SeqCst) == 0 {
            finish();
        }
        REACHED.fetch_add(1, Ordering::SeqCst);
    });
    tests.register("testFinishSkippedRest", || {
        assert_equal(REACHED.load(Ordering::SeqCst), 0);
    });
    tests.register("testSkip", || skip("demonstrating a skipped test"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crunch_core::{
        HarnessContext, Orchestrator, OutputMode, SharedBuffer, StaticProvider, SuiteProvider,
    };

    #[test]
    fn test_demo_suites_all_pass() {
        let buffer = SharedBuffer::new();
        let ctx = HarnessContext::buffered(OutputMode::Plain, buffer.clone());
        let providers: Vec<Box<dyn SuiteProvider>> =
            vec![Box::new(StaticProvider::new("crunch_demo_suite", register))];
        let summary = Orchestrator::new(ctx).run(providers);

        let out = buffer.contents();
        assert_eq!(summary.stats.failures, 0, "{}", out);
        assert_eq!(summary.exit_code(), 0);
        assert!(out.contains("Running tests in suite assertions..."));
        assert!(out.contains("testSkip... Skipping: demonstrating a skipped test [ SKIP ]"));
        assert!(!out.contains("[ FAIL ]"));
    }
}
