//! Assertion engine
//!
//! Every assertion either returns normally or unwinds the calling test thread
//! with a [`TestExit`] carrying the failure message. Nothing after a failing
//! assertion runs. The isolator catches the signal at the thread boundary,
//! so the failure never reaches the rest of the run.

use crate::outcome::{Outcome, TestExit};
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

/// Tolerance used for floating point equality
pub const DOUBLE_DELTA: f64 = 0.0000001;

/// Values that can be compared by [`assert_equal`] and [`assert_not_equal`]
pub trait Comparable {
    /// Equality as the harness defines it for this type
    fn matches(&self, other: &Self) -> bool;

    /// Rendering used in failure messages
    fn describe(&self) -> String;
}

macro_rules! exact_comparable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Comparable for $ty {
                fn matches(&self, other: &Self) -> bool {
                    self == other
                }

                fn describe(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

exact_comparable!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, bool, char, String);

impl Comparable for &str {
    fn matches(&self, other: &Self) -> bool {
        self == other
    }

    fn describe(&self) -> String {
        (*self).to_string()
    }
}

/// `|result - expected| <= DOUBLE_DELTA`, false for NaN
pub fn within_delta(result: f64, expected: f64) -> bool {
    result >= expected - DOUBLE_DELTA && result <= expected + DOUBLE_DELTA
}

impl Comparable for f64 {
    fn matches(&self, other: &Self) -> bool {
        within_delta(*self, *other)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl Comparable for f32 {
    fn matches(&self, other: &Self) -> bool {
        within_delta(f64::from(*self), f64::from(*other))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl<T: ?Sized> Comparable for *const T {
    fn matches(&self, other: &Self) -> bool {
        std::ptr::addr_eq(*self, *other)
    }

    fn describe(&self) -> String {
        format!("{:p}", *self)
    }
}

impl<T: ?Sized> Comparable for *mut T {
    fn matches(&self, other: &Self) -> bool {
        std::ptr::addr_eq(*self, *other)
    }

    fn describe(&self) -> String {
        format!("{:p}", *self)
    }
}

/// Values with a distinguished null state, for [`assert_null`]
pub trait Nullable {
    fn is_null_value(&self) -> bool;

    fn describe(&self) -> String;

    /// How the null value itself is rendered
    fn null_description() -> &'static str;
}

impl<T: ?Sized> Nullable for *const T {
    fn is_null_value(&self) -> bool {
        self.is_null()
    }

    fn describe(&self) -> String {
        format!("{:p}", *self)
    }

    fn null_description() -> &'static str {
        "0x0"
    }
}

impl<T: ?Sized> Nullable for *mut T {
    fn is_null_value(&self) -> bool {
        self.is_null()
    }

    fn describe(&self) -> String {
        format!("{:p}", *self)
    }

    fn null_description() -> &'static str {
        "0x0"
    }
}

impl<T> Nullable for Option<T> {
    fn is_null_value(&self) -> bool {
        self.is_none()
    }

    fn describe(&self) -> String {
        match self {
            Some(_) => "Some(..)".to_string(),
            None => "None".to_string(),
        }
    }

    fn null_description() -> &'static str {
        "None"
    }
}

fn assertion_failure(what: impl Display) -> ! {
    TestExit::failure(format!("Assertion failure: {}", what)).raise()
}

fn expected_got(expected: impl Display, result: impl Display) -> ! {
    assertion_failure(format_args!("expected {}, got {}", expected, result))
}

fn did_not_expect(result: impl Display) -> ! {
    assertion_failure(format_args!("did not expect {}", result))
}

/// Fail the current test unconditionally
pub fn fail(reason: &str) -> ! {
    TestExit::failure(format!("Failure: {}", reason)).raise()
}

/// Skip the rest of the current test; it is tallied as a pass
pub fn skip(reason: &str) -> ! {
    TestExit::skip(format!("Skipping: {}", reason)).raise()
}

/// Stop this test and every test after it
pub fn abort(reason: &str) -> ! {
    TestExit::abort(reason.to_string()).raise()
}

/// Leave the current test early, treating it as passed
pub fn finish() -> ! {
    TestExit::success().raise()
}

pub fn assert_true(value: bool) {
    if !value {
        expected_got(true, value);
    }
}

pub fn assert_false(value: bool) {
    if value {
        expected_got(false, value);
    }
}

/// Equality over any [`Comparable`] type; floats use [`DOUBLE_DELTA`]
pub fn assert_equal<T: Comparable>(result: T, expected: T) {
    if !result.matches(&expected) {
        expected_got(expected.describe(), result.describe());
    }
}

pub fn assert_not_equal<T: Comparable>(result: T, expected: T) {
    if result.matches(&expected) {
        did_not_expect(result.describe());
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Compare two strings byte-wise up to the first NUL
pub fn assert_c_str_equal(result: impl AsRef<[u8]>, expected: impl AsRef<[u8]>) {
    let (result, expected) = (until_nul(result.as_ref()), until_nul(expected.as_ref()));
    if result != expected {
        expected_got(
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(result),
        );
    }
}

pub fn assert_c_str_not_equal(result: impl AsRef<[u8]>, expected: impl AsRef<[u8]>) {
    let (result, expected) = (until_nul(result.as_ref()), until_nul(expected.as_ref()));
    if result == expected {
        did_not_expect(String::from_utf8_lossy(result));
    }
}

fn blocks_match(result: &[u8], expected: &[u8], len: usize) -> bool {
    match (result.get(..len), expected.get(..len)) {
        (Some(result), Some(expected)) => result == expected,
        _ => false,
    }
}

/// Compare exactly `len` bytes. A buffer shorter than `len` never matches.
pub fn assert_mem_equal(result: &[u8], expected: &[u8], len: usize) {
    if !blocks_match(result, expected, len) {
        assertion_failure(format_args!(
            "buffers {:p} and {:p} do not match",
            result.as_ptr(),
            expected.as_ptr()
        ));
    }
}

pub fn assert_mem_not_equal(result: &[u8], expected: &[u8], len: usize) {
    if blocks_match(result, expected, len) {
        assertion_failure(format_args!(
            "buffers {:p} and {:p} match",
            result.as_ptr(),
            expected.as_ptr()
        ));
    }
}

pub fn assert_null<T: Nullable>(result: T) {
    if !result.is_null_value() {
        expected_got(T::null_description(), result.describe());
    }
}

pub fn assert_not_null<T: Nullable>(result: T) {
    if result.is_null_value() {
        did_not_expect(result.describe());
    }
}

pub fn assert_greater_than<T: PartialOrd + Display>(result: T, expected: T) {
    if !(result > expected) {
        assertion_failure(format_args!("{} was not greater than {}", result, expected));
    }
}

pub fn assert_less_than<T: PartialOrd + Display>(result: T, expected: T) {
    if !(result < expected) {
        assertion_failure(format_args!("{} was not less than {}", result, expected));
    }
}

/// Run `test` and require it to raise an assertion failure.
///
/// The failure is swallowed, so the enclosing test carries on and nothing is
/// tallied for it. Skip and abort signals, and ordinary panics, keep
/// unwinding. If `test` returns normally the enclosing test fails.
pub fn should_fail<F: FnOnce()>(test: F) {
    let payload = match panic::catch_unwind(AssertUnwindSafe(test)) {
        Ok(()) => fail("Expected assertion failure was not raised"),
        Err(payload) => payload,
    };
    match payload.downcast::<TestExit>() {
        Ok(exit) if matches!(exit.outcome(), Outcome::Failure(_)) => {}
        Ok(exit) => panic::resume_unwind(exit),
        Err(other) => panic::resume_unwind(other),
    }
}
