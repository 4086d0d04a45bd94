/// Export a suite library's entry points.
///
/// `$register` is a `fn(&mut SuiteSet)` that adds the library's suites. The
/// macro emits the two unmangled symbols the `crunch` runner looks up, and
/// silences assertion signals in the library's own panic hook:
///
/// ```ignore
/// use crunch_core::{assert_equal, SuiteSet};
///
/// fn register(suites: &mut SuiteSet) {
///     suites.add("arith", |tests| {
///         tests.register("testAdd", || assert_equal(2 + 2, 4));
///     });
/// }
///
/// crunch_core::export_suites!(register);
/// ```
///
/// A panic or assertion signal inside `$register` is caught on the library's
/// side and handed back as an error.
///
/// The library must be built as a `cdylib` with the same crunch-core version
/// and the same compiler as the runner; otherwise loading is refused.
#[macro_export]
macro_rules! export_suites {
    ($register:path) => {
        #[no_mangle]
        pub fn crunch_register_suites(
            suites: &mut $crate::SuiteSet,
        ) -> ::std::result::Result<(), $crate::Interruption> {
            $crate::isolator::install_panic_hook();
            $crate::guard(|| $register(suites))
        }

        #[no_mangle]
        pub fn crunch_abi_version() -> &'static str {
            $crate::ABI_VERSION
        }
    };
}
