//! Test registry - ordered (name, callable) pairs grouped into suites

use crate::context::HarnessContext;
use crate::error::RegistrationError;
use crate::outcome::{guard, Interruption, Outcome};
use std::fmt;
use std::sync::Arc;

/// Body of a single test, already wrapped in [`guard`]
pub type TestFn = Arc<dyn Fn() -> Result<(), Interruption> + Send + Sync + 'static>;

type Registrar = Box<dyn FnOnce(&mut TestRegistry) -> Result<(), Interruption> + Send + 'static>;

/// One named, independently executed unit of test logic
#[derive(Clone)]
pub struct TestCase {
    name: String,
    func: TestFn,
}

impl TestCase {
    pub fn new(name: impl Into<String>, func: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(move || guard(&func)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the body, for running it on another thread
    pub fn func(&self) -> TestFn {
        Arc::clone(&self.func)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// Ordered collection of a suite's tests. Registration order is run order.
#[derive(Debug, Default)]
pub struct TestRegistry {
    tests: Vec<TestCase>,
    /// First test that could not be stored
    rejected: Option<String>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a test. Returns false, leaving the registry unchanged, only when
    /// the allocation for the new entry fails.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        func: impl Fn() + Send + Sync + 'static,
    ) -> bool {
        let name = name.into();
        if self.tests.try_reserve(1).is_err() {
            self.rejected.get_or_insert(name);
            return false;
        }
        self.tests.push(TestCase::new(name, func));
        true
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// A named group of tests populated by its registration callback
pub struct TestSuite {
    name: String,
    registry: TestRegistry,
    registrar: Option<Registrar>,
}

impl TestSuite {
    pub fn new(
        name: impl Into<String>,
        registrar: impl FnOnce(&mut TestRegistry) + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            registry: TestRegistry::new(),
            registrar: Some(Box::new(move |registry: &mut TestRegistry| {
                guard(|| registrar(registry))
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tests(&self) -> &[TestCase] {
        self.registry.tests()
    }

    /// Run the registration callback once.
    ///
    /// If the callback signals (skip, fail, abort), panics, or cannot store a
    /// test, the suite is left with no tests at all and the error says why.
    pub fn populate(&mut self) -> Result<usize, RegistrationError> {
        let Some(registrar) = self.registrar.take() else {
            return Ok(self.registry.len());
        };

        let mut registry = TestRegistry::new();
        let suite = self.name.clone();
        match registrar(&mut registry) {
            Ok(()) | Err(Interruption::Exit(Outcome::Success)) => {}
            Err(Interruption::Exit(outcome)) => {
                return Err(RegistrationError::Rejected {
                    suite,
                    reason: outcome.message().to_string(),
                })
            }
            Err(Interruption::Panic(reason)) => {
                return Err(RegistrationError::Panicked { suite, reason })
            }
        }

        if let Some(test) = registry.rejected.take() {
            return Err(RegistrationError::OutOfMemory { suite, test });
        }
        self.registry = registry;
        Ok(self.registry.len())
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("tests", &self.registry.tests)
            .field("populated", &self.registrar.is_none())
            .finish()
    }
}

/// The suites exposed by one provider, plus the context they run under.
///
/// A suite library's entry point receives this and adds its suites in the
/// order they should run. It is dropped once the library has been processed.
pub struct SuiteSet {
    context: Arc<HarnessContext>,
    suites: Vec<TestSuite>,
}

impl SuiteSet {
    pub fn new(context: Arc<HarnessContext>) -> Self {
        Self {
            context,
            suites: Vec::new(),
        }
    }

    /// Add a suite whose tests are registered lazily by `registrar`
    pub fn add(
        &mut self,
        name: impl Into<String>,
        registrar: impl FnOnce(&mut TestRegistry) + Send + 'static,
    ) {
        self.suites.push(TestSuite::new(name, registrar));
    }

    /// Context shared by every test in the run; tests may capture it to
    /// start and stop logging
    pub fn context(&self) -> Arc<HarnessContext> {
        Arc::clone(&self.context)
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    pub fn suites_mut(&mut self) -> impl Iterator<Item = &mut TestSuite> {
        self.suites.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{fail, skip};
    use crate::isolator::install_panic_hook;
    use pretty_assertions::assert_eq;

    fn names(suite: &TestSuite) -> Vec<&str> {
        suite.tests().iter().map(TestCase::name).collect()
    }

    #[test]
    fn test_register_preserves_order() {
        let mut registry = TestRegistry::new();
        assert!(registry.register("first", || {}));
        assert!(registry.register("second", || {}));
        assert!(registry.register("third", || {}));
        let names: Vec<_> = registry.tests().iter().map(TestCase::name).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_populate_runs_registrar_once() {
        let mut suite = TestSuite::new("arith", |registry| {
            registry.register("testAdd", || {});
            registry.register("testSub", || {});
        });
        assert!(suite.tests().is_empty());
        assert_eq!(suite.populate(), Ok(2));
        assert_eq!(names(&suite), vec!["testAdd", "testSub"]);
        assert_eq!(suite.populate(), Ok(2));
    }

    #[test]
    fn test_skipping_registrar_contributes_no_tests() {
        install_panic_hook();
        let mut suite = TestSuite::new("devices", |registry| {
            registry.register("testOpen", || {});
            skip("Unable to open null device for tests");
        });
        let err = suite.populate().unwrap_err();
        assert_eq!(
            err,
            RegistrationError::Rejected {
                suite: "devices".to_string(),
                reason: "Skipping: Unable to open null device for tests".to_string(),
            }
        );
        assert!(suite.tests().is_empty());
    }

    #[test]
    fn test_panicking_registrar_is_contained() {
        install_panic_hook();
        let mut failing = TestSuite::new("broken", |_| fail("setup"));
        assert!(matches!(
            failing.populate(),
            Err(RegistrationError::Rejected { .. })
        ));

        let mut panicking = TestSuite::new("worse", |_| panic!("allocation failure"));
        match panicking.populate() {
            Err(RegistrationError::Panicked { suite, reason }) => {
                assert_eq!(suite, "worse");
                assert_eq!(reason, "allocation failure");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(panicking.tests().is_empty());
    }
}
