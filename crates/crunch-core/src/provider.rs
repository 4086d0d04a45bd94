//! Suite providers - where a run's test suites come from
//!
//! The orchestrator only needs something that can fill a [`SuiteSet`].
//! Shared libraries are one source ([`crate::loader::LibraryProvider`]);
//! suites compiled into the calling binary are another ([`StaticProvider`]).

use crate::error::LoadError;
use crate::outcome::{guard, Interruption, Outcome};
use crate::registry::SuiteSet;

/// A source of test suites, processed in isolation from other providers
pub trait SuiteProvider {
    /// Name shown in the `Running test suite` header and in errors
    fn name(&self) -> &str;

    /// Add this provider's suites to `suites`, in run order
    fn provide(&mut self, suites: &mut SuiteSet) -> Result<(), LoadError>;
}

/// Provider backed by a registration function in the current binary
pub struct StaticProvider<F> {
    name: String,
    register: F,
}

impl<F> StaticProvider<F>
where
    F: FnMut(&mut SuiteSet),
{
    pub fn new(name: impl Into<String>, register: F) -> Self {
        Self {
            name: name.into(),
            register,
        }
    }
}

impl<F> SuiteProvider for StaticProvider<F>
where
    F: FnMut(&mut SuiteSet),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn provide(&mut self, suites: &mut SuiteSet) -> Result<(), LoadError> {
        let register = &mut self.register;
        registered(&self.name, guard(|| register(suites)))
    }
}

/// Map a guarded library-level registration onto a load result.
///
/// `finish()` during registration counts as success, like it does for a
/// suite registrar.
pub(crate) fn registered(
    library: &str,
    result: Result<(), Interruption>,
) -> Result<(), LoadError> {
    let reason = match result {
        Ok(()) | Err(Interruption::Exit(Outcome::Success)) => return Ok(()),
        Err(Interruption::Exit(outcome)) => outcome.message().to_string(),
        Err(Interruption::Panic(message)) => message,
    };
    Err(LoadError::RegisterFailed {
        library: library.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HarnessContext;
    use crate::reporter::{OutputMode, SharedBuffer};

    #[test]
    fn test_static_provider_adds_suites() {
        let ctx = HarnessContext::buffered(OutputMode::Plain, SharedBuffer::new());
        let mut provider = StaticProvider::new("builtin", |suites: &mut SuiteSet| {
            suites.add("first", |_| {});
            suites.add("second", |_| {});
        });
        let mut suites = SuiteSet::new(ctx);
        provider.provide(&mut suites).unwrap();
        assert_eq!(provider.name(), "builtin");
        assert_eq!(suites.len(), 2);
    }

    #[test]
    fn test_panicking_entry_point_is_an_error() {
        let ctx = HarnessContext::buffered(OutputMode::Plain, SharedBuffer::new());
        let mut provider = StaticProvider::new("exploding", |_: &mut SuiteSet| {
            panic!("entry point blew up");
        });
        let mut suites = SuiteSet::new(ctx);
        let err = provider.provide(&mut suites).unwrap_err();
        assert_eq!(
            err,
            LoadError::RegisterFailed {
                library: "exploding".to_string(),
                reason: "entry point blew up".to_string(),
            }
        );
    }

    #[test]
    fn test_signals_during_registration() {
        assert_eq!(registered("lib", Err(Interruption::Exit(Outcome::Success))), Ok(()));
        let err = registered(
            "lib",
            Err(Interruption::Exit(Outcome::Failure("no fixtures".to_string()))),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Test library lib failed to register its suites: no fixtures"
        );
    }
}
