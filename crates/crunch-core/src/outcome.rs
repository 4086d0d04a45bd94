//! Test outcomes and the exit-now signal that carries them out of a test thread

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// The classified result of running one test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Test body returned normally
    Success,
    /// An assertion failed or the test called `fail`
    Failure(String),
    /// The test called `skip`; tallied as a pass
    Skip(String),
    /// The test asked for the whole run to stop
    Abort(String),
}

impl Outcome {
    /// Message printed ahead of the result tag
    pub fn message(&self) -> &str {
        match self {
            Outcome::Success => "",
            Outcome::Failure(msg) | Outcome::Skip(msg) | Outcome::Abort(msg) => msg,
        }
    }

    /// Check if this outcome counts towards the pass tally
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::Skip(_))
    }

    /// Check if this outcome counts towards the failure tally
    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Failure(_) | Outcome::Abort(_))
    }
}

/// Numeric status carried by the exit-now signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExitStatus {
    /// Leave the test early, treating it as passed
    Clean = 0,
    /// Assertion failure or skip; the outcome is already decided
    Finished = 1,
    /// Abort the whole run
    Abort = 2,
}

/// Panic payload used to unwind exactly one test thread.
///
/// Assertions raise it with [`std::panic::panic_any`]; [`guard`] turns it
/// back into an [`Interruption`]. Anything else that unwinds out of a test
/// body is treated as an uncaught panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestExit {
    outcome: Outcome,
}

impl TestExit {
    pub fn new(outcome: Outcome) -> Self {
        Self { outcome }
    }

    pub fn success() -> Self {
        Self::new(Outcome::Success)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(Outcome::Failure(message.into()))
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(Outcome::Skip(message.into()))
    }

    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(Outcome::Abort(message.into()))
    }

    pub fn status(&self) -> ExitStatus {
        match self.outcome {
            Outcome::Success => ExitStatus::Clean,
            Outcome::Failure(_) | Outcome::Skip(_) => ExitStatus::Finished,
            Outcome::Abort(_) => ExitStatus::Abort,
        }
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    /// Unwind the current thread with this signal
    pub fn raise(self) -> ! {
        std::panic::panic_any(self)
    }
}

impl fmt::Display for TestExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test exit ({})", self.status() as i32)
    }
}

/// Best-effort text for a panic payload that is not a [`TestExit`]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(exit) = payload.downcast_ref::<TestExit>() {
        exit.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// How a [`guard`]ed call ended early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interruption {
    /// A [`TestExit`] signal and the outcome it carried
    Exit(Outcome),
    /// Any other panic, with its message
    Panic(String),
}

/// Run `f`, catching any unwind and classifying it.
///
/// The catch happens in whichever binary instantiates this function. Test
/// libraries carry their own copy of the standard library, and an unwind may
/// not cross from one copy into another, so callables handed over by a
/// library are wrapped on the library's side at registration time.
pub fn guard<R>(f: impl FnOnce() -> R) -> Result<R, Interruption> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        match payload.downcast::<TestExit>() {
            Ok(exit) => Interruption::Exit(exit.into_outcome()),
            Err(other) => Interruption::Panic(panic_message(other.as_ref())),
        }
    })
}
