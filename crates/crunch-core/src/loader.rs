//! Test-suite library loading
//!
//! Resolves a library identifier against a directory using the platform's
//! naming conventions, loads it with `libloading`, and calls its registration
//! entry point.
//!
//! # Entry points
//!
//! A suite library exports two symbols, normally via [`crate::export_suites!`]:
//!
//! - [`ABI_SYMBOL`]: `fn() -> &'static str`, the library's
//!   [`crate::ABI_VERSION`]. Anything but an exact match is refused, since
//!   `SuiteSet` crosses the boundary by reference.
//! - [`REGISTER_SYMBOL`]: `fn(&mut SuiteSet) -> Result<(), Interruption>`,
//!   which adds the library's suites under the library's own `guard`.
//!
//! # Safety
//!
//! Loading a library runs its initialisation code in this process. Only load
//! trusted test libraries built with the same toolchain as the harness.

use crate::error::LoadError;
use crate::outcome::Interruption;
use crate::provider::{registered, SuiteProvider};
use crate::registry::SuiteSet;
use crate::ABI_VERSION;
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Symbol that registers a library's suites
pub const REGISTER_SYMBOL: &str = "crunch_register_suites";

/// Symbol reporting the crunch ABI the library was built for
pub const ABI_SYMBOL: &str = "crunch_abi_version";

/// Signature of [`REGISTER_SYMBOL`]
pub type RegisterFn = fn(&mut SuiteSet) -> Result<(), Interruption>;

/// Signature of [`ABI_SYMBOL`]
pub type AbiFn = fn() -> &'static str;

/// Platform library extensions, in probe order
pub fn library_extensions() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &["dll"]
    } else if cfg!(target_os = "macos") {
        &["dylib", "so"]
    } else {
        &["so"]
    }
}

/// Find `name` in `dir`.
///
/// Tries `<name>.<ext>` and then `lib<name>.<ext>` for every extension. A name
/// that is already an existing path is used as is.
pub fn resolve_library(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.extension().is_some() && direct.is_file() {
        return Some(direct.to_path_buf());
    }

    for prefix in ["", "lib"] {
        for ext in library_extensions() {
            let candidate = dir.join(format!("{}{}.{}", prefix, name, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// A test-suite shared library, loaded on first use
pub struct LibraryProvider {
    name: String,
    dir: PathBuf,
    library: Option<Library>,
}

impl LibraryProvider {
    /// Provider for library `name`, resolved against `dir`
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            library: None,
        }
    }

    fn load(&mut self) -> Result<&Library, LoadError> {
        let path = resolve_library(&self.dir, &self.name)
            .ok_or_else(|| LoadError::not_found(&self.name, &self.dir))?;
        debug!(library = %self.name, path = %path.display(), "loading test library");

        // SAFETY: loading runs the library's initialisers; callers only pass
        // test libraries they intend to execute anyway.
        let library =
            unsafe { Library::new(&path).map_err(|e| LoadError::LoadFailed(e.to_string()))? };
        Ok(self.library.insert(library))
    }

    /// Check if the library is currently loaded
    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }
}

impl SuiteProvider for LibraryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn provide(&mut self, suites: &mut SuiteSet) -> Result<(), LoadError> {
        let name = self.name.clone();
        let library = self.load()?;

        // SAFETY: both symbols are emitted by `export_suites!` with exactly
        // these signatures; the library stays loaded while they are used.
        let register = unsafe {
            let abi: Symbol<AbiFn> = library
                .get(ABI_SYMBOL.as_bytes())
                .map_err(|_| LoadError::missing_symbol(&name, ABI_SYMBOL))?;
            let found = abi();
            if found != ABI_VERSION {
                return Err(LoadError::incompatible(name, found));
            }
            let register: Symbol<RegisterFn> = library
                .get(REGISTER_SYMBOL.as_bytes())
                .map_err(|_| LoadError::missing_symbol(&name, REGISTER_SYMBOL))?;
            *register
        };

        let before = suites.len();
        registered(&name, register(suites))?;
        debug!(library = %name, suites = suites.len() - before, "library registered suites");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HarnessContext;
    use crate::reporter::{OutputMode, SharedBuffer};
    use tempfile::tempdir;

    #[test]
    fn test_extensions_not_empty() {
        assert!(!library_extensions().is_empty());
        #[cfg(target_os = "linux")]
        assert_eq!(library_extensions(), &["so"]);
    }

    #[test]
    fn test_resolve_prefers_exact_name() {
        let dir = tempdir().unwrap();
        let ext = library_extensions()[0];
        std::fs::write(dir.path().join(format!("suite.{}", ext)), b"").unwrap();
        std::fs::write(dir.path().join(format!("libsuite.{}", ext)), b"").unwrap();

        let found = resolve_library(dir.path(), "suite").unwrap();
        assert_eq!(found, dir.path().join(format!("suite.{}", ext)));
    }

    #[test]
    fn test_resolve_falls_back_to_lib_prefix() {
        let dir = tempdir().unwrap();
        let ext = library_extensions()[0];
        std::fs::write(dir.path().join(format!("libmath.{}", ext)), b"").unwrap();

        let found = resolve_library(dir.path(), "math").unwrap();
        assert_eq!(found, dir.path().join(format!("libmath.{}", ext)));
        assert!(resolve_library(dir.path(), "physics").is_none());
    }

    #[test]
    fn test_missing_library_is_reported() {
        let dir = tempdir().unwrap();
        let ctx = HarnessContext::buffered(OutputMode::Plain, SharedBuffer::new());
        let mut provider = LibraryProvider::new(dir.path(), "nonexistent_suite_xyz");
        let mut suites = SuiteSet::new(ctx);

        let err = provider.provide(&mut suites).unwrap_err();
        assert!(matches!(err, LoadError::LibraryNotFound { .. }));
        assert!(!provider.is_loaded());
    }

    #[test]
    fn test_invalid_library_fails_to_load() {
        let dir = tempdir().unwrap();
        let ext = library_extensions()[0];
        std::fs::write(dir.path().join(format!("garbage.{}", ext)), b"not a library").unwrap();

        let ctx = HarnessContext::buffered(OutputMode::Plain, SharedBuffer::new());
        let mut provider = LibraryProvider::new(dir.path(), "garbage");
        let mut suites = SuiteSet::new(ctx);
        assert!(matches!(
            provider.provide(&mut suites),
            Err(LoadError::LoadFailed(_))
        ));
        assert!(suites.is_empty());
    }
}
