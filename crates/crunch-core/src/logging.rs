//! Stdout-to-file redirection for the duration of a run or a single test
//!
//! While a session is active, the process's standard output descriptor points
//! at the log file. Harness output keeps reaching the console through a
//! duplicate of the original descriptor.
//!
//! Descriptor 1 belongs to the whole process, so at most one session may be
//! active across every [`LogSlot`], not just within one.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Token naming one logging session.
///
/// Only [`LogSlot::begin_log`] hands these out, so a session can only be
/// stopped by whoever started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogHandle {
    id: u64,
}

/// Set while any slot in the process holds a session
static SESSION_OPEN: AtomicBool = AtomicBool::new(false);

/// Process-wide claim on stdout; released on drop
struct SessionClaim;

impl SessionClaim {
    fn acquire() -> Option<Self> {
        SESSION_OPEN
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionClaim)
    }
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        SESSION_OPEN.store(false, Ordering::Release);
    }
}

struct ActiveLog {
    id: u64,
    path: PathBuf,
    file: File,
    redirect: redirect::Redirection,
    console: File,
    // dropped after `redirect` has been undone
    _claim: SessionClaim,
}

/// Owner of the (at most one) active logging session
pub struct LogSlot {
    active: Mutex<Option<ActiveLog>>,
    next_id: AtomicU64,
}

impl Default for LogSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSlot {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveLog>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Redirect stdout into `path`.
    ///
    /// Returns `None` if a session is already active anywhere in the process,
    /// the path is empty or cannot be opened for writing, or the descriptors
    /// cannot be swapped. A refused request leaves any active session
    /// untouched.
    pub fn begin_log(&self, path: impl AsRef<Path>) -> Option<LogHandle> {
        let path = path.as_ref();
        let mut active = self.lock();
        if active.is_some() || path.as_os_str().is_empty() {
            return None;
        }
        let Some(claim) = SessionClaim::acquire() else {
            debug!(path = %path.display(), "stdout is already logged by another context");
            return None;
        };

        let file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open log file");
                return None;
            }
        };

        let (redirect, console) = match redirect::start(&file) {
            Ok(started) => started,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot redirect stdout");
                return None;
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, path = %path.display(), "logging started");
        *active = Some(ActiveLog {
            id,
            path: path.to_path_buf(),
            file,
            redirect,
            console,
            _claim: claim,
        });
        Some(LogHandle { id })
    }

    /// Stop the session named by `handle` and restore stdout.
    ///
    /// `None`, an already-stopped handle, or a handle that does not name the
    /// active session are all ignored.
    pub fn end_log(&self, handle: Option<LogHandle>) {
        let Some(handle) = handle else {
            return;
        };
        let mut active = self.lock();
        if active.as_ref().map(|log| log.id) != Some(handle.id) {
            return;
        }
        if let Some(log) = active.take() {
            redirect::stop(&log.file, log.redirect);
            debug!(id = log.id, path = %log.path.display(), "logging stopped");
        }
    }

    /// Check if any session is running
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub(crate) fn active(&self) -> Option<LogHandle> {
        self.lock().as_ref().map(|log| LogHandle { id: log.id })
    }

    /// Path of the file currently receiving stdout
    pub fn active_path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|log| log.path.clone())
    }

    /// Write harness output to the console, bypassing any redirection
    pub(crate) fn write_console(&self, bytes: &[u8]) -> io::Result<()> {
        let mut active = self.lock();
        match active.as_mut() {
            Some(log) => {
                log.console.write_all(bytes)?;
                log.console.flush()
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(bytes)?;
                stdout.flush()
            }
        }
    }
}

impl Drop for LogSlot {
    fn drop(&mut self) {
        let active = self.lock().take();
        if let Some(log) = active {
            redirect::stop(&log.file, log.redirect);
        }
    }
}

#[cfg(unix)]
mod redirect {
    use std::fs::File;
    use std::io::{self, Write};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    /// The original stdout descriptor, held until the session ends
    pub(super) struct Redirection {
        saved: OwnedFd,
    }

    pub(super) fn start(file: &File) -> io::Result<(Redirection, File)> {
        let _ = io::stdout().flush();

        // SAFETY: dup on a descriptor number has no memory-safety preconditions.
        let saved = unsafe { libc::dup(libc::STDOUT_FILENO) };
        if saved == -1 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `saved` is a freshly duplicated descriptor we now own.
        let saved = unsafe { OwnedFd::from_raw_fd(saved) };
        let console = File::from(saved.try_clone()?);

        let fd = file.as_raw_fd();
        // SAFETY: `fd` stays open for as long as `file` is borrowed.
        if unsafe { libc::flock(fd, libc::LOCK_EX) } == -1 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: both descriptors are open; dup2 atomically replaces fd 1.
        if unsafe { libc::dup2(fd, libc::STDOUT_FILENO) } == -1 {
            let err = io::Error::last_os_error();
            // SAFETY: `fd` is still open; this releases the lock taken above.
            unsafe { libc::flock(fd, libc::LOCK_UN) };
            return Err(err);
        }
        Ok((Redirection { saved }, console))
    }

    pub(super) fn stop(file: &File, redirect: Redirection) {
        let _ = io::stdout().flush();
        // SAFETY: the saved descriptor is owned by `redirect` and still open.
        unsafe {
            libc::dup2(redirect.saved.as_raw_fd(), libc::STDOUT_FILENO);
            libc::flock(file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

#[cfg(not(unix))]
mod redirect {
    use std::fs::File;
    use std::io;

    pub(super) struct Redirection;

    pub(super) fn start(_file: &File) -> io::Result<(Redirection, File)> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stdout redirection is only available on unix targets",
        ))
    }

    pub(super) fn stop(_file: &File, _redirect: Redirection) {}
}
