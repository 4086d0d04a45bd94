//! Hardware fault reporting
//!
//! A segfault or similar inside a test cannot be contained: the process dies.
//! [`install`] makes that death readable by printing which signal hit, at what
//! address, on which test thread, and a backtrace, before the default action
//! terminates the process.

/// Signals a test can trigger through bad memory or arithmetic
#[cfg(unix)]
const FAULT_SIGNALS: [libc::c_int; 4] = [libc::SIGILL, libc::SIGSEGV, libc::SIGFPE, libc::SIGBUS];

#[cfg(unix)]
fn signal_name(signal: libc::c_int) -> &'static str {
    match signal {
        libc::SIGILL => "SIGILL (illegal instruction)",
        libc::SIGSEGV => "SIGSEGV (segmentation fault)",
        libc::SIGFPE => "SIGFPE (arithmetic error)",
        libc::SIGBUS => "SIGBUS (bus error)",
        _ => "unknown signal",
    }
}

/// Install the fault reporter for the whole process.
///
/// Each handler is one-shot: the default disposition is restored before it
/// runs, so re-raising the signal terminates the process.
#[cfg(unix)]
pub fn install() {
    for signal in FAULT_SIGNALS {
        // SAFETY: the sigaction struct is fully initialised before use and
        // `on_fault` has the SA_SIGINFO handler signature.
        let installed = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_fault as *const () as libc::sighandler_t;
            action.sa_flags = libc::SA_SIGINFO | libc::SA_RESETHAND;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signal, &action, std::ptr::null_mut())
        };
        if installed != 0 {
            tracing::warn!(
                signal = signal_name(signal),
                error = %std::io::Error::last_os_error(),
                "cannot install fault handler"
            );
        }
    }
}

#[cfg(not(unix))]
pub fn install() {
    tracing::debug!("fault reporting is not available on this platform");
}

#[cfg(unix)]
extern "C" fn on_fault(signal: libc::c_int, info: *mut libc::siginfo_t, _context: *mut libc::c_void) {
    use std::io::Write;

    // Nothing above the details may allocate: the fault can be inside malloc.
    write_raw(b"\nFatal signal ");
    write_raw(signal_name(signal).as_bytes());
    write_raw(b"\n");

    // SAFETY: the kernel passes a valid siginfo_t for SA_SIGINFO handlers.
    let address = unsafe { fault_address(info) };
    let thread = std::thread::current();
    let backtrace = std::backtrace::Backtrace::force_capture();

    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(
        stderr,
        "at address {:p} in test thread '{}'",
        address,
        thread.name().unwrap_or("<unnamed>")
    );
    let _ = writeln!(stderr, "{}", backtrace);
    let _ = stderr.flush();
    drop(stderr);

    // SAFETY: SA_RESETHAND already restored the default action.
    unsafe {
        libc::raise(signal);
    }
}

/// Async-signal-safe write to stderr
#[cfg(unix)]
fn write_raw(bytes: &[u8]) {
    // SAFETY: `bytes` is a valid buffer of the given length; write(2) is
    // async-signal-safe.
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

#[cfg(all(unix, any(target_os = "linux", target_os = "android")))]
unsafe fn fault_address(info: *mut libc::siginfo_t) -> *mut libc::c_void {
    if info.is_null() {
        return std::ptr::null_mut();
    }
    (*info).si_addr()
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
unsafe fn fault_address(info: *mut libc::siginfo_t) -> *mut libc::c_void {
    if info.is_null() {
        return std::ptr::null_mut();
    }
    (*info).si_addr
}
