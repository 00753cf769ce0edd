//! Process-wide `SIGPIPE` masking (spec.md §6 process glue).
//!
//! Mirrors the C lab's `Signal(SIGPIPE, SIG_IGN)`: without it, writing to a
//! peer that already closed its read side raises `SIGPIPE` and kills the
//! process by default. Ignoring it turns that into the ordinary `EPIPE`
//! that `io_util::write_all_robust` already classifies as
//! [`crate::error::ProxyError::BrokenPipe`].
pub fn ignore_sigpipe() {
    // SAFETY: installing SIG_IGN for SIGPIPE is the standard, well-defined
    // way to prevent a broken pipe from terminating the process; it takes
    // no pointers and cannot fail in a way that leaves process state
    // inconsistent.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}
