//! Non-destructive liveness check for a recorded pid.

use std::io;

/// What a probe learned about a process id.
#[derive(Debug)]
pub enum Liveness {
    /// The null signal was deliverable: the process exists.
    Alive,
    /// No process with that id exists.
    Dead,
    /// The probe could not assert either way (e.g. EPERM on a process owned
    /// by another user). Reported to the operator, never treated as fatal.
    Indeterminate(io::Error),
}

/// Probe `pid` with `kill(pid, 0)`. The null signal performs the permission
/// and existence checks without delivering anything to the target.
pub fn probe(pid: u32) -> Liveness {
    let ret = unsafe { libc::kill(pid as libc::pid_t, 0) };
    if ret == 0 {
        return Liveness::Alive;
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Liveness::Dead,
        _ => Liveness::Indeterminate(err),
    }
}
