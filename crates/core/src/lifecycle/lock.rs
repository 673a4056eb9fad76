//! Advisory lock serializing concurrent `start` invocations.

use std::io;
use std::os::unix::io::RawFd;

use crate::error::DaemonError;

/// Exclusive advisory lock on the stdout descriptor.
///
/// Taken before role determination so two `start` invocations racing between
/// the PID-file existence check and the spawn cannot both proceed. The lock
/// stays held for the rest of the launcher's life; the kernel releases it
/// when the process exits.
#[must_use = "acquire the lock before determining the role"]
pub struct StartLock {
    _fd: RawFd,
}

impl StartLock {
    /// Block until an exclusive lock on stdout is held.
    pub fn acquire() -> Result<Self, DaemonError> {
        lock_fd(libc::STDOUT_FILENO).map_err(DaemonError::Lock)?;
        Ok(Self {
            _fd: libc::STDOUT_FILENO,
        })
    }
}

/// Blocking exclusive `flock` on `fd`.
pub(crate) fn lock_fd(fd: RawFd) -> io::Result<()> {
    let ret = unsafe { libc::flock(fd, libc::LOCK_EX) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
