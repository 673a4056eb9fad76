//! Detachment: self re-execution, session creation, stdio redirection.
//!
//! Approximates double-fork daemonization without a native fork. `start`
//! re-invokes the current binary with a role marker and exits immediately;
//! once the launcher is gone the child is adopted by the reaper (pid 1) and
//! finishes detaching by creating its own session.

use std::env;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::DaemonError;

/// Marker argument appended after `run` when the launcher re-executes
/// itself. Its presence tells the new instance it is the detached one; it is
/// not meant for direct human invocation.
pub const DETACH_MARKER: &str = "--detached";

/// Capability query for the current process's parent id, injected into role
/// determination so tests can drive it without real reparenting.
pub trait ParentProbe: Send + Sync {
    fn parent_pid(&self) -> u32;
}

/// Asks the OS via `getppid(2)`.
pub struct OsParent;

impl ParentProbe for OsParent {
    fn parent_pid(&self) -> u32 {
        unsafe { libc::getppid() as u32 }
    }
}

/// Which side of the detachment a `start` invocation is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Ordinary shell invocation: spawn the detached instance and exit.
    Launcher,
    /// Already orphaned and adopted by the reaper: become the instance.
    Detached,
}

/// A process whose parent is the init/reaper process is already detached;
/// anything else is a launcher. The test window depends on the OS having
/// completed reparenting before the child checks its own parent.
pub fn role(probe: &dyn ParentProbe) -> Role {
    if probe.parent_pid() == 1 {
        Role::Detached
    } else {
        Role::Launcher
    }
}

/// Spawn a new instance of the current program image as
/// `run --detached <args…>`, inheriting the launcher's standard streams and
/// optionally overriding its working directory. Returns the child pid
/// without waiting for the child to finish starting.
pub fn respawn(working_dir: Option<&Path>, args: &[String]) -> Result<u32, DaemonError> {
    let binary = env::current_exe().map_err(DaemonError::Spawn)?;

    let mut cmd = Command::new(binary);
    cmd.arg("run").arg(DETACH_MARKER).args(args);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let child = cmd
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(DaemonError::Spawn)?;
    Ok(child.id())
}

/// Sever the controlling terminal by creating a new session.
pub fn new_session() -> Result<(), DaemonError> {
    if unsafe { libc::setsid() } < 0 {
        return Err(DaemonError::Detach(io::Error::last_os_error()));
    }
    Ok(())
}

/// Replace stdin/stdout/stderr with the null device.
pub fn redirect_stdio() -> Result<(), DaemonError> {
    use std::os::unix::io::AsRawFd;

    let devnull = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(DaemonError::Detach)?;
    let fd = devnull.as_raw_fd();
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        if unsafe { libc::dup2(fd, target) } < 0 {
            return Err(DaemonError::Detach(io::Error::last_os_error()));
        }
    }
    Ok(())
}
