//! The daemon descriptor and the state machine dispatching lifecycle
//! commands against it.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::DaemonError;
use crate::lifecycle::detach::{self, OsParent, ParentProbe, Role};
use crate::lifecycle::lock::StartLock;
use crate::lifecycle::pid_file::PidFile;
use crate::lifecycle::probe::{self, Liveness};
use crate::lifecycle::{Hooks, NoopHooks};

/// Pause between the stop and start phases of `restart`. An external
/// observer can see "not running" during this gap.
const RESTART_GRACE: Duration = Duration::from_secs(1);

/// One-line usage text for unknown or missing commands.
pub const USAGE: &str = "Usage: expected 'run', 'start', 'stop', 'restart' or 'status'";

/// Lifecycle command dispatched against a [`Daemon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Execute the worker in this process. `detached` marks the instance
    /// spawned by `start`; without it the worker runs attached to the
    /// invoking terminal.
    Run { detached: bool },
    Start,
    Stop,
    Restart,
    Status,
}

impl Action {
    /// Parse a raw command line (argv without the binary name). Returns
    /// `None` for unknown or missing commands; the caller prints usage and
    /// exits zero, a deliberate non-error outcome.
    pub fn parse(args: &[String]) -> Option<Self> {
        let detached = args.get(1).is_some_and(|a| a == detach::DETACH_MARKER);
        match args.first().map(String::as_str) {
            Some("run") => Some(Self::Run { detached }),
            Some("start") => Some(Self::Start),
            Some("stop") => Some(Self::Stop),
            Some("restart") => Some(Self::Restart),
            Some("status") => Some(Self::Status),
            _ => None,
        }
    }
}

/// What a dispatched command observed or did. The caller turns this into
/// user-facing output; every variant maps to exit code zero.
#[derive(Debug)]
pub enum Outcome {
    /// `start`: the detached instance was spawned. The launcher exits
    /// without waiting for the child to finish starting.
    Launched { pid: u32 },
    /// `start`: a PID file already exists, nothing was spawned.
    AlreadyRunning,
    /// `stop`/`status`: no PID file, no instance to act on.
    AlreadyStopped,
    /// `stop`: signal delivered and PID file removed.
    Stopped { pid: u32 },
    /// `status`: the recorded process is alive.
    Running { pid: u32 },
    /// `status`: the recorded process is gone. The stale file is left in
    /// place for the operator; `status` never self-heals the record.
    Stale { pid: u32 },
    /// `status`: the probe could not assert liveness either way.
    Indeterminate { pid: u32, error: io::Error },
    /// The worker returned and this instance is done.
    Finished,
    /// Unknown or missing command; print [`USAGE`].
    Usage,
}

/// Descriptor for a single background instance: identity, PID file
/// location, detachment options, and lifecycle hooks. Immutable once built;
/// an [`Action`] is dispatched against it once per invocation.
pub struct Daemon {
    name: String,
    pid_file: PidFile,
    working_dir: Option<PathBuf>,
    redirect_stdio: bool,
    relaunch_args: Vec<String>,
    hooks: Box<dyn Hooks>,
    parent: Box<dyn ParentProbe>,
}

impl Daemon {
    /// Descriptor named `name`, with the PID file at `<name>.pid`, stdio
    /// redirection on, no-op hooks, and the OS parent query.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let pid_file = PidFile::new(format!("{name}.pid"));
        Self {
            name,
            pid_file,
            working_dir: None,
            redirect_stdio: true,
            relaunch_args: Vec::new(),
            hooks: Box::new(NoopHooks),
            parent: Box::new(OsParent),
        }
    }

    /// Descriptor named after the current executable.
    pub fn from_current_exe() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let name = exe
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "daemon".to_string());
        Ok(Self::new(name))
    }

    /// Override the PID file location.
    pub fn pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = PidFile::new(path);
        self
    }

    /// Working directory for the detached instance.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Whether the detached instance's stdio is replaced with `/dev/null`.
    pub fn redirect_stdio(mut self, redirect: bool) -> Self {
        self.redirect_stdio = redirect;
        self
    }

    /// Extra argv forwarded to the re-executed instance after the
    /// `run --detached` marker, so it sees the same configuration the
    /// launcher saw.
    pub fn relaunch_args(mut self, args: Vec<String>) -> Self {
        self.relaunch_args = args;
        self
    }

    /// Install lifecycle hooks.
    pub fn hooks(mut self, hooks: Box<dyn Hooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replace the parent-pid query (used by tests to drive role
    /// determination without real reparenting).
    pub fn parent_probe(mut self, probe: Box<dyn ParentProbe>) -> Self {
        self.parent = probe;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid_path(&self) -> &Path {
        self.pid_file.path()
    }

    /// Dispatch a lifecycle command. `worker` is the instance's blocking
    /// main loop; it is invoked only in the process that ends up being the
    /// running instance, and it is expected to block until the instance is
    /// signalled.
    pub fn dispatch(
        &self,
        action: Action,
        worker: impl FnOnce(),
    ) -> Result<Outcome, DaemonError> {
        match action {
            Action::Run { detached } => self.run(detached, worker),
            Action::Start => self.start(worker),
            Action::Stop => self.stop(),
            Action::Restart => {
                let stopped = self.stop()?;
                tracing::debug!(phase = ?stopped, "stop phase complete");
                thread::sleep(RESTART_GRACE);
                self.start(worker)
            }
            Action::Status => self.status(),
        }
    }

    /// Like [`Daemon::dispatch`], over raw argv tokens.
    pub fn dispatch_args(
        &self,
        args: &[String],
        worker: impl FnOnce(),
    ) -> Result<Outcome, DaemonError> {
        match Action::parse(args) {
            Some(action) => self.dispatch(action, worker),
            None => Ok(Outcome::Usage),
        }
    }

    fn run(&self, detached: bool, worker: impl FnOnce()) -> Result<Outcome, DaemonError> {
        if detached {
            self.finalize_detach()?;
            return self.run_instance(worker);
        }

        // Invoked without the marker: attached foreground execution, no PID
        // file and no session change.
        self.hooks.on_start();
        worker();
        Ok(Outcome::Finished)
    }

    fn start(&self, worker: impl FnOnce()) -> Result<Outcome, DaemonError> {
        if self.pid_file.exists() {
            return Ok(Outcome::AlreadyRunning);
        }

        let _lock = StartLock::acquire()?;

        match detach::role(self.parent.as_ref()) {
            Role::Launcher => {
                let pid = detach::respawn(self.working_dir.as_deref(), &self.relaunch_args)?;
                tracing::debug!(pid, "spawned detached instance");
                Ok(Outcome::Launched { pid })
            }
            Role::Detached => {
                // Already orphaned (e.g. invoked from init): no relaunch
                // needed, become the instance directly.
                self.finalize_detach()?;
                self.run_instance(worker)
            }
        }
    }

    fn stop(&self) -> Result<Outcome, DaemonError> {
        if !self.pid_file.exists() {
            return Ok(Outcome::AlreadyStopped);
        }

        self.hooks.on_stop();
        let pid = self.pid_file.read()?;
        send_hangup(pid)?;
        self.pid_file.remove()?;
        Ok(Outcome::Stopped { pid })
    }

    fn status(&self) -> Result<Outcome, DaemonError> {
        if !self.pid_file.exists() {
            return Ok(Outcome::AlreadyStopped);
        }

        let pid = self.pid_file.read()?;
        Ok(match probe::probe(pid) {
            Liveness::Alive => Outcome::Running { pid },
            Liveness::Dead => Outcome::Stale { pid },
            Liveness::Indeterminate(error) => Outcome::Indeterminate { pid, error },
        })
    }

    fn finalize_detach(&self) -> Result<(), DaemonError> {
        detach::new_session()?;
        if self.redirect_stdio {
            detach::redirect_stdio()?;
        }
        Ok(())
    }

    fn run_instance(&self, worker: impl FnOnce()) -> Result<Outcome, DaemonError> {
        let pid = std::process::id();
        let _guard = self.pid_file.guard(pid)?;
        tracing::info!(name = %self.name, pid, "instance running");

        self.hooks.on_start();
        worker();
        Ok(Outcome::Finished)
    }
}

/// Deliver the termination signal. Success means "signal delivered", not
/// "process terminated": there is no wait-for-exit confirmation and no
/// forced-kill escalation.
fn send_hangup(pid: u32) -> Result<(), DaemonError> {
    if unsafe { libc::kill(pid as libc::pid_t, libc::SIGHUP) } != 0 {
        return Err(DaemonError::Signal {
            pid,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}
