use std::path::PathBuf;

/// Unified error type for all lifecycle operations.
///
/// Every variant is fatal to the command that produced it: the binary prints
/// the diagnostic and exits non-zero. Non-error terminal states ("already
/// running", "already stopped", usage) are [`Outcome`](crate::daemon::Outcome)
/// variants, not errors.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("pid file {}: {source}", path.display())]
    PidFileIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("pid file {} does not contain a pid: {source}", path.display())]
    PidFileParse {
        path: PathBuf,
        source: std::num::ParseIntError,
    },

    #[error("failed to lock stdout: {0}")]
    Lock(std::io::Error),

    #[error("failed to spawn detached instance: {0}")]
    Spawn(std::io::Error),

    #[error("failed to detach from terminal: {0}")]
    Detach(std::io::Error),

    #[error("failed to signal pid {pid}: {source}")]
    Signal { pid: u32, source: std::io::Error },
}
