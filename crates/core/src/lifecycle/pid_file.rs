//! On-disk PID record for the running instance.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::DaemonError;

/// Store for the PID file: plain decimal text, created with mode 0644.
///
/// The file's existence is the sole indicator that an instance is believed
/// to be running. A stale file left behind by a crashed instance is reported
/// by `status` but never removed automatically.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create or overwrite the record with `pid`.
    pub fn write(&self, pid: u32) -> Result<(), DaemonError> {
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(&self.path)
            .map_err(|e| self.io(e))?;
        write!(file, "{pid}").map_err(|e| self.io(e))?;
        file.flush().map_err(|e| self.io(e))?;
        Ok(())
    }

    /// Read and parse the recorded pid.
    pub fn read(&self) -> Result<u32, DaemonError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| self.io(e))?;
        contents
            .trim()
            .parse()
            .map_err(|source| DaemonError::PidFileParse {
                path: self.path.clone(),
                source,
            })
    }

    /// Delete the record.
    pub fn remove(&self) -> Result<(), DaemonError> {
        fs::remove_file(&self.path).map_err(|e| self.io(e))
    }

    /// Write `pid` and return a guard that removes the file when dropped.
    /// The daemon role holds the guard for the lifetime of its worker, so a
    /// clean exit leaves no record behind.
    pub fn guard(&self, pid: u32) -> Result<PidGuard, DaemonError> {
        self.write(pid)?;
        Ok(PidGuard {
            path: self.path.clone(),
        })
    }

    fn io(&self, source: std::io::Error) -> DaemonError {
        DaemonError::PidFileIo {
            path: self.path.clone(),
            source,
        }
    }
}

/// Removes the PID file on drop. Best-effort: a failed removal here is not
/// reported, it only leaves the stale-file case `status` already knows about.
pub struct PidGuard {
    path: PathBuf,
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
