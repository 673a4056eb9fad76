//! CLI argument parsing with subcommand architecture.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nocturne", version, about = "Detached background heartbeat service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the worker in this process (also the internal target of `start`)
    Run(RunArgs),
    /// Launch a detached background instance
    Start(RunArgs),
    /// Signal the running instance and clear its PID file
    Stop(PidArgs),
    /// Stop, wait a grace period, then start again
    Restart(RunArgs),
    /// Report whether the recorded instance is alive
    Status(PidArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub pid: PidArgs,

    /// Heartbeat period in seconds
    #[arg(long, default_value_t = 30, env = "NOCTURNE_INTERVAL")]
    pub interval: u64,

    /// Log level
    #[arg(long, default_value = "info", env = "NOCTURNE_LOG_LEVEL")]
    pub log_level: String,

    /// Directory for the detached instance's rotating log files
    #[arg(long, env = "NOCTURNE_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Working directory for the detached instance
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Keep stdio attached instead of redirecting it to /dev/null
    #[arg(long)]
    pub keep_stdio: bool,

    /// Internal marker: this invocation is the re-executed, detached instance
    #[arg(long, hide = true)]
    pub detached: bool,
}

impl RunArgs {
    /// Flags forwarded to the re-executed instance so it sees the same
    /// configuration the launcher saw.
    pub fn relaunch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--pid-file".to_string(),
            self.pid.pid_file.clone(),
            "--interval".to_string(),
            self.interval.to_string(),
            "--log-level".to_string(),
            self.log_level.clone(),
        ];
        if let Some(dir) = &self.log_dir {
            args.push("--log-dir".to_string());
            args.push(dir.clone());
        }
        if self.keep_stdio {
            args.push("--keep-stdio".to_string());
        }
        args
    }
}

#[derive(Args, Debug)]
pub struct PidArgs {
    /// Path to the PID file
    #[arg(long, default_value = "nocturne.pid", env = "NOCTURNE_PID_FILE")]
    pub pid_file: String,
}
