#[cfg(unix)]
mod cli;

#[cfg(unix)]
use std::time::Duration;

#[cfg(unix)]
use clap::Parser;

#[cfg(unix)]
use cli::{Cli, Command, PidArgs, RunArgs};
#[cfg(unix)]
use nocturne_core::daemon::{Action, Daemon, Outcome, USAGE};
#[cfg(unix)]
use nocturne_core::lifecycle::{detect_hooks, logging};

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("{USAGE}");
        return Ok(());
    };

    match command {
        Command::Run(args) => {
            let action = Action::Run {
                detached: args.detached,
            };
            cmd_worker(args, action)
        }
        Command::Start(args) => cmd_worker(args, Action::Start),
        Command::Restart(args) => cmd_worker(args, Action::Restart),
        Command::Stop(args) => cmd_control(args, Action::Stop),
        Command::Status(args) => cmd_control(args, Action::Status),
    }
}

#[cfg(not(unix))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("nocturne only runs on Unix systems");
}

/// Commands that may end up owning the worker: `run`, `start`, `restart`.
#[cfg(unix)]
fn cmd_worker(args: RunArgs, action: Action) -> anyhow::Result<()> {
    // The detached instance's stdio points at /dev/null, so it logs to files
    let to_file = matches!(action, Action::Run { detached: true });
    let _guard = logging::init_logging(
        &args.log_level,
        to_file,
        args.log_dir.as_deref(),
        "nocturne.log",
    );

    let daemon = build_daemon(&args)?;
    let worker = heartbeat(Duration::from_secs(args.interval));
    let outcome = daemon.dispatch(action, worker)?;
    report(&daemon, outcome);
    Ok(())
}

/// Commands that only consult the PID record: `stop`, `status`.
#[cfg(unix)]
fn cmd_control(args: PidArgs, action: Action) -> anyhow::Result<()> {
    let daemon = Daemon::from_current_exe()?
        .pid_file(&args.pid_file)
        .hooks(detect_hooks());
    let outcome = daemon.dispatch(action, || {})?;
    report(&daemon, outcome);
    Ok(())
}

#[cfg(unix)]
fn build_daemon(args: &RunArgs) -> anyhow::Result<Daemon> {
    let mut daemon = Daemon::from_current_exe()?
        .pid_file(&args.pid.pid_file)
        .redirect_stdio(!args.keep_stdio)
        .relaunch_args(args.relaunch_args())
        .hooks(detect_hooks());
    if let Some(dir) = &args.workdir {
        daemon = daemon.working_dir(dir);
    }
    Ok(daemon)
}

#[cfg(unix)]
fn report(daemon: &Daemon, outcome: Outcome) {
    let name = daemon.name();
    match outcome {
        Outcome::Launched { pid } => println!("The {name} daemon was started (pid {pid})"),
        Outcome::AlreadyRunning => println!("The {name} daemon is already running..."),
        Outcome::AlreadyStopped => println!("The {name} daemon is already stopped..."),
        Outcome::Stopped { pid } => println!("The {name} daemon was successfully stopped (pid {pid})"),
        Outcome::Running { pid } => println!("The {name} daemon is running (pid {pid})"),
        Outcome::Stale { pid } => {
            println!("The {name} daemon is NOT running (stale pid file, pid {pid})");
        }
        Outcome::Indeterminate { pid, error } => {
            eprintln!("could not probe pid {pid}: {error}");
        }
        Outcome::Finished => {}
        Outcome::Usage => println!("{USAGE}"),
    }
}

/// Demonstration worker: logs a heartbeat until the instance is signalled.
#[cfg(unix)]
fn heartbeat(interval: Duration) -> impl FnOnce() {
    move || {
        loop {
            tracing::info!("heartbeat");
            std::thread::sleep(interval);
        }
    }
}
