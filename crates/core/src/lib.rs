//! Turn a blocking worker routine into a detached, single-instance
//! background process, controlled through a small
//! `run|start|stop|restart|status` protocol.
//!
//! `start` re-executes the current binary with a role marker and exits;
//! the orphaned child is adopted by the reaper, creates its own session,
//! records its pid, and hands control to the worker. `stop` and `status`
//! operate on the recorded pid via signals. A single PID file is the only
//! shared state between invocations.
//!
//! ```no_run
//! use nocturne_core::{Daemon, Outcome};
//!
//! let daemon = Daemon::new("example");
//! let args: Vec<String> = std::env::args().skip(1).collect();
//! let outcome = daemon
//!     .dispatch_args(&args, || {
//!         loop {
//!             std::thread::sleep(std::time::Duration::from_secs(60));
//!         }
//!     })
//!     .expect("lifecycle command failed");
//! if let Outcome::Usage = outcome {
//!     println!("{}", nocturne_core::daemon::USAGE);
//! }
//! ```

#[cfg(unix)]
pub mod daemon;
pub mod error;
pub mod lifecycle;

#[cfg(unix)]
pub use daemon::{Action, Daemon, Outcome};
pub use error::DaemonError;
pub use lifecycle::Hooks;
