//! End-to-end lifecycle tests driving the compiled binary.
//!
//! Each test gets its own temp directory and PID file so the suites can run
//! in parallel without contending on the advisory start lock (every spawned
//! process locks its own captured stdout, not a shared terminal).

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

// Above PID_MAX_LIMIT (4194304), so never a live process.
const DEAD_PID: u32 = 2_000_000_000;

// ---------------------------------------------------------------------------
// Helper: per-test sandbox running the binary with a private PID file
// ---------------------------------------------------------------------------

struct Harness {
    dir: tempfile::TempDir,
    invocations: std::cell::Cell<u32>,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
            invocations: std::cell::Cell::new(0),
        }
    }

    fn pid_file(&self) -> PathBuf {
        self.dir.path().join("nocturne.pid")
    }

    /// Run the binary with raw arguments. Stdout goes to a file so the start
    /// lock has a lockable descriptor; returns (exited zero, captured stdout).
    fn run_raw(&self, args: &[&str]) -> (bool, String) {
        let n = self.invocations.get();
        self.invocations.set(n + 1);
        let out_path = self.dir.path().join(format!("stdout.{n}"));
        let stdout = fs::File::create(&out_path).expect("failed to capture stdout");

        let status = Command::new(env!("CARGO_BIN_EXE_nocturne"))
            .args(args)
            .current_dir(self.dir.path())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::null())
            .status()
            .expect("failed to run nocturne");

        let text = fs::read_to_string(&out_path).unwrap_or_default();
        (status.success(), text)
    }

    /// Run a lifecycle command against this sandbox's PID file.
    fn run(&self, command: &str) -> (bool, String) {
        let pid_file = self.pid_file();
        let log_dir = self.dir.path().join("logs");
        let mut args = vec![
            command,
            "--pid-file",
            pid_file.to_str().unwrap(),
        ];
        // Worker-owning commands also configure the heartbeat and its logs
        if matches!(command, "start" | "restart") {
            args.extend(["--interval", "1", "--log-dir"]);
            args.push(log_dir.to_str().unwrap());
        }
        self.run_raw(&args)
    }

    /// Wait for the detached instance to record its pid. The launcher exits
    /// before the child has finished starting, so the record appears a beat
    /// after `start` returns.
    fn wait_for_pid(&self) -> u32 {
        for _ in 0..100 {
            if let Ok(contents) = fs::read_to_string(self.pid_file()) {
                if let Ok(pid) = contents.trim().parse() {
                    return pid;
                }
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        panic!("detached instance never wrote {}", self.pid_file().display());
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        // Don't leak a heartbeat daemon if an assertion failed mid-test
        if let Ok(contents) = fs::read_to_string(self.pid_file()) {
            if let Ok(pid) = contents.trim().parse::<i32>() {
                unsafe {
                    libc::kill(pid, libc::SIGKILL);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle round trips
// ---------------------------------------------------------------------------

#[test]
fn test_start_status_stop_round_trip() {
    let harness = Harness::new();

    let (ok, out) = harness.run("start");
    assert!(ok, "start failed: {out}");
    assert!(out.contains("was started"), "unexpected start output: {out}");

    let pid = harness.wait_for_pid();

    let (ok, out) = harness.run("status");
    assert!(ok);
    assert!(
        out.contains(&format!("is running (pid {pid})")),
        "unexpected status output: {out}"
    );

    // A second start must refuse while the record exists
    let (ok, out) = harness.run("start");
    assert!(ok);
    assert!(
        out.contains("already running"),
        "unexpected second-start output: {out}"
    );

    let (ok, out) = harness.run("stop");
    assert!(ok, "stop failed: {out}");
    assert!(
        out.contains("successfully stopped"),
        "unexpected stop output: {out}"
    );
    assert!(!harness.pid_file().exists());
}

#[test]
fn test_restart_from_stopped_state() {
    let harness = Harness::new();

    // stop phase sees no record and falls through to start after the grace
    let (ok, out) = harness.run("restart");
    assert!(ok, "restart failed: {out}");
    assert!(out.contains("was started"), "unexpected output: {out}");

    harness.wait_for_pid();

    let (ok, _) = harness.run("stop");
    assert!(ok);
    assert!(!harness.pid_file().exists());
}

// ---------------------------------------------------------------------------
// Terminal states and failure paths
// ---------------------------------------------------------------------------

#[test]
fn test_stop_without_record_is_not_an_error() {
    let harness = Harness::new();

    let (ok, out) = harness.run("stop");
    assert!(ok);
    assert!(out.contains("already stopped"), "unexpected output: {out}");
}

#[test]
fn test_status_without_record_reports_stopped() {
    let harness = Harness::new();

    let (ok, out) = harness.run("status");
    assert!(ok);
    assert!(out.contains("already stopped"), "unexpected output: {out}");
}

#[test]
fn test_stop_with_stale_record_fails_and_keeps_it() {
    let harness = Harness::new();
    fs::write(harness.pid_file(), DEAD_PID.to_string()).unwrap();

    let (ok, _) = harness.run("stop");
    assert!(!ok, "stop against a dead pid must exit non-zero");
    assert!(harness.pid_file().exists(), "failed stop must not delete the record");
}

#[test]
fn test_status_with_stale_record_reports_but_keeps_it() {
    let harness = Harness::new();
    fs::write(harness.pid_file(), DEAD_PID.to_string()).unwrap();

    let (ok, out) = harness.run("status");
    assert!(ok, "a stale record is not fatal for status");
    assert!(out.contains("NOT running"), "unexpected output: {out}");
    assert!(harness.pid_file().exists(), "status must never self-heal the record");
}

#[test]
fn test_garbage_record_is_fatal_for_stop() {
    let harness = Harness::new();
    fs::write(harness.pid_file(), "not a pid").unwrap();

    let (ok, _) = harness.run("stop");
    assert!(!ok);
}

#[test]
fn test_missing_command_prints_usage_and_exits_zero() {
    let harness = Harness::new();

    let (ok, out) = harness.run_raw(&[]);
    assert!(ok, "a bare invocation is a usage message, not an error");
    assert!(out.contains("Usage:"), "unexpected output: {out}");
}
