//! Thin wrappers around sd-notify for the systemd readiness protocol.

/// Notify systemd that the instance is ready.
pub fn sd_ready() {
    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);
}

/// Notify systemd that the instance is about to stop.
pub fn sd_stopping() {
    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
}
