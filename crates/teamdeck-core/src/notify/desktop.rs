//! Native desktop notifications via notify-rust

use notify_rust::Notification;
use tracing::debug;

/// How long a desktop toast stays up, in milliseconds
const TOAST_TIMEOUT_MS: i32 = 5000;

/// Show a desktop notification without blocking the caller
pub fn show(title: &str, body: &str) {
    let title = title.to_string();
    let body = body.to_string();

    std::thread::spawn(move || {
        if let Err(e) = Notification::new()
            .appname("teamdeck")
            .summary(&title)
            .body(&body)
            .timeout(TOAST_TIMEOUT_MS)
            .show()
        {
            debug!(error = %e, "Desktop notification failed");
        }
    });
}
