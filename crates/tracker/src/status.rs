//! Status projection for the persistent session notification.

use crate::models::RunSnapshot;

/// Receives the one-line status text once per tick. In the mobile shell this
/// backs the foreground-service notification; headless hosts can log it or
/// ignore it.
pub trait StatusNotifier: Send + Sync {
    fn update(&self, status: &str);
}

/// Notifier that mirrors the status line into the log.
pub struct LogStatusNotifier;

impl StatusNotifier for LogStatusNotifier {
    fn update(&self, status: &str) {
        tracing::info!(target: "tracker::status", "{status}");
    }
}

/// Formats `"<HH:MM:SS or PAUSED> • <distance> km • <calories> kcal"`.
pub fn status_line(snapshot: &RunSnapshot) -> String {
    let lead = if snapshot.paused() {
        "PAUSED".to_string()
    } else {
        format_elapsed(snapshot.elapsed_seconds)
    };
    format!(
        "{lead} • {:.2} km • {} kcal",
        snapshot.distance_meters / 1000.0,
        snapshot.calories.round() as u64,
    )
}

fn format_elapsed(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
