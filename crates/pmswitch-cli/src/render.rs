//! Plain-text rendering of the view snapshots.

use pmswitch_application::SettingsSnapshot;
use pmswitch_core::update::{UpdatePhase, UpdateSnapshot};

pub fn settings(snapshot: &SettingsSnapshot) -> String {
    let pending = |busy: bool| if busy { " (saving...)" } else { "" };
    format!(
        "package manager: {}{}\nmonitoring:      {}{}",
        snapshot.tool_choice,
        pending(snapshot.in_flight.tool_choice),
        if snapshot.monitor_enabled { "on" } else { "off" },
        pending(snapshot.in_flight.monitor_enabled),
    )
}

pub fn update(snapshot: &UpdateSnapshot) -> String {
    let line = match &snapshot.phase {
        UpdatePhase::Idle => "up to date".to_string(),
        UpdatePhase::CheckRequested => "checking for updates...".to_string(),
        UpdatePhase::Available { version } => format!("version {} is available", version),
        UpdatePhase::Downloading { version } => {
            let percentage = snapshot.progress.map(|p| p.percentage).unwrap_or(0);
            format!("downloading {}: {}% {}", version, percentage, bar(percentage))
        }
        UpdatePhase::Installing { version } => format!("installing {}...", version),
        UpdatePhase::Finished { version } => {
            format!("update {} installed, restart to apply", version)
        }
        UpdatePhase::Dismissed => "update dismissed".to_string(),
    };
    match &snapshot.last_error {
        Some(error) => format!("update: {}\n  last error: {}", line, error),
        None => format!("update: {}", line),
    }
}

fn bar(percentage: u8) -> String {
    const WIDTH: usize = 20;
    let filled = usize::from(percentage.min(100)) * WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}
