// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber control.
//!
//! This module provides the scrubber for seeking through the video and the
//! current/total time readout.

use crate::models::session::{Session, SessionEvent};

/// Scrubber range used until the engine reports a duration.
pub const UNKNOWN_DURATION_RANGE: f64 = 100.0;

/// Scrubber step in seconds.
pub const SCRUB_STEP: f64 = 0.1;

/// Format seconds as `mm:ss`. Negative and non-finite input reads `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Upper end of the scrubber.
pub fn scrub_range(duration: f64) -> f64 {
    if duration > 0.0 {
        duration
    } else {
        UNKNOWN_DURATION_RANGE
    }
}

/// Display the timeline and return a seek intent if the user moved it.
pub fn show(ui: &mut egui::Ui, session: &Session) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    let mut position = session.playback.current_time;

    ui.horizontal(|ui| {
        ui.label(format_time(session.playback.current_time));

        let time_width = ui.spacing().interact_size.x;
        ui.spacing_mut().slider_width = (ui.available_width() - time_width - 16.0).max(50.0);
        let slider = egui::Slider::new(&mut position, 0.0..=scrub_range(session.playback.duration))
            .step_by(SCRUB_STEP)
            .show_value(false);
        if ui.add(slider).changed() {
            events.push(SessionEvent::Scrub(position));
        }

        ui.label(format_time(session.playback.duration));
    });

    events
}
