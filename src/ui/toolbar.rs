// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Player control toolbar.
//!
//! This module provides the row of playback, visibility and draw mode
//! controls shown above the video.

use crate::models::annotation::AnnotationKind;
use crate::models::session::{InteractionMode, Session, SessionEvent};

/// Button text for a class toggle, e.g. `Detections (3)`.
///
/// The count is only shown while the class is visible and something is active.
pub fn class_button_text(kind: AnnotationKind, visible: bool, active: usize) -> String {
    if visible && active > 0 {
        format!("{} ({})", kind.title(), active)
    } else {
        kind.title().to_string()
    }
}

/// Display the toolbar and return the intents raised this frame.
pub fn show(ui: &mut egui::Ui, session: &Session) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    let drawing = session.mode == InteractionMode::Draw;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let play_text = if session.playback.playing {
            "⏸ Pause"
        } else {
            "▶ Play"
        };
        if ui.add_enabled(!drawing, egui::Button::new(play_text)).clicked() {
            events.push(SessionEvent::TogglePlayback);
        }

        ui.separator();

        for kind in AnnotationKind::ALL {
            let visible = session.visibility.is_visible(kind);
            let text = class_button_text(kind, visible, session.active(kind).len());
            if ui.selectable_label(visible, text).clicked() {
                events.push(match kind {
                    AnnotationKind::Detection => SessionEvent::ToggleDetections,
                    AnnotationKind::Damage => SessionEvent::ToggleDamages,
                });
            }
        }

        let all_text = if session.visibility.all_visible() {
            "Hide All"
        } else {
            "Show All"
        };
        if ui.button(all_text).clicked() {
            events.push(SessionEvent::ToggleAll);
        }

        ui.separator();

        let draw_text = if drawing { "Exit Draw Mode" } else { "✏ Draw Mode" };
        if ui.selectable_label(drawing, draw_text).clicked() {
            events.push(SessionEvent::ToggleDrawMode);
        }
        if ui
            .add_enabled(drawing, egui::Button::new("Clear Canvas"))
            .clicked()
        {
            events.push(SessionEvent::ClearSketch);
        }

        if session.is_loading() {
            ui.separator();
            ui.spinner();
            ui.label(egui::RichText::new("Loading...").italics().weak());
        }
    });

    events
}
