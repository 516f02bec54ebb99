// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Debug panel.
//!
//! This module shows the numbers behind the overlay: the resolution the
//! annotations were recorded at (editable), the display size, scale factors,
//! the playback timestamp and the first active box of each class.

use crate::models::annotation::{AnnotationKind, AnnotationRecord};
use crate::models::session::{Session, SessionEvent};
use crate::util::geometry::{ScaleError, ScaleFactors};

fn format_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    format!("x1={:.1}, y1={:.1}, x2={:.1}, y2={:.1}", x1, y1, x2, y2)
}

/// Scale factor readout, or a placeholder when the original size is unusable.
pub fn scale_text(factors: Result<ScaleFactors, ScaleError>) -> String {
    match factors {
        Ok(factors) => format!("X: {:.2}, Y: {:.2}", factors.x, factors.y),
        Err(_) => "X: -, Y: -".to_string(),
    }
}

/// One scale factor line per class. A batch that declares its own video size
/// is scaled from that size rather than the editable original.
pub fn scale_lines(session: &Session) -> Vec<String> {
    AnnotationKind::ALL
        .into_iter()
        .map(|kind| {
            format!(
                "{}: {}",
                kind.title(),
                scale_text(session.scale_factors(kind))
            )
        })
        .collect()
}

/// Description lines for one active record.
pub fn summary_lines(record: &AnnotationRecord, factors: Option<ScaleFactors>) -> Vec<String> {
    let id = record
        .class_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    let b = record.geometry.bounds();

    let mut lines = vec![
        format!("Class: {} (ID: {})", record.label, id),
        format!("Original: {}", format_coords(b.x1, b.y1, b.x2, b.y2)),
    ];
    if let Some(factors) = factors {
        let s = factors.scale_box(b);
        lines.push(format!("Scaled: {}", format_coords(s.x1, s.y1, s.x2, s.y2)));
    }
    if let Some(vertices) = record.geometry.vertices() {
        lines.push(format!("Polygon: {} vertices", vertices.len()));
    }
    lines
}

fn check(visible: bool) -> &'static str {
    if visible {
        "✓"
    } else {
        "✗"
    }
}

/// Display the debug panel and return any edits made to the original size.
pub fn show(ui: &mut egui::Ui, session: &Session) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    let dims = &session.dimensions;

    ui.heading("Debug Info");
    ui.separator();

    ui.label(egui::RichText::new("Original Video Size").strong());
    ui.horizontal(|ui| {
        let mut width = dims.original.width as u32;
        let mut height = dims.original.height as u32;
        ui.label("W:");
        if ui
            .add(egui::DragValue::new(&mut width).clamp_range(0..=16384))
            .changed()
        {
            events.push(SessionEvent::SetOriginalWidth(width));
        }
        ui.label("H:");
        if ui
            .add(egui::DragValue::new(&mut height).clamp_range(0..=16384))
            .changed()
        {
            events.push(SessionEvent::SetOriginalHeight(height));
        }
    });

    ui.label(format!(
        "Current Video Size: {:.0}x{:.0}",
        dims.display.width, dims.display.height
    ));
    ui.label("Scale Factors:");
    for line in scale_lines(session) {
        ui.label(egui::RichText::new(line).monospace());
    }
    ui.label(format!(
        "Current Timestamp: {:.3}",
        session.playback.current_time
    ));
    ui.label(format!(
        "Visibility: Damages {} | Detections {}",
        check(session.visibility.show_damages),
        check(session.visibility.show_detections)
    ));

    ui.separator();

    let order = [AnnotationKind::Damage, AnnotationKind::Detection];
    let active: Vec<(AnnotationKind, Vec<&AnnotationRecord>)> = order
        .into_iter()
        .map(|kind| (kind, session.active(kind)))
        .collect();
    let total: usize = active.iter().map(|(_, records)| records.len()).sum();
    ui.label(format!("Active Boxes: {}", total));

    for (kind, records) in &active {
        let Some(first) = records.first() else {
            continue;
        };
        ui.add_space(4.0);
        let title = match kind {
            AnnotationKind::Damage => "First Active Damage Box",
            AnnotationKind::Detection => "First Active Detection Box",
        };
        ui.label(egui::RichText::new(title).strong());
        for line in summary_lines(first, session.scale_factors(*kind).ok()) {
            ui.label(egui::RichText::new(line).monospace());
        }
    }

    events
}
