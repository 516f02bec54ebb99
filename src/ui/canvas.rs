// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video surface with the annotation overlay.
//!
//! This module shows the current video frame, reports the size it is drawn
//! at, paints the overlay on top, and turns pointer input into session
//! events: clicks toggle playback, drags draw in draw mode.

use crate::models::annotation::{Dimensions, Point};
use crate::models::session::{InteractionMode, Session, SessionEvent};
use crate::ui::overlay;

/// Requested display size; unset sides follow the frame's aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplaySize {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Size to draw the video at inside `available`.
///
/// A fixed width and height are used as given. Otherwise the frame keeps its
/// aspect ratio, fitted to whatever is fixed or to the available space.
pub fn display_size(
    available: egui::Vec2,
    frame_size: Option<(u32, u32)>,
    fixed: DisplaySize,
) -> egui::Vec2 {
    let fallback = Dimensions::default_source();
    let aspect = match frame_size {
        Some((w, h)) if w > 0 && h > 0 => w as f32 / h as f32,
        _ => (fallback.width / fallback.height) as f32,
    };

    match (fixed.width, fixed.height) {
        (Some(width), Some(height)) => egui::vec2(width, height),
        (Some(width), None) => egui::vec2(width, width / aspect),
        (None, Some(height)) => egui::vec2(height * aspect, height),
        (None, None) => {
            if available.y <= 0.0 || available.x <= 0.0 {
                return egui::Vec2::ZERO;
            }
            if aspect > available.x / available.y {
                egui::vec2(available.x, available.x / aspect)
            } else {
                egui::vec2(available.y * aspect, available.y)
            }
        }
    }
}

/// Display the video and overlay, returning the events raised this frame.
pub fn show(
    ui: &mut egui::Ui,
    session: &Session,
    texture: Option<&egui::TextureHandle>,
    frame_size: Option<(u32, u32)>,
    fixed: DisplaySize,
) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let status_height = ui.spacing().interact_size.y + ui.spacing().item_spacing.y * 2.0;
    let available = ui.available_size() - egui::vec2(0.0, status_height);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available);

        let size = display_size(ui.available_size(), frame_size, fixed);
        let x_offset = ((ui.available_width() - size.x) / 2.0).max(0.0);
        let y_offset = ((ui.available_height() - size.y) / 2.0).max(0.0);
        let video_rect =
            egui::Rect::from_min_size(ui.min_rect().min + egui::vec2(x_offset, y_offset), size);

        if (size.x as f64, size.y as f64)
            != (session.dimensions.display.width, session.dimensions.display.height)
        {
            events.push(SessionEvent::Resized {
                width: size.x as f64,
                height: size.y as f64,
            });
        }

        match texture {
            Some(texture) => {
                ui.painter().image(
                    texture.id(),
                    video_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                ui.painter().rect_filled(video_rect, 0.0, egui::Color32::BLACK);
                ui.painter().text(
                    video_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "No video frame",
                    egui::FontId::proportional(14.0),
                    egui::Color32::from_gray(120),
                );
            }
        }

        let response = ui.allocate_rect(video_rect, egui::Sense::click_and_drag());
        let to_local = |pos: egui::Pos2| {
            Point::new((pos.x - video_rect.min.x) as f64, (pos.y - video_rect.min.y) as f64)
        };

        match session.mode {
            InteractionMode::Playback => {
                if response.clicked() {
                    events.push(SessionEvent::OverlayClicked);
                }
            }
            InteractionMode::Draw => {
                if response.drag_started() {
                    let origin = ui.input(|i| i.pointer.press_origin());
                    if let Some(pos) = origin.or(response.interact_pointer_pos()) {
                        events.push(SessionEvent::PointerDown(to_local(pos)));
                    }
                }
                if response.dragged() && session.sketch.is_drawing() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        if video_rect.contains(pos) {
                            events.push(SessionEvent::PointerMoved(to_local(pos)));
                        } else {
                            // Leaving the surface ends the stroke.
                            events.push(SessionEvent::PointerUp);
                        }
                    }
                }
                if response.drag_stopped() {
                    events.push(SessionEvent::PointerUp);
                }
            }
        }

        overlay::paint(
            &ui.painter_at(video_rect),
            video_rect.min,
            &overlay::compose(session),
        );

        if session.mode == InteractionMode::Draw {
            response.on_hover_cursor(egui::CursorIcon::Crosshair);
        }
    });

    // Status line at the bottom
    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Mode: {:?}", session.mode));
        ui.separator();
        if session.is_loading() {
            ui.label("Loading annotations...");
        } else {
            ui.label(format!(
                "{} detections, {} damages loaded",
                session.detections.len(),
                session.damages.len()
            ));
        }
    });

    events
}
