// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the player application that implements the
//! egui::App trait. Each frame it polls the background annotation load,
//! reads the playback engine's state into the session, collects intents from
//! the UI panels and runs them through [`Session::apply`], handing the
//! resulting commands back to the engine.

use crate::config::PlayerConfig;
use crate::io::loader::{AssetDir, PendingLoad};
use crate::io::media::{open_engine, PlaybackEngine, VideoFrame};
use crate::io::serialization;
use crate::models::annotation::AnnotationKind;
use crate::models::session::{
    InteractionMode, LoadedAnnotations, PlaybackCommand, Session, SessionEvent,
};
use crate::ui::canvas::{self, DisplaySize};
use crate::ui::{properties, timeline, toolbar};
use std::path::PathBuf;

/// Slack added past the last annotation when the engine has no duration.
const COVER_MARGIN: f64 = 1.0;

/// Session events describing how the engine's state differs from the session's.
pub fn engine_events(session: &Session, engine: &dyn PlaybackEngine) -> Vec<SessionEvent> {
    let mut events = Vec::new();

    let duration = engine.duration().unwrap_or(0.0);
    if duration != session.playback.duration {
        events.push(SessionEvent::MetadataLoaded { duration });
    }
    let time = engine.current_time();
    if time != session.playback.current_time {
        events.push(SessionEvent::TimeUpdated(time));
    }
    let playing = !engine.is_paused();
    if playing != session.playback.playing {
        events.push(SessionEvent::PlayStateChanged(playing));
    }

    events
}

/// Carry out one reducer command on the engine.
pub fn execute(engine: &mut dyn PlaybackEngine, command: PlaybackCommand) {
    match command {
        PlaybackCommand::Play => engine.play(),
        PlaybackCommand::Pause => engine.pause(),
        PlaybackCommand::Seek(seconds) => engine.seek(seconds),
    }
}

/// Main application state.
pub struct PlayerApp {
    /// Settings the app was started with; written back on Save Config
    config: PlayerConfig,

    session: Session,

    engine: Box<dyn PlaybackEngine>,

    /// Texture holding the most recent video frame
    frame_texture: Option<egui::TextureHandle>,

    /// Annotation load running in the background
    pending_load: Option<PendingLoad>,
}

impl PlayerApp {
    /// Create the player and start loading annotations.
    pub fn new(config: PlayerConfig) -> Self {
        let engine = open_engine(config.video_src.as_deref(), config.clock_duration);

        let mut session = Session::new(config.match_window, config.matcher);
        session.show_debug = config.show_debug;
        session.apply(SessionEvent::SetOriginalWidth(config.original_width));
        session.apply(SessionEvent::SetOriginalHeight(config.original_height));

        let mut app = Self {
            config,
            session,
            engine,
            frame_texture: None,
            pending_load: None,
        };
        app.reload_annotations();
        app
    }

    /// Start a fresh load of both annotation files. A load already in flight
    /// is superseded and its result discarded.
    pub fn reload_annotations(&mut self) {
        let generation = self.session.begin_load();
        log::info!(
            "Loading annotations from {} (request {})",
            self.config.asset_dir.display(),
            generation
        );
        self.pending_load = Some(PendingLoad::spawn(
            Box::new(AssetDir::new(self.config.asset_dir.clone())),
            self.config.schema,
            generation,
        ));
    }

    /// Switch to another video or image source.
    pub fn open_video(&mut self, src: String) {
        log::info!("Opening {}", src);
        self.engine = open_engine(Some(&src), self.config.clock_duration);
        self.frame_texture = None;
        self.config.video_src = Some(src);
        self.cover_annotations();
    }

    fn cover_annotations(&mut self) {
        let last = AnnotationKind::ALL
            .iter()
            .filter_map(|kind| self.session.set(*kind).last_timestamp())
            .fold(None, |max: Option<f64>, t| Some(max.map_or(t, |m| m.max(t))));
        if let Some(last) = last {
            self.engine.cover(last + COVER_MARGIN);
        }
    }

    fn poll_loader(&mut self) {
        let Some(pending) = &self.pending_load else {
            return;
        };

        let generation = pending.generation();
        let loaded: Option<LoadedAnnotations> = match pending.poll() {
            Ok(result) => result,
            Err(e) => {
                log::error!("Annotation load {} stopped without a result: {}", generation, e);
                self.session.cancel_load();
                self.pending_load = None;
                return;
            }
        };

        if let Some(loaded) = loaded {
            log::debug!("Annotation load {} finished", generation);
            self.pending_load = None;
            self.session.apply(SessionEvent::AnnotationsLoaded(loaded));
            self.cover_annotations();
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context, frame: VideoFrame) {
        let size = [frame.width as usize, frame.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.pixels);
        match &mut self.frame_texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.frame_texture = Some(ctx.load_texture(
                    "video_frame",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }
    }

    /// Advance the engine and mirror its state into the session.
    fn sync_engine(&mut self, ctx: &egui::Context) {
        let dt = ctx.input(|i| i.stable_dt) as f64;
        if let Some(frame) = self.engine.tick(dt) {
            self.upload_frame(ctx, frame);
        }
        for event in engine_events(&self.session, self.engine.as_ref()) {
            self.session.apply(event);
        }
    }

    /// Run UI intents through the session and carry out the resulting commands.
    fn dispatch(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            for command in self.session.apply(event) {
                log::debug!("Playback command {:?}", command);
                execute(self.engine.as_mut(), command);
            }
        }
    }

    /// Write the current settings to a YAML or JSON file.
    fn save_config(&mut self, path: PathBuf) {
        let original = self.session.dimensions.original;
        self.config.original_width = original.width as u32;
        self.config.original_height = original.height as u32;
        self.config.show_debug = self.session.show_debug;

        match serialization::export_config(&self.config, &path) {
            Ok(()) => log::info!("Saved configuration to {}", path.display()),
            Err(e) => log::error!("Failed to save configuration: {:#}", e),
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Video...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Videos", &["mp4", "mov", "avi", "mkv", "webm"])
                            .pick_file()
                        {
                            self.open_video(path.to_string_lossy().to_string());
                        }
                        ui.close_menu();
                    }
                    if ui.button("Open Image...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "tiff", "tif"])
                            .pick_file()
                        {
                            self.open_video(path.to_string_lossy().to_string());
                        }
                        ui.close_menu();
                    }
                    if ui.button("Open Annotation Folder...").clicked() {
                        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                            self.config.asset_dir = dir;
                            self.reload_annotations();
                        }
                        ui.close_menu();
                    }
                    if ui.button("Reload Annotations").clicked() {
                        self.reload_annotations();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save Config...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("YAML", &["yaml", "yml"])
                            .add_filter("JSON", &["json"])
                            .set_file_name("player.yaml")
                            .save_file()
                        {
                            self.save_config(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Show All").clicked() {
                        events.push(SessionEvent::ShowAll);
                        ui.close_menu();
                    }
                    if ui.button("Hide All").clicked() {
                        events.push(SessionEvent::HideAll);
                        ui.close_menu();
                    }
                    ui.separator();
                    let mut show_debug = self.session.show_debug;
                    if ui.checkbox(&mut show_debug, "Debug Panel").clicked() {
                        events.push(SessionEvent::ToggleDebug);
                        ui.close_menu();
                    }
                });
            });
        });

        events
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        self.sync_engine(ctx);

        let mut events = self.menu_bar(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            events.extend(toolbar::show(ui, &self.session));
        });

        egui::TopBottomPanel::bottom("timeline").show(ctx, |ui| {
            events.extend(timeline::show(ui, &self.session));
        });

        if self.session.show_debug {
            egui::SidePanel::right("debug")
                .default_width(280.0)
                .show(ctx, |ui| {
                    events.extend(properties::show(ui, &self.session));
                });
        }

        // Only process if no text field is focused (to avoid toggling while editing sizes)
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
                events.push(SessionEvent::TogglePlayback);
            }
            if ctx.input(|i| i.key_pressed(egui::Key::Escape))
                && self.session.mode == InteractionMode::Draw
            {
                events.push(SessionEvent::ToggleDrawMode);
            }
        }

        let fixed = DisplaySize {
            width: self.config.width,
            height: self.config.height,
        };
        egui::CentralPanel::default().show(ctx, |ui| {
            events.extend(canvas::show(
                ui,
                &self.session,
                self.frame_texture.as_ref(),
                self.engine.frame_size(),
                fixed,
            ));
        });

        self.dispatch(events);

        // Keep frames coming while the clock runs or a load is in flight
        if self.session.playback.playing || self.session.is_loading() {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::ClockPlayback;
    use crate::util::matcher::{MatchStrategy, MatchWindow};

    fn session() -> Session {
        Session::new(MatchWindow::FRAME, MatchStrategy::Linear)
    }

    #[test]
    fn test_engine_events_only_report_changes() {
        let mut session = session();
        let mut engine = ClockPlayback::new(Some(10.0), None);

        let events = engine_events(&session, &engine);
        assert_eq!(events, vec![SessionEvent::MetadataLoaded { duration: 10.0 }]);
        for event in events {
            session.apply(event);
        }
        assert!(engine_events(&session, &engine).is_empty());

        engine.play();
        engine.tick(0.5);
        let events = engine_events(&session, &engine);
        assert_eq!(
            events,
            vec![
                SessionEvent::TimeUpdated(0.5),
                SessionEvent::PlayStateChanged(true)
            ]
        );
    }

    #[test]
    fn test_click_round_trip_through_engine() {
        let mut session = session();
        let mut engine = ClockPlayback::new(Some(10.0), None);
        for event in engine_events(&session, &engine) {
            session.apply(event);
        }

        for command in session.apply(SessionEvent::OverlayClicked) {
            execute(&mut engine, command);
        }
        assert!(!engine.is_paused());

        for command in session.apply(SessionEvent::Scrub(4.0)) {
            execute(&mut engine, command);
        }
        assert_eq!(engine.current_time(), 4.0);
    }

    #[test]
    fn test_draw_mode_keeps_engine_paused() {
        let mut session = session();
        let mut engine = ClockPlayback::new(Some(10.0), None);
        session.apply(SessionEvent::ToggleDrawMode);

        for command in session.apply(SessionEvent::OverlayClicked) {
            execute(&mut engine, command);
        }
        for command in session.apply(SessionEvent::TogglePlayback) {
            execute(&mut engine, command);
        }
        assert!(engine.is_paused());
    }
}
