// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Player session state.
//!
//! The session owns everything the overlay is drawn from: the loaded
//! annotation sets, visibility flags, original and display dimensions,
//! playback position and the draw-mode sketch. It changes only through
//! [`Session::apply`], which maps one [`SessionEvent`] onto the state and
//! returns the commands the playback engine has to carry out.

use super::annotation::{AnnotationKind, AnnotationRecord, AnnotationSet, Dimensions, Point};
use super::sketch::Sketch;
use crate::util::geometry::{ScaleError, ScaleFactors};
use crate::util::matcher::{MatchStrategy, MatchWindow};

/// Which annotation classes are drawn. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityState {
    pub show_detections: bool,
    pub show_damages: bool,
}

impl Default for VisibilityState {
    fn default() -> Self {
        Self {
            show_detections: true,
            show_damages: true,
        }
    }
}

impl VisibilityState {
    pub fn is_visible(&self, kind: AnnotationKind) -> bool {
        match kind {
            AnnotationKind::Detection => self.show_detections,
            AnnotationKind::Damage => self.show_damages,
        }
    }

    pub fn all_visible(&self) -> bool {
        self.show_detections && self.show_damages
    }
}

/// Resolution annotations were authored against, and the size the video is
/// drawn at right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionState {
    pub original: Dimensions,
    pub display: Dimensions,
}

impl Default for DimensionState {
    fn default() -> Self {
        Self {
            original: Dimensions::default_source(),
            display: Dimensions::new(0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackState {
    pub playing: bool,
    pub current_time: f64,
    /// Zero until the engine reports its duration.
    pub duration: f64,
}

/// Whether pointer input on the overlay controls playback or draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Playback,
    Draw,
}

/// Both classes from one load request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedAnnotations {
    pub generation: u64,
    pub detections: AnnotationSet,
    pub damages: AnnotationSet,
}

/// Something that happened to the player: engine notifications and user intents.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TimeUpdated(f64),
    Resized { width: f64, height: f64 },
    PlayStateChanged(bool),
    MetadataLoaded { duration: f64 },
    AnnotationsLoaded(LoadedAnnotations),

    TogglePlayback,
    OverlayClicked,
    Scrub(f64),

    ToggleDetections,
    ToggleDamages,
    ToggleAll,
    ShowAll,
    HideAll,

    ToggleDrawMode,
    PointerDown(Point),
    PointerMoved(Point),
    PointerUp,
    ClearSketch,

    /// Zero falls back to the default width.
    SetOriginalWidth(u32),
    /// Zero falls back to the default height.
    SetOriginalHeight(u32),
    ToggleDebug,
}

/// Work for the playback engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Seek(f64),
}

pub struct Session {
    pub detections: AnnotationSet,
    pub damages: AnnotationSet,
    pub visibility: VisibilityState,
    pub dimensions: DimensionState,
    pub playback: PlaybackState,
    pub mode: InteractionMode,
    pub sketch: Sketch,
    pub window: MatchWindow,
    pub strategy: MatchStrategy,
    pub show_debug: bool,
    /// Generation of the load in flight, if any.
    loading: Option<u64>,
    generation: u64,
}

impl Session {
    pub fn new(window: MatchWindow, strategy: MatchStrategy) -> Self {
        Self {
            detections: AnnotationSet::default(),
            damages: AnnotationSet::default(),
            visibility: VisibilityState::default(),
            dimensions: DimensionState::default(),
            playback: PlaybackState::default(),
            mode: InteractionMode::default(),
            sketch: Sketch::new(),
            window,
            strategy,
            show_debug: true,
            loading: None,
            generation: 0,
        }
    }

    /// Mark a new annotation load as in flight and return its generation.
    /// Results from earlier generations are dropped when they arrive.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.loading = Some(self.generation);
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Abandon the load in flight without touching the current sets.
    pub fn cancel_load(&mut self) {
        self.loading = None;
    }

    pub fn set(&self, kind: AnnotationKind) -> &AnnotationSet {
        match kind {
            AnnotationKind::Detection => &self.detections,
            AnnotationKind::Damage => &self.damages,
        }
    }

    /// Records of `kind` to draw at the current time. Empty when the class is hidden.
    pub fn active(&self, kind: AnnotationKind) -> Vec<&AnnotationRecord> {
        if !self.visibility.is_visible(kind) {
            return Vec::new();
        }
        self.set(kind)
            .active_at(self.playback.current_time, self.window, self.strategy)
    }

    /// Scale factors for `kind`, using the batch's declared resolution when it has one.
    pub fn scale_factors(&self, kind: AnnotationKind) -> Result<ScaleFactors, ScaleError> {
        let original = self.set(kind).reference_dimensions(self.dimensions.original);
        ScaleFactors::between(original, self.dimensions.display)
    }

    /// Apply one event and return what the playback engine must do.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<PlaybackCommand> {
        match event {
            SessionEvent::TimeUpdated(time) => {
                self.playback.current_time = time;
            }
            SessionEvent::Resized { width, height } => {
                let display = Dimensions::new(width, height);
                if self.dimensions.display != display {
                    log::debug!("Display size {}x{}", width, height);
                    self.dimensions.display = display;
                }
            }
            SessionEvent::PlayStateChanged(playing) => {
                self.playback.playing = playing;
            }
            SessionEvent::MetadataLoaded { duration } => {
                if duration.is_finite() && duration >= 0.0 {
                    self.playback.duration = duration;
                }
            }
            SessionEvent::AnnotationsLoaded(loaded) => self.replace_annotations(loaded),

            SessionEvent::TogglePlayback => {
                if self.mode == InteractionMode::Draw {
                    return Vec::new();
                }
                return vec![self.toggle_playback()];
            }
            SessionEvent::OverlayClicked => {
                if self.mode == InteractionMode::Playback {
                    return vec![self.toggle_playback()];
                }
            }
            SessionEvent::Scrub(time) => {
                let time = self.clamp_time(time);
                self.playback.current_time = time;
                return vec![PlaybackCommand::Seek(time)];
            }

            SessionEvent::ToggleDetections => {
                self.visibility.show_detections = !self.visibility.show_detections;
            }
            SessionEvent::ToggleDamages => {
                self.visibility.show_damages = !self.visibility.show_damages;
            }
            SessionEvent::ToggleAll => {
                let show = !self.visibility.all_visible();
                self.visibility = VisibilityState {
                    show_detections: show,
                    show_damages: show,
                };
            }
            SessionEvent::ShowAll => {
                self.visibility = VisibilityState {
                    show_detections: true,
                    show_damages: true,
                };
            }
            SessionEvent::HideAll => {
                self.visibility = VisibilityState {
                    show_detections: false,
                    show_damages: false,
                };
            }

            SessionEvent::ToggleDrawMode => {
                self.mode = match self.mode {
                    InteractionMode::Playback => InteractionMode::Draw,
                    InteractionMode::Draw => {
                        self.sketch.end();
                        InteractionMode::Playback
                    }
                };
                log::info!("Interaction mode: {:?}", self.mode);
            }
            SessionEvent::PointerDown(point) => {
                if self.mode == InteractionMode::Draw {
                    self.sketch.begin(point);
                }
            }
            SessionEvent::PointerMoved(point) => {
                if self.mode == InteractionMode::Draw {
                    self.sketch.extend(point);
                }
            }
            SessionEvent::PointerUp => self.sketch.end(),
            SessionEvent::ClearSketch => {
                if self.mode == InteractionMode::Draw {
                    self.sketch.clear();
                }
            }

            SessionEvent::SetOriginalWidth(width) => {
                let width = if width == 0 {
                    Dimensions::default_source().width
                } else {
                    width as f64
                };
                self.dimensions.original.width = width;
            }
            SessionEvent::SetOriginalHeight(height) => {
                let height = if height == 0 {
                    Dimensions::default_source().height
                } else {
                    height as f64
                };
                self.dimensions.original.height = height;
            }
            SessionEvent::ToggleDebug => self.show_debug = !self.show_debug,
        }
        Vec::new()
    }

    fn toggle_playback(&mut self) -> PlaybackCommand {
        let at_end =
            self.playback.duration > 0.0 && self.playback.current_time >= self.playback.duration;
        if self.playback.playing && !at_end {
            self.playback.playing = false;
            PlaybackCommand::Pause
        } else {
            self.playback.playing = true;
            PlaybackCommand::Play
        }
    }

    fn clamp_time(&self, time: f64) -> f64 {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        if self.playback.duration > 0.0 {
            time.min(self.playback.duration)
        } else {
            time
        }
    }

    fn replace_annotations(&mut self, loaded: LoadedAnnotations) {
        if self.loading != Some(loaded.generation) {
            log::debug!(
                "Dropping stale annotation load (generation {}, expecting {:?})",
                loaded.generation,
                self.loading
            );
            return;
        }
        self.loading = None;

        for (kind, set) in [
            (AnnotationKind::Detection, &loaded.detections),
            (AnnotationKind::Damage, &loaded.damages),
        ] {
            if let Some(size) = set.source_resolution {
                log::info!(
                    "Using {}x{} from {} as original size for {}",
                    size.width,
                    size.height,
                    kind.file_name(),
                    kind.title().to_lowercase()
                );
            }
        }

        self.detections = loaded.detections;
        self.damages = loaded.damages;
    }
}
