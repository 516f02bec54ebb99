// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media playback engines.
//!
//! The player never decodes or validates media itself; it drives a
//! [`PlaybackEngine`] and reads back the current time, duration and frames.
//! Two engines exist: a clock that advances time from frame deltas (with an
//! optional still image as poster), and an OpenCV decoder behind the
//! `video-opencv` feature.

use anyhow::{Context, Result};
use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// A decoded RGBA8 frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Load an image file as an RGBA frame.
pub fn load_image(path: &Path) -> Result<VideoFrame> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rgba = img.to_rgba8();
    Ok(VideoFrame {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// The host video playback capability.
pub trait PlaybackEngine {
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn is_paused(&self) -> bool;
    fn ended(&self) -> bool;
    fn current_time(&self) -> f64;
    /// `None` until known.
    fn duration(&self) -> Option<f64>;
    /// Native frame size, when the engine shows frames.
    fn frame_size(&self) -> Option<(u32, u32)>;
    /// Advance by `dt` seconds of wall time. Returns a frame when a new one
    /// should be shown.
    fn tick(&mut self, dt: f64) -> Option<VideoFrame>;
    /// Make sure playback can reach `seconds`. Only meaningful for engines
    /// without a media-defined duration.
    fn cover(&mut self, _seconds: f64) {}
}

/// Time source without a decoder.
pub struct ClockPlayback {
    time: f64,
    duration: Option<f64>,
    playing: bool,
    poster: Option<VideoFrame>,
    poster_size: Option<(u32, u32)>,
}

impl ClockPlayback {
    pub fn new(duration: Option<f64>, poster: Option<VideoFrame>) -> Self {
        let poster_size = poster.as_ref().map(|p| (p.width, p.height));
        Self {
            time: 0.0,
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
            playing: false,
            poster,
            poster_size,
        }
    }
}

impl PlaybackEngine for ClockPlayback {
    fn play(&mut self) {
        if self.ended() {
            self.time = 0.0;
        }
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        self.time = match self.duration {
            Some(d) => seconds.min(d),
            None => seconds,
        };
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn ended(&self) -> bool {
        self.duration.is_some_and(|d| self.time >= d)
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.poster_size
    }

    fn tick(&mut self, dt: f64) -> Option<VideoFrame> {
        if self.playing && dt.is_finite() && dt > 0.0 {
            self.time += dt;
            if let Some(d) = self.duration {
                if self.time >= d {
                    self.time = d;
                    self.playing = false;
                }
            }
        }
        self.poster.take()
    }

    fn cover(&mut self, seconds: f64) {
        if seconds.is_finite() && self.duration.map_or(true, |d| d < seconds) {
            self.duration = Some(seconds);
        }
    }
}

#[cfg(feature = "video-opencv")]
pub use decoder::OpenCvPlayback;

#[cfg(feature = "video-opencv")]
mod decoder {
    use super::{PlaybackEngine, VideoFrame};
    use anyhow::Result;
    use opencv::{core::Mat, imgproc, prelude::*, videoio};

    /// Frames decoded with `videoio::VideoCapture`.
    pub struct OpenCvPlayback {
        capture: videoio::VideoCapture,
        fps: f64,
        duration: f64,
        width: u32,
        height: u32,
        time: f64,
        playing: bool,
        /// Index of the frame the next `read` returns.
        next_frame: i64,
        seek_pending: bool,
    }

    impl OpenCvPlayback {
        pub fn open(src: &str) -> Result<Self> {
            let capture = videoio::VideoCapture::from_file(src, videoio::CAP_ANY)?;
            if !capture.is_opened()? {
                anyhow::bail!("Failed to open video {}", src);
            }

            let fps = capture.get(videoio::CAP_PROP_FPS)?;
            let fps = if fps.is_finite() && fps > 0.0 { fps } else { 30.0 };
            let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0);
            let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
            let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;

            log::info!(
                "Opened video {} ({}x{}, {:.2} fps, {} frames)",
                src,
                width,
                height,
                fps,
                frame_count
            );

            Ok(Self {
                capture,
                fps,
                duration: frame_count / fps,
                width,
                height,
                time: 0.0,
                playing: false,
                next_frame: 0,
                seek_pending: false,
            })
        }

        fn decode_frame(&mut self, target: i64) -> Result<Option<VideoFrame>> {
            if self.seek_pending || target < self.next_frame {
                self.capture
                    .set(videoio::CAP_PROP_POS_FRAMES, target as f64)?;
                self.next_frame = target;
                self.seek_pending = false;
            }
            while self.next_frame < target {
                if !self.capture.grab()? {
                    return Ok(None);
                }
                self.next_frame += 1;
            }

            let mut bgr = Mat::default();
            if !self.capture.read(&mut bgr)? || bgr.empty() {
                return Ok(None);
            }
            self.next_frame += 1;

            let mut rgba = Mat::default();
            imgproc::cvt_color(&bgr, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;
            Ok(Some(VideoFrame {
                width: rgba.cols() as u32,
                height: rgba.rows() as u32,
                pixels: rgba.data_bytes()?.to_vec(),
            }))
        }
    }

    impl PlaybackEngine for OpenCvPlayback {
        fn play(&mut self) {
            if self.ended() {
                self.seek(0.0);
            }
            self.playing = true;
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn seek(&mut self, seconds: f64) {
            self.time = if self.duration > 0.0 {
                seconds.clamp(0.0, self.duration)
            } else {
                seconds.max(0.0)
            };
            self.seek_pending = true;
        }

        fn is_paused(&self) -> bool {
            !self.playing
        }

        fn ended(&self) -> bool {
            self.duration > 0.0 && self.time >= self.duration
        }

        fn current_time(&self) -> f64 {
            self.time
        }

        fn duration(&self) -> Option<f64> {
            (self.duration > 0.0).then_some(self.duration)
        }

        fn frame_size(&self) -> Option<(u32, u32)> {
            Some((self.width, self.height))
        }

        fn tick(&mut self, dt: f64) -> Option<VideoFrame> {
            if self.playing && dt.is_finite() && dt > 0.0 {
                self.time += dt;
                if self.ended() {
                    self.time = self.duration;
                    self.playing = false;
                }
            }

            let mut target = (self.time * self.fps).floor() as i64;
            if self.duration > 0.0 {
                let last = ((self.duration * self.fps).ceil() as i64 - 1).max(0);
                target = target.min(last);
            }
            // The frame for `target` is already on screen.
            if !self.seek_pending && target == self.next_frame - 1 {
                return None;
            }
            match self.decode_frame(target) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Failed to decode frame {}: {}", target, e);
                    None
                }
            }
        }
    }
}

/// Pick an engine for `src`. Falls back to the clock when the source cannot
/// be opened, so playback of annotations still works.
pub fn open_engine(src: Option<&str>, clock_duration: Option<f64>) -> Box<dyn PlaybackEngine> {
    let Some(src) = src else {
        log::info!("No video source, using annotation clock");
        return Box::new(ClockPlayback::new(clock_duration, None));
    };

    let is_image = Path::new(src)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
    if is_image {
        return match load_image(Path::new(src)) {
            Ok(poster) => {
                log::info!("Loaded poster {} ({}x{})", src, poster.width, poster.height);
                Box::new(ClockPlayback::new(clock_duration, Some(poster)))
            }
            Err(e) => {
                log::error!("Failed to load image: {:#}", e);
                Box::new(ClockPlayback::new(clock_duration, None))
            }
        };
    }

    #[cfg(feature = "video-opencv")]
    {
        match OpenCvPlayback::open(src) {
            Ok(engine) => return Box::new(engine),
            Err(e) => log::error!("Failed to open video {}: {:#}", src, e),
        }
    }
    #[cfg(not(feature = "video-opencv"))]
    log::warn!(
        "Built without video-opencv, cannot decode {}; using annotation clock",
        src
    );

    Box::new(ClockPlayback::new(clock_duration, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_only_advances_while_playing() {
        let mut clock = ClockPlayback::new(Some(10.0), None);
        clock.tick(1.0);
        assert_eq!(clock.current_time(), 0.0);

        clock.play();
        clock.tick(0.25);
        clock.tick(0.25);
        assert_eq!(clock.current_time(), 0.5);

        clock.pause();
        clock.tick(1.0);
        assert_eq!(clock.current_time(), 0.5);
    }

    #[test]
    fn test_clock_pauses_at_end_and_restarts() {
        let mut clock = ClockPlayback::new(Some(1.0), None);
        clock.play();
        clock.tick(3.0);
        assert_eq!(clock.current_time(), 1.0);
        assert!(clock.is_paused());
        assert!(clock.ended());

        clock.play();
        assert_eq!(clock.current_time(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_clock_seek_clamps_to_duration() {
        let mut clock = ClockPlayback::new(Some(4.0), None);
        clock.seek(9.0);
        assert_eq!(clock.current_time(), 4.0);
        clock.seek(-2.0);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn test_cover_extends_unknown_or_short_duration() {
        let mut clock = ClockPlayback::new(None, None);
        assert_eq!(clock.duration(), None);
        clock.cover(12.0);
        assert_eq!(clock.duration(), Some(12.0));
        clock.cover(3.0);
        assert_eq!(clock.duration(), Some(12.0));
    }

    #[test]
    fn test_poster_is_delivered_once() {
        let poster = VideoFrame {
            width: 2,
            height: 1,
            pixels: vec![0; 8],
        };
        let mut clock = ClockPlayback::new(None, Some(poster.clone()));
        assert_eq!(clock.frame_size(), Some((2, 1)));
        assert_eq!(clock.tick(0.0), Some(poster));
        assert_eq!(clock.tick(0.0), None);
        assert_eq!(clock.frame_size(), Some((2, 1)));
    }

    #[test]
    fn test_load_image_returns_rgba_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let frame = load_image(&path).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.pixels.len(), 4 * 2 * 4);
        assert_eq!(&frame.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_open_engine_without_source_uses_clock() {
        let engine = open_engine(None, Some(30.0));
        assert_eq!(engine.duration(), Some(30.0));
        assert!(engine.is_paused());
    }
}
