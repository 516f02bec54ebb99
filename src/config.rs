// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Player configuration.
//!
//! Built-in defaults are overlaid by an optional YAML/JSON file, which is in
//! turn overlaid by command-line flags.

use crate::io::parser::Schema;
use crate::models::annotation::{DEFAULT_SOURCE_HEIGHT, DEFAULT_SOURCE_WIDTH};
use crate::util::matcher::{MatchStrategy, MatchWindow};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Video file, stream URL or still image shown under the overlay.
    pub video_src: Option<String>,
    /// Directory holding `detection.txt` and `damage.txt`.
    pub asset_dir: PathBuf,
    pub schema: Schema,
    pub match_window: MatchWindow,
    pub matcher: MatchStrategy,
    /// Fixed display width; the video fills the panel width when unset.
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub original_width: u32,
    pub original_height: u32,
    pub show_debug: bool,
    /// Timeline length when the video source does not provide one.
    pub clock_duration: Option<f64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            video_src: None,
            asset_dir: PathBuf::from("assets"),
            schema: Schema::default(),
            match_window: MatchWindow::default(),
            matcher: MatchStrategy::default(),
            width: None,
            height: None,
            original_width: DEFAULT_SOURCE_WIDTH as u32,
            original_height: DEFAULT_SOURCE_HEIGHT as u32,
            show_debug: true,
            clock_duration: None,
        }
    }
}

/// Command line. Every flag overrides the matching config file entry.
#[derive(Parser, Debug, Default)]
#[command(name = "overlay_player", about = "Play a video with detection and damage overlays")]
pub struct Cli {
    /// YAML or JSON configuration file
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Video file, stream URL or still image
    #[arg(value_name = "VIDEO")]
    pub video: Option<String>,

    /// Directory containing detection.txt and damage.txt
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Annotation file layout: rich or simple
    #[arg(long)]
    pub schema: Option<Schema>,

    /// Matching window: frame (0.01s), label (0.5s) or seconds
    #[arg(long)]
    pub window: Option<MatchWindow>,

    /// Matching lookup: linear or sorted
    #[arg(long)]
    pub matcher: Option<MatchStrategy>,

    #[arg(long)]
    pub width: Option<f32>,

    #[arg(long)]
    pub height: Option<f32>,

    /// Width the annotation coordinates were recorded at
    #[arg(long)]
    pub original_width: Option<u32>,

    /// Height the annotation coordinates were recorded at
    #[arg(long)]
    pub original_height: Option<u32>,

    /// Timeline length in seconds when the source has none
    #[arg(long)]
    pub duration: Option<f64>,

    /// Start with the debug panel hidden
    #[arg(long)]
    pub no_debug: bool,
}

impl PlayerConfig {
    /// Apply command-line overrides.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(video) = &cli.video {
            self.video_src = Some(video.clone());
        }
        if let Some(assets) = &cli.assets {
            self.asset_dir = assets.clone();
        }
        if let Some(schema) = cli.schema {
            self.schema = schema;
        }
        if let Some(window) = cli.window {
            self.match_window = window;
        }
        if let Some(matcher) = cli.matcher {
            self.matcher = matcher;
        }
        if cli.width.is_some() {
            self.width = cli.width;
        }
        if cli.height.is_some() {
            self.height = cli.height;
        }
        if let Some(width) = cli.original_width {
            self.original_width = width;
        }
        if let Some(height) = cli.original_height {
            self.original_height = height;
        }
        if cli.duration.is_some() {
            self.clock_duration = cli.duration;
        }
        if cli.no_debug {
            self.show_debug = false;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_file_values() {
        let file = PlayerConfig {
            video_src: Some("file.mp4".to_string()),
            schema: Schema::Simple,
            original_width: 1280,
            ..PlayerConfig::default()
        };
        let cli = Cli::parse_from([
            "overlay_player",
            "clip.mp4",
            "--window",
            "label",
            "--matcher",
            "sorted",
            "--original-height",
            "720",
            "--no-debug",
        ]);

        let merged = file.merge_cli(&cli);
        assert_eq!(merged.video_src.as_deref(), Some("clip.mp4"));
        assert_eq!(merged.schema, Schema::Simple);
        assert_eq!(merged.match_window, MatchWindow::LABEL);
        assert_eq!(merged.matcher, MatchStrategy::Sorted);
        assert_eq!((merged.original_width, merged.original_height), (1280, 720));
        assert!(!merged.show_debug);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: PlayerConfig =
            serde_yaml::from_str("schema: simple\nmatch_window: 0.2\n").unwrap();
        assert_eq!(config.schema, Schema::Simple);
        assert_eq!(config.match_window.seconds(), 0.2);
        assert_eq!(config.asset_dir, PathBuf::from("assets"));
        assert_eq!((config.original_width, config.original_height), (480, 848));
        assert!(config.show_debug);
    }

    #[test]
    fn test_bad_window_on_command_line_is_rejected() {
        assert!(Cli::try_parse_from(["overlay_player", "--window", "forever"]).is_err());
    }
}
