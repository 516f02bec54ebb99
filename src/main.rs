// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay Player - Video Damage and Detection Analyzer
//!
//! A desktop video player that draws time-synchronized detection and damage
//! annotations over the video as it plays.

mod app;
mod config;
mod error;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::PlayerApp;
use clap::Parser;
use config::{Cli, PlayerConfig};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let file_config = match &cli.config {
        Some(path) => io::serialization::import_config(path)?,
        None => PlayerConfig::default(),
    };
    let config = file_config.merge_cli(&cli);
    log::info!(
        "Starting with assets from {}, schema {:?}, window {}",
        config.asset_dir.display(),
        config.schema,
        config.match_window
    );

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Video Damage and Detection Analyzer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Overlay Player",
        options,
        Box::new(|_cc| Ok(Box::new(PlayerApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
