// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Selection of the annotations active at a playback time.
//!
//! A record is active when `|timestamp - time| <= window`, inclusive on both
//! sides. Two window conventions are in use: a wide label window that keeps a
//! record highlighted for a second around its timestamp, and a tight frame
//! epsilon that treats records as per-frame markers. Callers always pass the
//! window explicitly.

use crate::models::annotation::AnnotationRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Half-width of the matching interval, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindowSetting", into = "WindowSetting")]
pub struct MatchWindow {
    seconds: f64,
}

impl MatchWindow {
    /// Per-frame marker matching.
    pub const FRAME: MatchWindow = MatchWindow { seconds: 0.01 };
    /// Label highlighting around the record's timestamp.
    pub const LABEL: MatchWindow = MatchWindow { seconds: 0.5 };

    pub fn from_seconds(seconds: f64) -> Result<Self, String> {
        if seconds.is_finite() && seconds >= 0.0 {
            Ok(Self { seconds })
        } else {
            Err(format!("match window must be a non-negative number of seconds, got {seconds}"))
        }
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn contains(&self, timestamp: f64, time: f64) -> bool {
        (timestamp - time).abs() <= self.seconds
    }
}

impl Default for MatchWindow {
    fn default() -> Self {
        Self::FRAME
    }
}

impl FromStr for MatchWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "frame" => Ok(Self::FRAME),
            "label" => Ok(Self::LABEL),
            other => other
                .parse::<f64>()
                .map_err(|_| format!("expected `frame`, `label` or seconds, got {other:?}"))
                .and_then(Self::from_seconds),
        }
    }
}

impl fmt::Display for MatchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WindowSetting {
    Seconds(f64),
    Named(String),
}

impl TryFrom<WindowSetting> for MatchWindow {
    type Error = String;

    fn try_from(setting: WindowSetting) -> Result<Self, Self::Error> {
        match setting {
            WindowSetting::Seconds(seconds) => Self::from_seconds(seconds),
            WindowSetting::Named(name) => name.parse(),
        }
    }
}

impl From<MatchWindow> for WindowSetting {
    fn from(window: MatchWindow) -> Self {
        if window == MatchWindow::FRAME {
            WindowSetting::Named("frame".to_string())
        } else if window == MatchWindow::LABEL {
            WindowSetting::Named("label".to_string())
        } else {
            WindowSetting::Seconds(window.seconds)
        }
    }
}

/// Which lookup an annotation set uses for matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    #[default]
    Linear,
    Sorted,
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "linear" => Ok(Self::Linear),
            "sorted" => Ok(Self::Sorted),
            other => Err(format!("expected `linear` or `sorted`, got {other:?}")),
        }
    }
}

/// Lookup of active records. Results are indices into the record slice, in
/// file order.
pub trait TemporalIndex {
    fn active_indices(&self, time: f64, window: MatchWindow) -> Vec<usize>;
}

/// Checks every record. Fine for the tens to hundreds of records per file.
pub struct LinearScan<'a> {
    records: &'a [AnnotationRecord],
}

impl<'a> LinearScan<'a> {
    pub fn new(records: &'a [AnnotationRecord]) -> Self {
        Self { records }
    }
}

impl TemporalIndex for LinearScan<'_> {
    fn active_indices(&self, time: f64, window: MatchWindow) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| window.contains(record.timestamp, time))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Timestamps sorted once at load, searched with two binary searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedIndex {
    by_time: Vec<(f64, usize)>,
}

impl SortedIndex {
    pub fn build(records: &[AnnotationRecord]) -> Self {
        let mut by_time: Vec<(f64, usize)> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.timestamp, idx))
            .collect();
        by_time.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Self { by_time }
    }
}

impl TemporalIndex for SortedIndex {
    fn active_indices(&self, time: f64, window: MatchWindow) -> Vec<usize> {
        let w = window.seconds();
        // Same arithmetic as `MatchWindow::contains`, split into its two halves.
        let lo = self.by_time.partition_point(|(ts, _)| time - ts > w);
        let hi = self.by_time.partition_point(|(ts, _)| ts - time <= w);
        if lo >= hi {
            return Vec::new();
        }
        let mut indices: Vec<usize> = self.by_time[lo..hi].iter().map(|(_, idx)| *idx).collect();
        indices.sort_unstable();
        indices
    }
}

/// Every record within `window` seconds of `time`, in file order.
pub fn active_at(
    records: &[AnnotationRecord],
    time: f64,
    window: MatchWindow,
) -> Vec<&AnnotationRecord> {
    records
        .iter()
        .filter(|record| window.contains(record.timestamp, time))
        .collect()
}
