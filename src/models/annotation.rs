// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the records parsed from detection and damage files:
//! their geometry in source-resolution pixels, their category metadata, and
//! the per-file batch that owns them.

use crate::util::matcher::{LinearScan, MatchStrategy, MatchWindow, SortedIndex, TemporalIndex};
use serde::{Deserialize, Serialize};

/// Resolution assumed for annotation files that do not carry a `video_size`.
pub const DEFAULT_SOURCE_WIDTH: f64 = 480.0;
pub const DEFAULT_SOURCE_HEIGHT: f64 = 848.0;

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Resolution annotation files are authored against unless they say otherwise.
    pub fn default_source() -> Self {
        Self::new(DEFAULT_SOURCE_WIDTH, DEFAULT_SOURCE_HEIGHT)
    }
}

/// Axis-aligned box given by its top-left and bottom-right corners.
///
/// Corner order is not validated: a box with `x2 < x1` keeps a negative width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Shape of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Box(BoundingBox),
    /// Damage outline. `bounds` is kept as the bounding fallback.
    Polygon {
        bounds: BoundingBox,
        vertices: Vec<Point>,
    },
}

impl Geometry {
    /// The rectangle fields of the record, present for both variants.
    pub fn bounds(&self) -> &BoundingBox {
        match self {
            Geometry::Box(bounds) => bounds,
            Geometry::Polygon { bounds, .. } => bounds,
        }
    }

    pub fn vertices(&self) -> Option<&[Point]> {
        match self {
            Geometry::Box(_) => None,
            Geometry::Polygon { vertices, .. } => Some(vertices),
        }
    }
}

/// One line of an annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Playback time in seconds the record applies to.
    pub timestamp: f64,
    pub class_id: Option<i64>,
    pub label: String,
    pub confidence: Option<f64>,
    pub geometry: Geometry,
}

impl AnnotationRecord {
    /// Text drawn next to the annotation, e.g. `scratch (87%)`.
    pub fn display_label(&self) -> String {
        match self.confidence {
            Some(confidence) => format!("{} ({}%)", self.label, (confidence * 100.0).round()),
            None => self.label.clone(),
        }
    }
}

/// The two annotation classes drawn over the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Detection,
    Damage,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 2] = [AnnotationKind::Detection, AnnotationKind::Damage];

    /// Name of the resource the class is loaded from.
    pub fn file_name(&self) -> &'static str {
        match self {
            AnnotationKind::Detection => "detection.txt",
            AnnotationKind::Damage => "damage.txt",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AnnotationKind::Detection => "Detections",
            AnnotationKind::Damage => "Damages",
        }
    }
}

/// All records parsed from one file. Replaced wholesale, never edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    records: Vec<AnnotationRecord>,
    /// Resolution declared by the file's `video_size` column, if any.
    pub source_resolution: Option<Dimensions>,
    index: SortedIndex,
}

impl AnnotationSet {
    pub fn new(records: Vec<AnnotationRecord>, source_resolution: Option<Dimensions>) -> Self {
        let index = SortedIndex::build(&records);
        Self {
            records,
            source_resolution,
            index,
        }
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records active at `time`, in file order.
    pub fn active_at(
        &self,
        time: f64,
        window: MatchWindow,
        strategy: MatchStrategy,
    ) -> Vec<&AnnotationRecord> {
        let indices = match strategy {
            MatchStrategy::Linear => LinearScan::new(&self.records).active_indices(time, window),
            MatchStrategy::Sorted => self.index.active_indices(time, window),
        };
        indices.into_iter().map(|idx| &self.records[idx]).collect()
    }

    /// Resolution to scale this batch from: its own `video_size` when declared.
    pub fn reference_dimensions(&self, fallback: Dimensions) -> Dimensions {
        self.source_resolution.unwrap_or(fallback)
    }

    /// Latest timestamp in the batch.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|record| record.timestamp)
            .fold(None, |max, t| Some(max.map_or(t, |m: f64| m.max(t))))
    }
}
