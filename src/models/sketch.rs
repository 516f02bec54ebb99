// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Freehand strokes drawn over the overlay in draw mode.
//!
//! Strokes live in overlay pixel coordinates. They are not annotations: they
//! are never matched to playback time and are discarded on clear.

use super::annotation::Point;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    strokes: Vec<Vec<Point>>,
    drawing: bool,
}

impl Sketch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a stroke at the pointer-down position.
    pub fn begin(&mut self, point: Point) {
        self.strokes.push(vec![point]);
        self.drawing = true;
    }

    /// Extend the current stroke. Ignored when no stroke is in progress.
    pub fn extend(&mut self, point: Point) {
        if !self.drawing {
            return;
        }
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.push(point);
        }
    }

    pub fn end(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn strokes(&self) -> &[Vec<Point>] {
        &self.strokes
    }
}
