// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module re-projects annotation coordinates from the resolution they were
//! recorded at to the size the video is currently displayed at. X and Y scale
//! independently, the same way the video frame itself is stretched.

use crate::models::annotation::{BoundingBox, Dimensions, Geometry, Point};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ScaleError {
    #[error("original dimensions {width}x{height} cannot be scaled from")]
    DegenerateOriginal { width: f64, height: f64 },
}

/// Per-axis factors mapping original pixels to display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Factors for drawing `original`-resolution coordinates at `display` size.
    ///
    /// Fails when either original dimension is zero, negative or non-finite, so
    /// no infinite or NaN coordinate can reach the painter.
    pub fn between(original: Dimensions, display: Dimensions) -> Result<Self, ScaleError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(original.width) || !usable(original.height) {
            return Err(ScaleError::DegenerateOriginal {
                width: original.width,
                height: original.height,
            });
        }

        let factors = Self {
            x: display.width / original.width,
            y: display.height / original.height,
        };
        if !factors.x.is_finite() || !factors.y.is_finite() {
            return Err(ScaleError::DegenerateOriginal {
                width: original.width,
                height: original.height,
            });
        }
        Ok(factors)
    }

    pub fn scale_point(&self, point: &Point) -> Point {
        Point::new(point.x * self.x, point.y * self.y)
    }

    pub fn scale_box(&self, bounds: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            bounds.x1 * self.x,
            bounds.y1 * self.y,
            bounds.x2 * self.x,
            bounds.y2 * self.y,
        )
    }

    pub fn scale_geometry(&self, geometry: &Geometry) -> Geometry {
        match geometry {
            Geometry::Box(bounds) => Geometry::Box(self.scale_box(bounds)),
            Geometry::Polygon { bounds, vertices } => Geometry::Polygon {
                bounds: self.scale_box(bounds),
                vertices: vertices.iter().map(|v| self.scale_point(v)).collect(),
            },
        }
    }
}

/// Scale a single point from `original` to `display` resolution.
pub fn scale(
    point: &Point,
    original: Dimensions,
    display: Dimensions,
) -> Result<Point, ScaleError> {
    Ok(ScaleFactors::between(original, display)?.scale_point(point))
}

/// Twice the signed area of a closed outline. Positive for counter-clockwise
/// vertex order in a y-up frame.
fn signed_area2(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Inside or on the edge of triangle `abc`, for either winding.
fn in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Split a simple polygon outline into triangles by ear clipping.
///
/// Returns index triples into `vertices`. Concave outlines are handled; the
/// triangles cover exactly the area enclosed by the outline. An outline that
/// crosses itself has no ears left at some point, and the rest is fanned.
pub fn triangulate(vertices: &[Point]) -> Vec<[usize; 3]> {
    let n = vertices.len();
    if n < 3 {
        return Vec::new();
    }
    let area = signed_area2(vertices);
    if area == 0.0 || !area.is_finite() {
        return Vec::new();
    }
    // Convex corners turn the same way as the whole outline.
    let winding = area.signum();

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let prev = remaining[(i + m - 1) % m];
            let cur = remaining[i];
            let next = remaining[(i + 1) % m];
            let (a, b, c) = (vertices[prev], vertices[cur], vertices[next]);
            if cross(a, b, c) * winding <= 0.0 {
                return false;
            }
            remaining.iter().all(|&other| {
                let p = vertices[other];
                other == prev
                    || other == cur
                    || other == next
                    || p == a
                    || p == b
                    || p == c
                    || !in_triangle(p, a, b, c)
            })
        });

        match ear {
            Some(i) => {
                let prev = remaining[(i + m - 1) % m];
                let next = remaining[(i + 1) % m];
                triangles.push([prev, remaining[i], next]);
                remaining.remove(i);
            }
            None => {
                for i in 1..m - 1 {
                    triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
                }
                return triangles;
            }
        }
    }

    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_dimensions_is_identity() {
        let dims = Dimensions::new(1920.0, 1080.0);
        let p = Point::new(123.4, 567.8);
        assert_eq!(scale(&p, dims, dims).unwrap(), p);
    }

    #[test]
    fn test_doubled_display_doubles_coordinates() {
        let original = Dimensions::new(480.0, 848.0);
        let display = Dimensions::new(960.0, 1696.0);
        let p = Point::new(12.5, 40.0);
        assert_eq!(scale(&p, original, display).unwrap(), Point::new(25.0, 80.0));
    }

    #[test]
    fn test_axes_scale_independently() {
        let factors =
            ScaleFactors::between(Dimensions::new(100.0, 100.0), Dimensions::new(300.0, 50.0))
                .unwrap();
        assert_eq!(factors.x, 3.0);
        assert_eq!(factors.y, 0.5);
        assert_eq!(factors.scale_point(&Point::new(10.0, 10.0)), Point::new(30.0, 5.0));
    }

    #[test]
    fn test_zero_original_dimension_is_rejected() {
        let display = Dimensions::new(640.0, 480.0);
        assert!(ScaleFactors::between(Dimensions::new(0.0, 480.0), display).is_err());
        assert!(ScaleFactors::between(Dimensions::new(640.0, 0.0), display).is_err());
        assert!(ScaleFactors::between(Dimensions::new(f64::NAN, 480.0), display).is_err());
    }

    #[test]
    fn test_zero_display_collapses_but_stays_finite() {
        let factors =
            ScaleFactors::between(Dimensions::new(640.0, 480.0), Dimensions::new(0.0, 0.0))
                .unwrap();
        assert_eq!(factors.scale_point(&Point::new(10.0, 10.0)), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_polygon_vertices_and_bounds_both_scale() {
        let factors = ScaleFactors { x: 2.0, y: 3.0 };
        let geometry = Geometry::Polygon {
            bounds: BoundingBox::new(1.0, 1.0, 2.0, 2.0),
            vertices: vec![Point::new(1.0, 1.0), Point::new(2.0, 1.0), Point::new(2.0, 2.0)],
        };
        let scaled = factors.scale_geometry(&geometry);
        assert_eq!(scaled.bounds(), &BoundingBox::new(2.0, 3.0, 4.0, 6.0));
        assert_eq!(
            scaled.vertices().unwrap(),
            &[Point::new(2.0, 3.0), Point::new(4.0, 3.0), Point::new(4.0, 6.0)]
        );
    }

    fn triangle_area(vertices: &[Point], [a, b, c]: [usize; 3]) -> f64 {
        cross(vertices[a], vertices[b], vertices[c]).abs() / 2.0
    }

    #[test]
    fn test_concave_outline_triangles_stay_inside() {
        // Arrow head pointing right with a notch at (5,5).
        let outline = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 10.0),
            Point::new(5.0, 5.0),
        ];
        let triangles = triangulate(&outline);
        assert_eq!(triangles.len(), 2);

        let covered: f64 = triangles.iter().map(|t| triangle_area(&outline, *t)).sum();
        assert_eq!(covered, signed_area2(&outline).abs() / 2.0);

        let notch = Point::new(2.0, 5.0);
        for [a, b, c] in triangles {
            assert!(!in_triangle(notch, outline[a], outline[b], outline[c]));
        }
    }

    #[test]
    fn test_convex_outline_either_winding() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let mut reversed = square;
        reversed.reverse();
        for outline in [square, reversed] {
            let triangles = triangulate(&outline);
            assert_eq!(triangles.len(), 2);
            let covered: f64 = triangles.iter().map(|t| triangle_area(&outline, *t)).sum();
            assert_eq!(covered, 16.0);
        }
    }

    #[test]
    fn test_degenerate_outlines_have_no_triangles() {
        assert!(triangulate(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).is_empty());
        let collinear = [Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
        assert!(triangulate(&collinear).is_empty());
    }
}
