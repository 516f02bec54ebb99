// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation overlay drawn on top of the video frame.
//!
//! [`compose`] turns the session into a fresh list of draw commands in
//! overlay pixel coordinates; [`paint`] puts them on an `egui::Painter`.
//! The list is rebuilt from scratch every frame.

use crate::models::annotation::{AnnotationKind, AnnotationRecord, BoundingBox, Geometry, Point};
use crate::models::session::Session;
use crate::util::geometry::{triangulate, ScaleFactors};
use egui::epaint::RectShape;
use egui::{Color32, Mesh, Pos2, Rect, Shape, Stroke, Vec2};

const STROKE_WIDTH: f32 = 2.0;
const SKETCH_WIDTH: f32 = 3.0;
const LABEL_SIZE: f32 = 14.0;
/// A box whose top is at or above this line gets its label underneath.
const LABEL_CLEARANCE: f64 = 20.0;
const LABEL_GAP_ABOVE: f64 = 5.0;
const LABEL_GAP_BELOW: f64 = 15.0;

/// One primitive on the overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        fill: Color32,
        stroke: Stroke,
    },
    /// Closed outline, filled.
    Polygon {
        points: Vec<Pos2>,
        fill: Color32,
        stroke: Stroke,
    },
    /// Text whose bottom-left corner sits at `anchor`.
    Label {
        anchor: Pos2,
        text: String,
        color: Color32,
    },
    Freehand {
        points: Vec<Pos2>,
        stroke: Stroke,
    },
}

/// Colors for one annotation class.
#[derive(Debug, Clone, Copy)]
pub struct ClassStyle {
    pub stroke: Color32,
    /// Fill inside boxes. Polygons always use `area_fill`.
    pub box_fill: Color32,
    pub area_fill: Color32,
}

pub fn class_style(kind: AnnotationKind) -> ClassStyle {
    match kind {
        AnnotationKind::Detection => ClassStyle {
            stroke: Color32::from_rgba_unmultiplied(0, 255, 0, 160),
            box_fill: Color32::from_rgba_unmultiplied(0, 255, 0, 48),
            area_fill: Color32::from_rgba_unmultiplied(0, 255, 0, 48),
        },
        AnnotationKind::Damage => ClassStyle {
            stroke: Color32::from_rgba_unmultiplied(255, 0, 0, 200),
            box_fill: Color32::TRANSPARENT,
            area_fill: Color32::from_rgba_unmultiplied(255, 0, 0, 64),
        },
    }
}

/// Where a box label goes: just above the box, or below it when the box is
/// too close to the top edge.
pub fn label_anchor(bounds: &BoundingBox) -> Point {
    if bounds.y1 > LABEL_CLEARANCE {
        Point::new(bounds.x1, bounds.y1 - LABEL_GAP_ABOVE)
    } else {
        Point::new(bounds.x1, bounds.y1 + bounds.height() + LABEL_GAP_BELOW)
    }
}

/// Draw list for the current session state. Detections go first so damages
/// end up on top.
pub fn compose(session: &Session) -> Vec<DrawCommand> {
    let mut commands = Vec::new();

    for kind in AnnotationKind::ALL {
        let active = session.active(kind);
        if active.is_empty() {
            continue;
        }
        let factors = match session.scale_factors(kind) {
            Ok(factors) => factors,
            Err(e) => {
                log::trace!("Skipping {} this frame: {}", kind.title().to_lowercase(), e);
                continue;
            }
        };
        let style = class_style(kind);
        for record in active {
            push_record(&mut commands, record, &factors, &style);
        }
    }

    let sketch_stroke = Stroke::new(SKETCH_WIDTH, Color32::RED);
    for stroke in session.sketch.strokes() {
        if stroke.len() < 2 {
            continue;
        }
        commands.push(DrawCommand::Freehand {
            points: stroke.iter().map(pos).collect(),
            stroke: sketch_stroke,
        });
    }

    commands
}

fn push_record(
    commands: &mut Vec<DrawCommand>,
    record: &AnnotationRecord,
    factors: &ScaleFactors,
    style: &ClassStyle,
) {
    let stroke = Stroke::new(STROKE_WIDTH, style.stroke);
    let text = record.display_label();

    match factors.scale_geometry(&record.geometry) {
        Geometry::Polygon { vertices, .. } if !vertices.is_empty() => {
            let anchor = pos(&vertices[0]);
            commands.push(DrawCommand::Polygon {
                points: vertices.iter().map(pos).collect(),
                fill: style.area_fill,
                stroke,
            });
            commands.push(DrawCommand::Label {
                anchor,
                text,
                color: Color32::WHITE,
            });
        }
        geometry => {
            let bounds = geometry.bounds();
            // Corners as given; an inverted box is not normalized.
            let rect = Rect {
                min: Pos2::new(bounds.x1 as f32, bounds.y1 as f32),
                max: Pos2::new(bounds.x2 as f32, bounds.y2 as f32),
            };
            commands.push(DrawCommand::Rect {
                rect,
                fill: style.box_fill,
                stroke,
            });
            commands.push(DrawCommand::Label {
                anchor: pos(&label_anchor(bounds)),
                text,
                color: Color32::WHITE,
            });
        }
    }
}

fn pos(point: &Point) -> Pos2 {
    Pos2::new(point.x as f32, point.y as f32)
}

/// Filled area of a closed outline. The outline is triangulated, so concave
/// shapes are filled only inside their edges.
fn fill_mesh(points: &[Pos2], fill: Color32) -> Mesh {
    let outline: Vec<Point> = points
        .iter()
        .map(|p| Point::new(p.x as f64, p.y as f64))
        .collect();

    let mut mesh = Mesh::default();
    for point in points {
        mesh.colored_vertex(*point, fill);
    }
    for [a, b, c] in triangulate(&outline) {
        mesh.add_triangle(a as u32, b as u32, c as u32);
    }
    mesh
}

/// Shape for a command, moved by `offset`. Labels need the font system and
/// are painted as text instead.
fn shape(command: &DrawCommand, offset: Vec2) -> Option<Shape> {
    match command {
        DrawCommand::Rect { rect, fill, stroke } => {
            // Inverted corners would be culled by the tessellator.
            let rect = Rect::from_two_pos(rect.min, rect.max).translate(offset);
            Some(Shape::Rect(RectShape::new(rect, 0.0, *fill, *stroke)))
        }
        DrawCommand::Polygon {
            points,
            fill,
            stroke,
        } => {
            let points: Vec<Pos2> = points.iter().map(|p| *p + offset).collect();
            let mut shapes = Vec::with_capacity(2);
            if *fill != Color32::TRANSPARENT {
                let mesh = fill_mesh(&points, *fill);
                if !mesh.is_empty() {
                    shapes.push(Shape::mesh(mesh));
                }
            }
            shapes.push(Shape::closed_line(points, *stroke));
            Some(Shape::Vec(shapes))
        }
        DrawCommand::Freehand { points, stroke } => {
            let points = points.iter().map(|p| *p + offset).collect();
            Some(Shape::line(points, *stroke))
        }
        DrawCommand::Label { .. } => None,
    }
}

/// Paint `commands` with the overlay's top-left corner at `origin`.
pub fn paint(painter: &egui::Painter, origin: Pos2, commands: &[DrawCommand]) {
    let offset = origin.to_vec2();

    for command in commands {
        if let DrawCommand::Label {
            anchor,
            text,
            color,
        } = command
        {
            painter.text(
                *anchor + offset,
                egui::Align2::LEFT_BOTTOM,
                text,
                egui::FontId::proportional(LABEL_SIZE),
                *color,
            );
        } else if let Some(primitive) = shape(command, offset) {
            painter.add(primitive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parser::{parse_annotations, Schema};
    use crate::models::annotation::{AnnotationSet, Dimensions};
    use crate::models::session::{LoadedAnnotations, SessionEvent};
    use crate::util::matcher::{MatchStrategy, MatchWindow};

    fn session_with(detections: &str, damages: &str) -> Session {
        let mut session = Session::new(MatchWindow::LABEL, MatchStrategy::Linear);
        let generation = session.begin_load();
        session.apply(SessionEvent::AnnotationsLoaded(LoadedAnnotations {
            generation,
            detections: parse_annotations(detections, Schema::Rich).unwrap(),
            damages: parse_annotations(damages, Schema::Rich).unwrap(),
        }));
        session.apply(SessionEvent::SetOriginalWidth(100));
        session.apply(SessionEvent::SetOriginalHeight(100));
        session.apply(SessionEvent::Resized {
            width: 200.0,
            height: 200.0,
        });
        session.apply(SessionEvent::TimeUpdated(1.0));
        session
    }

    fn rects(commands: &[DrawCommand]) -> Vec<Rect> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    fn labels(commands: &[DrawCommand]) -> Vec<(Pos2, String)> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Label { anchor, text, .. } => Some((*anchor, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parsed_box_is_matched_and_doubled() {
        let session = session_with("1.0,10,20,,0.9,50,60,150,160", "");
        let commands = compose(&session);

        assert_eq!(
            rects(&commands),
            vec![Rect::from_min_max(Pos2::new(100.0, 120.0), Pos2::new(300.0, 320.0))]
        );
        assert_eq!(labels(&commands), vec![(Pos2::new(100.0, 115.0), "20 (90%)".to_string())]);
    }

    #[test]
    fn test_polygon_supersedes_box() {
        let session = session_with("", "1.0,4,dent,0.5,50,60,150,160,10,10;20,10;20,20");
        let commands = compose(&session);

        assert!(rects(&commands).is_empty());
        let polygon = commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Polygon { points, fill, .. } => Some((points.clone(), *fill)),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            polygon.0,
            vec![Pos2::new(20.0, 20.0), Pos2::new(40.0, 20.0), Pos2::new(40.0, 40.0)]
        );
        assert_eq!(polygon.1, class_style(AnnotationKind::Damage).area_fill);
        assert_eq!(labels(&commands)[0].0, Pos2::new(20.0, 20.0));
    }

    #[test]
    fn test_label_goes_below_box_near_top_edge() {
        assert_eq!(
            label_anchor(&BoundingBox::new(5.0, 21.0, 50.0, 60.0)),
            Point::new(5.0, 16.0)
        );
        assert_eq!(
            label_anchor(&BoundingBox::new(5.0, 20.0, 50.0, 60.0)),
            Point::new(5.0, 75.0)
        );
        assert_eq!(
            label_anchor(&BoundingBox::new(5.0, 0.0, 50.0, 10.0)),
            Point::new(5.0, 25.0)
        );
    }

    #[test]
    fn test_only_detection_boxes_are_filled() {
        let session = session_with("1.0,1,car,,10,20,30,40", "1.0,2,dent,,10,20,30,40");
        let fills: Vec<_> = compose(&session)
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { fill, .. } => Some(fill),
                _ => None,
            })
            .collect();
        assert_eq!(
            fills,
            vec![class_style(AnnotationKind::Detection).box_fill, Color32::TRANSPARENT]
        );
    }

    #[test]
    fn test_hidden_classes_draw_nothing() {
        let mut session = session_with("1.0,1,car,,10,20,30,40", "1.0,2,dent,,10,20,30,40");
        session.apply(SessionEvent::HideAll);
        assert!(compose(&session).is_empty());

        session.apply(SessionEvent::ToggleDamages);
        assert_eq!(rects(&compose(&session)).len(), 1);
    }

    #[test]
    fn test_inactive_time_draws_nothing() {
        let mut session = session_with("1.0,1,car,,10,20,30,40", "");
        session.apply(SessionEvent::TimeUpdated(1.6));
        assert!(compose(&session).is_empty());
    }

    #[test]
    fn test_degenerate_batch_resolution_skips_only_that_class() {
        let mut session = Session::new(MatchWindow::LABEL, MatchStrategy::Linear);
        let generation = session.begin_load();
        session.apply(SessionEvent::AnnotationsLoaded(LoadedAnnotations {
            generation,
            detections: parse_annotations("1.0,1,car,,10,20,30,40", Schema::Rich).unwrap(),
            damages: AnnotationSet::new(
                parse_annotations("1.0,2,dent,,10,20,30,40", Schema::Rich)
                    .unwrap()
                    .records()
                    .to_vec(),
                Some(Dimensions::new(0.0, 0.0)),
            ),
        }));
        session.apply(SessionEvent::Resized {
            width: 480.0,
            height: 848.0,
        });
        session.apply(SessionEvent::TimeUpdated(1.0));

        let commands = compose(&session);
        assert_eq!(rects(&commands).len(), 1);
        for command in &commands {
            if let DrawCommand::Rect { rect, .. } = command {
                assert!(rect.min.x.is_finite() && rect.max.y.is_finite());
            }
        }
    }

    #[test]
    fn test_inverted_box_is_drawn_as_given() {
        let session = session_with("1.0,1,car,,50,60,40,20", "");
        let rect = rects(&compose(&session))[0];
        assert_eq!(rect.min, Pos2::new(100.0, 120.0));
        assert_eq!(rect.max, Pos2::new(80.0, 40.0));
    }

    fn tessellate(shape: Shape) -> Mesh {
        let mut tessellator = egui::epaint::Tessellator::new(
            1.0,
            egui::epaint::TessellationOptions::default(),
            [1, 1],
            Vec::new(),
        );
        let mut mesh = Mesh::default();
        tessellator.tessellate_shape(shape, &mut mesh);
        mesh
    }

    fn triangle_contains(mesh: &Mesh, p: Pos2) -> bool {
        let side = |a: Pos2, b: Pos2| (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        mesh.indices.chunks(3).any(|t| {
            let [a, b, c] = [0, 1, 2].map(|i| mesh.vertices[t[i] as usize].pos);
            let d = [side(a, b), side(b, c), side(c, a)];
            d.iter().all(|v| *v > 0.0) || d.iter().all(|v| *v < 0.0)
        })
    }

    #[test]
    fn test_inverted_box_still_paints() {
        let session = session_with("1.0,1,car,,50,60,40,20", "");
        let commands = compose(&session);
        let rect = shape(&commands[0], Vec2::new(10.0, 10.0)).unwrap();

        let mesh = tessellate(rect);
        assert!(!mesh.vertices.is_empty());
        let bounds = mesh.calc_bounds();
        assert!(bounds.contains(Pos2::new(90.0, 50.0)));
        assert!(bounds.contains(Pos2::new(110.0, 130.0)));
    }

    #[test]
    fn test_concave_polygon_fill_stays_inside_outline() {
        let session = session_with("", "1.0,4,dent,0.5,0,0,20,20,0,0;10,5;0,10;5,5");
        let commands = compose(&session);
        let polygon = commands
            .iter()
            .find(|c| matches!(c, DrawCommand::Polygon { .. }))
            .unwrap();

        let Some(Shape::Vec(parts)) = shape(polygon, Vec2::ZERO) else {
            panic!("polygon should paint as a fill and an outline");
        };
        assert_eq!(parts.len(), 2);
        let Shape::Mesh(fill) = &parts[0] else {
            panic!("fill should be a mesh");
        };
        assert_eq!(fill.indices.len(), 6);
        // Points scale by 2: the notch is at (10,10), the tip at (20,10).
        assert!(!triangle_contains(fill, Pos2::new(4.0, 10.0)));
        assert!(triangle_contains(fill, Pos2::new(14.0, 9.0)));
        assert!(matches!(parts[1], Shape::Path(_)));
    }

    #[test]
    fn test_sketch_strokes_are_drawn() {
        let mut session = session_with("", "");
        session.apply(SessionEvent::ToggleDrawMode);
        session.apply(SessionEvent::PointerDown(Point::new(1.0, 1.0)));
        session.apply(SessionEvent::PointerMoved(Point::new(4.0, 5.0)));
        session.apply(SessionEvent::PointerUp);
        session.apply(SessionEvent::PointerDown(Point::new(9.0, 9.0)));
        session.apply(SessionEvent::PointerUp);

        let commands = compose(&session);
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            DrawCommand::Freehand { points, stroke } => {
                assert_eq!(points, &vec![Pos2::new(1.0, 1.0), Pos2::new(4.0, 5.0)]);
                assert_eq!(stroke.color, Color32::RED);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
