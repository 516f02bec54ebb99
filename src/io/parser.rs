// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation file parsing.
//!
//! One record per line, comma-separated, blank lines skipped. Two layouts are
//! understood:
//!
//! - simple: `timestamp,x,y,x2,y2,label`
//! - rich: `[video_size,]timestamp,classId,className,confidence,x1,y1,x2,y2[,polygon]`
//!
//! In the rich layout `video_size` looks like `1920x1080` and the polygon is
//! `x,y;x,y;...` appended after `y2`. The polygon segment starts one field
//! before the first field containing `;`, so it needs at least two vertices to
//! be recognised. Columns are anchored at both ends: surplus fields between
//! `classId` and `confidence` belong to `className`, unless one of them after
//! the first is a number, which fails the batch.
//!
//! Any unparsable number fails the whole batch.

use crate::error::ParseError;
use crate::models::annotation::{
    AnnotationRecord, AnnotationSet, BoundingBox, Dimensions, Geometry, Point,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Column layout of an annotation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// Legacy `timestamp,x,y,x2,y2,label` layout.
    Simple,
    #[default]
    Rich,
}

impl FromStr for Schema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "simple" => Ok(Schema::Simple),
            "rich" => Ok(Schema::Rich),
            other => Err(format!("expected `simple` or `rich`, got {other:?}")),
        }
    }
}

const SIMPLE_FIELDS: usize = 6;
const RICH_FIELDS: usize = 8;

/// Parse annotation text into a batch. Record order follows line order.
pub fn parse_annotations(text: &str, schema: Schema) -> Result<AnnotationSet, ParseError> {
    let mut records = Vec::new();
    let mut source_resolution: Option<Dimensions> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match schema {
            Schema::Simple => records.push(parse_simple(line, line_no)?),
            Schema::Rich => {
                let (record, video_size) = parse_rich(line, line_no)?;
                match (source_resolution, video_size) {
                    (None, Some(size)) => source_resolution = Some(size),
                    (Some(first), Some(size)) if first != size => {
                        log::warn!(
                            "line {}: video size {}x{} ignored, batch already uses {}x{}",
                            line_no,
                            size.width,
                            size.height,
                            first.width,
                            first.height
                        );
                    }
                    _ => {}
                }
                records.push(record);
            }
        }
    }

    log::debug!("Parsed {} {:?} annotation records", records.len(), schema);
    Ok(AnnotationSet::new(records, source_resolution))
}

fn parse_simple(line: &str, line_no: usize) -> Result<AnnotationRecord, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < SIMPLE_FIELDS {
        return Err(ParseError::MissingFields {
            line: line_no,
            expected: SIMPLE_FIELDS,
            found: fields.len(),
        });
    }

    let timestamp = number(fields[0], "timestamp", line_no)?;
    let x = number(fields[1], "x", line_no)?;
    let y = number(fields[2], "y", line_no)?;
    let x2 = number(fields[3], "x2", line_no)?;
    let y2 = number(fields[4], "y2", line_no)?;

    Ok(AnnotationRecord {
        timestamp,
        class_id: None,
        label: fields[5..].join(",").trim().to_string(),
        confidence: None,
        geometry: Geometry::Box(BoundingBox::new(x, y, x2, y2)),
    })
}

fn parse_rich(
    line: &str,
    line_no: usize,
) -> Result<(AnnotationRecord, Option<Dimensions>), ParseError> {
    let mut fields: Vec<&str> = line.split(',').collect();

    let video_size = match fields.first() {
        Some(first) if first.contains(['x', 'X']) => {
            let size = parse_video_size(first, line_no)?;
            fields.remove(0);
            Some(size)
        }
        _ => None,
    };

    let (mandatory, polygon) = match fields.iter().position(|f| f.contains(';')) {
        Some(semi) if semi >= 1 => (&fields[..semi - 1], Some(fields[semi - 1..].join(","))),
        _ => (&fields[..], None),
    };

    if mandatory.len() < RICH_FIELDS {
        return Err(ParseError::MissingFields {
            line: line_no,
            expected: RICH_FIELDS,
            found: mandatory.len(),
        });
    }

    let n = mandatory.len();
    // Surplus columns may only continue a comma-containing class name. A
    // number there is a one-vertex polygon or a stray column.
    if let Some(extra) = mandatory[3..n - 5].iter().find(|f| finite(f).is_some()) {
        return Err(ParseError::UnexpectedNumber {
            line: line_no,
            value: extra.to_string(),
        });
    }
    let timestamp = number(mandatory[0], "timestamp", line_no)?;
    let class_id = class_id(mandatory[1], line_no)?;
    let label = mandatory[2..n - 5]
        .join(",")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string();
    let confidence = optional_number(mandatory[n - 5], "confidence", line_no)?;
    let bounds = BoundingBox::new(
        number(mandatory[n - 4], "x1", line_no)?,
        number(mandatory[n - 3], "y1", line_no)?,
        number(mandatory[n - 2], "x2", line_no)?,
        number(mandatory[n - 1], "y2", line_no)?,
    );

    let geometry = match polygon {
        Some(text) => {
            let vertices = parse_polygon(&text, line_no)?;
            if vertices.is_empty() {
                Geometry::Box(bounds)
            } else {
                Geometry::Polygon { bounds, vertices }
            }
        }
        None => Geometry::Box(bounds),
    };

    let record = AnnotationRecord {
        timestamp,
        class_id,
        label,
        confidence,
        geometry,
    };
    Ok((record, video_size))
}

fn parse_video_size(value: &str, line_no: usize) -> Result<Dimensions, ParseError> {
    let invalid = || ParseError::InvalidVideoSize {
        line: line_no,
        value: value.to_string(),
    };
    let (w, h) = value.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    Ok(Dimensions::new(width as f64, height as f64))
}

/// Parse `x,y;x,y;...`. Empty segments (a trailing `;`) are skipped.
fn parse_polygon(text: &str, line_no: usize) -> Result<Vec<Point>, ParseError> {
    let invalid = |pair: &str| ParseError::InvalidPolygon {
        line: line_no,
        value: pair.to_string(),
    };

    let mut vertices = Vec::new();
    for pair in text.split(';') {
        let pair = pair.trim().trim_matches(',');
        if pair.is_empty() {
            continue;
        }
        let (x, y) = pair.split_once(',').ok_or_else(|| invalid(pair))?;
        let x = finite(x).ok_or_else(|| invalid(pair))?;
        let y = finite(y).ok_or_else(|| invalid(pair))?;
        vertices.push(Point::new(x, y));
    }
    Ok(vertices)
}

fn finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn number(value: &str, field: &'static str, line_no: usize) -> Result<f64, ParseError> {
    finite(value).ok_or_else(|| ParseError::InvalidNumber {
        line: line_no,
        field,
        value: value.to_string(),
    })
}

fn optional_number(
    value: &str,
    field: &'static str,
    line_no: usize,
) -> Result<Option<f64>, ParseError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    number(value, field, line_no).map(Some)
}

fn class_id(value: &str, line_no: usize) -> Result<Option<i64>, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ParseError::InvalidNumber {
            line: line_no,
            field: "class_id",
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rich_line_with_surplus_column() {
        let set = parse_annotations("1.0,10,20,,0.9,50,60,150,160", Schema::Rich).unwrap();
        assert_eq!(set.len(), 1);
        let record = &set.records()[0];
        assert_eq!(record.timestamp, 1.0);
        assert_eq!(record.class_id, Some(10));
        assert_eq!(record.label, "20");
        assert_eq!(record.confidence, Some(0.9));
        assert_eq!(
            record.geometry,
            Geometry::Box(BoundingBox::new(50.0, 60.0, 150.0, 160.0))
        );
        assert_eq!(set.source_resolution, None);
    }

    #[test]
    fn test_rich_line_with_polygon_suffix() {
        let text = "2.5,3,dent,0.75,50,60,150,160,10,10;20,10;20,20";
        let set = parse_annotations(text, Schema::Rich).unwrap();
        let record = &set.records()[0];

        assert_eq!(record.label, "dent");
        assert_eq!(record.geometry.bounds(), &BoundingBox::new(50.0, 60.0, 150.0, 160.0));
        assert_eq!(
            record.geometry.vertices().unwrap(),
            &[Point::new(10.0, 10.0), Point::new(20.0, 10.0), Point::new(20.0, 20.0)]
        );
    }

    #[test]
    fn test_single_vertex_suffix_is_rejected() {
        let err = parse_annotations("2.5,3,dent,0.75,50,60,150,160,10,10", Schema::Rich)
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedNumber {
                line: 1,
                value: "0.75".to_string(),
            }
        );
    }

    #[test]
    fn test_comma_in_class_name_is_kept() {
        let set = parse_annotations("2.5,3,dent, rear door,0.75,50,60,150,160", Schema::Rich)
            .unwrap();
        assert_eq!(set.records()[0].label, "dent, rear door");
        assert_eq!(set.records()[0].confidence, Some(0.75));
    }

    #[test]
    fn test_polygon_length_does_not_shift_columns() {
        let text = "\
0.1,1,scratch,0.5,1,2,3,4,0,0;5,0
0.2,1,scratch,0.5,1,2,3,4,0,0;5,0;5,5;0,5;0,2;1,1";
        let set = parse_annotations(text, Schema::Rich).unwrap();
        assert_eq!(set.records()[0].geometry.vertices().unwrap().len(), 2);
        assert_eq!(set.records()[1].geometry.vertices().unwrap().len(), 6);
        for record in set.records() {
            assert_eq!(record.geometry.bounds(), &BoundingBox::new(1.0, 2.0, 3.0, 4.0));
            assert_eq!(record.confidence, Some(0.5));
        }
    }

    #[test]
    fn test_video_size_prefix_becomes_batch_resolution() {
        let text = "\
1920x1080,0.5,2,crack,0.6,1,1,2,2,1,1;2,1;2,2
1280x720,0.6,2,crack,0.6,1,1,2,2
0.7,2,crack,0.6,1,1,2,2";
        let set = parse_annotations(text, Schema::Rich).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.source_resolution, Some(Dimensions::new(1920.0, 1080.0)));
        assert_eq!(set.records()[0].timestamp, 0.5);
        assert_eq!(set.records()[0].class_id, Some(2));
    }

    #[test]
    fn test_malformed_video_size_fails() {
        let err = parse_annotations("19x20x1,0.5,2,c,0.6,1,1,2,2", Schema::Rich).unwrap_err();
        assert!(matches!(err, ParseError::InvalidVideoSize { line: 1, .. }));
    }

    #[test]
    fn test_empty_class_id_and_confidence_are_absent() {
        let set = parse_annotations("0.5,,car,,1,2,3,4", Schema::Rich).unwrap();
        let record = &set.records()[0];
        assert_eq!(record.class_id, None);
        assert_eq!(record.confidence, None);
        assert_eq!(record.display_label(), "car");
    }

    #[test]
    fn test_simple_schema_derives_extent() {
        let text = "0.5,10,20,110,70,car\n1.5,5.5,6.25,8,7,person";
        let set = parse_annotations(text, Schema::Simple).unwrap();
        for record in set.records() {
            let bounds = record.geometry.bounds();
            assert_eq!(record.class_id, None);
            assert_eq!(record.confidence, None);
            assert_eq!(bounds.width(), bounds.x2 - bounds.x1);
            assert_eq!(bounds.height(), bounds.y2 - bounds.y1);
        }
        let first = set.records()[0].geometry.bounds();
        assert_eq!((first.width(), first.height()), (100.0, 50.0));
        assert_eq!(set.records()[1].label, "person");
    }

    #[test]
    fn test_blank_lines_skipped_and_order_kept() {
        let text = "\n3.0,0,0,1,1,late\n\n   \n1.0,0,0,1,1,early\r\n";
        let set = parse_annotations(text, Schema::Simple).unwrap();
        let labels: Vec<_> = set.records().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["late", "early"]);
    }

    #[test]
    fn test_non_numeric_field_fails_whole_batch() {
        let text = "0.5,0,0,1,1,ok\n0.6,zero,0,1,1,bad\n0.7,0,0,1,1,ok";
        let err = parse_annotations(text, Schema::Simple).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                line: 2,
                field: "x",
                value: "zero".to_string(),
            }
        );
    }

    #[test]
    fn test_nan_and_empty_numbers_are_rejected() {
        assert!(parse_annotations("NaN,0,0,1,1,x", Schema::Simple).is_err());
        assert!(parse_annotations("0.5,0,,1,1,x", Schema::Simple).is_err());
        assert!(parse_annotations("0.5,1,c,0.5,inf,1,2,2", Schema::Rich).is_err());
    }

    #[test]
    fn test_short_lines_report_missing_fields() {
        let err = parse_annotations("0.5,1,car,0.9,1,2,3", Schema::Rich).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingFields {
                line: 1,
                expected: 8,
                found: 7,
            }
        );
        assert!(parse_annotations("0.5,1,2,3,4", Schema::Simple).is_err());
    }

    #[test]
    fn test_bad_polygon_vertex_fails() {
        let err = parse_annotations("0.5,1,c,0.5,1,1,2,2,1,1;2;3,3", Schema::Rich).unwrap_err();
        assert!(matches!(err, ParseError::InvalidPolygon { line: 1, .. }));
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let text = "1280x720,0.5,1,dent,0.8,1,2,3,4,1,1;2,2;3,1\n0.6,2,car,0.9,5,6,7,8\n";
        assert_eq!(
            parse_annotations(text, Schema::Rich).unwrap(),
            parse_annotations(text, Schema::Rich).unwrap()
        );
    }

    #[test]
    fn test_schema_from_str() {
        assert_eq!("simple".parse::<Schema>().unwrap(), Schema::Simple);
        assert_eq!("rich".parse::<Schema>().unwrap(), Schema::Rich);
        assert!("csv".parse::<Schema>().is_err());
    }
}
