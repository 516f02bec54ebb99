// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for annotation parsing and loading.

use std::io;
use thiserror::Error;

/// A malformed annotation line. Line numbers are 1-based and count blank lines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    MissingFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: field `{field}` is not a finite number: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: invalid video size {value:?}, expected <width>x<height>")]
    InvalidVideoSize { line: usize, value: String },

    #[error("line {line}: invalid polygon vertex {value:?}")]
    InvalidPolygon { line: usize, value: String },

    /// Usually a polygon with a single vertex, which is not recognised as one.
    #[error("line {line}: stray number {value:?} after className")]
    UnexpectedNumber { line: usize, value: String },
}

/// Failure to produce an annotation set for one resource.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("annotation resource {0} not found")]
    NotFound(String),

    #[error("could not read annotation resource {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("could not parse annotation resource {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}
