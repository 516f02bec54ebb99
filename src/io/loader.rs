// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Loading of the detection and damage annotation files.
//!
//! Each class is fetched and parsed on its own. A class that fails to load is
//! logged and comes back empty, without affecting the other class or playback.
//! Loads run on a background thread and are delivered in a single message
//! tagged with the generation that requested them, so the receiver can drop
//! results that arrive after a newer load was started.

use crate::error::LoadError;
use crate::io::parser::{parse_annotations, Schema};
use crate::models::annotation::{AnnotationKind, AnnotationSet};
use crate::models::session::LoadedAnnotations;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

/// Where annotation resources are fetched from.
pub trait AnnotationSource: Send {
    /// Raw text of the named resource.
    fn fetch(&self, name: &str) -> Result<String, LoadError>;
}

/// Static asset directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AnnotationSource for AssetDir {
    fn fetch(&self, name: &str) -> Result<String, LoadError> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LoadError::NotFound(path.display().to_string())
            } else {
                LoadError::Io {
                    name: path.display().to_string(),
                    source,
                }
            }
        })
    }
}

/// Fetch and parse one class.
pub fn try_load_kind(
    source: &dyn AnnotationSource,
    kind: AnnotationKind,
    schema: Schema,
) -> Result<AnnotationSet, LoadError> {
    let name = kind.file_name();
    let text = source.fetch(name)?;
    parse_annotations(&text, schema).map_err(|source| LoadError::Parse {
        name: name.to_string(),
        source,
    })
}

/// Fetch and parse one class, degrading to an empty set on any failure.
pub fn load_kind(
    source: &dyn AnnotationSource,
    kind: AnnotationKind,
    schema: Schema,
) -> AnnotationSet {
    match try_load_kind(source, kind, schema) {
        Ok(set) => {
            log::info!("Loaded {} {} annotations", set.len(), kind.title().to_lowercase());
            set
        }
        Err(e) => {
            log::error!("Error loading {} data: {}", kind.title().to_lowercase(), e);
            AnnotationSet::default()
        }
    }
}

/// Load both classes independently.
pub fn load_all(
    source: &dyn AnnotationSource,
    schema: Schema,
    generation: u64,
) -> LoadedAnnotations {
    LoadedAnnotations {
        generation,
        detections: load_kind(source, AnnotationKind::Detection, schema),
        damages: load_kind(source, AnnotationKind::Damage, schema),
    }
}

/// A load running on a background thread.
pub struct PendingLoad {
    receiver: Receiver<LoadedAnnotations>,
    generation: u64,
}

impl PendingLoad {
    /// Start loading both classes from `source`.
    pub fn spawn(source: Box<dyn AnnotationSource>, schema: Schema, generation: u64) -> Self {
        let (sender, receiver) = channel();

        std::thread::spawn(move || {
            let loaded = load_all(source.as_ref(), schema, generation);
            // The receiver is gone if the app shut down first.
            let _ = sender.send(loaded);
        });

        Self {
            receiver,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The result if the load has finished. `Err` means the worker died
    /// without reporting.
    pub fn poll(&self) -> Result<Option<LoadedAnnotations>, TryRecvError> {
        match self.receiver.try_recv() {
            Ok(loaded) => Ok(Some(loaded)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
