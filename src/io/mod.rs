// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for annotation files, media and configuration.

pub mod loader;
pub mod media;
pub mod parser;
pub mod serialization;
