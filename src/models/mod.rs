// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data and player session state.

pub mod annotation;
pub mod session;
pub mod sketch;
