// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Temporal matching and coordinate scaling.

pub mod geometry;
pub mod matcher;
