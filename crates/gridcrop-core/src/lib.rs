// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// gridcrop — Core types, transform policy, and error definitions shared by
// the table pipeline and its adapters.

pub mod config;
pub mod error;
pub mod integrity;
pub mod types;

pub use config::{BoundaryRounding, DetectionConfig, ResampleKernel, TransformPolicy};
pub use error::{ErrorKind, GridCropError, Result};
pub use types::*;
