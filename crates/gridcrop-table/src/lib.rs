// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// gridcrop-table — Normalisation of photographed grid tables.
//
// Finds the table's outline, warps it onto a fixed canonical canvas, removes
// the label column and a left margin, and splits the remainder into two row
// bands with an audit record of every coordinate used.

pub mod adjust;
pub mod detect;
pub mod diagnostics;
pub mod export;
pub mod extract;
pub mod grid;
pub mod pipeline;
pub mod rectify;
pub mod split;

// Re-export the stage types so callers can use `gridcrop_table::TablePipeline` etc.
pub use adjust::{AdjustedCorners, CornerAdjuster};
pub use detect::CornerDetector;
pub use diagnostics::annotate_corners;
pub use export::ExportedFile;
pub use extract::{ExtractedRegions, RegionExtractor};
pub use grid::Grid;
pub use pipeline::{TableOutputs, TablePipeline};
pub use rectify::PerspectiveRectifier;
pub use split::{SplitExporter, SplitParts};
