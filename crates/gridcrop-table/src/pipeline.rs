// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table pipeline — Detect -> Adjust -> Rectify -> Partition -> Extract ->
// Split, strictly in that order. The first failing stage ends the run.

use gridcrop_core::{CornerSet, CornerSource, Dimensions, ProcessingMetadata, Result, TransformPolicy};
use image::{DynamicImage, RgbaImage};
use tracing::{info, instrument};

use crate::adjust::CornerAdjuster;
use crate::detect::CornerDetector;
use crate::extract::RegionExtractor;
use crate::grid::Grid;
use crate::rectify::PerspectiveRectifier;
use crate::split::{SplitExporter, StageRecord};

/// Every raster produced by one run, plus its audit record.
#[derive(Debug, Clone)]
pub struct TableOutputs {
    pub corrected_canonical: RgbaImage,
    pub cropped_table: RgbaImage,
    pub left_cropped: RgbaImage,
    pub part1: RgbaImage,
    pub part2: RgbaImage,
    pub metadata: ProcessingMetadata,
}

/// Runs the full normalisation pipeline under one validated policy.
///
/// Holds no mutable state, so a single pipeline can serve any number of
/// threads; each call owns its buffers end to end.
///
/// ```ignore
/// let pipeline = TablePipeline::new(TransformPolicy::default())?;
/// let outputs = match pipeline.run(&image) {
///     Ok(outputs) => outputs,
///     Err(err) if err.is_retryable_with_manual_corners() => {
///         pipeline.run_with_corners(&image, user_corners)?
///     }
///     Err(err) => return Err(err),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TablePipeline {
    policy: TransformPolicy,
    grid: Grid,
}

impl TablePipeline {
    /// Validate `policy` and build the pipeline. Fails with
    /// [`gridcrop_core::GridCropError::InvalidPolicy`] before any image is touched.
    pub fn new(policy: TransformPolicy) -> Result<Self> {
        policy.validate()?;
        let grid = Grid::from_policy(&policy)?;
        Ok(Self { policy, grid })
    }

    pub fn policy(&self) -> &TransformPolicy {
        &self.policy
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Detect the table's corners, then process.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn run(&self, source: &DynamicImage) -> Result<TableOutputs> {
        let detected = CornerDetector::new(self.policy.detection.clone()).detect(source)?;
        self.process(source, detected, CornerSource::Detected)
    }

    /// Skip detection and process with caller-supplied corners.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn run_with_corners(&self, source: &DynamicImage, corners: CornerSet) -> Result<TableOutputs> {
        self.process(source, corners, CornerSource::Manual)
    }

    fn process(
        &self,
        source: &DynamicImage,
        corners: CornerSet,
        corner_source: CornerSource,
    ) -> Result<TableOutputs> {
        let original = Dimensions::new(source.width(), source.height());

        let adjusted = CornerAdjuster::from_policy(&self.policy).adjust(&corners, original)?;

        let corrected_canonical =
            PerspectiveRectifier::from_policy(&self.policy).rectify(source, &adjusted.corners)?;

        let regions = RegionExtractor::new(self.grid, self.policy.left_crop_ratio)
            .extract(&corrected_canonical)?;

        let exporter = SplitExporter::new(self.grid, self.policy.row_split_index)?;
        let parts = exporter.split(&regions.left_cropped, regions.left_region)?;

        let metadata = exporter.metadata(StageRecord {
            original_dimensions: original,
            corner_source,
            detected_corners: (corner_source == CornerSource::Detected).then_some(corners),
            adjusted_corners: adjusted.corners,
            right_edge_clamped: adjusted.clamped,
            corrected_canonical: &corrected_canonical,
            regions: &regions,
            parts: &parts,
        });

        info!(
            original_w = original.width,
            original_h = original.height,
            corner_source = ?corner_source,
            degraded = adjusted.clamped,
            "Table pipeline complete"
        );

        Ok(TableOutputs {
            corrected_canonical,
            cropped_table: regions.cropped_table,
            left_cropped: regions.left_cropped,
            part1: parts.part1,
            part2: parts.part2,
            metadata,
        })
    }
}

// -- Tests --------------------------------------------------------------------
