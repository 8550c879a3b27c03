// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split export — cut the trimmed table into two stacked row bands at an
// exact row boundary, and assemble the run's processing metadata.

use gridcrop_core::integrity::raster_digest;
use gridcrop_core::{
    CornerSet, CornerSource, Dimensions, GridCropError, OutputDigests, ProcessingMetadata, Region,
    RegionBoundaries, Result,
};
use image::RgbaImage;
use tracing::{info, instrument};

use crate::extract::{ExtractedRegions, copy_region};
use crate::grid::Grid;

/// The two row bands. Regions are in canonical coordinates.
#[derive(Debug, Clone)]
pub struct SplitParts {
    pub part1: RgbaImage,
    pub part1_region: Region,
    pub part2: RgbaImage,
    pub part2_region: Region,
}

/// Everything the metadata record summarises, borrowed from earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct StageRecord<'a> {
    pub original_dimensions: Dimensions,
    pub corner_source: CornerSource,
    pub detected_corners: Option<CornerSet>,
    pub adjusted_corners: CornerSet,
    pub right_edge_clamped: bool,
    pub corrected_canonical: &'a RgbaImage,
    pub regions: &'a ExtractedRegions,
    pub parts: &'a SplitParts,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitExporter {
    grid: Grid,
    split_index: u32,
}

impl SplitExporter {
    /// Fails with [`GridCropError::InvalidPolicy`] unless
    /// `0 < split_index < rows`.
    pub fn new(grid: Grid, split_index: u32) -> Result<Self> {
        if split_index == 0 || split_index >= grid.rows() {
            return Err(GridCropError::InvalidPolicy(format!(
                "row split index {split_index} must lie in 1..{}",
                grid.rows()
            )));
        }
        Ok(Self { grid, split_index })
    }

    pub fn split_index(&self) -> u32 {
        self.split_index
    }

    /// Split `left_cropped`, whose canonical placement is `left_region`.
    ///
    /// Row cuts reuse the canonical grid's boundaries rather than dividing
    /// `left_cropped`'s own height, so the two heights always sum exactly.
    #[instrument(skip(self, left_cropped), fields(width = left_cropped.width(), height = left_cropped.height()))]
    pub fn split(&self, left_cropped: &RgbaImage, left_region: Region) -> Result<SplitParts> {
        let top = self.grid.row_boundary(0);
        let cut = self.grid.row_boundary(self.split_index);
        let bottom = self.grid.row_boundary(self.grid.rows());

        if left_cropped.height() != bottom - top {
            return Err(GridCropError::Bounds(format!(
                "trimmed table is {} px tall, grid spans {} px",
                left_cropped.height(),
                bottom - top
            )));
        }

        let width = left_cropped.width();
        let part1 = copy_region(left_cropped, Region::new(0, top, width, cut - top))?;
        let part2 = copy_region(left_cropped, Region::new(0, cut, width, bottom - cut))?;

        let part1_region = Region::new(left_region.x, left_region.y + top, width, cut - top);
        let part2_region = Region::new(left_region.x, left_region.y + cut, width, bottom - cut);

        info!(
            split_row = self.split_index,
            cut,
            part1_height = part1.height(),
            part2_height = part2.height(),
            "Table split into row bands"
        );

        Ok(SplitParts {
            part1,
            part1_region,
            part2,
            part2_region,
        })
    }

    /// Assemble the read-only audit record for one run.
    pub fn metadata(&self, record: StageRecord<'_>) -> ProcessingMetadata {
        let canvas = self.grid.canvas();
        ProcessingMetadata {
            original_dimensions: record.original_dimensions,
            corner_source: record.corner_source,
            detected_corners: record.detected_corners,
            adjusted_corners: record.adjusted_corners,
            right_edge_clamped: record.right_edge_clamped,
            canonical_dimensions: canvas,
            cell_width: self.grid.cell_width(),
            cell_height: self.grid.cell_height(),
            column_boundaries: self.grid.column_boundaries(),
            row_boundaries: self.grid.row_boundaries(),
            row_split_index: self.split_index,
            regions: RegionBoundaries {
                cropped_table: record.regions.cropped_region,
                left_cropped: record.regions.left_region,
                part1: record.parts.part1_region,
                part2: record.parts.part2_region,
            },
            digests: OutputDigests {
                corrected_canonical: raster_digest(record.corrected_canonical),
                cropped_table: raster_digest(&record.regions.cropped_table),
                left_cropped: raster_digest(&record.regions.left_cropped),
                part1: raster_digest(&record.parts.part1),
                part2: raster_digest(&record.parts.part2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RegionExtractor;
    use gridcrop_core::integrity::verify_raster;
    use gridcrop_core::{BoundaryRounding, Point};
    use image::Rgba;

    fn grid(rows: u32, height: u32) -> Grid {
        Grid::new(Dimensions::new(1364, height), 32, rows, BoundaryRounding::Floor).expect("grid")
    }

    /// Each pixel encodes its own y coordinate.
    fn y_ramp(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |_, y| {
            Rgba([(y % 256) as u8, (y / 256) as u8, 0, 255])
        })
    }

    #[test]
    fn canonical_split_heights() {
        let exporter = SplitExporter::new(grid(17, 850), 8).expect("exporter");
        let parts = exporter
            .split(&y_ramp(979, 850), Region::new(385, 0, 979, 850))
            .expect("split");

        assert_eq!(parts.part1.height(), 400);
        assert_eq!(parts.part2.height(), 450);
        assert_eq!(parts.part1.width(), 979);
        assert_eq!(parts.part2.width(), 979);
        assert_eq!(parts.part2_region, Region::new(385, 400, 979, 450));
        // part2 starts exactly where part1 ends.
        assert_eq!(parts.part1.get_pixel(0, 399).0[0], (399 % 256) as u8);
        assert_eq!(parts.part2.get_pixel(0, 0).0[0], (400 % 256) as u8);
        assert_eq!(parts.part2.get_pixel(0, 0).0[1], 1);
    }

    #[test]
    fn heights_sum_for_every_split_index() {
        for (rows, height) in [(17, 850), (17, 851), (7, 100), (3, 5)] {
            let grid = grid(rows, height);
            for split in 1..rows {
                let exporter = SplitExporter::new(grid, split).expect("exporter");
                let parts = exporter
                    .split(&y_ramp(4, height), Region::new(0, 0, 4, height))
                    .expect("split");
                assert_eq!(parts.part1.height() + parts.part2.height(), height);
                assert_eq!(parts.part1.height(), grid.row_boundary(split));
            }
        }
    }

    #[test]
    fn split_index_must_be_interior() {
        assert!(SplitExporter::new(grid(17, 850), 0).is_err());
        assert!(SplitExporter::new(grid(17, 850), 17).is_err());
    }

    #[test]
    fn mismatched_height_is_bounds_error() {
        let exporter = SplitExporter::new(grid(17, 850), 8).expect("exporter");
        let result = exporter.split(&y_ramp(10, 849), Region::new(0, 0, 10, 849));
        assert!(matches!(result, Err(GridCropError::Bounds(_))));
    }

    #[test]
    fn metadata_digests_match_each_output() {
        let grid = grid(17, 850);
        let canonical = y_ramp(1364, 850);
        let regions = RegionExtractor::new(grid, 0.26).extract(&canonical).expect("extract");
        let exporter = SplitExporter::new(grid, 8).expect("exporter");
        let parts = exporter
            .split(&regions.left_cropped, regions.left_region)
            .expect("split");
        let corners = CornerSet {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(1363.0, 0.0),
            bottom_right: Point::new(1363.0, 850.0),
            bottom_left: Point::new(0.0, 850.0),
        };

        let meta = exporter.metadata(StageRecord {
            original_dimensions: Dimensions::new(1364, 850),
            corner_source: CornerSource::Manual,
            detected_corners: None,
            adjusted_corners: corners,
            right_edge_clamped: true,
            corrected_canonical: &canonical,
            regions: &regions,
            parts: &parts,
        });

        assert!(verify_raster(&canonical, &meta.digests.corrected_canonical).is_ok());
        assert!(verify_raster(&regions.cropped_table, &meta.digests.cropped_table).is_ok());
        assert!(verify_raster(&regions.left_cropped, &meta.digests.left_cropped).is_ok());
        assert!(verify_raster(&parts.part1, &meta.digests.part1).is_ok());
        assert!(verify_raster(&parts.part2, &meta.digests.part2).is_ok());
        assert!(verify_raster(&parts.part1, &meta.digests.part2).is_err());
        assert_eq!(meta.row_split_index, 8);
        assert_eq!(meta.regions.part2, Region::new(385, 400, 979, 450));
    }
}
