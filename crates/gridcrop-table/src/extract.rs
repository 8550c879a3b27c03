// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region extraction — drop the label column, then trim a fixed share of the
// remaining width from the left. Both steps are lossless pixel copies.

use gridcrop_core::{Dimensions, GridCropError, Region, Result};
use image::RgbaImage;
use image::imageops::crop_imm;
use tracing::{debug, info, instrument};

use crate::grid::Grid;

/// Output of [`RegionExtractor::extract`]. Regions are in canonical
/// coordinates.
#[derive(Debug, Clone)]
pub struct ExtractedRegions {
    pub cropped_table: RgbaImage,
    pub cropped_region: Region,
    pub left_cropped: RgbaImage,
    pub left_region: Region,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionExtractor {
    grid: Grid,
    left_crop_ratio: f64,
}

impl RegionExtractor {
    pub fn new(grid: Grid, left_crop_ratio: f64) -> Self {
        Self {
            grid,
            left_crop_ratio,
        }
    }

    /// `[col_boundary(1), col_boundary(C))` at full height.
    pub fn cropped_table_region(&self) -> Region {
        let left = self.grid.col_boundary(1);
        let right = self.grid.col_boundary(self.grid.columns());
        Region::new(left, 0, right - left, self.grid.canvas().height)
    }

    /// Pixels removed from the left of a table `width` pixels wide.
    pub fn left_trim(&self, width: u32) -> u32 {
        self.grid
            .rounding()
            .apply(self.left_crop_ratio * width as f64)
            .min(width as u64) as u32
    }

    /// The cropped table minus its left trim. Fails with
    /// [`GridCropError::Bounds`] if nothing would be left.
    pub fn left_cropped_region(&self) -> Result<Region> {
        let table = self.cropped_table_region();
        let trim = self.left_trim(table.width);
        if trim >= table.width {
            return Err(GridCropError::Bounds(format!(
                "left trim of {trim} px consumes the whole {} px table",
                table.width
            )));
        }
        Ok(Region::new(table.x + trim, 0, table.width - trim, table.height))
    }

    #[instrument(skip_all, fields(width = canonical.width(), height = canonical.height()))]
    pub fn extract(&self, canonical: &RgbaImage) -> Result<ExtractedRegions> {
        let expected = self.grid.canvas();
        if canonical.dimensions() != (expected.width, expected.height) {
            return Err(GridCropError::Bounds(format!(
                "canonical raster is {}x{}, grid expects {}x{}",
                canonical.width(),
                canonical.height(),
                expected.width,
                expected.height
            )));
        }

        let cropped_region = self.cropped_table_region();
        let cropped_table = copy_region(canonical, cropped_region)?;
        debug!(region = ?cropped_region, "Label column removed");

        let left_region = self.left_cropped_region()?;
        // Offset relative to the cropped table, not the canonical raster.
        let relative = Region::new(
            left_region.x - cropped_region.x,
            0,
            left_region.width,
            left_region.height,
        );
        let left_cropped = copy_region(&cropped_table, relative)?;

        info!(
            cropped_width = cropped_region.width,
            left_cropped_width = left_region.width,
            trim = relative.x,
            "Table regions extracted"
        );

        Ok(ExtractedRegions {
            cropped_table,
            cropped_region,
            left_cropped,
            left_region,
        })
    }
}

/// Copy `region` out of `image`, failing with [`GridCropError::Bounds`] if it
/// is empty or does not fit.
pub fn copy_region(image: &RgbaImage, region: Region) -> Result<RgbaImage> {
    let bounds = Dimensions::new(image.width(), image.height());
    if !region.fits_within(bounds) {
        return Err(GridCropError::Bounds(format!(
            "region {region:?} does not fit in {}x{}",
            bounds.width, bounds.height
        )));
    }
    Ok(crop_imm(image, region.x, region.y, region.width, region.height).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcrop_core::BoundaryRounding;
    use image::Rgba;

    fn extractor(rounding: BoundaryRounding) -> RegionExtractor {
        let grid = Grid::new(Dimensions::new(1364, 850), 32, 17, rounding).expect("grid");
        RegionExtractor::new(grid, 0.26)
    }

    /// Each pixel encodes its own x coordinate so copies can be checked.
    fn x_ramp(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (x / 256) as u8, (y % 256) as u8, 255])
        })
    }

    fn x_at(image: &RgbaImage, x: u32) -> u32 {
        let p = image.get_pixel(x, 0).0;
        p[0] as u32 + 256 * p[1] as u32
    }

    #[test]
    fn canonical_widths_with_floor() {
        let extractor = extractor(BoundaryRounding::Floor);
        let out = extractor.extract(&x_ramp(1364, 850)).expect("extract");

        assert_eq!(out.cropped_table.width(), 1364 - 42);
        assert_eq!(out.cropped_table.width(), 1322);
        assert_eq!(out.left_cropped.width(), 979);
        assert_eq!(out.cropped_table.height(), 850);
        assert_eq!(out.left_cropped.height(), 850);
    }

    #[test]
    fn widths_follow_boundaries_for_each_rounding() {
        for rounding in [BoundaryRounding::Floor, BoundaryRounding::HalfUp] {
            let extractor = extractor(rounding);
            let grid = Grid::new(Dimensions::new(1364, 850), 32, 17, rounding).expect("grid");
            let out = extractor.extract(&x_ramp(1364, 850)).expect("extract");

            let table_width = grid.col_boundary(32) - grid.col_boundary(1);
            assert_eq!(out.cropped_table.width(), table_width);
            let trim = rounding.apply(0.26 * table_width as f64) as u32;
            assert_eq!(out.left_cropped.width(), table_width - trim);
        }
    }

    #[test]
    fn copies_are_lossless() {
        let extractor = extractor(BoundaryRounding::Floor);
        let out = extractor.extract(&x_ramp(1364, 850)).expect("extract");

        assert_eq!(x_at(&out.cropped_table, 0), 42);
        assert_eq!(x_at(&out.cropped_table, 1321), 1363);
        assert_eq!(x_at(&out.left_cropped, 0), 42 + 343);
        assert_eq!(out.left_region.x, 385);
        assert_eq!(x_at(&out.left_cropped, out.left_cropped.width() - 1), 1363);
    }

    #[test]
    fn left_trim_follows_decimal_ratio() {
        let grid = Grid::new(Dimensions::new(1364, 850), 32, 17, BoundaryRounding::Floor)
            .expect("grid");
        // 0.29 * 100 falls just short of 29 in binary floating point.
        assert_eq!(RegionExtractor::new(grid, 0.29).left_trim(100), 29);
        assert_eq!(RegionExtractor::new(grid, 0.26).left_trim(1322), 343);
        assert_eq!(RegionExtractor::new(grid, 0.0).left_trim(1322), 0);
    }

    #[test]
    fn wrong_canvas_size_is_bounds_error() {
        let result = extractor(BoundaryRounding::Floor).extract(&x_ramp(1000, 850));
        assert!(matches!(result, Err(GridCropError::Bounds(_))));
    }

    #[test]
    fn copy_region_rejects_overflow() {
        let image = x_ramp(10, 10);
        assert!(copy_region(&image, Region::new(5, 0, 6, 10)).is_err());
        assert!(copy_region(&image, Region::new(0, 0, 0, 10)).is_err());
        assert_eq!(copy_region(&image, Region::new(5, 0, 5, 10)).expect("fits").width(), 5);
    }

    #[test]
    fn trim_that_consumes_table_is_bounds_error() {
        // Two columns over two pixels leaves a one-pixel table; rounding 0.6
        // half-up trims that single pixel.
        let grid = Grid::new(Dimensions::new(2, 2), 2, 2, BoundaryRounding::HalfUp).expect("grid");
        let result = RegionExtractor::new(grid, 0.6).left_cropped_region();
        assert!(matches!(result, Err(GridCropError::Bounds(_))));
    }
}
