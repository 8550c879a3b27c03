// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — map the adjusted quadrilateral onto the fixed
// canonical rectangle and resample the source into it.

mod lanczos;

use gridcrop_core::{CornerSet, GridCropError, Point, ResampleKernel, Result, TransformPolicy};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

/// Relative tolerance for the collinearity test: a triangle of corners whose
/// doubled area is below `span^2 * DEGENERACY_TOLERANCE` counts as flat.
const DEGENERACY_TOLERANCE: f64 = 1e-6;

/// Maximum distance, in canonical pixels, between a projected source corner
/// and its target before the transform is considered ill-conditioned.
const MAX_CORNER_RESIDUAL: f32 = 0.5;

/// Warps a source raster so the table quadrilateral fills a fixed-size
/// rectangle.
///
/// There is no aspect-ratio preservation or letterboxing: content is
/// stretched to exactly `width` x `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveRectifier {
    width: u32,
    height: u32,
    kernel: ResampleKernel,
    fill: Rgba<u8>,
}

impl PerspectiveRectifier {
    pub fn new(width: u32, height: u32, kernel: ResampleKernel, fill: Rgba<u8>) -> Self {
        Self {
            width,
            height,
            kernel,
            fill,
        }
    }

    pub fn from_policy(policy: &TransformPolicy) -> Self {
        Self::new(
            policy.canonical_width,
            policy.canonical_height,
            policy.resample,
            Rgba(policy.fill),
        )
    }

    /// Solve the projective transform taking `corners` to
    /// `(0,0) (W,0) (W,H) (0,H)`.
    ///
    /// Fails with [`GridCropError::Rectification`] if the corners are
    /// non-finite, coincident, collinear, or yield a singular or
    /// ill-conditioned matrix.
    pub fn projection(&self, corners: &CornerSet) -> Result<Projection> {
        check_non_degenerate(corners)?;

        let (w, h) = (self.width as f32, self.height as f32);
        let src: [(f32, f32); 4] = corners.to_array().map(Into::into);
        let dest: [(f32, f32); 4] = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            GridCropError::Rectification("projective transform is singular".into())
        })?;

        for (s, d) in src.iter().zip(dest.iter()) {
            let (px, py) = projection * *s;
            let residual = (px - d.0).hypot(py - d.1);
            if !residual.is_finite() || residual > MAX_CORNER_RESIDUAL {
                return Err(GridCropError::Rectification(format!(
                    "projective transform is ill-conditioned: corner {s:?} maps {residual} px from {d:?}"
                )));
            }
        }
        Ok(projection)
    }

    /// Produce the canonical raster. The output is always exactly
    /// `width` x `height`.
    #[instrument(skip(self, source), fields(src_w = source.width(), src_h = source.height()))]
    pub fn rectify(&self, source: &DynamicImage, corners: &CornerSet) -> Result<RgbaImage> {
        if source.width() == 0 || source.height() == 0 {
            return Err(GridCropError::Rectification("source image is empty".into()));
        }
        let projection = self.projection(corners)?;
        debug!(kernel = ?self.kernel, "Projective transform solved");

        let input = source.to_rgba8();
        let mut output = RgbaImage::new(self.width, self.height);

        match self.kernel {
            ResampleKernel::Lanczos4 => {
                lanczos::warp_into_lanczos4(&input, projection.invert(), self.fill, &mut output)
            }
            ResampleKernel::Bicubic => warp_into(
                &input,
                &projection,
                Interpolation::Bicubic,
                self.fill,
                &mut output,
            ),
            ResampleKernel::Bilinear => warp_into(
                &input,
                &projection,
                Interpolation::Bilinear,
                self.fill,
                &mut output,
            ),
            ResampleKernel::Nearest => warp_into(
                &input,
                &projection,
                Interpolation::Nearest,
                self.fill,
                &mut output,
            ),
        }

        info!(
            out_w = self.width,
            out_h = self.height,
            "Perspective rectification applied"
        );
        Ok(output)
    }
}

/// Reject corner sets that cannot define a projective transform: any three
/// corners collinear (which covers coincident pairs) or non-finite values.
fn check_non_degenerate(corners: &CornerSet) -> Result<()> {
    let points = corners.to_array();
    if points.iter().any(|p| !p.is_finite()) {
        return Err(GridCropError::Rectification(
            "corner set contains non-finite coordinates".into(),
        ));
    }

    let (min_x, max_x) = extent(points.iter().map(|p| p.x));
    let (min_y, max_y) = extent(points.iter().map(|p| p.y));
    let span = (max_x - min_x).max(max_y - min_y);
    if span < 1.0 {
        return Err(GridCropError::Rectification(format!(
            "corners are coincident (span {span:.3} px)"
        )));
    }

    let tolerance = span * span * DEGENERACY_TOLERANCE;
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    for (i, j, k) in TRIPLES {
        let doubled_area = cross(points[i], points[j], points[k]).abs();
        if doubled_area <= tolerance {
            return Err(GridCropError::Rectification(format!(
                "corners {:?}, {:?}, {:?} are collinear",
                points[i], points[j], points[k]
            )));
        }
    }
    Ok(())
}

fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

// -- Tests --------------------------------------------------------------------
