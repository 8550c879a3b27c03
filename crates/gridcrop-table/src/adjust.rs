// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner adjustment — push the right-side corners outward to compensate for
// systematic undercapture of the last column.

use gridcrop_core::{CornerSet, Dimensions, GridCropError, Point, Result, TransformPolicy};
use tracing::{debug, info, instrument, warn};

/// Result of [`CornerAdjuster::adjust`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedCorners {
    pub corners: CornerSet,
    /// At least one right corner was clamped to the source's last column.
    /// Rectification still proceeds; the run is merely degraded.
    pub clamped: bool,
}

/// Shifts `top_right` and `bottom_right` by a fixed pixel bias, then extends
/// them further by a fraction of the quadrilateral's width. Left corners are
/// never touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerAdjuster {
    pixel_bias: f64,
    margin_ratio: f64,
}

impl CornerAdjuster {
    pub fn new(pixel_bias: f64, margin_ratio: f64) -> Self {
        Self {
            pixel_bias,
            margin_ratio,
        }
    }

    pub fn from_policy(policy: &TransformPolicy) -> Self {
        Self::new(policy.right_corner_pixel_bias, policy.right_corner_margin_ratio)
    }

    /// Adjust `corners` detected in a source raster of size `source`.
    ///
    /// Fails with [`GridCropError::Bounds`] if any coordinate is non-finite or
    /// if, after clamping, a left corner is not strictly left of its right
    /// counterpart.
    #[instrument(skip(self))]
    pub fn adjust(&self, corners: &CornerSet, source: Dimensions) -> Result<AdjustedCorners> {
        if corners.to_array().iter().any(|p| !p.is_finite()) {
            return Err(GridCropError::Bounds(format!(
                "corner set contains non-finite coordinates: {corners:?}"
            )));
        }
        if source.width == 0 {
            return Err(GridCropError::Bounds("source image has zero width".into()));
        }

        // Measured on the corners as supplied, before the bias is applied.
        let margin = self.margin_ratio * corners.width().max(0.0);
        let offset = self.pixel_bias + margin;
        let max_x = (source.width - 1) as f64;
        debug!(offset, margin, max_x, "Right corner offset computed");

        let (top_right, top_clamped) = shift_right(corners.top_right, offset, max_x);
        let (bottom_right, bottom_clamped) = shift_right(corners.bottom_right, offset, max_x);

        let adjusted = CornerSet {
            top_left: corners.top_left,
            top_right,
            bottom_right,
            bottom_left: corners.bottom_left,
        };
        let clamped = top_clamped || bottom_clamped;

        if adjusted.top_left.x >= adjusted.top_right.x
            || adjusted.bottom_left.x >= adjusted.bottom_right.x
        {
            return Err(GridCropError::Bounds(format!(
                "left corners are not left of right corners after adjustment: {adjusted:?}"
            )));
        }

        if clamped {
            warn!(
                top_right = ?adjusted.top_right,
                bottom_right = ?adjusted.bottom_right,
                max_x,
                "Right corner clamped to source edge; last column may be cut"
            );
        }
        info!(
            top_right = ?adjusted.top_right,
            bottom_right = ?adjusted.bottom_right,
            clamped,
            "Right corners adjusted"
        );

        Ok(AdjustedCorners {
            corners: adjusted,
            clamped,
        })
    }
}

fn shift_right(corner: Point, offset: f64, max_x: f64) -> (Point, bool) {
    let x = corner.x + offset;
    if x > max_x {
        (Point::new(max_x, corner.y), true)
    } else {
        (Point::new(x, corner.y), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(left: f64, right: f64) -> CornerSet {
        CornerSet {
            top_left: Point::new(left, 20.0),
            top_right: Point::new(right, 25.0),
            bottom_right: Point::new(right + 4.0, 400.0),
            bottom_left: Point::new(left - 2.0, 390.0),
        }
    }

    #[test]
    fn left_corners_are_untouched() {
        let corners = quad(50.0, 700.0);
        let adjusted = CornerAdjuster::new(30.0, 0.10)
            .adjust(&corners, Dimensions::new(2000, 1000))
            .expect("adjust");

        assert_eq!(adjusted.corners.top_left, corners.top_left);
        assert_eq!(adjusted.corners.bottom_left, corners.bottom_left);
        assert!(!adjusted.clamped);
    }

    #[test]
    fn applies_bias_then_margin() {
        let corners = quad(50.0, 700.0);
        // Width: ((700 - 50) + (704 - 48)) / 2 = 653.
        let adjusted = CornerAdjuster::new(30.0, 0.10)
            .adjust(&corners, Dimensions::new(2000, 1000))
            .expect("adjust");

        assert!((adjusted.corners.top_right.x - (700.0 + 30.0 + 65.3)).abs() < 1e-9);
        assert!((adjusted.corners.bottom_right.x - (704.0 + 30.0 + 65.3)).abs() < 1e-9);
        // y is preserved.
        assert_eq!(adjusted.corners.top_right.y, 25.0);
        assert_eq!(adjusted.corners.bottom_right.y, 400.0);
    }

    #[test]
    fn adjusted_right_is_at_least_bias_when_unclamped() {
        for (left, right) in [(0.0, 10.0), (100.0, 900.0), (10.0, 11.0)] {
            let corners = quad(left, right);
            let adjusted = CornerAdjuster::new(30.0, 0.10)
                .adjust(&corners, Dimensions::new(5000, 1000))
                .expect("adjust");
            assert!(adjusted.corners.top_right.x >= corners.top_right.x + 30.0);
            assert!(adjusted.corners.bottom_right.x >= corners.bottom_right.x + 30.0);
        }
    }

    #[test]
    fn clamps_to_last_column() {
        let corners = quad(50.0, 780.0);
        let adjusted = CornerAdjuster::new(30.0, 0.10)
            .adjust(&corners, Dimensions::new(800, 500))
            .expect("clamping is not an error");

        assert!(adjusted.clamped);
        assert_eq!(adjusted.corners.top_right.x, 799.0);
        assert_eq!(adjusted.corners.bottom_right.x, 799.0);
        assert_eq!(adjusted.corners.top_left.x, 50.0);
    }

    #[test]
    fn left_beyond_clamped_right_is_bounds_error() {
        // Left corners sit past the last column, so clamping the right side
        // leaves them on the wrong side.
        let corners = CornerSet {
            top_left: Point::new(900.0, 0.0),
            top_right: Point::new(950.0, 0.0),
            bottom_right: Point::new(950.0, 100.0),
            bottom_left: Point::new(900.0, 100.0),
        };
        let result = CornerAdjuster::new(30.0, 0.10).adjust(&corners, Dimensions::new(800, 500));
        assert!(matches!(result, Err(GridCropError::Bounds(_))));
    }

    #[test]
    fn non_finite_corner_is_bounds_error() {
        let mut corners = quad(50.0, 700.0);
        corners.top_left.x = f64::NAN;
        let result = CornerAdjuster::new(30.0, 0.10).adjust(&corners, Dimensions::new(2000, 1000));
        assert!(matches!(result, Err(GridCropError::Bounds(_))));
    }
}
