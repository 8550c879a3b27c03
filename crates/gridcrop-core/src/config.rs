// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform policy — the single immutable configuration value threaded
// through every pipeline stage.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GridCropError, Result};

/// Rounding rule applied to every grid boundary and to the left-crop amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRounding {
    /// Truncate toward zero: `floor(i * W / C)`.
    #[default]
    Floor,
    /// Round to nearest, ties away from zero: `round(i * W / C)`.
    HalfUp,
}

impl BoundaryRounding {
    /// Apply the rule to the exact rational `numerator / denominator`.
    ///
    /// Integer arithmetic only, so boundaries never pick up float drift. The
    /// half-up test compares the remainder with its complement and cannot
    /// overflow for any inputs.
    pub fn ratio(self, numerator: u64, denominator: u64) -> u64 {
        let (quotient, remainder) = (numerator / denominator, numerator % denominator);
        match self {
            Self::Floor => quotient,
            Self::HalfUp => quotient + u64::from(remainder >= denominator - remainder),
        }
    }

    /// Apply the rule to a non-negative float product such as `ratio * width`.
    ///
    /// The value is nudged up by a relative 1e-9 first, so a product that
    /// lands just below an integer or a half through binary representation
    /// (`0.29 * 100.0 == 28.999999999999996`) rounds as its decimal reading.
    pub fn apply(self, value: f64) -> u64 {
        let nudged = value + value.abs().max(1.0) * APPLY_TOLERANCE;
        match self {
            Self::Floor => nudged.floor() as u64,
            Self::HalfUp => nudged.round() as u64,
        }
    }
}

const APPLY_TOLERANCE: f64 = 1e-9;

/// Interpolation kernel used when resampling the source into the canonical
/// rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleKernel {
    /// 8x8 windowed-sinc kernel.
    #[default]
    Lanczos4,
    Bicubic,
    Bilinear,
    Nearest,
}

/// Tuning for the contour-based corner detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Gaussian blur sigma applied before edge extraction (1.1 matches a 5x5 kernel).
    pub blur_sigma: f32,
    /// Canny hysteresis low threshold.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,
    /// Radius of the morphological close used to bridge edge gaps (0 disables it).
    pub close_radius: u8,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Minimum enclosed area as a fraction of the image area.
    pub min_area_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            close_radius: 1,
            approx_epsilon_ratio: 0.02,
            min_area_ratio: 0.10,
        }
    }
}

/// Immutable configuration for one pipeline run.
///
/// Every downstream computation is a pure function of the source raster, the
/// corner set, and this value. Grid shape, canonical size, and all margin
/// ratios live here rather than in the algorithms, so other table templates
/// need no code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformPolicy {
    /// Width of the rectified raster in pixels.
    pub canonical_width: u32,
    /// Height of the rectified raster in pixels.
    pub canonical_height: u32,
    /// Grid columns, including the label column.
    pub columns: u32,
    /// Grid rows.
    pub rows: u32,
    /// Fixed x shift applied to both right-side corners.
    pub right_corner_pixel_bias: f64,
    /// Extra outward extension of the right corners, as a fraction of the
    /// detected quadrilateral width.
    pub right_corner_margin_ratio: f64,
    /// Fraction of the label-free table width trimmed from its left side.
    pub left_crop_ratio: f64,
    /// Row boundary at which the trimmed table is split into two bands.
    pub row_split_index: u32,
    pub rounding: BoundaryRounding,
    pub resample: ResampleKernel,
    /// RGBA colour for canonical pixels that map outside the source.
    pub fill: [u8; 4],
    pub detection: DetectionConfig,
}

impl Default for TransformPolicy {
    fn default() -> Self {
        Self {
            canonical_width: 1364,
            canonical_height: 850,
            columns: 32,
            rows: 17,
            right_corner_pixel_bias: 30.0,
            right_corner_margin_ratio: 0.10,
            left_crop_ratio: 0.26,
            row_split_index: 8,
            rounding: BoundaryRounding::Floor,
            resample: ResampleKernel::Lanczos4,
            fill: [0, 0, 0, 255],
            detection: DetectionConfig::default(),
        }
    }
}

impl TransformPolicy {
    /// Check every constraint the pipeline relies on.
    ///
    /// `canonical_width >= columns` and `canonical_height >= rows` keep the
    /// rounded grid boundaries strictly increasing.
    pub fn validate(&self) -> Result<()> {
        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(invalid(format!(
                "canonical dimensions must be positive, got {}x{}",
                self.canonical_width, self.canonical_height
            )));
        }
        if self.columns < 2 {
            return Err(invalid(format!(
                "columns must be at least 2 (label column plus body), got {}",
                self.columns
            )));
        }
        if self.rows < 2 {
            return Err(invalid(format!("rows must be at least 2, got {}", self.rows)));
        }
        if self.canonical_width < self.columns {
            return Err(invalid(format!(
                "canonical width {} is narrower than {} columns",
                self.canonical_width, self.columns
            )));
        }
        if self.canonical_height < self.rows {
            return Err(invalid(format!(
                "canonical height {} is shorter than {} rows",
                self.canonical_height, self.rows
            )));
        }
        if self.row_split_index == 0 || self.row_split_index >= self.rows {
            return Err(invalid(format!(
                "row split index {} must lie in 1..{}",
                self.row_split_index, self.rows
            )));
        }
        if !self.right_corner_pixel_bias.is_finite() || self.right_corner_pixel_bias < 0.0 {
            return Err(invalid(format!(
                "right corner pixel bias must be finite and non-negative, got {}",
                self.right_corner_pixel_bias
            )));
        }
        check_unit_ratio("right_corner_margin_ratio", self.right_corner_margin_ratio)?;
        check_unit_ratio("left_crop_ratio", self.left_crop_ratio)?;
        self.detection.validate()
    }

    /// Parse a policy from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load and validate a policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Persist the policy as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json_pretty()?)?;
        Ok(())
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(invalid(format!(
                "blur sigma must be finite and non-negative, got {}",
                self.blur_sigma
            )));
        }
        if !(self.canny_low.is_finite() && self.canny_high.is_finite())
            || self.canny_low < 0.0
            || self.canny_low > self.canny_high
        {
            return Err(invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} / {}",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio < 1.0) {
            return Err(invalid(format!(
                "approx_epsilon_ratio must lie in (0, 1), got {}",
                self.approx_epsilon_ratio
            )));
        }
        check_unit_ratio("min_area_ratio", self.min_area_ratio)
    }
}

fn check_unit_ratio(name: &str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must lie in [0, 1), got {value}")))
    }
}

fn invalid(message: String) -> GridCropError {
    GridCropError::InvalidPolicy(message)
}
