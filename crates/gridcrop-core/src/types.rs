// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometric and record types shared by every pipeline stage.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A pixel-space coordinate. Whether it lives in source or canonical space
/// is determined by the stage that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x as f32, p.y as f32)
    }
}

/// The four corners of a table quadrilateral, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSet {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl CornerSet {
    /// Label four points regardless of the order they were discovered in.
    ///
    /// - top-left minimises `x + y`
    /// - bottom-right maximises `x + y`
    /// - top-right minimises `y - x`
    /// - bottom-left maximises `y - x`
    ///
    /// Ties keep the earliest point in input order, so the result is fully
    /// deterministic.
    pub fn from_unordered(points: [Point; 4]) -> Self {
        let sum = |p: &Point| p.x + p.y;
        let diff = |p: &Point| p.y - p.x;
        Self {
            top_left: pick(&points, sum, Extreme::Min),
            top_right: pick(&points, diff, Extreme::Min),
            bottom_right: pick(&points, sum, Extreme::Max),
            bottom_left: pick(&points, diff, Extreme::Max),
        }
    }

    /// A frame inset from the image border by `margin_ratio` of the shorter
    /// side. Useful as a manual fallback when detection fails.
    pub fn inset_frame(width: u32, height: u32, margin_ratio: f64) -> Self {
        let (w, h) = (width as f64, height as f64);
        let margin = w.min(h) * margin_ratio;
        Self {
            top_left: Point::new(margin, margin),
            top_right: Point::new(w - margin, margin),
            bottom_right: Point::new(w - margin, h - margin),
            bottom_left: Point::new(margin, h - margin),
        }
    }

    /// Corners in `[top_left, top_right, bottom_right, bottom_left]` order.
    pub fn to_array(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Mean of the top and bottom edge widths.
    pub fn width(&self) -> f64 {
        ((self.top_right.x - self.top_left.x) + (self.bottom_right.x - self.bottom_left.x)) / 2.0
    }

    /// Enclosed area via the shoelace formula.
    pub fn area(&self) -> f64 {
        polygon_area(&self.to_array())
    }
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

fn pick(points: &[Point; 4], key: impl Fn(&Point) -> f64, extreme: Extreme) -> Point {
    let mut best = points[0];
    let mut best_key = key(&best);
    for p in &points[1..] {
        let k = key(p);
        let better = match extreme {
            Extreme::Min => k < best_key,
            Extreme::Max => k > best_key,
        };
        if better {
            best = *p;
            best_key = k;
        }
    }
    best
}

/// Area of a simple polygon given by its vertices in order (CW or CCW).
pub fn polygon_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += vertices[i].x * vertices[j].y - vertices[j].x * vertices[i].y;
    }
    twice_area.abs() / 2.0
}

/// Width and height of a raster in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned sub-rectangle of a raster. Extraction is a pixel copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Whether the region is non-empty and lies entirely inside `bounds`.
    pub fn fits_within(&self, bounds: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.right() <= bounds.width as u64
            && self.bottom() <= bounds.height as u64
    }
}

/// How the corner set entering the pipeline was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerSource {
    Detected,
    Manual,
}

/// Canonical-space rectangles of every derived output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBoundaries {
    pub cropped_table: Region,
    pub left_cropped: Region,
    pub part1: Region,
    pub part2: Region,
}

/// SHA-256 hex digests of each output raster's raw pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDigests {
    pub corrected_canonical: String,
    pub cropped_table: String,
    pub left_cropped: String,
    pub part1: String,
    pub part2: String,
}

/// Read-only audit record produced once per pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub original_dimensions: Dimensions,
    pub corner_source: CornerSource,
    /// Present only when the corners came from the detector.
    pub detected_corners: Option<CornerSet>,
    pub adjusted_corners: CornerSet,
    /// Whether a right-side corner hit the source's right edge during adjustment.
    pub right_edge_clamped: bool,
    pub canonical_dimensions: Dimensions,
    pub cell_width: f64,
    pub cell_height: f64,
    pub column_boundaries: Vec<u32>,
    pub row_boundaries: Vec<u32>,
    /// Row boundary index separating `part1` from `part2`.
    pub row_split_index: u32,
    pub regions: RegionBoundaries,
    pub digests: OutputDigests,
}

impl ProcessingMetadata {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
