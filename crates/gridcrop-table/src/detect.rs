// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner detection — locate the table quadrilateral in source pixel space
// from the largest four-sided closed contour in the edge map.

use gridcrop_core::{CornerSet, DetectionConfig, GridCropError, Point, Result};
use image::{DynamicImage, GrayImage};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use imageproc::morphology::close;
use imageproc::point::Point as PixelPoint;
use tracing::{debug, info, instrument, warn};

/// Finds the four corners of a table in a photographed or scanned image.
///
/// ## Pipeline
///
/// 1. Convert to grayscale
/// 2. Gaussian blur for noise reduction
/// 3. Canny edge detection
/// 4. Morphological close to bridge one-pixel gaps in the edge map
/// 5. Trace outermost contours
/// 6. Approximate each contour by a polygon (Douglas-Peucker); keep those
///    with exactly four vertices whose enclosed area clears the threshold
/// 7. Label the vertices of the largest survivor with
///    [`CornerSet::from_unordered`]
#[derive(Debug, Clone, Default)]
pub struct CornerDetector {
    config: DetectionConfig,
}

impl CornerDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect the table's corners, or fail with
    /// [`GridCropError::CornerDetection`] when no qualifying contour exists.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Result<CornerSet> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(GridCropError::CornerDetection(format!(
                "source image is empty ({width}x{height})"
            )));
        }

        let edges = self.edge_map(&image.to_luma8());
        let contours = find_contours::<i32>(&edges);
        debug!(contour_count = contours.len(), "Contours traced");

        let min_area = width as f64 * height as f64 * self.config.min_area_ratio;
        let mut best: Option<(f64, [Point; 4])> = None;

        for contour in contours.iter().filter(|c| is_outermost(c)) {
            let Some(quad) = approximate_quad(&contour.points, self.config.approx_epsilon_ratio)
            else {
                continue;
            };
            let area = contour_area(&contour.points);
            if area <= min_area {
                debug!(area, min_area, "Quadrilateral contour below area threshold");
                continue;
            }
            if best.is_none_or(|(best_area, _)| area > best_area) {
                best = Some((area, quad));
            }
        }

        let Some((area, quad)) = best else {
            warn!(min_area, "No four-vertex contour above the area threshold");
            return Err(GridCropError::CornerDetection(format!(
                "no four-vertex contour encloses more than {:.0}% of the image",
                self.config.min_area_ratio * 100.0
            )));
        };

        let corners = CornerSet::from_unordered(quad);
        info!(
            area,
            top_left = ?corners.top_left,
            top_right = ?corners.top_right,
            bottom_right = ?corners.bottom_right,
            bottom_left = ?corners.bottom_left,
            "Table corners detected"
        );
        Ok(corners)
    }

    /// Binary edge map: blur, Canny, then close.
    fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        // gaussian_blur_f32 rejects a zero sigma.
        let blurred = if self.config.blur_sigma > 0.0 {
            gaussian_blur_f32(gray, self.config.blur_sigma)
        } else {
            gray.clone()
        };
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        if self.config.close_radius > 0 {
            close(&edges, Norm::LInf, self.config.close_radius)
        } else {
            edges
        }
    }
}

fn is_outermost(contour: &Contour<i32>) -> bool {
    contour.parent.is_none() && contour.border_type == BorderType::Outer
}

/// Reduce a closed contour to a polygon and return its vertices if there are
/// exactly four.
///
/// `approximate_polygon_dp` treats its input as an open path whose first
/// chord joins the first and last points, which on a closed contour are
/// neighbours. The ring is therefore cut at two points that are vertices of
/// any convex outline: the one minimising `x + y`, and the point farthest
/// from it. Each half is simplified as an open path.
fn approximate_quad(points: &[PixelPoint<i32>], epsilon_ratio: f64) -> Option<[Point; 4]> {
    if points.len() < 4 {
        return None;
    }
    let epsilon = epsilon_ratio * arc_length(points, true);
    if epsilon <= 0.0 {
        return None;
    }

    let start = points
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| p.x as i64 + p.y as i64)
        .map(|(i, _)| i)?;
    let mut ring: Vec<PixelPoint<i32>> = points[start..]
        .iter()
        .chain(&points[..start])
        .copied()
        .collect();
    let anchor = ring[0];
    let far = ring
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| squared_distance(anchor, **p))
        .map(|(i, _)| i)?;
    if far == 0 {
        return None;
    }
    ring.push(anchor);

    let mut simplified = approximate_polygon_dp(&ring[..=far], epsilon, false);
    let mut closing = approximate_polygon_dp(&ring[far..], epsilon, false);
    // Each half ends on the other half's first vertex.
    simplified.pop();
    closing.pop();
    simplified.extend(closing);

    let polygon: Vec<Point> = simplified.iter().map(to_point).collect();
    match prune_collinear(polygon, epsilon).as_slice() {
        [a, b, c, d] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

fn squared_distance(a: PixelPoint<i32>, b: PixelPoint<i32>) -> i64 {
    let (dx, dy) = (b.x as i64 - a.x as i64, b.y as i64 - a.y as i64);
    dx * dx + dy * dy
}

/// Drop vertices lying within `epsilon` of the chord joining their cyclic
/// neighbours.
///
/// Catches near-straight runs that survive simplification as extra vertices,
/// and repeated points.
fn prune_collinear(mut polygon: Vec<Point>, epsilon: f64) -> Vec<Point> {
    let mut i = 0;
    while polygon.len() > 3 && i < polygon.len() {
        let n = polygon.len();
        let prev = polygon[(i + n - 1) % n];
        let next = polygon[(i + 1) % n];
        if distance_to_chord(polygon[i], prev, next) <= epsilon {
            polygon.remove(i);
            // Re-examine the neighbour that now precedes index `i`.
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
    polygon
}

fn distance_to_chord(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length = dx.hypot(dy);
    if length < f64::EPSILON {
        return (p.x - a.x).hypot(p.y - a.y);
    }
    (dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs() / length
}

fn to_point(p: &PixelPoint<i32>) -> Point {
    Point::new(p.x as f64, p.y as f64)
}

// -- Tests --------------------------------------------------------------------
