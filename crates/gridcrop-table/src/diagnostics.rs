// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostic overlay — a copy of the source with the table quadrilateral
// drawn on it. Never consumed by the pipeline itself.

use gridcrop_core::CornerSet;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

const MARKER_COLOUR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const OUTLINE_COLOUR: Rgba<u8> = Rgba([0, 200, 0, 255]);

/// Mark each corner with a filled dot and join them with an outline.
///
/// Marker radius scales with the image (1% of the shorter side, at least
/// 3 px) so it stays visible on large photos.
pub fn annotate_corners(source: &DynamicImage, corners: &CornerSet) -> RgbaImage {
    let mut canvas = source.to_rgba8();
    let radius = ((canvas.width().min(canvas.height()) as f32 * 0.01).round() as i32).max(3);

    let points = corners.to_array();
    for (i, start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        draw_line_segment_mut(&mut canvas, (*start).into(), end.into(), OUTLINE_COLOUR);
    }
    for p in points {
        let centre = (p.x.round() as i32, p.y.round() as i32);
        draw_filled_circle_mut(&mut canvas, centre, radius, MARKER_COLOUR);
    }
    canvas
}
