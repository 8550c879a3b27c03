// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lanczos-4 inverse-mapping warp. `imageproc` stops at bicubic, so the
// windowed-sinc path lives here.

use std::f64::consts::PI;

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::Projection;

/// Kernel half-width in source pixels; the window covers 8 taps per axis.
const RADIUS: i64 = 4;
const TAPS: usize = 2 * RADIUS as usize;

/// Source coordinates this far outside the pixel grid still count as
/// inside, absorbing float error at the canvas edges.
const EDGE_TOLERANCE: f64 = 1e-3;

/// Fill `output` by mapping each destination pixel through `inverse`
/// (destination -> source) and sampling the source with an 8x8 Lanczos
/// window. Pixels whose pre-image falls outside the source get `fill`.
///
/// Taps that reach past the border replicate the edge pixel.
pub(crate) fn warp_into_lanczos4(
    input: &RgbaImage,
    inverse: Projection,
    fill: Rgba<u8>,
    output: &mut RgbaImage,
) {
    let (in_w, in_h) = input.dimensions();
    let max_x = in_w.saturating_sub(1) as f64;
    let max_y = in_h.saturating_sub(1) as f64;

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let (sx, sy) = inverse * (x as f32, y as f32);
        let (sx, sy) = (sx as f64, sy as f64);

        let inside = sx.is_finite()
            && sy.is_finite()
            && sx >= -EDGE_TOLERANCE
            && sy >= -EDGE_TOLERANCE
            && sx <= max_x + EDGE_TOLERANCE
            && sy <= max_y + EDGE_TOLERANCE;

        *pixel = if inside {
            sample(input, sx.clamp(0.0, max_x), sy.clamp(0.0, max_y))
        } else {
            fill
        };
    }
}

fn sample(input: &RgbaImage, sx: f64, sy: f64) -> Rgba<u8> {
    let (x0, wx) = weights(sx);
    let (y0, wy) = weights(sy);
    let last_x = input.width() as i64 - 1;
    let last_y = input.height() as i64 - 1;

    let mut acc = [0.0f64; 4];
    for (j, &weight_y) in wy.iter().enumerate() {
        let yy = (y0 + j as i64).clamp(0, last_y) as u32;
        for (i, &weight_x) in wx.iter().enumerate() {
            let xx = (x0 + i as i64).clamp(0, last_x) as u32;
            let weight = weight_x * weight_y;
            let px = input.get_pixel(xx, yy).0;
            for (channel, value) in acc.iter_mut().zip(px) {
                *channel += weight * value as f64;
            }
        }
    }

    Rgba(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

/// First tap index and normalised weights for coordinate `t`.
fn weights(t: f64) -> (i64, [f64; TAPS]) {
    let first = t.floor() as i64 - (RADIUS - 1);
    let mut w = [0.0; TAPS];
    let mut sum = 0.0;
    for (i, wi) in w.iter_mut().enumerate() {
        *wi = lanczos(t - (first + i as i64) as f64);
        sum += *wi;
    }
    for wi in &mut w {
        *wi /= sum;
    }
    (first, w)
}

fn lanczos(x: f64) -> f64 {
    let a = RADIUS as f64;
    if x.abs() < 1e-12 {
        1.0
    } else if x.abs() >= a {
        0.0
    } else {
        let px = PI * x;
        a * px.sin() * (px / a).sin() / (px * px)
    }
}
