// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster fingerprints — SHA-256 over a raster's shape and pixels, recorded in
// the processing metadata for every output.

use image::RgbaImage;
use sha2::{Digest, Sha256};

use crate::error::{GridCropError, Result};

/// Lowercase hex SHA-256 of `width`, `height` (little-endian u32 each) and
/// then the RGBA pixel buffer.
///
/// The shape is part of the digest, so two rasters holding the same bytes in
/// different layouts (2x1 and 1x2, say) never collide.
pub fn raster_digest(raster: &RgbaImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raster.width().to_le_bytes());
    hasher.update(raster.height().to_le_bytes());
    hasher.update(raster.as_raw());
    hex::encode(hasher.finalize())
}

/// Check `raster` against a digest previously produced by [`raster_digest`].
///
/// Comparison ignores ASCII case so digests typed or copied in upper case
/// still verify.
pub fn verify_raster(raster: &RgbaImage, expected: &str) -> Result<()> {
    let actual = raster_digest(raster);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(GridCropError::IntegrityMismatch {
            expected: expected.to_owned(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn shape_changes_digest_even_with_identical_bytes() {
        let wide = RgbaImage::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).expect("2x1");
        let tall = RgbaImage::from_raw(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).expect("1x2");
        assert_eq!(wide.as_raw(), tall.as_raw());
        assert_ne!(raster_digest(&wide), raster_digest(&tall));
    }

    #[test]
    fn digest_is_stable_and_pixel_sensitive() {
        let base = RgbaImage::from_pixel(16, 9, Rgba([10, 20, 30, 255]));
        let digest = raster_digest(&base);
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, raster_digest(&base.clone()));

        let mut touched = base.clone();
        touched.put_pixel(15, 8, Rgba([10, 20, 31, 255]));
        assert_ne!(raster_digest(&touched), digest);
    }

    #[test]
    fn empty_rasters_of_different_shape_differ() {
        assert_ne!(
            raster_digest(&RgbaImage::new(0, 5)),
            raster_digest(&RgbaImage::new(5, 0))
        );
    }

    #[test]
    fn verify_accepts_own_digest_in_either_case() {
        let raster = RgbaImage::from_pixel(3, 3, Rgba([200, 0, 0, 255]));
        let digest = raster_digest(&raster);
        assert!(verify_raster(&raster, &digest).is_ok());
        assert!(verify_raster(&raster, &digest.to_uppercase()).is_ok());
    }

    #[test]
    fn verify_reports_both_digests_on_mismatch() {
        let raster = RgbaImage::new(4, 4);
        let other = raster_digest(&RgbaImage::new(4, 5));
        match verify_raster(&raster, &other) {
            Err(GridCropError::IntegrityMismatch { expected, actual }) => {
                assert_eq!(expected, other);
                assert_eq!(actual, raster_digest(&raster));
            }
            result => panic!("expected a mismatch, got {result:?}"),
        }
    }
}
