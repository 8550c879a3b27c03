// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export adapter — decode inputs, encode pipeline outputs as PNG plus a JSON
// metadata file, and optionally write them to a directory.

use std::path::{Path, PathBuf};

use gridcrop_core::{GridCropError, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info, instrument};

use crate::pipeline::TableOutputs;

/// One encoded output, ready to be written or transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Decode an image from raw encoded bytes (JPEG, PNG, TIFF, etc.).
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(data).map_err(|err| {
        GridCropError::ImageError(format!("failed to decode table image: {}", err))
    })?;
    debug!(width = image.width(), height = image.height(), "Image decoded from bytes");
    Ok(image)
}

/// Load an image from a file path.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<Path>) -> Result<DynamicImage> {
    image::open(path.as_ref()).map_err(|err| {
        GridCropError::ImageError(format!(
            "failed to open table image {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

/// Encode an RGBA raster as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, ImageFormat::Png).map_err(|err| {
        GridCropError::ImageError(format!("PNG encoding failed: {}", err))
    })?;
    Ok(buffer)
}

impl TableOutputs {
    /// Encode every output under names derived from `base_name`.
    ///
    /// Row-band names carry 1-based row ranges, e.g. `_part1_rows1-8.png` and
    /// `_part2_rows9-17.png` for the default 17-row grid split at 8.
    /// `corner_overlay`, if given, is included as `_corners.png`.
    #[instrument(skip(self, corner_overlay))]
    pub fn encode(
        &self,
        base_name: &str,
        corner_overlay: Option<&RgbaImage>,
    ) -> Result<Vec<ExportedFile>> {
        let split = self.metadata.row_split_index;
        let rows = self.metadata.row_boundaries.len().saturating_sub(1);

        let mut rasters: Vec<(String, &RgbaImage)> = Vec::with_capacity(6);
        if let Some(overlay) = corner_overlay {
            rasters.push((format!("{base_name}_corners.png"), overlay));
        }
        rasters.extend([
            (format!("{base_name}_perspective_corrected.png"), &self.corrected_canonical),
            (format!("{base_name}_cropped_table.png"), &self.cropped_table),
            (format!("{base_name}_left_cropped.png"), &self.left_cropped),
            (format!("{base_name}_part1_rows1-{split}.png"), &self.part1),
            (format!("{base_name}_part2_rows{}-{rows}.png", split + 1), &self.part2),
        ]);

        let mut files = Vec::with_capacity(rasters.len() + 1);
        for (name, raster) in rasters {
            files.push(ExportedFile {
                bytes: encode_png(raster)?,
                name,
            });
        }
        files.push(ExportedFile {
            name: format!("{base_name}_metadata.json"),
            bytes: self.metadata.to_json_pretty()?.into_bytes(),
        });

        debug!(file_count = files.len(), "Outputs encoded");
        Ok(files)
    }

    /// Encode every output and write it into `dir`, creating the directory
    /// if needed. Returns the written paths in encoding order.
    #[instrument(skip(self, dir, corner_overlay), fields(dir = %dir.as_ref().display()))]
    pub fn write_to_dir(
        &self,
        dir: impl AsRef<Path>,
        base_name: &str,
        corner_overlay: Option<&RgbaImage>,
    ) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut paths = Vec::new();
        for file in self.encode(base_name, corner_overlay)? {
            let path = dir.join(&file.name);
            std::fs::write(&path, &file.bytes)?;
            paths.push(path);
        }
        info!(count = paths.len(), "Outputs written");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::annotate_corners;
    use crate::pipeline::TablePipeline;
    use gridcrop_core::{CornerSet, ProcessingMetadata, TransformPolicy};
    use image::Rgba;

    fn outputs() -> (DynamicImage, CornerSet, TableOutputs) {
        let policy = TransformPolicy {
            canonical_width: 96,
            canonical_height: 51,
            columns: 8,
            rows: 17,
            ..TransformPolicy::default()
        };
        let source = DynamicImage::ImageRgba8(RgbaImage::from_fn(160, 120, |x, y| {
            Rgba([x as u8, y as u8, 128, 255])
        }));
        let corners = CornerSet::inset_frame(160, 120, 0.05);
        let out = TablePipeline::new(policy)
            .expect("policy")
            .run_with_corners(&source, corners)
            .expect("pipeline");
        (source, corners, out)
    }

    #[test]
    fn encode_names_follow_row_split() {
        let (_, _, out) = outputs();
        let files = out.encode("scan", None).expect("encode");
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "scan_perspective_corrected.png",
                "scan_cropped_table.png",
                "scan_left_cropped.png",
                "scan_part1_rows1-8.png",
                "scan_part2_rows9-17.png",
                "scan_metadata.json",
            ]
        );
    }

    #[test]
    fn encoded_png_decodes_to_same_pixels() {
        let (_, _, out) = outputs();
        let bytes = encode_png(&out.part2).expect("encode");
        let decoded = decode(&bytes).expect("decode").to_rgba8();
        assert_eq!(decoded, out.part2);
    }

    #[test]
    fn metadata_json_parses_back() {
        let (_, _, out) = outputs();
        let files = out.encode("scan", None).expect("encode");
        let json = files.last().expect("metadata file");
        let text = std::str::from_utf8(&json.bytes).expect("utf-8");
        let parsed = ProcessingMetadata::from_json_str(text).expect("metadata parses");
        assert_eq!(parsed, out.metadata);
    }

    #[test]
    fn writes_all_files_including_overlay() {
        let (source, corners, out) = outputs();
        let overlay = annotate_corners(&source, &corners);
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("output");

        let paths = out
            .write_to_dir(&target, "table", Some(&overlay))
            .expect("write");

        assert_eq!(paths.len(), 7);
        assert!(target.join("table_corners.png").is_file());
        assert!(target.join("table_metadata.json").is_file());
        for path in &paths {
            assert!(std::fs::metadata(path).expect("exists").len() > 0);
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        let result = decode(b"definitely not an image");
        assert!(matches!(result, Err(GridCropError::ImageError(_))));
    }
}
