// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for gridcrop.

use thiserror::Error;

/// Top-level error type for all gridcrop operations.
///
/// Every pipeline failure is terminal for the run that produced it; callers
/// inspect [`GridCropError::kind`] to decide whether to retry with a manually
/// supplied corner set or reject the input.
#[derive(Debug, Error)]
pub enum GridCropError {
    // -- Pipeline errors --
    #[error("corner detection failed: {0}")]
    CornerDetection(String),

    #[error("perspective rectification failed: {0}")]
    Rectification(String),

    #[error("invalid transform policy: {0}")]
    InvalidPolicy(String),

    #[error("region out of bounds: {0}")]
    Bounds(String),

    // -- Adapter errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`GridCropError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CornerDetection,
    Rectification,
    InvalidPolicy,
    Bounds,
    Adapter,
}

impl GridCropError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CornerDetection(_) => ErrorKind::CornerDetection,
            Self::Rectification(_) => ErrorKind::Rectification,
            Self::InvalidPolicy(_) => ErrorKind::InvalidPolicy,
            Self::Bounds(_) => ErrorKind::Bounds,
            Self::ImageError(_)
            | Self::IntegrityMismatch { .. }
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Adapter,
        }
    }

    /// Whether re-running with a caller-supplied `CornerSet` could succeed.
    ///
    /// Only geometry failures qualify; a bad policy or an I/O failure will
    /// fail the same way regardless of the corners.
    pub fn is_retryable_with_manual_corners(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CornerDetection | ErrorKind::Rectification | ErrorKind::Bounds
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GridCropError>;
