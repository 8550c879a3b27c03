// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grid partitioning — exact column and row boundaries over the canonical
// rectangle. Every later cut reads its coordinates from here.

use gridcrop_core::{BoundaryRounding, Dimensions, GridCropError, Result, TransformPolicy};

/// A fixed `columns` x `rows` grid laid over a `width` x `height` canvas.
///
/// Boundaries are computed in integer arithmetic from the exact ratio
/// `i * W / C`, never by accumulating a rounded cell size, so they cannot
/// drift. With `W >= C` and `H >= R` both sequences are strictly increasing,
/// start at 0, and end at the canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    columns: u32,
    rows: u32,
    rounding: BoundaryRounding,
}

impl Grid {
    /// Fails with [`GridCropError::InvalidPolicy`] if any dimension is zero
    /// or the canvas is smaller than the grid along either axis.
    pub fn new(
        canvas: Dimensions,
        columns: u32,
        rows: u32,
        rounding: BoundaryRounding,
    ) -> Result<Self> {
        if canvas.width == 0 || canvas.height == 0 || columns == 0 || rows == 0 {
            return Err(GridCropError::InvalidPolicy(format!(
                "grid {columns}x{rows} over {}x{} has a zero dimension",
                canvas.width, canvas.height
            )));
        }
        if canvas.width < columns || canvas.height < rows {
            return Err(GridCropError::InvalidPolicy(format!(
                "canvas {}x{} is too small for a {columns}x{rows} grid",
                canvas.width, canvas.height
            )));
        }
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            columns,
            rows,
            rounding,
        })
    }

    pub fn from_policy(policy: &TransformPolicy) -> Result<Self> {
        Self::new(
            Dimensions::new(policy.canonical_width, policy.canonical_height),
            policy.columns,
            policy.rows,
            policy.rounding,
        )
    }

    pub fn canvas(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn rounding(&self) -> BoundaryRounding {
        self.rounding
    }

    /// x coordinate of the left edge of column `i`; `col_boundary(columns)`
    /// is the canvas width.
    ///
    /// # Panics
    ///
    /// Panics if `i > columns`.
    pub fn col_boundary(&self, i: u32) -> u32 {
        assert!(i <= self.columns, "column boundary {i} out of range 0..={}", self.columns);
        self.rounding.ratio(i as u64 * self.width as u64, self.columns as u64) as u32
    }

    /// y coordinate of the top edge of row `j`; `row_boundary(rows)` is the
    /// canvas height.
    ///
    /// # Panics
    ///
    /// Panics if `j > rows`.
    pub fn row_boundary(&self, j: u32) -> u32 {
        assert!(j <= self.rows, "row boundary {j} out of range 0..={}", self.rows);
        self.rounding.ratio(j as u64 * self.height as u64, self.rows as u64) as u32
    }

    pub fn column_boundaries(&self) -> Vec<u32> {
        (0..=self.columns).map(|i| self.col_boundary(i)).collect()
    }

    pub fn row_boundaries(&self) -> Vec<u32> {
        (0..=self.rows).map(|j| self.row_boundary(j)).collect()
    }

    /// Nominal (unrounded) cell width.
    pub fn cell_width(&self) -> f64 {
        self.width as f64 / self.columns as f64
    }

    /// Nominal (unrounded) cell height.
    pub fn cell_height(&self) -> f64 {
        self.height as f64 / self.rows as f64
    }
}
