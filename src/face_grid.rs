//! Face-location grid.
//!
//! The gaze network takes, next to the image crops, a coarse binary map of
//! where the face sits in the frame: a `grid_w × grid_h` grid (25 × 25 by
//! default) with ones over the cells the face box covers. The rounding and
//! clamping rules below are fixed by the network's training data and must not
//! drift.

use crate::constants::{FACE_GRID_HEIGHT, FACE_GRID_WIDTH};
use crate::geometry::{Rect, Size};
use crate::utils::safe_cast::f64_to_i64_clamp;
use ndarray::Array2;

/// Row-major binary occupancy grid
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGrid {
    width: usize,
    height: usize,
    cells: Vec<f32>,
}

impl FaceGrid {
    /// All-zero grid
    #[must_use]
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    /// Rasterize a face box from a frame of `frame` size into the default 25 × 25 grid
    #[must_use]
    pub fn from_face(frame: Size, face: &Rect) -> Self {
        rasterize(frame.width, frame.height, FACE_GRID_WIDTH, FACE_GRID_HEIGHT, face)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Cells in row-major order, `index = width * row + col`
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    #[must_use]
    pub fn into_cells(self) -> Vec<f32> {
        self.cells
    }

    /// Value at (`row`, `col`), zero-based
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.cells.get(self.width * row + col).copied()
    }

    /// Number of cells set to one
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell > 0.0).count()
    }

    /// Grid as a (height, width) matrix
    #[must_use]
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.height, self.width), |(row, col)| self.cells[self.width * row + col])
    }

    fn fill(&mut self, rows: std::ops::RangeInclusive<usize>, cols: std::ops::Range<usize>) {
        for row in rows {
            let start = self.width * row;
            for cell in &mut self.cells[start + cols.start..start + cols.end] {
                *cell = 1.0;
            }
        }
    }
}

/// Rasterize `face` (pixel box in a `frame_w × frame_h` frame) into a grid.
///
/// Cell bounds are one-based: `lo = round(pos * scale) + 1`,
/// `hi = lo + round(extent * scale) - 1`, each clamped into `[1, dim]`.
/// Rounding is half away from zero. A face with zero cell extent, an empty
/// frame, or a face entirely outside the grid gives an all-zero grid.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Grid dimensions are tiny
#[allow(clippy::cast_sign_loss)] // Bounds are clamped to [1, dim] before the cast
#[allow(clippy::cast_possible_truncation)]
pub fn rasterize(frame_w: f64, frame_h: f64, grid_w: usize, grid_h: usize, face: &Rect) -> FaceGrid {
    let mut grid = FaceGrid::zeros(grid_w, grid_h);
    if grid_w == 0 || grid_h == 0 || !(frame_w > 0.0 && frame_h > 0.0) {
        return grid;
    }

    let scale_x = grid_w as f64 / frame_w;
    let scale_y = grid_h as f64 / frame_h;

    let x_lo = (face.x * scale_x).round() + 1.0;
    let y_lo = (face.y * scale_y).round() + 1.0;
    let w = (face.width * scale_x).round();
    let h = (face.height * scale_y).round();
    if !(w > 0.0 && h > 0.0) || !(x_lo.is_finite() && y_lo.is_finite()) {
        return grid;
    }
    let x_hi = x_lo + w - 1.0;
    let y_hi = y_lo + h - 1.0;

    let max_col = grid_w as f64;
    let max_row = grid_h as f64;
    if x_hi < 1.0 || y_hi < 1.0 || x_lo > max_col || y_lo > max_row {
        return grid;
    }

    let clamp_col = |v: f64| f64_to_i64_clamp(v, 1, grid_w as i64) as usize;
    let clamp_row = |v: f64| f64_to_i64_clamp(v, 1, grid_h as i64) as usize;
    // Non-finite values clamp to the low bound; cap the high ends first
    let (x_lo, x_hi) = (clamp_col(x_lo), clamp_col(x_hi.min(max_col)));
    let (y_lo, y_hi) = (clamp_row(y_lo), clamp_row(y_hi.min(max_row)));

    grid.fill(y_lo - 1..=y_hi - 1, x_lo - 1..x_hi);
    grid
}
