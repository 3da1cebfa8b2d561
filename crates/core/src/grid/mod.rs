//! Cell and stream simulations that render as glyph grids.
//!
//! All three effects share the same coordinate system: a cell is
//! `density` pixels square, and the grid holds `floor(W / density)` columns
//! by `floor(H / density)` rows.

mod ascii;
mod matrix;
mod predator;

pub use ascii::{AsciiWaveGrid, ASCII_TIERS};
pub use matrix::{MatrixDrop, MatrixRainGrid};
pub use predator::{PredatorThermalGrid, THERMAL_TIERS};

/// Cell layout derived from the canvas size and glyph density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDims {
    pub cols: usize,
    pub rows: usize,
    pub density: u32,
}

impl GridDims {
    pub fn new(width: u32, height: u32, density: u32) -> Self {
        let density = density.max(1);
        Self {
            cols: (width / density) as usize,
            rows: (height / density) as usize,
            density,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Spectrum bin a column listens to.
    pub(crate) fn bin_for_column(&self, col: usize, bins: usize) -> usize {
        if self.cols == 0 {
            return 0;
        }
        col * bins / self.cols
    }
}

/// Byte sample at `index`, or 0 when the buffer is too short.
pub(crate) fn sample(buffer: &[u8], index: usize) -> f32 {
    buffer.get(index).copied().unwrap_or(0) as f32
}
