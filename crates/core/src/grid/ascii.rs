use rand::{rngs::StdRng, Rng};

use super::{sample, GridDims};
use crate::{
    color,
    render::{Point, Surface},
    ColorStyle,
};

/// Glyph sets from sparse to dense, picked by intensity quartile.
pub const ASCII_TIERS: [&[char]; 4] = [
    &[' ', '.', '\''],
    &[':', '-', '~'],
    &['=', '+', '*'],
    &['#', '%', '@'],
];

/// Chance per frame that a cell picks up a glyph from its current tier.
const SHIMMER: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct AsciiCell {
    glyph: char,
    intensity: f32,
}

impl Default for AsciiCell {
    fn default() -> Self {
        Self {
            glyph: ' ',
            intensity: 0.0,
        }
    }
}

/// Spectrum blended with a travelling sine field, drawn as shimmering glyphs.
#[derive(Debug, Clone, Default)]
pub struct AsciiWaveGrid {
    dims: GridDims,
    cells: Vec<AsciiCell>,
}

impl AsciiWaveGrid {
    pub fn new(width: u32, height: u32, density: u32) -> Self {
        let mut grid = Self::default();
        grid.resize(width, height, density);
        grid
    }

    /// Rebuilds every cell for the new layout.
    pub fn resize(&mut self, width: u32, height: u32, density: u32) {
        self.dims = GridDims::new(width, height, density);
        self.cells = vec![AsciiCell::default(); self.dims.cell_count()];
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn glyph(&self, row: usize, col: usize) -> Option<char> {
        if row >= self.dims.rows || col >= self.dims.cols {
            return None;
        }
        self.cells.get(row * self.dims.cols + col).map(|c| c.glyph)
    }

    /// Recomputes intensities and lets ~10% of cells swap glyphs.
    pub fn step(&mut self, buffer: &[u8], sensitivity: f32, time: f32, rng: &mut StdRng) {
        let dims = self.dims;
        for row in 0..dims.rows {
            for col in 0..dims.cols {
                let freq = sample(buffer, dims.bin_for_column(col, buffer.len())) / 255.0
                    * sensitivity;
                let wave = ((col as f32 * 0.15 + time).sin()
                    * (row as f32 * 0.15 + time * 0.7).cos()
                    + 1.0)
                    * 0.5;
                let intensity = (freq * 0.7 + wave * 0.3).clamp(0.0, 1.0);

                let cell = &mut self.cells[row * dims.cols + col];
                cell.intensity = intensity;
                if rng.gen_bool(SHIMMER) {
                    let tier = ASCII_TIERS[tier_for(intensity)];
                    cell.glyph = tier[rng.gen_range(0..tier.len())];
                }
            }
        }
    }

    pub fn draw(&self, style: ColorStyle, time: f32, surface: &mut dyn Surface) {
        let dims = self.dims;
        let size = dims.density as f32;
        let total = dims.cols + dims.rows;

        for row in 0..dims.rows {
            for col in 0..dims.cols {
                let cell = self.cells[row * dims.cols + col];
                if cell.glyph == ' ' {
                    continue;
                }
                let sway = cell.intensity * size * 0.3;
                let dx = (time * 2.0 + row as f32 * 0.3).sin() * sway;
                let dy = (time * 2.0 + col as f32 * 0.3).cos() * sway;
                let at = Point::new(col as f32 * size + dx, row as f32 * size + dy);
                let tint = color::color(col + row, total, cell.intensity * 255.0, style);
                let mut glyph = [0u8; 4];
                surface.fill_text(cell.glyph.encode_utf8(&mut glyph), at, size, tint);
            }
        }
    }
}

fn tier_for(intensity: f32) -> usize {
    match intensity {
        i if i < 0.25 => 0,
        i if i < 0.5 => 1,
        i if i < 0.75 => 2,
        _ => 3,
    }
}
