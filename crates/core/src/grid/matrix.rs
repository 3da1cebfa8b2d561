use rand::{rngs::StdRng, Rng};

use super::GridDims;
use crate::{
    render::{Point, Surface},
    Color, ColorStyle,
};

/// Spawn probability per column per frame at full audio strength.
const SPAWN_RATE: f32 = 0.08;
/// Per-glyph chance of mutating each frame.
const MUTATE_RATE: f64 = 0.02;
/// A column may hold only one drop whose head is above this row.
const TOP_ZONE: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixDrop {
    pub column: usize,
    /// Row of the leading glyph. Negative while still above the top edge.
    pub head: f32,
    pub speed: f32,
    /// Glyphs from the head backwards.
    pub glyphs: Vec<char>,
    pub length: usize,
    /// Audio strength when the drop spawned.
    pub intensity: f32,
}

impl MatrixDrop {
    fn spawn(column: usize, rows: usize, intensity: f32, rng: &mut StdRng) -> Self {
        let length = rng.gen_range(5..=(rows / 2).max(6));
        Self {
            column,
            head: -rng.gen_range(0.0..4.0),
            speed: rng.gen_range(0.3..1.0),
            glyphs: (0..length).map(|_| rain_glyph(rng)).collect(),
            length,
            intensity,
        }
    }

    fn near_top(&self) -> bool {
        self.head < TOP_ZONE
    }

    /// True once the whole trail has left the bottom edge.
    fn finished(&self, rows: usize) -> bool {
        self.head - self.length as f32 > rows as f32
    }
}

/// Falling glyph streams whose speed and spawn rate follow the audio level.
#[derive(Debug, Clone, Default)]
pub struct MatrixRainGrid {
    dims: GridDims,
    drops: Vec<MatrixDrop>,
}

impl MatrixRainGrid {
    pub fn new(width: u32, height: u32, density: u32) -> Self {
        let mut grid = Self::default();
        grid.resize(width, height, density);
        grid
    }

    /// Adopts the new layout. Existing drops belong to the old coordinate
    /// system and are dropped.
    pub fn resize(&mut self, width: u32, height: u32, density: u32) {
        self.dims = GridDims::new(width, height, density);
        self.drops.clear();
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn drops(&self) -> &[MatrixDrop] {
        &self.drops
    }

    pub fn step(&mut self, buffer: &[u8], sensitivity: f32, rng: &mut StdRng) {
        let strength = audio_strength(buffer, sensitivity);
        let rows = self.dims.rows;

        for drop in &mut self.drops {
            drop.head += drop.speed * (1.0 + strength);
            for glyph in &mut drop.glyphs {
                if rng.gen_bool(MUTATE_RATE) {
                    *glyph = rain_glyph(rng);
                }
            }
        }
        self.drops.retain(|drop| !drop.finished(rows));

        let mut occupied = vec![false; self.dims.cols];
        for drop in self.drops.iter().filter(|d| d.near_top()) {
            if let Some(slot) = occupied.get_mut(drop.column) {
                *slot = true;
            }
        }
        for (column, taken) in occupied.into_iter().enumerate() {
            if !taken && rng.gen::<f32>() < strength * SPAWN_RATE {
                self.drops.push(MatrixDrop::spawn(column, rows, strength, rng));
            }
        }
    }

    pub fn draw(&self, style: ColorStyle, surface: &mut dyn Surface) {
        let size = self.dims.density as f32;
        let rows = self.dims.rows as i64;

        for drop in &self.drops {
            let head_row = drop.head.floor() as i64;
            let tail = trail_color(style, drop.intensity);
            for (offset, glyph) in drop.glyphs.iter().enumerate() {
                let row = head_row - offset as i64;
                if row < 0 || row >= rows {
                    continue;
                }
                let alpha = (1.0 - offset as f32 / drop.length as f32).max(0.1);
                let tint = if offset == 0 {
                    Color::rgb(220, 255, 220)
                } else {
                    tail
                };
                let mut buf = [0u8; 4];
                surface.fill_text(
                    glyph.encode_utf8(&mut buf),
                    Point::new(drop.column as f32 * size, row as f32 * size),
                    size,
                    tint.with_alpha(alpha),
                );
            }
        }
    }
}

/// Mean byte level scaled by sensitivity, in `[0, 1]`.
fn audio_strength(buffer: &[u8], sensitivity: f32) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let mean = buffer.iter().map(|&v| v as f32).sum::<f32>() / buffer.len() as f32;
    (mean / 255.0 * sensitivity).clamp(0.0, 1.0)
}

fn trail_color(style: ColorStyle, intensity: f32) -> Color {
    match style {
        ColorStyle::Minimal => Color::WHITE,
        _ => Color::hsla(120.0, 1.0, 0.3 + 0.3 * intensity, 1.0),
    }
}

fn rain_glyph(rng: &mut StdRng) -> char {
    // mostly half-width katakana, some digits
    if rng.gen_bool(0.8) {
        char::from_u32(rng.gen_range(0xFF66u32..=0xFF9D)).unwrap_or('0')
    } else {
        rng.gen_range(b'0'..=b'9') as char
    }
}
