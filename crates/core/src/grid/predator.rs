use std::f32::consts::TAU;

use super::{sample, GridDims};
use crate::{
    color::thermal_color,
    render::{Point, Surface},
};

/// Glyphs for the five heat bands, coolest first.
pub const THERMAL_TIERS: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Every third row is dimmed by this factor.
const SCANLINE_ALPHA: f32 = 0.6;
/// Heat used for the HUD strokes.
const HUD_HEAT: f32 = 220.0;

/// Thermal-camera view. Holds only its layout; every cell is recomputed from
/// the spectrum and two noise fields each frame.
#[derive(Debug, Clone, Default)]
pub struct PredatorThermalGrid {
    dims: GridDims,
}

impl PredatorThermalGrid {
    pub fn new(width: u32, height: u32, density: u32) -> Self {
        Self {
            dims: GridDims::new(width, height, density),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32, density: u32) {
        self.dims = GridDims::new(width, height, density);
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Heat of one cell on the byte scale.
    pub fn heat(&self, buffer: &[u8], sensitivity: f32, time: f32, row: usize, col: usize) -> f32 {
        let freq = sample(buffer, self.dims.bin_for_column(col, buffer.len())) * sensitivity;
        let (r, c) = (row as f32, col as f32);
        let body = (c * 0.3 + time * 2.0).sin() * (r * 0.2 + time).cos();
        let shimmer = ((c + r) * 0.1 - time * 1.5).sin();
        (freq * 0.6 + (body + 1.0) * 0.5 * 60.0 + (shimmer + 1.0) * 0.5 * 40.0).clamp(0.0, 255.0)
    }

    pub fn draw(&self, buffer: &[u8], sensitivity: f32, time: f32, surface: &mut dyn Surface) {
        let dims = self.dims;
        let size = dims.density as f32;

        for row in 0..dims.rows {
            let scanline = if row % 3 == 0 { SCANLINE_ALPHA } else { 1.0 };
            for col in 0..dims.cols {
                let heat = self.heat(buffer, sensitivity, time, row, col);
                let glyph = THERMAL_TIERS[tier_for(heat)];
                if glyph == ' ' {
                    continue;
                }
                let mut buf = [0u8; 4];
                surface.fill_text(
                    glyph.encode_utf8(&mut buf),
                    Point::new(col as f32 * size, row as f32 * size),
                    size,
                    thermal_color(heat).with_alpha(scanline),
                );
            }
        }

        draw_hud(surface);
    }
}

fn tier_for(heat: f32) -> usize {
    ((heat / 51.0) as usize).min(THERMAL_TIERS.len() - 1)
}

/// Center crosshair with a ring, plus four corner brackets.
fn draw_hud(surface: &mut dyn Surface) {
    let (width, height) = surface.size();
    let (w, h) = (width as f32, height as f32);
    let hud = thermal_color(HUD_HEAT);
    let center = Point::new(w * 0.5, h * 0.5);
    let (reach, gap) = (30.0, 8.0);

    for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
        surface.stroke_line(
            Point::new(center.x + dx * gap, center.y + dy * gap),
            Point::new(center.x + dx * reach, center.y + dy * reach),
            2.0,
            hud,
        );
    }
    surface.stroke_arc(center, 20.0, 0.0, TAU, 1.0, hud.with_alpha(0.7));

    let (margin, arm) = (20.0, 40.0);
    for (x, y, sx, sy) in [
        (margin, margin, 1.0, 1.0),
        (w - margin, margin, -1.0, 1.0),
        (margin, h - margin, 1.0, -1.0),
        (w - margin, h - margin, -1.0, -1.0),
    ] {
        let corner = Point::new(x, y);
        surface.stroke_line(corner, Point::new(x + sx * arm, y), 2.0, hud);
        surface.stroke_line(corner, Point::new(x, y + sy * arm), 2.0, hud);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CommandList, DrawCommand};

    #[test]
    fn heat_stays_on_byte_scale() {
        let grid = PredatorThermalGrid::new(320, 240, 10);
        for (row, col) in [(0, 0), (5, 17), (23, 31)] {
            for t in [0.0, 1.3, 42.0] {
                let hot = grid.heat(&[255; 64], 5.0, t, row, col);
                let cold = grid.heat(&[], 1.0, t, row, col);
                assert!((0.0..=255.0).contains(&hot));
                assert!((0.0..=100.0).contains(&cold));
                assert!(hot >= cold);
            }
        }
    }

    #[test]
    fn recomputes_from_inputs_each_frame() {
        let grid = PredatorThermalGrid::new(200, 100, 10);
        let mut first = CommandList::new(200, 100);
        let mut second = CommandList::new(200, 100);
        grid.draw(&[180; 32], 1.0, 2.5, &mut first);
        grid.draw(&[180; 32], 1.0, 2.5, &mut second);
        assert_eq!(first.commands(), second.commands());
    }

    #[test]
    fn scanlines_dim_every_third_row() {
        let grid = PredatorThermalGrid::new(100, 100, 10);
        let mut surface = CommandList::new(100, 100);
        grid.draw(&[255; 16], 5.0, 0.0, &mut surface);

        for command in surface.commands() {
            if let DrawCommand::Text { at, color, .. } = command {
                let row = (at.y / 10.0).round() as usize;
                let expected = if row % 3 == 0 { SCANLINE_ALPHA } else { 1.0 };
                assert_eq!(color.a, expected);
            }
        }
    }

    #[test]
    fn hud_is_fixed_geometry() {
        let grid = PredatorThermalGrid::new(300, 200, 10);
        let mut surface = CommandList::new(300, 200);
        grid.draw(&[], 1.0, 0.0, &mut surface);
        let lines = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        let arcs = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Arc { .. }))
            .count();
        assert_eq!(lines, 4 + 8);
        assert_eq!(arcs, 1);
    }

    #[test]
    fn tiers_cover_the_byte_range() {
        assert_eq!(tier_for(0.0), 0);
        assert_eq!(tier_for(51.0), 1);
        assert_eq!(tier_for(204.0), 4);
        assert_eq!(tier_for(255.0), 4);
    }
}
