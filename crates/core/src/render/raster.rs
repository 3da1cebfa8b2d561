use std::f32::consts::TAU;

use image::{Rgba, RgbaImage};

use super::{Point, Rect, Surface};
use crate::Color;

/// Software rasterizer over an opaque RGBA image.
///
/// Every primitive is composited source-over with the color's alpha, one
/// blend per covered pixel. Text has no font: each glyph becomes a cell-sized
/// block whose opacity follows how much ink the glyph would carry.
#[derive(Debug, Clone)]
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    /// Resizes to the new viewport, clearing to black. No-op when unchanged.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        }
    }

    pub fn snapshot(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    fn blend(&mut self, x: i64, y: i64, color: Color) {
        let (width, height) = self.image.dimensions();
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            return;
        }
        let alpha = color.a.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let px = self.image.get_pixel_mut(x as u32, y as u32);
        for (channel, source) in [color.r, color.g, color.b].into_iter().enumerate() {
            let dest = px.0[channel] as f32;
            px.0[channel] = (source as f32 * alpha + dest * (1.0 - alpha)).round() as u8;
        }
        px.0[3] = 255;
    }

    /// Pixel bounds of a float box, clipped to the image.
    fn clip(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (i64, i64, i64, i64) {
        let (width, height) = self.image.dimensions();
        (
            (min_x.floor() as i64).max(0),
            (min_y.floor() as i64).max(0),
            (max_x.ceil() as i64).min(width as i64),
            (max_y.ceil() as i64).min(height as i64),
        )
    }
}

impl Surface for Raster {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (x0, y0, x1, y1) = self.clip(
            rect.x.round(),
            rect.y.round(),
            (rect.x + rect.width).round(),
            (rect.y + rect.height).round(),
        );
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color) {
        let half = (width * 0.5).max(0.5);
        let (x0, y0, x1, y1) = self.clip(
            from.x.min(to.x) - half,
            from.y.min(to.y) - half,
            from.x.max(to.x) + half,
            from.y.max(to.y) + half,
        );
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(center, from, to) <= half {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn stroke_path(&mut self, points: &[Point], width: f32, color: Color) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], width, color);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let radius = radius.max(0.5);
        let (x0, y0, x1, y1) = self.clip(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        );
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                if dx * dx + dy * dy <= radius * radius {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        color: Color,
    ) {
        let half = (width * 0.5).max(0.5);
        let outer = radius + half;
        let sweep = end - start;
        let (x0, y0, x1, y1) = self.clip(
            center.x - outer,
            center.y - outer,
            center.x + outer,
            center.y + outer,
        );
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                if ((dx * dx + dy * dy).sqrt() - radius).abs() > half {
                    continue;
                }
                let within = sweep >= TAU || (dy.atan2(dx) - start).rem_euclid(TAU) <= sweep;
                if within {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        let (_, y0, _, y1) = self.clip(0.0, min_y, 0.0, max_y);
        let width = self.image.width() as i64;

        let mut crossings = Vec::with_capacity(points.len());
        for y in y0..y1 {
            let scan = y as f32 + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if (a.y <= scan && b.y > scan) || (b.y <= scan && a.y > scan) {
                    crossings.push(a.x + (scan - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as i64;
                let end = ((span[1] - 0.5).floor() as i64).min(width - 1);
                for x in start..=end {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Color) {
        let advance = size * 0.6;
        for (i, glyph) in text.chars().enumerate() {
            let ink = glyph_ink(glyph);
            if ink <= 0.0 {
                continue;
            }
            let cell = Rect::new(
                at.x + i as f32 * advance + size * 0.1,
                at.y + size * 0.15,
                size * 0.4,
                size * 0.7,
            );
            self.fill_rect(cell, color.with_alpha(color.a * ink));
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * abx, a.y + t * aby);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Rough share of a glyph cell covered by ink.
fn glyph_ink(glyph: char) -> f32 {
    match glyph {
        ' ' => 0.0,
        '.' | ',' | '\'' | '`' | '·' => 0.15,
        ':' | '-' | ';' | '░' => 0.3,
        '=' | '+' | '*' | '~' | '▒' => 0.5,
        '▓' => 0.75,
        '#' | '%' | '&' | '$' | '@' => 0.85,
        '█' => 1.0,
        c if c.is_alphanumeric() => 0.6,
        _ => 0.55,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_rect_replaces_pixels() {
        let mut raster = Raster::new(20, 10);
        raster.fill_rect(Rect::new(2.0, 2.0, 4.0, 4.0), Color::rgb(255, 0, 0));
        assert_eq!(raster.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(raster.pixel(10, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn translucent_fill_fades_toward_color() {
        let mut raster = Raster::new(4, 4);
        raster.fill(Color::WHITE);
        raster.fill(Color::BLACK.with_alpha(0.5));
        let [r, g, b, a] = raster.pixel(1, 1).unwrap();
        assert!((r as i32 - 128).abs() <= 1);
        assert_eq!((r, g, b, a), (r, r, r, 255));
    }

    #[test]
    fn polygon_fills_interior_only() {
        let mut raster = Raster::new(20, 20);
        let triangle = [
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(0.0, 20.0),
        ];
        raster.fill_polygon(&triangle, Color::WHITE);
        assert_eq!(raster.pixel(2, 2), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(18, 18), Some([0, 0, 0, 255]));
    }

    #[test]
    fn line_and_circle_touch_expected_pixels() {
        let mut raster = Raster::new(30, 30);
        raster.stroke_line(Point::new(0.0, 15.0), Point::new(30.0, 15.0), 2.0, Color::WHITE);
        assert_eq!(raster.pixel(10, 15).unwrap()[0], 255);
        assert_eq!(raster.pixel(10, 5).unwrap()[0], 0);

        raster.fill_circle(Point::new(5.0, 5.0), 3.0, Color::rgb(0, 255, 0));
        assert_eq!(raster.pixel(5, 5).unwrap()[1], 255);
        assert_eq!(raster.pixel(25, 25).unwrap()[1], 0);
    }

    #[test]
    fn arc_respects_sweep() {
        let mut raster = Raster::new(40, 40);
        let center = Point::new(20.0, 20.0);
        // Lower half in screen space (angles 0..PI point down).
        raster.stroke_arc(center, 10.0, 0.0, std::f32::consts::PI, 2.0, Color::WHITE);
        assert_eq!(raster.pixel(20, 30).unwrap()[0], 255);
        assert_eq!(raster.pixel(20, 9).unwrap()[0], 0);
    }

    #[test]
    fn resize_clears_and_reports_new_size() {
        let mut raster = Raster::new(10, 10);
        raster.fill(Color::WHITE);
        raster.resize(16, 8);
        assert_eq!(raster.size(), (16, 8));
        assert_eq!(raster.pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn text_leaves_ink_but_spaces_do_not() {
        let mut raster = Raster::new(40, 20);
        raster.fill_text(" ", Point::new(0.0, 0.0), 16.0, Color::WHITE);
        assert!(raster.snapshot().pixels().all(|p| p.0[0] == 0));
        raster.fill_text("@", Point::new(0.0, 0.0), 16.0, Color::WHITE);
        assert!(raster.snapshot().pixels().any(|p| p.0[0] > 0));
    }
}
