//! Pure color mapping for every draw algorithm.

use crate::ColorStyle;

/// RGBA color with a float alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a color from hue in degrees, saturation and lightness in `[0, 1]`.
    pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = to_byte(l);
            return Color::rgba(v, v, v, alpha.clamp(0.0, 1.0));
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Color::rgba(
            to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
            to_byte(hue_to_channel(p, q, h)),
            to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
            alpha.clamp(0.0, 1.0),
        )
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Hue in degrees `[0, 360)`. Greys report 0.
    pub fn hue(&self) -> f32 {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        if delta <= f32::EPSILON {
            return 0.0;
        }
        let hue = if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        hue.rem_euclid(360.0)
    }

    /// Perceived brightness in `[0, 1]`, alpha ignored.
    pub fn luminance(&self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

const NEON_ACCENTS: [Color; 4] = [
    Color::rgb(255, 0, 255),
    Color::rgb(0, 255, 255),
    Color::rgb(255, 255, 0),
    Color::rgb(255, 0, 128),
];

/// Maps a bin (or cell) to a color for the given style.
///
/// `intensity` is a byte-scale magnitude; values outside `[0, 255]` are clamped.
pub fn color(index: usize, total: usize, intensity: f32, style: ColorStyle) -> Color {
    let position = if total == 0 {
        0.0
    } else {
        (index as f32 / total as f32).clamp(0.0, 1.0)
    };
    let t = intensity.clamp(0.0, 255.0) / 255.0;

    match style {
        ColorStyle::Rainbow => Color::hsla(360.0 * position, 1.0, 0.3 + 0.3 * t, 1.0),
        ColorStyle::Neon => {
            let slot = ((position * NEON_ACCENTS.len() as f32) as usize).min(NEON_ACCENTS.len() - 1);
            NEON_ACCENTS[slot].with_alpha(0.3 + 0.7 * t)
        }
        ColorStyle::Fire => Color::hsla(60.0 * position, 1.0, 0.2 + 0.5 * t, 1.0),
        ColorStyle::Ocean => Color::hsla(180.0 + 60.0 * position, 0.8, 0.3 + 0.4 * t, 1.0),
        ColorStyle::Retro => Color::hsla(270.0 + 60.0 * position, 0.9, 0.4 + 0.3 * t, 1.0),
        ColorStyle::Minimal => Color::WHITE.with_alpha(t),
    }
}

/// Infrared-style ramp: black, blue, cyan, green, yellow, red.
pub fn thermal_color(intensity: f32) -> Color {
    let t = intensity.clamp(0.0, 255.0) / 255.0;
    let (from, to, local) = if t < 0.2 {
        ([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], t / 0.2)
    } else if t < 0.4 {
        ([0.0, 0.0, 1.0], [0.0, 1.0, 1.0], (t - 0.2) / 0.2)
    } else if t < 0.6 {
        ([0.0, 1.0, 1.0], [0.0, 1.0, 0.0], (t - 0.4) / 0.2)
    } else if t < 0.8 {
        ([0.0, 1.0, 0.0], [1.0, 1.0, 0.0], (t - 0.6) / 0.2)
    } else {
        ([1.0, 1.0, 0.0], [1.0, 0.0, 0.0], (t - 0.8) / 0.2)
    };
    let lerp = |i: usize| to_byte(from[i] + (to[i] - from[i]) * local);
    Color::rgb(lerp(0), lerp(1), lerp(2))
}
