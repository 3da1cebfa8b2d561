//! One draw algorithm per [`VisualMode`], looked up through a static table.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::{Point, Rect, Surface};
use crate::{color, Color, ColorStyle, EngineState, VisualConfig, VisualMode};

/// Per-frame inputs shared by every draw algorithm.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Bytes in the domain the active mode asked for.
    pub buffer: &'a [u8],
    pub config: &'a VisualConfig,
    /// Seconds since the loop started.
    pub time: f32,
    pub sample_rate: u32,
    pub fft_size: usize,
}

impl FrameInput<'_> {
    /// Byte at `index` as a float, or 0 past the end.
    fn value(&self, index: usize) -> f32 {
        self.buffer.get(index).copied().unwrap_or(0) as f32
    }

    fn average(&self) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.buffer.iter().map(|&v| v as f32).sum::<f32>() / self.buffer.len() as f32
    }

    /// Largest distance from the 128 midpoint, doubled onto the byte scale.
    fn peak_amplitude(&self) -> f32 {
        self.buffer
            .iter()
            .map(|&v| (v as f32 - 128.0).abs() * 2.0)
            .fold(0.0, f32::max)
            .min(255.0)
    }

    fn style(&self) -> ColorStyle {
        self.config.style
    }
}

/// A draw algorithm. Implementations hold no state of their own; anything
/// that must survive between frames lives in [`EngineState`].
pub trait ModeRenderer: Sync {
    fn mode(&self) -> VisualMode;

    fn render(&self, input: &FrameInput<'_>, state: &mut EngineState, surface: &mut dyn Surface);
}

static RENDERERS: [&dyn ModeRenderer; 10] = [
    &Bars,
    &Waveform,
    &Oscillator,
    &Circular,
    &Particles,
    &AsciiWave,
    &MatrixRain,
    &PredatorVision,
    &RadialBurst,
    &Spectrum3d,
];

pub fn renderer_for(mode: VisualMode) -> &'static dyn ModeRenderer {
    RENDERERS[mode.index()]
}

/// How the previous frame is cleared before drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundPolicy {
    /// Translucent black overlay so earlier frames linger as trails.
    Fade(f32),
    /// (Near-)opaque clear for modes that manage their own persistence.
    Clear(f32),
}

impl BackgroundPolicy {
    pub fn for_mode(mode: VisualMode, fade: f32) -> Self {
        match mode {
            VisualMode::Matrix => BackgroundPolicy::Clear(0.9),
            VisualMode::Predator => BackgroundPolicy::Clear(1.0),
            _ => BackgroundPolicy::Fade(fade),
        }
    }

    pub fn alpha(&self) -> f32 {
        match *self {
            BackgroundPolicy::Fade(alpha) | BackgroundPolicy::Clear(alpha) => alpha,
        }
    }

    pub fn apply(&self, surface: &mut dyn Surface) {
        let alpha = self.alpha();
        if alpha > 0.0 {
            surface.fill(Color::BLACK.with_alpha(alpha));
        }
    }
}

struct Bars;

impl ModeRenderer for Bars {
    fn mode(&self) -> VisualMode {
        VisualMode::Bars
    }

    fn render(&self, input: &FrameInput<'_>, _state: &mut EngineState, surface: &mut dyn Surface) {
        let bins = input.buffer.len();
        if bins == 0 {
            return;
        }
        let (width, height) = surface.size();
        let (w, h) = (width as f32, height as f32);
        let bar_width = w / bins as f32;
        let sensitivity = input.config.sensitivity;

        for i in 0..bins {
            let value = input.value(i);
            let bar_height = (value * sensitivity * 2.0).min(h);
            surface.fill_rect(
                Rect::new(
                    i as f32 * bar_width,
                    h - bar_height,
                    (bar_width - 1.0).max(1.0),
                    bar_height,
                ),
                color::color(i, bins, value, input.style()),
            );
        }

        if input.config.show_freq_labels && input.fft_size > 0 {
            let step = (bins / 8).max(1);
            let label = Color::WHITE.with_alpha(0.7);
            for i in (0..bins).step_by(step) {
                let hz = i as f32 * input.sample_rate as f32 / input.fft_size as f32;
                surface.fill_text(
                    &format_frequency(hz),
                    Point::new(i as f32 * bar_width + 2.0, h - 14.0),
                    10.0,
                    label,
                );
            }
        }
    }
}

fn format_frequency(hz: f32) -> String {
    if hz >= 1000.0 {
        format!("{:.1}k", hz / 1000.0)
    } else {
        format!("{}", hz.round() as u32)
    }
}

/// Screen points for a time-domain trace, centered vertically.
fn trace_points(input: &FrameInput<'_>, width: f32, height: f32) -> Vec<Point> {
    let n = input.buffer.len();
    let slice = if n > 1 { width / (n - 1) as f32 } else { width };
    let mid = height * 0.5;
    input
        .buffer
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let offset = (v as f32 - 128.0) / 128.0 * mid * input.config.sensitivity;
            Point::new(i as f32 * slice, (mid + offset).clamp(0.0, height))
        })
        .collect()
}

struct Waveform;

impl ModeRenderer for Waveform {
    fn mode(&self) -> VisualMode {
        VisualMode::Waveform
    }

    fn render(&self, input: &FrameInput<'_>, _state: &mut EngineState, surface: &mut dyn Surface) {
        if input.buffer.len() < 2 {
            return;
        }
        let (width, height) = surface.size();
        let points = trace_points(input, width as f32, height as f32);
        // slow drift around the color wheel
        let hue_index = (input.time * 20.0) as usize % 360;
        let tint = color::color(hue_index, 360, input.peak_amplitude(), input.style());
        surface.stroke_path(&points, 2.0, tint);
    }
}

struct Oscillator;

impl ModeRenderer for Oscillator {
    fn mode(&self) -> VisualMode {
        VisualMode::Oscillator
    }

    fn render(&self, input: &FrameInput<'_>, _state: &mut EngineState, surface: &mut dyn Surface) {
        let (width, height) = surface.size();
        let (w, h) = (width as f32, height as f32);

        let grid = Color::WHITE.with_alpha(0.08);
        for i in 1..10 {
            let x = w * i as f32 / 10.0;
            surface.stroke_line(Point::new(x, 0.0), Point::new(x, h), 1.0, grid);
        }
        for i in 1..8 {
            let y = h * i as f32 / 8.0;
            surface.stroke_line(Point::new(0.0, y), Point::new(w, y), 1.0, grid);
        }
        surface.stroke_line(
            Point::new(0.0, h * 0.5),
            Point::new(w, h * 0.5),
            1.0,
            Color::WHITE.with_alpha(0.2),
        );

        if input.buffer.len() < 2 {
            return;
        }
        let points = trace_points(input, w, h);
        let n = input.buffer.len();
        let phosphor = color::color(n / 3, n, input.peak_amplitude().max(128.0), input.style());
        surface.stroke_path(&points, 8.0, phosphor.with_alpha(phosphor.a * 0.15));
        surface.stroke_path(&points, 2.5, phosphor);
    }
}

struct Circular;

impl ModeRenderer for Circular {
    fn mode(&self) -> VisualMode {
        VisualMode::Circular
    }

    fn render(&self, input: &FrameInput<'_>, _state: &mut EngineState, surface: &mut dyn Surface) {
        let bins = input.buffer.len();
        let (width, height) = surface.size();
        let center = Point::new(width as f32 * 0.5, height as f32 * 0.5);
        let span = width.min(height) as f32;
        let radius = span * 0.25;

        surface.stroke_arc(center, radius, 0.0, TAU, 1.0, Color::WHITE.with_alpha(0.15));
        if bins == 0 {
            return;
        }

        let reach = span * 0.25 / 255.0 * input.config.sensitivity;
        let mut outline: Vec<Point> = (0..bins)
            .map(|i| {
                let angle = i as f32 / bins as f32 * TAU - FRAC_PI_2;
                let r = radius + input.value(i) * reach;
                Point::new(center.x + angle.cos() * r, center.y + angle.sin() * r)
            })
            .collect();
        outline.push(outline[0]);

        let fill = color::color(bins / 2, bins, input.average(), input.style());
        surface.fill_polygon(&outline, fill.with_alpha(fill.a * 0.2));
        for i in 0..bins {
            let tint = color::color(i, bins, input.value(i), input.style());
            surface.stroke_line(outline[i], outline[i + 1], 2.0, tint);
        }
    }
}

struct Particles;

impl ModeRenderer for Particles {
    fn mode(&self) -> VisualMode {
        VisualMode::Particles
    }

    fn render(&self, input: &FrameInput<'_>, state: &mut EngineState, surface: &mut dyn Surface) {
        state.particles.draw(input.style(), surface);
    }
}

struct AsciiWave;

impl ModeRenderer for AsciiWave {
    fn mode(&self) -> VisualMode {
        VisualMode::Ascii
    }

    fn render(&self, input: &FrameInput<'_>, state: &mut EngineState, surface: &mut dyn Surface) {
        state.ascii.step(
            input.buffer,
            input.config.sensitivity,
            input.time,
            &mut state.rng,
        );
        state.ascii.draw(input.style(), input.time, surface);
    }
}

struct MatrixRain;

impl ModeRenderer for MatrixRain {
    fn mode(&self) -> VisualMode {
        VisualMode::Matrix
    }

    fn render(&self, input: &FrameInput<'_>, state: &mut EngineState, surface: &mut dyn Surface) {
        state
            .matrix
            .step(input.buffer, input.config.sensitivity, &mut state.rng);
        state.matrix.draw(input.style(), surface);
    }
}

struct PredatorVision;

impl ModeRenderer for PredatorVision {
    fn mode(&self) -> VisualMode {
        VisualMode::Predator
    }

    fn render(&self, input: &FrameInput<'_>, state: &mut EngineState, surface: &mut dyn Surface) {
        state
            .predator
            .draw(input.buffer, input.config.sensitivity, input.time, surface);
    }
}

struct RadialBurst;

impl ModeRenderer for RadialBurst {
    fn mode(&self) -> VisualMode {
        VisualMode::Radial
    }

    fn render(&self, input: &FrameInput<'_>, _state: &mut EngineState, surface: &mut dyn Surface) {
        let bins = input.buffer.len();
        let (width, height) = surface.size();
        let center = Point::new(width as f32 * 0.5, height as f32 * 0.5);
        let span = width.min(height) as f32;
        let average = input.average();
        let core = span * 0.08 + average / 255.0 * span * 0.05;

        let glow = color::color(0, 1, average, input.style());
        surface.fill_circle(center, core, glow.with_alpha(glow.a * 0.5));
        if bins == 0 {
            return;
        }

        // Each bin fires two mirrored rays so the burst is symmetric.
        let reach = span * 0.4 / 255.0 * input.config.sensitivity;
        for i in 0..bins {
            let value = input.value(i);
            if value <= 0.0 {
                continue;
            }
            let tint = color::color(i, bins, value, input.style());
            let length = value * reach;
            let stroke = (value / 255.0 * 4.0).max(1.0);
            let sweep = i as f32 / bins as f32 * PI;
            for angle in [-FRAC_PI_2 + sweep, -FRAC_PI_2 - sweep] {
                let (cos, sin) = (angle.cos(), angle.sin());
                surface.stroke_line(
                    Point::new(center.x + cos * core, center.y + sin * core),
                    Point::new(
                        center.x + cos * (core + length),
                        center.y + sin * (core + length),
                    ),
                    stroke,
                    tint,
                );
            }
        }
    }
}

struct Spectrum3d;

impl ModeRenderer for Spectrum3d {
    fn mode(&self) -> VisualMode {
        VisualMode::Spectrum3d
    }

    fn render(&self, input: &FrameInput<'_>, _state: &mut EngineState, surface: &mut dyn Surface) {
        let bins = input.buffer.len();
        if bins == 0 {
            return;
        }
        let (width, height) = surface.size();
        let (w, h) = (width as f32, height as f32);
        let cols = (bins as f32).sqrt().ceil() as usize;
        let rows = bins.div_ceil(cols);
        let camera = Camera {
            center_x: w * 0.5,
            floor_y: h * 0.85,
            cell: w * 0.6 / cols as f32,
            depth_step: h * 0.04,
        };
        let max_height = h * 0.5 * input.config.sensitivity;

        // back to front so nearer towers overdraw farther ones
        for row in (0..rows).rev() {
            for col in 0..cols {
                let index = row * cols + col;
                if index >= bins {
                    continue;
                }
                let value = input.value(index);
                let lift = value / 255.0 * max_height;
                let x = col as f32 - cols as f32 * 0.5;
                let z = row as f32;
                let (x0, x1, z0, z1) = (x + 0.1, x + 0.9, z, z + 0.8);

                let front = color::color(index, bins, value, input.style());
                let top = color::color(index, bins, (value + 60.0).min(255.0), input.style());
                let side = front.with_alpha(front.a * 0.6);

                surface.fill_polygon(
                    &[
                        camera.project(x1, 0.0, z0),
                        camera.project(x1, 0.0, z1),
                        camera.project(x1, lift, z1),
                        camera.project(x1, lift, z0),
                    ],
                    side,
                );
                surface.fill_polygon(
                    &[
                        camera.project(x0, 0.0, z0),
                        camera.project(x1, 0.0, z0),
                        camera.project(x1, lift, z0),
                        camera.project(x0, lift, z0),
                    ],
                    front,
                );
                surface.fill_polygon(
                    &[
                        camera.project(x0, lift, z0),
                        camera.project(x1, lift, z0),
                        camera.project(x1, lift, z1),
                        camera.project(x0, lift, z1),
                    ],
                    top,
                );
            }
        }
    }
}

/// Fixed perspective used by the 3D spectrum: x across, y up (pixels), z away.
struct Camera {
    center_x: f32,
    floor_y: f32,
    cell: f32,
    depth_step: f32,
}

impl Camera {
    fn project(&self, x: f32, y: f32, z: f32) -> Point {
        let scale = 1.0 / (1.0 + z * 0.08);
        Point::new(
            self.center_x + x * self.cell * scale,
            self.floor_y - z * self.depth_step * scale - y * scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CommandList, DrawCommand};

    fn state(config: &VisualConfig) -> EngineState {
        EngineState::seeded(config, 800, 400, 42)
    }

    fn input<'a>(buffer: &'a [u8], config: &'a VisualConfig) -> FrameInput<'a> {
        FrameInput {
            buffer,
            config,
            time: 1.0,
            sample_rate: 44_100,
            fft_size: buffer.len() * 2,
        }
    }

    #[test]
    fn table_lines_up_with_modes() {
        for mode in VisualMode::ALL {
            assert_eq!(renderer_for(mode).mode(), mode);
        }
    }

    #[test]
    fn bars_height_follows_value_and_sensitivity() {
        let config = VisualConfig::default();
        let mut state = state(&config);
        let mut surface = CommandList::new(800, 400);
        let buffer: Vec<u8> = (0..128).map(|i| (i * 2) as u8).collect();
        renderer_for(VisualMode::Bars).render(&input(&buffer, &config), &mut state, &mut surface);

        let rects: Vec<Rect> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect(rect, _) => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects.len(), 128);
        for (i, rect) in rects.iter().enumerate() {
            let expected = (buffer[i] as f32 * 2.0).min(400.0);
            assert_eq!(rect.height, expected);
            assert_eq!(rect.y, 400.0 - expected);
            assert_eq!(rect.x, i as f32 * 800.0 / 128.0);
        }
    }

    #[test]
    fn bars_labels_are_optional() {
        let mut config = VisualConfig::default();
        let mut state = state(&config);
        let mut surface = CommandList::new(800, 400);
        let buffer = [100u8; 128];
        renderer_for(VisualMode::Bars).render(&input(&buffer, &config), &mut state, &mut surface);
        assert!(!surface
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { .. })));

        config.show_freq_labels = true;
        surface.take();
        renderer_for(VisualMode::Bars).render(&input(&buffer, &config), &mut state, &mut surface);
        let labels: Vec<String> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(labels.len(), 8);
        assert_eq!(labels[0], "0");
        assert_eq!(labels[1], "2.8k");
    }

    #[test]
    fn every_mode_tolerates_empty_and_short_buffers() {
        let config = VisualConfig::default();
        let mut state = state(&config);
        for mode in VisualMode::ALL {
            for buffer in [&[][..], &[200u8][..], &[0u8, 255, 128][..]] {
                let mut surface = CommandList::new(800, 400);
                renderer_for(mode).render(&input(buffer, &config), &mut state, &mut surface);
            }
        }
    }

    #[test]
    fn waveform_traces_every_sample() {
        let config = VisualConfig::default();
        let mut state = state(&config);
        let mut surface = CommandList::new(800, 400);
        let buffer = [128u8; 256];
        renderer_for(VisualMode::Waveform).render(&input(&buffer, &config), &mut state, &mut surface);
        match &surface.commands()[0] {
            DrawCommand::Path { points, .. } => {
                assert_eq!(points.len(), 256);
                assert!(points.iter().all(|p| p.y == 200.0));
                assert!((points.last().unwrap().x - 800.0).abs() < 1e-3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn radial_skips_silent_bins() {
        let config = VisualConfig::default();
        let mut state = state(&config);
        let mut surface = CommandList::new(800, 400);
        let mut buffer = [0u8; 64];
        buffer[10] = 255;
        buffer[20] = 100;
        renderer_for(VisualMode::Radial).render(&input(&buffer, &config), &mut state, &mut surface);
        let rays = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        assert_eq!(rays, 4);
    }

    #[test]
    fn spectrum3d_draws_three_faces_per_bin() {
        let config = VisualConfig::default();
        let mut state = state(&config);
        let mut surface = CommandList::new(800, 400);
        let buffer = [90u8; 128];
        renderer_for(VisualMode::Spectrum3d).render(&input(&buffer, &config), &mut state, &mut surface);
        let faces = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polygon(..)))
            .count();
        assert_eq!(faces, 128 * 3);
    }

    #[test]
    fn particle_renderer_draws_without_stepping() {
        let config = VisualConfig::default();
        let mut state = state(&config);
        let mut surface = CommandList::new(800, 400);
        let buffer = [200u8; 128];
        let before = state.particles.particles().to_vec();

        renderer_for(VisualMode::Particles).render(&input(&buffer, &config), &mut state, &mut surface);
        assert_eq!(state.particles.particles(), &before[..]);
        let circles = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count();
        assert_eq!(circles, config.particle_count);
    }

    #[test]
    fn background_policy_per_mode() {
        assert_eq!(
            BackgroundPolicy::for_mode(VisualMode::Bars, 0.25),
            BackgroundPolicy::Fade(0.25)
        );
        assert_eq!(
            BackgroundPolicy::for_mode(VisualMode::Predator, 0.25),
            BackgroundPolicy::Clear(1.0)
        );
        assert!(BackgroundPolicy::for_mode(VisualMode::Matrix, 0.0).alpha() > 0.8);

        let mut surface = CommandList::new(10, 10);
        BackgroundPolicy::Fade(0.0).apply(&mut surface);
        assert!(surface.commands().is_empty());
    }
}
