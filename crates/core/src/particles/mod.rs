use rand::{rngs::StdRng, Rng};

use crate::{
    color,
    render::{Point, Surface},
    ColorStyle,
};

/// Amplitude of the audio-driven oscillation, in pixels per unit force.
const SWIRL: f32 = 2.0;
/// Lines to the center are only drawn above this force.
const LINK_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub max_life: f32,
    /// Position in the spectrum this particle listens to, in `[0, 1)`.
    pub bin: f32,
    /// Force and byte intensity from the latest step.
    pub force: f32,
    pub intensity: f32,
}

impl Particle {
    fn spawn(width: f32, height: f32, rng: &mut StdRng) -> Self {
        let max_life = rng.gen_range(100.0..300.0);
        Self {
            x: wrap(rng.gen::<f32>() * width, width),
            y: wrap(rng.gen::<f32>() * height, height),
            vx: rng.gen_range(-1.0..1.0),
            vy: rng.gen_range(-1.0..1.0),
            life: max_life,
            max_life,
            bin: rng.gen::<f32>(),
            force: 0.0,
            intensity: 0.0,
        }
    }
}

/// A fixed-size particle field on a toroidal canvas.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
}

impl ParticleSystem {
    pub fn new(count: usize, width: u32, height: u32, rng: &mut StdRng) -> Self {
        let mut system = Self {
            particles: Vec::new(),
            width: width as f32,
            height: height as f32,
        };
        system.reinit(count, rng);
        system
    }

    /// Discards every particle and spawns `count` fresh ones.
    pub fn reinit(&mut self, count: usize, rng: &mut StdRng) {
        let (width, height) = (self.width, self.height);
        self.particles = (0..count)
            .map(|_| Particle::spawn(width, height, rng))
            .collect();
    }

    /// Rescales positions into the new canvas. Coming from an empty canvas
    /// there is nothing to scale, so every particle is respawned instead.
    pub fn resize(&mut self, width: u32, height: u32, rng: &mut StdRng) {
        let (old_w, old_h) = (self.width, self.height);
        self.width = width as f32;
        self.height = height as f32;
        if old_w <= 0.0 || old_h <= 0.0 {
            let count = self.particles.len();
            self.reinit(count, rng);
            return;
        }

        let (sx, sy) = (self.width / old_w, self.height / old_h);
        for p in &mut self.particles {
            p.x = wrap(p.x * sx, self.width);
            p.y = wrap(p.y * sy, self.height);
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Advances every particle one frame. `time` is wall-clock seconds.
    pub fn step(&mut self, buffer: &[u8], sensitivity: f32, time: f32, rng: &mut StdRng) {
        let (width, height) = (self.width, self.height);
        let bins = buffer.len();

        for (i, p) in self.particles.iter_mut().enumerate() {
            let index = (p.bin * bins as f32) as usize;
            let value = buffer.get(index).copied().unwrap_or(0) as f32;
            let force = value / 255.0 * sensitivity;
            let phase = time + i as f32 * 0.1;

            p.x = wrap(p.x + p.vx + phase.cos() * force * SWIRL, width);
            p.y = wrap(p.y + p.vy + phase.sin() * force * SWIRL, height);
            p.force = force;
            p.intensity = value;

            p.life -= 1.0;
            if p.life <= 0.0 {
                let bin = p.bin;
                *p = Particle::spawn(width, height, rng);
                p.bin = bin;
            }
        }
    }

    pub fn draw(&self, style: ColorStyle, surface: &mut dyn Surface) {
        let center = Point::new(self.width * 0.5, self.height * 0.5);
        let total = self.particles.len();

        for (i, p) in self.particles.iter().enumerate() {
            let fade = 0.3 + 0.7 * (p.life / p.max_life).clamp(0.0, 1.0);
            let point = color::color(i, total, p.intensity, style);
            surface.fill_circle(
                Point::new(p.x, p.y),
                (p.force * 10.0).max(1.0),
                point.with_alpha(point.a * fade),
            );

            if p.force > LINK_THRESHOLD {
                let link = color::color(i, total, p.intensity * 0.3, style);
                surface.stroke_line(Point::new(p.x, p.y), center, 1.0, link);
            }
        }
    }
}

/// Wraps `value` into `[0, max)`.
fn wrap(value: f32, max: f32) -> f32 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(max);
    // rem_euclid can round up to `max` for tiny negative inputs
    if wrapped >= max {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::render::{CommandList, DrawCommand};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn reinit_creates_exact_count() {
        let mut rng = rng();
        let mut system = ParticleSystem::new(120, 640, 480, &mut rng);
        assert_eq!(system.len(), 120);
        system.reinit(50, &mut rng);
        assert_eq!(system.len(), 50);
        system.reinit(500, &mut rng);
        assert_eq!(system.len(), 500);
    }

    #[test]
    fn positions_stay_on_canvas() {
        let mut rng = rng();
        let (width, height) = (320, 200);
        let mut system = ParticleSystem::new(300, width, height, &mut rng);
        let loud = vec![255u8; 128];
        for frame in 0..2_000 {
            let buffer: &[u8] = if frame % 3 == 0 { &loud } else { &[] };
            system.step(buffer, 5.0, frame as f32 / 60.0, &mut rng);
            for p in system.particles() {
                assert!((0.0..width as f32).contains(&p.x), "x = {}", p.x);
                assert!((0.0..height as f32).contains(&p.y), "y = {}", p.y);
            }
        }
        assert_eq!(system.len(), 300);
    }

    #[test]
    fn resize_rescales_into_new_bounds() {
        let mut rng = rng();
        let mut system = ParticleSystem::new(100, 800, 600, &mut rng);
        system.resize(100, 50, &mut rng);
        for p in system.particles() {
            assert!(p.x < 100.0 && p.y < 50.0);
        }
    }

    #[test]
    fn resize_from_empty_canvas_respawns() {
        let mut rng = rng();
        let mut system = ParticleSystem::new(80, 0, 0, &mut rng);
        assert!(system.particles().iter().all(|p| p.x == 0.0 && p.y == 0.0));

        system.resize(640, 480, &mut rng);
        assert_eq!(system.len(), 80);
        let spread = system
            .particles()
            .iter()
            .filter(|p| p.x > 0.0 && p.y > 0.0)
            .count();
        assert!(spread > 70, "only {spread} particles moved off the origin");
        assert!(system
            .particles()
            .iter()
            .all(|p| p.x < 640.0 && p.y < 480.0));
    }

    #[test]
    fn wrap_handles_edges() {
        assert_eq!(wrap(-1.0, 10.0), 9.0);
        assert_eq!(wrap(10.0, 10.0), 0.0);
        assert!(wrap(-1e-9, 10.0) < 10.0);
        assert_eq!(wrap(5.0, 0.0), 0.0);
    }

    #[test]
    fn links_only_above_threshold() {
        let mut rng = rng();
        let mut system = ParticleSystem::new(60, 200, 200, &mut rng);
        let mut surface = CommandList::new(200, 200);

        system.step(&[10; 64], 1.0, 0.0, &mut rng);
        system.draw(ColorStyle::Rainbow, &mut surface);
        let lines = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        assert_eq!(lines, 0);

        surface.take();
        system.step(&[200; 64], 1.0, 0.0, &mut rng);
        system.draw(ColorStyle::Rainbow, &mut surface);
        let circles: Vec<f32> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect();
        assert_eq!(circles.len(), 60);
        assert!(circles.iter().all(|r| (*r - 200.0 / 255.0 * 10.0).abs() < 1e-4));
        let lines = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        assert_eq!(lines, 60);
    }
}
