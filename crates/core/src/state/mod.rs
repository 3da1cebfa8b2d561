use rand::{rngs::StdRng, SeedableRng};

use crate::{
    AsciiWaveGrid, BeatDetector, MatrixRainGrid, ParticleSystem, PredatorThermalGrid, VisualConfig,
};

/// Every piece of cross-frame state, owned by the scheduler and lent to the
/// draw algorithms one frame at a time.
#[derive(Debug)]
pub struct EngineState {
    pub particles: ParticleSystem,
    pub ascii: AsciiWaveGrid,
    pub matrix: MatrixRainGrid,
    pub predator: PredatorThermalGrid,
    pub beat: BeatDetector,
    pub rng: StdRng,
    width: u32,
    height: u32,
    density: u32,
    frames: u64,
}

impl EngineState {
    pub fn new(config: &VisualConfig, width: u32, height: u32, mut rng: StdRng) -> Self {
        let density = config.ascii_density;
        Self {
            particles: ParticleSystem::new(config.particle_count, width, height, &mut rng),
            ascii: AsciiWaveGrid::new(width, height, density),
            matrix: MatrixRainGrid::new(width, height, density),
            predator: PredatorThermalGrid::new(width, height, density),
            beat: BeatDetector::new(),
            rng,
            width,
            height,
            density,
            frames: 0,
        }
    }

    /// Deterministic state for replays and tests.
    pub fn seeded(config: &VisualConfig, width: u32, height: u32, seed: u64) -> Self {
        Self::new(config, width, height, StdRng::seed_from_u64(seed))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn density(&self) -> u32 {
        self.density
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub(crate) fn count_frame(&mut self) {
        self.frames += 1;
    }

    /// Re-dimensions every grid and rescales the particle field.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.particles.resize(width, height, &mut self.rng);
        self.rebuild_grids();
    }

    pub fn set_density(&mut self, density: u32) {
        self.density = density;
        self.rebuild_grids();
    }

    /// Advances the particle field. Runs every rendered frame whatever mode
    /// is shown, so switching back to particles resumes mid-flight.
    pub fn step_particles(&mut self, buffer: &[u8], sensitivity: f32, time: f32) {
        self.particles.step(buffer, sensitivity, time, &mut self.rng);
    }

    pub fn reinit_particles(&mut self, count: usize) {
        self.particles.reinit(count, &mut self.rng);
    }

    fn rebuild_grids(&mut self) {
        let (w, h, d) = (self.width, self.height, self.density);
        self.ascii.resize(w, h, d);
        self.matrix.resize(w, h, d);
        self.predator.resize(w, h, d);
    }
}
