//! Frame loop: pacing, cancellation and the per-tick pipeline.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::{
    render::{renderer_for, BackgroundPolicy, FrameInput, Surface},
    Color, ColorStyle, ConfigChange, ConfigHandle, ConfigStore, EngineState, Reinit, Result,
    SampleDomain, SampleProvider, VisualConfig, VisualMode, VizError,
};

/// Alpha of the white overlay drawn on a detected beat.
const BEAT_FLASH_ALPHA: f32 = 0.1;

/// Shared stop flag checked before every tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Accumulated loop time in seconds, fed to the oscillatory effects.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    pub time_seconds: f32,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn advance(&mut self, delta: f32) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }
}

/// Paces the loop to a target frame rate and reports the frame delta.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    realtime: bool,
    last: Option<Instant>,
}

impl FramePacer {
    /// Sleeps until the next frame is due and measures real elapsed time.
    pub fn realtime(fps: u32) -> Self {
        Self {
            interval: frame_interval(fps),
            realtime: true,
            last: None,
        }
    }

    /// Never sleeps; every frame advances by exactly `1 / fps`.
    pub fn fixed(fps: u32) -> Self {
        Self {
            interval: frame_interval(fps),
            realtime: false,
            last: None,
        }
    }

    /// Blocks until the next frame is due and returns its delta in seconds.
    pub fn wait(&mut self) -> f32 {
        if !self.realtime {
            return self.interval.as_secs_f32();
        }
        let now = Instant::now();
        let Some(last) = self.last else {
            self.last = Some(now);
            return self.interval.as_secs_f32();
        };
        let due = last + self.interval;
        if due > now {
            thread::sleep(due - now);
        }
        let now = Instant::now();
        self.last = Some(now);
        (now - last).as_secs_f32()
    }
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered { beat: bool },
    /// The provider could not supply a buffer; nothing was drawn.
    Skipped,
    /// The scheduler is stopped.
    Inactive,
}

/// Drives the per-frame pipeline over a [`SampleProvider`].
///
/// Owns the configuration and, while active, the [`EngineState`]. All state
/// mutation happens inside [`FrameScheduler::tick`], so two ticks can never
/// overlap.
#[derive(Debug)]
pub struct FrameScheduler<P> {
    provider: P,
    store: ConfigStore,
    state: Option<EngineState>,
    clock: PlaybackClock,
    buffer: Vec<u8>,
    cancel: CancelToken,
    rejected: Vec<ConfigChange>,
}

impl<P: SampleProvider> FrameScheduler<P> {
    pub fn new(provider: P, config: VisualConfig) -> Result<Self> {
        let cancel = CancelToken::new();
        cancel.cancel();
        Ok(Self {
            provider,
            store: ConfigStore::new(config)?,
            state: None,
            clock: PlaybackClock::default(),
            buffer: Vec::new(),
            cancel,
            rejected: Vec::new(),
        })
    }

    pub fn config(&self) -> &VisualConfig {
        self.store.config()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> Option<&EngineState> {
        self.state.as_ref()
    }

    /// The sample buffer filled by the latest tick.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.time_seconds
    }

    /// Queued changes the latest tick refused, either out of range for the
    /// provider or rejected by it. Cleared at the start of every tick.
    pub fn rejected_changes(&self) -> &[ConfigChange] {
        &self.rejected
    }

    /// Sender for changes made outside the loop. Applied at the next tick.
    pub fn handle(&self) -> ConfigHandle {
        self.store.handle()
    }

    /// Token that ends [`FrameScheduler::run`] when cancelled. A fresh token is
    /// issued by every successful [`FrameScheduler::start`].
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Acquires the input and builds the initial engine state for a
    /// `width` x `height` surface. On failure nothing is retained and the
    /// scheduler stays inactive. A loop whose token was cancelled from
    /// outside counts as stopped and is torn down first.
    pub fn start(&mut self, width: u32, height: u32, rng: StdRng) -> Result<()> {
        if self.is_active() {
            if !self.cancel.is_cancelled() {
                info!("scheduler already running");
                return Ok(());
            }
            self.stop();
        }

        if let Err(err) = self.provider.acquire() {
            warn!(error = %err, "audio acquisition failed");
            return Err(err);
        }
        let config = self.store.config().clone();
        let configured = self
            .provider
            .set_fft_size(config.fft_size)
            .and_then(|_| self.provider.set_smoothing(config.smoothing));
        if let Err(err) = configured {
            warn!(error = %err, "provider rejected the configuration");
            self.provider.release();
            return Err(err);
        }

        self.state = Some(EngineState::new(&config, width, height, rng));
        self.clock.reset();
        self.resize_buffer();
        self.cancel = CancelToken::new();
        info!(
            mode = %config.mode,
            width,
            height,
            fft_size = config.fft_size,
            "scheduler started"
        );
        Ok(())
    }

    /// Cancels the loop and releases the input. Calling it again is a no-op.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(state) = self.state.take() {
            self.provider.release();
            info!(frames = state.frames(), "scheduler stopped");
        }
    }

    /// Applies a change right away, outside any tick. Range errors and
    /// provider rejections leave the configuration untouched.
    pub fn apply(&mut self, change: ConfigChange) -> Result<()> {
        change.validate()?;
        match change {
            ConfigChange::FftSize(size) if size != self.store.config().fft_size => {
                self.provider.set_fft_size(size)?;
            }
            ConfigChange::Smoothing(value) => self.provider.set_smoothing(value)?,
            _ => {}
        }

        match self.store.commit(change) {
            Reinit::Nothing => {}
            Reinit::SampleBuffer => {
                self.resize_buffer();
                debug!(len = self.buffer.len(), "sample buffer rebuilt");
            }
            Reinit::Smoothing => {
                debug!(smoothing = self.store.config().smoothing, "smoothing forwarded");
            }
            Reinit::Particles => {
                let count = self.store.config().particle_count;
                if let Some(state) = self.state.as_mut() {
                    state.reinit_particles(count);
                }
                debug!(count, "particles reinitialized");
            }
            Reinit::Grids => {
                let density = self.store.config().ascii_density;
                if let Some(state) = self.state.as_mut() {
                    state.set_density(density);
                }
                debug!(density, "grids rebuilt");
            }
        }
        Ok(())
    }

    /// Ticks until cancelled or `max_frames` frames have been rendered.
    /// Returns the number of rendered frames. Ending on cancellation also
    /// stops the scheduler.
    pub fn run(
        &mut self,
        surface: &mut dyn Surface,
        pacer: &mut FramePacer,
        max_frames: Option<u64>,
    ) -> Result<u64> {
        let cancel = self.cancel.clone();
        let mut rendered = 0;
        while !cancel.is_cancelled() && max_frames.map_or(true, |max| rendered < max) {
            let dt = pacer.wait();
            match self.tick(surface, dt)? {
                TickOutcome::Rendered { .. } => rendered += 1,
                TickOutcome::Skipped => {}
                TickOutcome::Inactive => break,
            }
        }
        debug!(rendered, "frame loop ended");
        if cancel.is_cancelled() {
            self.stop();
        }
        Ok(rendered)
    }

    /// One frame: housekeeping at the boundary, then read, clear, flash, draw.
    pub fn tick(&mut self, surface: &mut dyn Surface, dt: f32) -> Result<TickOutcome> {
        if self.cancel.is_cancelled() {
            self.stop();
        }
        if self.state.is_none() {
            return Ok(TickOutcome::Inactive);
        }

        self.rejected.clear();
        for change in self.store.drain_pending()? {
            if let Err(err) = self.apply(change) {
                warn!(?change, error = %err, "queued change rejected");
                self.rejected.push(change);
            }
        }
        // a mode switch may change the sample domain
        self.resize_buffer();

        let (width, height) = surface.size();
        let Some(state) = self.state.as_mut() else {
            return Ok(TickOutcome::Inactive);
        };
        if state.size() != (width, height) {
            debug!(width, height, "surface resized");
            state.resize(width, height);
        }

        self.clock.advance(dt);
        let config = self.store.config();
        let read = match config.mode.domain() {
            SampleDomain::Frequency => self.provider.read_frequency(&mut self.buffer),
            SampleDomain::Time => self.provider.read_time_domain(&mut self.buffer),
        };
        match read {
            Ok(()) => {}
            Err(VizError::ProviderNotReady) => {
                warn!("sample provider not ready, skipping frame");
                return Ok(TickOutcome::Skipped);
            }
            Err(err) => {
                warn!(error = %err, "sample read failed, skipping frame");
                return Ok(TickOutcome::Skipped);
            }
        }

        BackgroundPolicy::for_mode(config.mode, config.fade).apply(surface);

        let beat = config.beat_detection && state.beat.detect(&self.buffer);
        if beat && flash_allowed(config.mode, config.style) {
            surface.fill(Color::WHITE.with_alpha(BEAT_FLASH_ALPHA));
        }

        state.step_particles(&self.buffer, config.sensitivity, self.clock.time_seconds);

        let input = FrameInput {
            buffer: &self.buffer,
            config,
            time: self.clock.time_seconds,
            sample_rate: self.provider.sample_rate(),
            fft_size: self.provider.fft_size(),
        };
        renderer_for(config.mode).render(&input, state, surface);
        state.count_frame();
        Ok(TickOutcome::Rendered { beat })
    }

    /// Matches the buffer length to the provider's bin count for the
    /// active domain.
    fn resize_buffer(&mut self) {
        let len = match self.store.config().mode.domain() {
            SampleDomain::Frequency => self.provider.frequency_bin_count(),
            SampleDomain::Time => self.provider.fft_size(),
        };
        self.buffer.resize(len, 0);
    }
}

fn flash_allowed(mode: VisualMode, style: ColorStyle) -> bool {
    mode != VisualMode::Predator && style != ColorStyle::Minimal
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use rand::SeedableRng;

    use super::*;
    use crate::render::{CommandList, DrawCommand, Rect};

    /// Provider that replays a fixed byte level in both domains.
    #[derive(Debug)]
    struct FixedProvider {
        level: Rc<Cell<u8>>,
        fft_size: usize,
        ready: bool,
        fail_acquire: bool,
        releases: usize,
    }

    impl FixedProvider {
        fn new(level: u8) -> Self {
            Self {
                level: Rc::new(Cell::new(level)),
                fft_size: 256,
                ready: false,
                fail_acquire: false,
                releases: 0,
            }
        }
    }

    impl SampleProvider for FixedProvider {
        fn acquire(&mut self) -> Result<()> {
            if self.fail_acquire {
                return Err(VizError::Acquisition("denied".into()));
            }
            self.ready = true;
            Ok(())
        }

        fn release(&mut self) {
            self.ready = false;
            self.releases += 1;
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn sample_rate(&self) -> u32 {
            44_100
        }

        fn fft_size(&self) -> usize {
            self.fft_size
        }

        fn set_fft_size(&mut self, fft_size: usize) -> Result<()> {
            if !fft_size.is_power_of_two() {
                return Err(VizError::invalid("fft_size", "not a power of two"));
            }
            self.fft_size = fft_size;
            Ok(())
        }

        fn set_smoothing(&mut self, _smoothing: f32) -> Result<()> {
            Ok(())
        }

        fn read_frequency(&mut self, out: &mut [u8]) -> Result<()> {
            if !self.ready {
                return Err(VizError::ProviderNotReady);
            }
            out.fill(self.level.get());
            Ok(())
        }

        fn read_time_domain(&mut self, out: &mut [u8]) -> Result<()> {
            self.read_frequency(out)
        }
    }

    fn started(provider: FixedProvider, config: VisualConfig) -> FrameScheduler<FixedProvider> {
        let mut scheduler = FrameScheduler::new(provider, config).unwrap();
        scheduler.start(800, 400, StdRng::seed_from_u64(1)).unwrap();
        scheduler
    }

    fn bar_rects(surface: &CommandList) -> Vec<Rect> {
        surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect(rect, _) if rect.width < 800.0 => Some(*rect),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn bars_end_to_end_at_full_level() {
        let mut scheduler = started(FixedProvider::new(255), VisualConfig::default());
        let mut surface = CommandList::new(800, 400);
        let outcome = scheduler.tick(&mut surface, 1.0 / 60.0).unwrap();
        assert!(matches!(outcome, TickOutcome::Rendered { .. }));

        let bars: Vec<(Rect, Color)> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect(rect, color) if rect.width < 800.0 => Some((*rect, *color)),
                _ => None,
            })
            .collect();
        assert_eq!(bars.len(), 128);
        for (i, (rect, color)) in bars.iter().enumerate() {
            assert_eq!(rect.height, (255.0f32 * 2.0).min(400.0));
            assert_eq!(
                *color,
                crate::color(i, 128, 255.0, ColorStyle::Rainbow),
                "bar {i}"
            );
        }
    }

    #[test]
    fn fft_change_resizes_buffer_without_dropping_frames() {
        let mut scheduler = started(FixedProvider::new(100), VisualConfig::default());
        let mut surface = CommandList::new(800, 400);
        scheduler.tick(&mut surface, 0.016).unwrap();
        assert_eq!(scheduler.buffer().len(), 128);

        scheduler.handle().submit(ConfigChange::FftSize(512)).unwrap();
        surface.take();
        let outcome = scheduler.tick(&mut surface, 0.016).unwrap();
        assert!(matches!(outcome, TickOutcome::Rendered { .. }));
        assert_eq!(scheduler.buffer().len(), 256);
        assert_eq!(scheduler.config().fft_size, 512);
        assert_eq!(bar_rects(&surface).len(), 256);
    }

    #[test]
    fn provider_rejection_keeps_previous_config() {
        let mut scheduler = started(FixedProvider::new(100), VisualConfig::default());
        let err = scheduler.apply(ConfigChange::FftSize(192)).unwrap_err();
        assert!(matches!(err, VizError::InvalidParameter { .. }));
        assert_eq!(scheduler.config().fft_size, 256);

        let err = scheduler.apply(ConfigChange::Sensitivity(9.0)).unwrap_err();
        assert!(matches!(err, VizError::InvalidParameter { .. }));
        assert_eq!(scheduler.config(), &VisualConfig::default());
    }

    #[test]
    fn acquisition_failure_leaves_scheduler_inactive() {
        let mut provider = FixedProvider::new(0);
        provider.fail_acquire = true;
        let mut scheduler = FrameScheduler::new(provider, VisualConfig::default()).unwrap();
        let err = scheduler.start(640, 480, StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, VizError::Acquisition(_)));
        assert!(!scheduler.is_active());
        assert!(scheduler.state().is_none());

        let mut surface = CommandList::new(640, 480);
        assert_eq!(scheduler.tick(&mut surface, 0.016).unwrap(), TickOutcome::Inactive);
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn stop_twice_is_harmless() {
        let mut scheduler = started(FixedProvider::new(50), VisualConfig::default());
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.provider().releases, 1);

        let mut surface = CommandList::new(800, 400);
        let mut pacer = FramePacer::fixed(60);
        assert_eq!(scheduler.run(&mut surface, &mut pacer, Some(10)).unwrap(), 0);
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn restart_after_stop_issues_fresh_token() {
        let mut scheduler = started(FixedProvider::new(50), VisualConfig::default());
        let old = scheduler.cancel_token();
        scheduler.stop();
        assert!(old.is_cancelled());
        scheduler.start(800, 400, StdRng::seed_from_u64(2)).unwrap();
        assert!(!scheduler.cancel_token().is_cancelled());
    }

    #[test]
    fn run_honours_frame_limit_and_cancel() {
        let mut scheduler = started(FixedProvider::new(80), VisualConfig::default());
        let mut surface = CommandList::new(800, 400);
        let mut pacer = FramePacer::fixed(60);
        assert_eq!(scheduler.run(&mut surface, &mut pacer, Some(5)).unwrap(), 5);
        assert!((scheduler.elapsed() - 5.0 / 60.0).abs() < 1e-4);

        scheduler.cancel_token().cancel();
        assert_eq!(scheduler.run(&mut surface, &mut pacer, Some(5)).unwrap(), 0);
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.provider().releases, 1);
    }

    #[test]
    fn external_cancel_releases_and_allows_restart() {
        let mut scheduler = started(FixedProvider::new(80), VisualConfig::default());
        let mut surface = CommandList::new(800, 400);
        scheduler.cancel_token().cancel();

        assert_eq!(scheduler.tick(&mut surface, 0.016).unwrap(), TickOutcome::Inactive);
        assert!(surface.commands().is_empty());
        assert!(!scheduler.is_active());
        assert!(!scheduler.provider().is_ready());
        assert_eq!(scheduler.provider().releases, 1);

        scheduler.start(800, 400, StdRng::seed_from_u64(3)).unwrap();
        assert!(!scheduler.cancel_token().is_cancelled());
        let mut pacer = FramePacer::fixed(60);
        assert_eq!(scheduler.run(&mut surface, &mut pacer, Some(5)).unwrap(), 5);
    }

    #[test]
    fn start_after_untouched_cancel_rebuilds() {
        let mut scheduler = started(FixedProvider::new(80), VisualConfig::default());
        scheduler.cancel_token().cancel();
        scheduler.start(640, 320, StdRng::seed_from_u64(4)).unwrap();

        assert!(scheduler.is_active());
        assert!(scheduler.provider().is_ready());
        assert_eq!(scheduler.provider().releases, 1);
        assert_eq!(scheduler.state().map(EngineState::size), Some((640, 320)));
        let mut surface = CommandList::new(640, 320);
        let mut pacer = FramePacer::fixed(60);
        assert_eq!(scheduler.run(&mut surface, &mut pacer, Some(3)).unwrap(), 3);
    }

    #[test]
    fn refused_queued_change_is_reported() {
        let mut scheduler = started(FixedProvider::new(80), VisualConfig::default());
        let mut surface = CommandList::new(800, 400);
        scheduler.handle().submit(ConfigChange::FftSize(192)).unwrap();
        scheduler.handle().submit(ConfigChange::Fade(0.5)).unwrap();

        scheduler.tick(&mut surface, 0.016).unwrap();
        assert_eq!(scheduler.rejected_changes(), &[ConfigChange::FftSize(192)]);
        assert_eq!(scheduler.config().fft_size, 256);
        assert_eq!(scheduler.config().fade, 0.5);

        scheduler.tick(&mut surface, 0.016).unwrap();
        assert!(scheduler.rejected_changes().is_empty());
    }

    #[test]
    fn particles_keep_moving_under_other_modes() {
        let mut scheduler = started(FixedProvider::new(200), VisualConfig::default());
        let mut surface = CommandList::new(800, 400);
        scheduler.handle().submit(ConfigChange::Mode(VisualMode::Particles)).unwrap();
        scheduler.tick(&mut surface, 0.016).unwrap();

        scheduler.handle().submit(ConfigChange::Mode(VisualMode::Matrix)).unwrap();
        scheduler.tick(&mut surface, 0.016).unwrap();
        let before = scheduler.state().unwrap().particles.particles().to_vec();
        for _ in 0..30 {
            scheduler.tick(&mut surface, 0.016).unwrap();
        }
        scheduler.handle().submit(ConfigChange::Mode(VisualMode::Ascii)).unwrap();
        for _ in 0..10 {
            scheduler.tick(&mut surface, 0.016).unwrap();
        }

        let particles = scheduler.state().unwrap().particles.particles();
        assert_eq!(particles.len(), before.len());
        assert_ne!(particles, &before[..]);
        assert!(particles
            .iter()
            .all(|p| (0.0..800.0).contains(&p.x) && (0.0..400.0).contains(&p.y)));
    }

    #[test]
    fn not_ready_provider_skips_ticks() {
        let mut scheduler = started(FixedProvider::new(80), VisualConfig::default());
        scheduler.provider.ready = false;
        let mut surface = CommandList::new(800, 400);
        assert_eq!(scheduler.tick(&mut surface, 0.016).unwrap(), TickOutcome::Skipped);
        assert!(surface.commands().is_empty());
        assert_eq!(scheduler.state().map(EngineState::frames), Some(0));
    }

    #[test]
    fn queued_changes_wait_for_tick_boundary() {
        let mut scheduler = started(FixedProvider::new(80), VisualConfig::default());
        let handle = scheduler.handle();
        handle.submit(ConfigChange::Mode(VisualMode::Waveform)).unwrap();
        handle.submit(ConfigChange::ParticleCount(60)).unwrap();
        assert!(handle.submit(ConfigChange::AsciiDensity(3)).is_err());
        assert_eq!(scheduler.config().mode, VisualMode::Bars);

        let mut surface = CommandList::new(800, 400);
        scheduler.tick(&mut surface, 0.016).unwrap();
        assert_eq!(scheduler.config().mode, VisualMode::Waveform);
        assert_eq!(scheduler.state().map(|s| s.particles.len()), Some(60));
        assert_eq!(scheduler.buffer().len(), 256);
        assert!(surface
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Path { .. })));
    }

    #[test]
    fn surface_resize_rebuilds_grids() {
        let mut config = VisualConfig::default();
        config.mode = VisualMode::Matrix;
        let mut scheduler = started(FixedProvider::new(200), config);
        let mut surface = CommandList::new(800, 400);
        scheduler.tick(&mut surface, 0.016).unwrap();

        surface.resize(1600, 320);
        scheduler.tick(&mut surface, 0.016).unwrap();
        let state = scheduler.state().unwrap();
        assert_eq!(state.size(), (1600, 320));
        assert_eq!(state.matrix.dims().cols, 100);
        assert_eq!(state.ascii.dims().rows, 20);
    }

    #[test]
    fn beat_flash_rules() {
        assert!(flash_allowed(VisualMode::Bars, ColorStyle::Neon));
        assert!(!flash_allowed(VisualMode::Predator, ColorStyle::Neon));
        assert!(!flash_allowed(VisualMode::Bars, ColorStyle::Minimal));

        let provider = FixedProvider::new(20);
        let level = provider.level.clone();
        let mut scheduler = started(provider, VisualConfig::default());
        let mut surface = CommandList::new(800, 400);
        for _ in 0..10 {
            scheduler.tick(&mut surface, 0.016).unwrap();
        }
        level.set(250);
        surface.take();
        let outcome = scheduler.tick(&mut surface, 0.016).unwrap();
        assert_eq!(outcome, TickOutcome::Rendered { beat: true });
        let flash = Color::WHITE.with_alpha(BEAT_FLASH_ALPHA);
        assert!(surface
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::FillRect(_, color) if *color == flash)));
    }
}
