use std::{
    collections::VecDeque,
    fmt,
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};

use crate::{Result, VizError};

/// Which sample domain a mode consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDomain {
    /// `fft_size / 2` per-bin magnitudes.
    Frequency,
    /// `fft_size` waveform samples centered at 128.
    Time,
}

/// The ten visual modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualMode {
    Bars,
    Waveform,
    Oscillator,
    Circular,
    Particles,
    Ascii,
    Matrix,
    Predator,
    Radial,
    Spectrum3d,
}

impl VisualMode {
    pub const ALL: [VisualMode; 10] = [
        VisualMode::Bars,
        VisualMode::Waveform,
        VisualMode::Oscillator,
        VisualMode::Circular,
        VisualMode::Particles,
        VisualMode::Ascii,
        VisualMode::Matrix,
        VisualMode::Predator,
        VisualMode::Radial,
        VisualMode::Spectrum3d,
    ];

    /// Position of the mode in [`VisualMode::ALL`], used as the renderer table index.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn domain(self) -> SampleDomain {
        match self {
            VisualMode::Waveform | VisualMode::Oscillator => SampleDomain::Time,
            _ => SampleDomain::Frequency,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VisualMode::Bars => "bars",
            VisualMode::Waveform => "waveform",
            VisualMode::Oscillator => "oscillator",
            VisualMode::Circular => "circular",
            VisualMode::Particles => "particles",
            VisualMode::Ascii => "ascii",
            VisualMode::Matrix => "matrix",
            VisualMode::Predator => "predator",
            VisualMode::Radial => "radial",
            VisualMode::Spectrum3d => "spectrum3d",
        }
    }

    /// The mode after this one, wrapping around.
    pub fn next(self) -> VisualMode {
        VisualMode::ALL[(self.index() + 1) % VisualMode::ALL.len()]
    }
}

impl fmt::Display for VisualMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VisualMode {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        VisualMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| VizError::invalid("mode", format!("unknown mode `{s}`")))
    }
}

/// Color styles understood by the color mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorStyle {
    Rainbow,
    Neon,
    Fire,
    Ocean,
    Minimal,
    Retro,
}

impl ColorStyle {
    pub const ALL: [ColorStyle; 6] = [
        ColorStyle::Rainbow,
        ColorStyle::Neon,
        ColorStyle::Fire,
        ColorStyle::Ocean,
        ColorStyle::Minimal,
        ColorStyle::Retro,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorStyle::Rainbow => "rainbow",
            ColorStyle::Neon => "neon",
            ColorStyle::Fire => "fire",
            ColorStyle::Ocean => "ocean",
            ColorStyle::Minimal => "minimal",
            ColorStyle::Retro => "retro",
        }
    }
}

impl fmt::Display for ColorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorStyle {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        ColorStyle::ALL
            .into_iter()
            .find(|style| style.name() == s)
            .ok_or_else(|| VizError::invalid("style", format!("unknown style `{s}`")))
    }
}

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub visual: VisualConfig,
    pub audio: AudioConfig,
    pub canvas: CanvasConfig,
}

impl AppConfig {
    /// Loads a JSON config file. Missing sections fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        config.visual.validate()?;
        Ok(config)
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub fps: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            fps: 60,
        }
    }
}

/// Initial raster surface size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// The user-facing visual options. Owned by [`ConfigStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub mode: VisualMode,
    pub style: ColorStyle,
    pub fft_size: usize,
    pub fade: f32,
    pub sensitivity: f32,
    pub smoothing: f32,
    pub particle_count: usize,
    pub beat_detection: bool,
    pub show_freq_labels: bool,
    pub ascii_density: u32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            mode: VisualMode::Bars,
            style: ColorStyle::Rainbow,
            fft_size: 256,
            fade: 0.2,
            sensitivity: 1.0,
            smoothing: 0.8,
            particle_count: 200,
            beat_detection: true,
            show_freq_labels: false,
            ascii_density: 16,
        }
    }
}

impl VisualConfig {
    /// Expresses every field as a change, in application order.
    pub fn as_changes(&self) -> [ConfigChange; 10] {
        [
            ConfigChange::Mode(self.mode),
            ConfigChange::Style(self.style),
            ConfigChange::FftSize(self.fft_size),
            ConfigChange::Fade(self.fade),
            ConfigChange::Sensitivity(self.sensitivity),
            ConfigChange::Smoothing(self.smoothing),
            ConfigChange::ParticleCount(self.particle_count),
            ConfigChange::BeatDetection(self.beat_detection),
            ConfigChange::ShowFreqLabels(self.show_freq_labels),
            ConfigChange::AsciiDensity(self.ascii_density),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        self.as_changes().iter().try_for_each(ConfigChange::validate)
    }

    fn apply(&mut self, change: ConfigChange) {
        match change {
            ConfigChange::Mode(mode) => self.mode = mode,
            ConfigChange::Style(style) => self.style = style,
            ConfigChange::FftSize(size) => self.fft_size = size,
            ConfigChange::Fade(fade) => self.fade = fade,
            ConfigChange::Sensitivity(value) => self.sensitivity = value,
            ConfigChange::Smoothing(value) => self.smoothing = value,
            ConfigChange::ParticleCount(count) => self.particle_count = count,
            ConfigChange::BeatDetection(on) => self.beat_detection = on,
            ConfigChange::ShowFreqLabels(on) => self.show_freq_labels = on,
            ConfigChange::AsciiDensity(density) => self.ascii_density = density,
        }
    }
}

/// A single option-set operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigChange {
    Mode(VisualMode),
    Style(ColorStyle),
    FftSize(usize),
    Fade(f32),
    Sensitivity(f32),
    Smoothing(f32),
    ParticleCount(usize),
    BeatDetection(bool),
    ShowFreqLabels(bool),
    AsciiDensity(u32),
}

/// What has to be rebuilt after a change is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reinit {
    Nothing,
    SampleBuffer,
    Smoothing,
    Particles,
    Grids,
}

impl ConfigChange {
    /// Range validation. Provider-level checks (e.g. power-of-two FFT sizes)
    /// happen when the scheduler forwards the change.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ConfigChange::FftSize(size) => {
                if !(64..=2048).contains(&size) || size % 64 != 0 {
                    return Err(VizError::invalid(
                        "fft_size",
                        format!("{size} is not a multiple of 64 in 64..=2048"),
                    ));
                }
                Ok(())
            }
            ConfigChange::Fade(value) => check_range("fade", value, 0.0, 1.0),
            ConfigChange::Sensitivity(value) => check_range("sensitivity", value, 0.1, 5.0),
            ConfigChange::Smoothing(value) => check_range("smoothing", value, 0.0, 1.0),
            ConfigChange::ParticleCount(count) => {
                if !(50..=500).contains(&count) {
                    return Err(VizError::invalid(
                        "particle_count",
                        format!("{count} is outside 50..=500"),
                    ));
                }
                Ok(())
            }
            ConfigChange::AsciiDensity(density) => {
                if !(10..=40).contains(&density) {
                    return Err(VizError::invalid(
                        "ascii_density",
                        format!("{density} is outside 10..=40"),
                    ));
                }
                Ok(())
            }
            ConfigChange::Mode(_)
            | ConfigChange::Style(_)
            | ConfigChange::BeatDetection(_)
            | ConfigChange::ShowFreqLabels(_) => Ok(()),
        }
    }

    pub fn reinit(&self) -> Reinit {
        match self {
            ConfigChange::FftSize(_) => Reinit::SampleBuffer,
            ConfigChange::Smoothing(_) => Reinit::Smoothing,
            ConfigChange::ParticleCount(_) => Reinit::Particles,
            ConfigChange::AsciiDensity(_) => Reinit::Grids,
            _ => Reinit::Nothing,
        }
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(VizError::invalid(
            name,
            format!("{value} is outside {min}..={max}"),
        ))
    }
}

/// Parses `key=value` pairs as accepted on the command line.
impl FromStr for ConfigChange {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| VizError::msg(format!("expected key=value, got `{s}`")))?;
        let value = value.trim();
        let change = match key.trim() {
            "mode" => ConfigChange::Mode(value.parse()?),
            "style" => ConfigChange::Style(value.parse()?),
            "fft_size" => ConfigChange::FftSize(parse_value("fft_size", value)?),
            "fade" => ConfigChange::Fade(parse_value("fade", value)?),
            "sensitivity" => ConfigChange::Sensitivity(parse_value("sensitivity", value)?),
            "smoothing" => ConfigChange::Smoothing(parse_value("smoothing", value)?),
            "particle_count" => ConfigChange::ParticleCount(parse_value("particle_count", value)?),
            "beat_detection" => ConfigChange::BeatDetection(parse_value("beat_detection", value)?),
            "show_freq_labels" => {
                ConfigChange::ShowFreqLabels(parse_value("show_freq_labels", value)?)
            }
            "ascii_density" => ConfigChange::AsciiDensity(parse_value("ascii_density", value)?),
            other => return Err(VizError::msg(format!("unknown option `{other}`"))),
        };
        Ok(change)
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| VizError::invalid(name, format!("cannot parse `{raw}`")))
}

type PendingQueue = Arc<Mutex<VecDeque<ConfigChange>>>;

/// Sole owner of the live [`VisualConfig`].
///
/// Changes coming from outside the frame loop are queued through a
/// [`ConfigHandle`] and drained by the scheduler at the next tick boundary.
#[derive(Debug)]
pub struct ConfigStore {
    current: VisualConfig,
    pending: PendingQueue,
}

impl ConfigStore {
    pub fn new(config: VisualConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            current: config,
            pending: Arc::new(Mutex::new(VecDeque::new())),
        })
    }

    pub fn config(&self) -> &VisualConfig {
        &self.current
    }

    /// Commits an already validated change and reports what must be rebuilt.
    /// Unchanged values report [`Reinit::Nothing`].
    pub fn commit(&mut self, change: ConfigChange) -> Reinit {
        let before = self.current.clone();
        self.current.apply(change);
        if before == self.current {
            Reinit::Nothing
        } else {
            change.reinit()
        }
    }

    pub fn handle(&self) -> ConfigHandle {
        ConfigHandle {
            queue: self.pending.clone(),
        }
    }

    /// Takes every queued change, oldest first.
    pub fn drain_pending(&self) -> Result<Vec<ConfigChange>> {
        let mut queue = lock_queue(&self.pending)?;
        Ok(queue.drain(..).collect())
    }
}

/// Cloneable sender for configuration changes made outside the frame loop.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    queue: PendingQueue,
}

impl ConfigHandle {
    /// Queues a change after range validation. Provider-level rejection is
    /// only known once the scheduler applies it; refused changes are listed
    /// in `FrameScheduler::rejected_changes` after that tick.
    pub fn submit(&self, change: ConfigChange) -> Result<()> {
        change.validate()?;
        lock_queue(&self.queue)?.push_back(change);
        Ok(())
    }
}

fn lock_queue(queue: &PendingQueue) -> Result<MutexGuard<'_, VecDeque<ConfigChange>>> {
    queue
        .lock()
        .map_err(|_| VizError::msg("config queue has been poisoned"))
}
