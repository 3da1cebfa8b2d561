use std::{f32::consts::TAU, path::PathBuf};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{Result, SpectrumAnalyser, VizError};

/// Input collaborator feeding the frame loop.
///
/// Reads are non-blocking snapshots of the latest analysis; a provider that has
/// not been acquired reports [`VizError::ProviderNotReady`].
pub trait SampleProvider {
    /// Opens the underlying input. May fail with [`VizError::Acquisition`].
    fn acquire(&mut self) -> Result<()>;

    /// Closes the input. Safe to call when not acquired.
    fn release(&mut self);

    fn is_ready(&self) -> bool;

    fn sample_rate(&self) -> u32;

    fn fft_size(&self) -> usize;

    fn frequency_bin_count(&self) -> usize {
        self.fft_size() / 2
    }

    fn set_fft_size(&mut self, fft_size: usize) -> Result<()>;

    fn set_smoothing(&mut self, smoothing: f32) -> Result<()>;

    /// Fills `out` with byte magnitudes, one per bin.
    fn read_frequency(&mut self, out: &mut [u8]) -> Result<()>;

    /// Fills `out` with waveform bytes centered at 128.
    fn read_time_domain(&mut self, out: &mut [u8]) -> Result<()>;
}

/// Mono PCM source behind an [`AudioEngine`].
pub trait AudioSource {
    fn open(&mut self) -> Result<()>;

    fn sample_rate(&self) -> u32;

    /// Fills `out` with samples in `[-1, 1]` and returns how many were written.
    fn read(&mut self, out: &mut [f32]) -> Result<usize>;

    fn close(&mut self);
}

/// Seeded test signal: a 120 bpm kick, a sustained A minor chord and a little
/// noise on top.
#[derive(Debug)]
pub struct SyntheticSource {
    sample_rate: u32,
    seed: u64,
    rng: Option<StdRng>,
    position: u64,
}

impl SyntheticSource {
    const BEAT_SECONDS: f32 = 0.5;
    const CHORD: [f32; 3] = [220.0, 261.63, 329.63];

    pub fn new(sample_rate: u32, seed: u64) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            seed,
            rng: None,
            position: 0,
        }
    }

    fn sample_at(&self, t: f32, noise: f32) -> f32 {
        let since_beat = t % Self::BEAT_SECONDS;
        let envelope = (-since_beat * 12.0).exp();
        let kick = (TAU * (50.0 + 100.0 * envelope) * since_beat).sin() * envelope * 0.6;
        let chord: f32 = Self::CHORD
            .iter()
            .map(|freq| (TAU * freq * t).sin() * 0.1)
            .sum();
        (kick + chord + noise).clamp(-1.0, 1.0)
    }
}

impl AudioSource for SyntheticSource {
    fn open(&mut self) -> Result<()> {
        self.rng = Some(StdRng::seed_from_u64(self.seed));
        self.position = 0;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, out: &mut [f32]) -> Result<usize> {
        let mut rng = self.rng.take().ok_or(VizError::ProviderNotReady)?;
        let rate = self.sample_rate as f32;
        for slot in out.iter_mut() {
            let t = self.position as f32 / rate;
            *slot = self.sample_at(t, rng.gen_range(-0.05..0.05));
            self.position += 1;
        }
        self.rng = Some(rng);
        Ok(out.len())
    }

    fn close(&mut self) {
        self.rng = None;
    }
}

/// WAV file decoded through `hound`, downmixed to mono and looped forever.
#[derive(Debug)]
pub struct WavSource {
    path: PathBuf,
    sample_rate: u32,
    samples: Vec<f32>,
    cursor: usize,
}

impl WavSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sample_rate: 44_100,
            samples: Vec::new(),
            cursor: 0,
        }
    }

    fn decode(&self) -> Result<(u32, Vec<f32>)> {
        let mut reader = hound::WavReader::open(&self.path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;
        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };
        let mono = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        Ok((spec.sample_rate, mono))
    }
}

impl AudioSource for WavSource {
    fn open(&mut self) -> Result<()> {
        let (sample_rate, samples) = self
            .decode()
            .map_err(|e| VizError::Acquisition(format!("{}: {e}", self.path.display())))?;
        if samples.is_empty() {
            return Err(VizError::Acquisition(format!(
                "{}: no samples",
                self.path.display()
            )));
        }
        info!(path = %self.path.display(), sample_rate, frames = samples.len(), "wav loaded");
        self.sample_rate = sample_rate;
        self.samples = samples;
        self.cursor = 0;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, out: &mut [f32]) -> Result<usize> {
        if self.samples.is_empty() {
            return Err(VizError::ProviderNotReady);
        }
        for slot in out.iter_mut() {
            *slot = self.samples[self.cursor];
            self.cursor = (self.cursor + 1) % self.samples.len();
        }
        Ok(out.len())
    }

    fn close(&mut self) {
        self.samples = Vec::new();
        self.cursor = 0;
    }
}

/// The shipped [`SampleProvider`]: an [`AudioSource`] feeding a
/// [`SpectrumAnalyser`].
///
/// Every read first pulls one frame's worth of audio (`sample_rate / fps`
/// samples) from the source, so the analysis advances in step with the
/// frame loop whether it runs in real time or offline.
pub struct AudioEngine {
    source: Box<dyn AudioSource>,
    analyser: SpectrumAnalyser,
    fps: u32,
    block: Vec<f32>,
    ready: bool,
}

impl AudioEngine {
    pub fn new(source: Box<dyn AudioSource>, fps: u32) -> Self {
        Self {
            source,
            analyser: SpectrumAnalyser::default(),
            fps: fps.max(1),
            block: Vec::new(),
            ready: false,
        }
    }

    pub fn synthetic(sample_rate: u32, fps: u32, seed: u64) -> Self {
        Self::new(Box::new(SyntheticSource::new(sample_rate, seed)), fps)
    }

    pub fn wav(path: impl Into<PathBuf>, fps: u32) -> Self {
        Self::new(Box::new(WavSource::new(path)), fps)
    }

    pub fn analyser(&self) -> &SpectrumAnalyser {
        &self.analyser
    }

    fn pump(&mut self) -> Result<()> {
        if !self.ready {
            return Err(VizError::ProviderNotReady);
        }
        let len = (self.source.sample_rate() / self.fps).max(1) as usize;
        self.block.resize(len, 0.0);
        let read = self.source.read(&mut self.block)?;
        self.analyser.push(&self.block[..read.min(len)]);
        Ok(())
    }
}

impl SampleProvider for AudioEngine {
    fn acquire(&mut self) -> Result<()> {
        if self.ready {
            return Ok(());
        }
        self.source.open()?;
        self.ready = true;
        info!(sample_rate = self.source.sample_rate(), fps = self.fps, "audio input acquired");
        Ok(())
    }

    fn release(&mut self) {
        if self.ready {
            self.source.close();
            self.ready = false;
            info!("audio input released");
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    fn fft_size(&self) -> usize {
        self.analyser.fft_size()
    }

    fn set_fft_size(&mut self, fft_size: usize) -> Result<()> {
        self.analyser.set_fft_size(fft_size)
    }

    fn set_smoothing(&mut self, smoothing: f32) -> Result<()> {
        self.analyser.set_smoothing(smoothing)?;
        debug!(smoothing, "smoothing updated");
        Ok(())
    }

    fn read_frequency(&mut self, out: &mut [u8]) -> Result<()> {
        self.pump()?;
        self.analyser.byte_frequency_data(out)
    }

    fn read_time_domain(&mut self, out: &mut [u8]) -> Result<()> {
        self.pump()?;
        self.analyser.byte_time_domain_data(out);
        Ok(())
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("analyser", &self.analyser)
            .field("fps", &self.fps)
            .field("ready", &self.ready)
            .finish()
    }
}
