use std::{collections::VecDeque, f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use tracing::debug;

use crate::{Result, VizError};

/// Magnitudes at or below this map to byte 0.
pub const MIN_DECIBELS: f32 = -100.0;
/// Magnitudes at or above this map to byte 255.
pub const MAX_DECIBELS: f32 = -30.0;
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32_768;

/// FFT-backed analyser that turns a PCM ring buffer into the byte spectra the
/// draw algorithms consume.
///
/// Frequency data follows the usual analyser-node recipe: Blackman window,
/// `|X| / N` magnitudes, exponential smoothing across frames, then a linear
/// mapping of `[MIN_DECIBELS, MAX_DECIBELS]` onto `[0, 255]`. Time-domain
/// data maps `[-1, 1]` onto bytes centered at 128.
pub struct SpectrumAnalyser {
    fft_size: usize,
    smoothing: f32,
    ring: VecDeque<f32>,
    smoothed: Vec<f32>,
    window: Vec<f32>,
    planner: RealFftPlanner<f32>,
    fft: FftResources,
}

impl SpectrumAnalyser {
    pub fn new(fft_size: usize, smoothing: f32) -> Result<Self> {
        check_fft_size(fft_size)?;
        check_smoothing(smoothing)?;
        Ok(Self::build(fft_size, smoothing))
    }

    fn build(fft_size: usize, smoothing: f32) -> Self {
        let mut planner = RealFftPlanner::new();
        let fft = FftResources::plan(&mut planner, fft_size);
        Self {
            fft_size,
            smoothing,
            ring: std::iter::repeat(0.0).take(fft_size).collect(),
            smoothed: vec![0.0; fft_size / 2],
            window: blackman(fft_size),
            planner,
            fft,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Switches to a new transform size. The most recent samples are kept;
    /// smoothing history is discarded since the bins no longer line up.
    pub fn set_fft_size(&mut self, fft_size: usize) -> Result<()> {
        check_fft_size(fft_size)?;
        if fft_size == self.fft_size {
            return Ok(());
        }
        while self.ring.len() > fft_size {
            self.ring.pop_front();
        }
        while self.ring.len() < fft_size {
            self.ring.push_front(0.0);
        }
        self.fft = FftResources::plan(&mut self.planner, fft_size);
        self.window = blackman(fft_size);
        self.smoothed = vec![0.0; fft_size / 2];
        debug!(from = self.fft_size, to = fft_size, "analyser resized");
        self.fft_size = fft_size;
        Ok(())
    }

    pub fn set_smoothing(&mut self, smoothing: f32) -> Result<()> {
        check_smoothing(smoothing)?;
        self.smoothing = smoothing;
        Ok(())
    }

    /// Appends PCM samples, evicting the oldest once the ring is full.
    pub fn push(&mut self, samples: &[f32]) {
        let skip = samples.len().saturating_sub(self.fft_size);
        for &sample in &samples[skip..] {
            if self.ring.len() == self.fft_size {
                self.ring.pop_front();
            }
            self.ring.push_back(sample);
        }
    }

    /// Runs one transform and writes up to `out.len()` byte magnitudes.
    /// Entries beyond the bin count are zeroed.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) -> Result<()> {
        self.transform()?;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = match self.smoothed.get(i) {
                Some(&magnitude) if magnitude > 0.0 => {
                    let db = 20.0 * magnitude.log10();
                    (255.0 * (db - MIN_DECIBELS) / range).clamp(0.0, 255.0) as u8
                }
                _ => 0,
            };
        }
        Ok(())
    }

    /// Writes the most recent `out.len()` samples (at most `fft_size`),
    /// oldest first. Silence reads as 128.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let take = out.len().min(self.ring.len());
        let start = self.ring.len() - take;
        for (slot, &sample) in out.iter_mut().zip(self.ring.range(start..)) {
            *slot = (128.0 * (sample + 1.0)).clamp(0.0, 255.0) as u8;
        }
        for slot in out.iter_mut().skip(take) {
            *slot = 128;
        }
    }

    fn transform(&mut self) -> Result<()> {
        let fft = &mut self.fft;
        for ((input, &sample), &w) in fft.input.iter_mut().zip(&self.ring).zip(&self.window) {
            *input = sample * w;
        }
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)
            .map_err(|e| VizError::msg(format!("fft failed: {e}")))?;

        let scale = 1.0 / self.fft_size as f32;
        let tau = self.smoothing;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&fft.spectrum) {
            let magnitude = bin.norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }
        Ok(())
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::build(256, 0.8)
    }
}

impl fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("fft_size", &self.fft_size)
            .field("smoothing", &self.smoothing)
            .field("buffered", &self.ring.len())
            .finish()
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn plan(planner: &mut RealFftPlanner<f32>, size: usize) -> Self {
        let plan = planner.plan_fft_forward(size);
        Self {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }
}

fn check_fft_size(size: usize) -> Result<()> {
    if size.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(VizError::invalid(
            "fft_size",
            format!("{size} is not a power of two in {MIN_FFT_SIZE}..={MAX_FFT_SIZE}"),
        ))
    }
}

fn check_smoothing(smoothing: f32) -> Result<()> {
    if (0.0..=1.0).contains(&smoothing) {
        Ok(())
    } else {
        Err(VizError::invalid(
            "smoothing",
            format!("{smoothing} is outside 0..=1"),
        ))
    }
}

fn blackman(len: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42, 0.5, 0.08);
    let n = len as f32;
    (0..len)
        .map(|i| {
            let x = 2.0 * PI * i as f32 / n;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}
