use std::collections::VecDeque;

/// Number of per-frame energies kept in the rolling window.
pub const BEAT_HISTORY: usize = 20;
/// A frame is a beat when its energy exceeds the window mean by this factor.
pub const BEAT_RATIO: f32 = 1.3;

/// Rolling-average energy comparator.
#[derive(Debug, Clone, Default)]
pub struct BeatDetector {
    history: VecDeque<f32>,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(BEAT_HISTORY + 1),
        }
    }

    /// Pushes the buffer's mean magnitude and compares it against the window
    /// mean, which includes the current frame.
    pub fn detect(&mut self, buffer: &[u8]) -> bool {
        let current = mean(buffer.iter().map(|&v| v as f32), buffer.len());

        self.history.push_back(current);
        while self.history.len() > BEAT_HISTORY {
            self.history.pop_front();
        }

        let average = mean(self.history.iter().copied(), self.history.len());
        current > BEAT_RATIO * average
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

fn mean(values: impl Iterator<Item = f32>, len: usize) -> f32 {
    if len == 0 {
        return 0.0;
    }
    values.sum::<f32>() / len as f32
}
