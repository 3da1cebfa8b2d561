//! Core library for the wavescope audio visualiser.
//!
//! A [`FrameScheduler`] pulls one byte buffer per frame from a
//! [`SampleProvider`], clears the previous frame according to the active
//! mode, runs beat detection and hands everything to the mode's draw
//! algorithm. Cross-frame state (particles, glyph grids, drop streams, beat
//! history) lives in an [`EngineState`] owned by the scheduler. Drawing goes
//! through the [`Surface`] trait, so the same pipeline renders into a
//! [`Raster`] for PNG export or into a [`render::CommandList`] for tests.

pub mod analysis;
pub mod audio;
pub mod beat;
pub mod color;
pub mod config;
pub mod error;
pub mod grid;
pub mod particles;
pub mod record;
pub mod render;
pub mod state;
pub mod timeline;

pub use analysis::SpectrumAnalyser;
pub use audio::{AudioEngine, AudioSource, SampleProvider, SyntheticSource, WavSource};
pub use beat::{BeatDetector, BEAT_HISTORY, BEAT_RATIO};
pub use color::{color, thermal_color, Color};
pub use config::{
    AppConfig, AudioConfig, CanvasConfig, ColorStyle, ConfigChange, ConfigHandle, ConfigStore,
    Reinit, SampleDomain, VisualConfig, VisualMode,
};
pub use error::{Result, VizError};
pub use grid::{AsciiWaveGrid, GridDims, MatrixDrop, MatrixRainGrid, PredatorThermalGrid};
pub use particles::{Particle, ParticleSystem};
pub use record::{FrameExporter, Recorder, RecordingSettings};
pub use render::{Raster, Surface};
pub use state::EngineState;
pub use timeline::{CancelToken, FramePacer, FrameScheduler, PlaybackClock, TickOutcome};
