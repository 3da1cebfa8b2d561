use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Raster, Result, VizError};

/// Writes one-off snapshots of a [`Raster`] as timestamped PNG files.
#[derive(Debug, Clone)]
pub struct FrameExporter {
    dir: PathBuf,
    prefix: String,
}

impl FrameExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "wavescope".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Saves the current raster contents and returns the written path.
    pub fn export(&self, raster: &Raster) -> Result<PathBuf> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| VizError::msg(format!("system clock before epoch: {e}")))?
            .as_millis();
        self.export_as(raster, &format!("{}-{millis}.png", self.prefix))
    }

    fn export_as(&self, raster: &Raster, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        raster.snapshot().save(&path)?;
        info!(path = %path.display(), "frame exported");
        Ok(path)
    }
}

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub output_dir: PathBuf,
    /// Only every `stride`-th captured frame is written.
    pub stride: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("frames"),
            stride: 1,
        }
    }
}

/// Captures a numbered PNG sequence (`frame_000000.png`, ...) that external
/// tools can stitch into a video.
#[derive(Debug, Default)]
pub struct Recorder {
    settings: RecordingSettings,
    is_recording: bool,
    captured: u64,
    written: u64,
}

impl Recorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    pub fn start(&mut self) -> Result<()> {
        if self.settings.stride == 0 {
            return Err(VizError::invalid("stride", "must be at least 1"));
        }
        std::fs::create_dir_all(&self.settings.output_dir)?;
        self.is_recording = true;
        self.captured = 0;
        self.written = 0;
        info!(dir = %self.settings.output_dir.display(), "recording started");
        Ok(())
    }

    /// Offers a frame to the recorder. Returns the written path, or `None`
    /// when not recording or when the frame falls between strides.
    pub fn capture(&mut self, raster: &Raster) -> Result<Option<PathBuf>> {
        if !self.is_recording {
            return Ok(None);
        }
        let index = self.captured;
        self.captured += 1;
        if index % self.settings.stride as u64 != 0 {
            return Ok(None);
        }
        let path = self
            .settings
            .output_dir
            .join(format!("frame_{:06}.png", self.written));
        raster.snapshot().save(&path)?;
        self.written += 1;
        debug!(path = %path.display(), "frame captured");
        Ok(Some(path))
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.is_recording {
            info!(frames = self.written, "recording stopped");
        }
        self.is_recording = false;
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }
}
