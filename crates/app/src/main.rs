use std::{io::BufRead, path::PathBuf, thread, time::Duration};

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wavescope_core::{
    AppConfig, AudioEngine, CancelToken, ColorStyle, ConfigChange, ConfigHandle, FrameExporter,
    FramePacer, FrameScheduler, Raster, Recorder, RecordingSettings, Result, TickOutcome, VisualMode,
    VizError,
};

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Live {
            run,
            seconds,
            cycle_modes,
            snapshot,
        } => run_live(config, &run, seconds, cycle_modes, snapshot),
        Commands::Render {
            run,
            frames,
            out,
            stride,
        } => run_render(config, &run, frames, out, stride),
    }
}

/// Applies file values, then command-line overrides, and starts the loop.
fn build_scheduler(
    mut config: AppConfig,
    run: &RunOptions,
) -> Result<(FrameScheduler<AudioEngine>, u32, u32, u32)> {
    if let Some(fps) = run.fps {
        config.audio.fps = fps;
    }
    let width = run.width.unwrap_or(config.canvas.width);
    let height = run.height.unwrap_or(config.canvas.height);
    let fps = config.audio.fps.max(1);

    let engine = match &run.wav {
        Some(path) => AudioEngine::wav(path, fps),
        None => AudioEngine::synthetic(config.audio.sample_rate, fps, run.seed.unwrap_or(0)),
    };
    let mut scheduler = FrameScheduler::new(engine, config.visual)?;

    let overrides = run
        .mode
        .map(ConfigChange::Mode)
        .into_iter()
        .chain(run.style.map(ConfigChange::Style))
        .chain(run.set.iter().copied());
    for change in overrides {
        scheduler.apply(change)?;
    }

    let rng = match run.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    scheduler.start(width, height, rng)?;
    Ok((scheduler, width, height, fps))
}

fn run_live(
    config: AppConfig,
    run: &RunOptions,
    seconds: Option<f32>,
    cycle_modes: Option<f32>,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    let (mut scheduler, width, height, fps) = build_scheduler(config, run)?;
    let cancel = scheduler.cancel_token();
    info!(width, height, fps, "live mode, press enter to stop");

    spawn_stdin_watch(cancel.clone());
    if let Some(every) = cycle_modes {
        spawn_mode_cycler(
            scheduler.handle(),
            cancel.clone(),
            scheduler.config().mode,
            every,
        );
    }

    let mut raster = Raster::new(width, height);
    let mut pacer = FramePacer::realtime(fps);
    let limit = seconds.map(|s| (s.max(0.0) * fps as f32).round() as u64);
    let rendered = scheduler.run(&mut raster, &mut pacer, limit);
    scheduler.stop();
    let rendered = rendered?;
    info!(rendered, elapsed = scheduler.elapsed(), "live mode finished");

    if let Some(dir) = snapshot {
        FrameExporter::new(dir).export(&raster)?;
    }
    Ok(())
}

fn run_render(
    config: AppConfig,
    run: &RunOptions,
    frames: u64,
    out: PathBuf,
    stride: u32,
) -> Result<()> {
    let (mut scheduler, width, height, fps) = build_scheduler(config, run)?;
    let mut raster = Raster::new(width, height);
    let mut pacer = FramePacer::fixed(fps);
    let mut recorder = Recorder::new(RecordingSettings {
        output_dir: out,
        stride,
    });
    recorder.start()?;

    let progress = ProgressBar::new(frames);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames")
            .map_err(|e| VizError::msg(e.to_string()))?
            .progress_chars("=>-"),
    );

    let mut skipped = 0u64;
    for _ in 0..frames {
        match scheduler.tick(&mut raster, pacer.wait())? {
            TickOutcome::Rendered { .. } => {
                recorder.capture(&raster)?;
            }
            TickOutcome::Skipped => skipped += 1,
            TickOutcome::Inactive => break,
        }
        progress.inc(1);
    }
    progress.finish_with_message("rendering done");
    recorder.stop()?;
    scheduler.stop();

    if skipped > 0 {
        warn!(skipped, "some frames had no audio and were skipped");
    }
    info!(
        written = recorder.frames_written(),
        dir = %recorder.output_dir().display(),
        "frame sequence written"
    );
    Ok(())
}

/// Cancels the loop once a line (or EOF) arrives on stdin.
fn spawn_stdin_watch(cancel: CancelToken) {
    thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        cancel.cancel();
    });
}

/// Steps through every mode, one every `every` seconds, through the same
/// queue any external controller would use.
fn spawn_mode_cycler(handle: ConfigHandle, cancel: CancelToken, start: VisualMode, every: f32) {
    let period = Duration::from_secs_f32(every.max(0.1));
    thread::spawn(move || {
        let mut mode = start;
        loop {
            thread::sleep(period);
            if cancel.is_cancelled() {
                break;
            }
            mode = mode.next();
            if let Err(err) = handle.submit(ConfigChange::Mode(mode)) {
                warn!(error = %err, "mode cycle failed");
                break;
            }
        }
    });
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive visualiser", long_about = None)]
struct Cli {
    /// JSON config file; command-line flags override its values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the frame loop in real time against an offscreen raster.
    Live {
        #[command(flatten)]
        run: RunOptions,
        /// Stop after this many seconds instead of waiting for enter.
        #[arg(long)]
        seconds: Option<f32>,
        /// Switch to the next mode every N seconds.
        #[arg(long, value_name = "SECONDS")]
        cycle_modes: Option<f32>,
        /// Export the final frame as a timestamped PNG into this directory.
        #[arg(long, value_name = "DIR")]
        snapshot: Option<PathBuf>,
    },
    /// Render a fixed number of frames offline into a numbered PNG sequence.
    Render {
        #[command(flatten)]
        run: RunOptions,
        #[arg(short, long, default_value_t = 300)]
        frames: u64,
        /// Output directory for `frame_NNNNNN.png` files.
        #[arg(short, long, default_value = "frames")]
        out: PathBuf,
        /// Write only every N-th frame.
        #[arg(long, default_value_t = 1)]
        stride: u32,
    },
}

#[derive(Args, Debug)]
struct RunOptions {
    #[arg(short, long)]
    mode: Option<VisualMode>,
    #[arg(short, long)]
    style: Option<ColorStyle>,
    /// Extra `key=value` option overrides, e.g. `--set fft_size=512`.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<ConfigChange>,
    /// Drive the visuals from a WAV file instead of the synthetic signal.
    #[arg(long)]
    wav: Option<PathBuf>,
    /// Seed for the synthetic signal and every random effect.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    fps: Option<u32>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
}
