use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use physarum::{
    errors::PhysarumError,
    export::{FrameExporter, FrameFormat},
    field::FieldSnapshot,
    settings::{Settings, DEFAULT_SETTINGS_FILE},
    world::World,
};
use std::{path::PathBuf, sync::mpsc, thread};

/// Run a Physarum trail-formation simulation, writing one frame per iteration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file; defaults are used for anything it (or the file itself) is missing
    #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
    config: String,

    /// Last iteration to run (iterations 0 through N are simulated)
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Directory where frames are written
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Frame file format
    #[arg(short, long, value_enum)]
    format: Option<FrameFormat>,

    /// Seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Don't write any frames
    #[arg(long)]
    no_export: bool,

    /// Number of frames that may queue up between the simulation and the frame writer
    #[arg(long, default_value_t = 2)]
    frame_buffer: usize,
}

impl Args {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(iterations) = self.iterations {
            settings.iterations = iterations;
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = output_dir.clone();
        }
        if let Some(format) = self.format {
            settings.frame_format = format;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if self.no_export {
            settings.export_frames = false;
        }
    }
}

fn main() -> Result<(), PhysarumError> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let mut settings = Settings::load_from_file(&args.config)?;
    args.apply_overrides(&mut settings);

    let iterations = settings.iterations;
    let export = settings
        .export_frames
        .then(|| (settings.output_dir.clone(), settings.frame_format));
    // Settings are validated before anything is created on disk
    let mut world = World::new(settings)?;
    let exporter = match export {
        Some((output_dir, format)) => Some(FrameExporter::new(&output_dir, format)?),
        None => None,
    };

    let progress = ProgressBar::new(iterations as u64 + 1).with_message("Running simulation");
    if let Ok(style) = ProgressStyle::with_template("{msg} {pos}/{len} {wide_bar} {elapsed}") {
        progress.set_style(style);
    }

    let failed_frames = match &exporter {
        Some(exporter) => run_with_exporter(
            &mut world,
            iterations,
            exporter,
            &progress,
            args.frame_buffer,
        )?,
        None => {
            world.run(iterations, |_, _| {
                progress.inc(1);
                Ok(())
            })?;
            0
        }
    };
    progress.finish();

    info!(
        "finished {} ticks, final total intensity {}",
        world.tick(),
        world.field().total_intensity()
    );

    if failed_frames > 0 {
        return Err(PhysarumError::FrameWriter(format!(
            "{} of {} frames could not be written",
            failed_frames,
            iterations + 1
        )));
    }

    Ok(())
}

/// Simulate on this thread while a second thread writes frames, so writing a frame overlaps
/// with computing the next one. Returns how many frames failed to write.
fn run_with_exporter(
    world: &mut World,
    iterations: usize,
    exporter: &FrameExporter,
    progress: &ProgressBar,
    frame_buffer: usize,
) -> Result<usize, PhysarumError> {
    thread::scope(|s| {
        let (sender, receiver) = mpsc::sync_channel::<(usize, FieldSnapshot)>(frame_buffer);

        let writer = s.spawn(move || {
            let mut failed_frames = 0;
            for (iteration, snapshot) in receiver {
                if let Err(e) = exporter.export(&snapshot, iteration) {
                    error!("failed to write frame {}: {}", iteration, e);
                    failed_frames += 1;
                }
            }
            failed_frames
        });

        world.run(iterations, |iteration, snapshot| {
            sender
                .send((iteration, snapshot))
                .map_err(|e| PhysarumError::FrameWriter(e.to_string()))?;
            progress.inc(1);
            Ok(())
        })?;
        drop(sender);

        writer
            .join()
            .map_err(|_| PhysarumError::FrameWriter("frame writer thread panicked".to_string()))
    })
}
