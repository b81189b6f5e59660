use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use depthmeasure_app::logging::{self, LogTarget};
use depthmeasure_app::{load_script, write_summary, AppConfig, ReplaySink, ScriptedInput};
use depthmeasure_core::{classify, DepthSampleProvider, MeasurementLoop, Pixel, Validity};
use depthmeasure_io::{write_frame, SyntheticConfig, SyntheticScene};
use depthmeasure_visualization::{open_terminal, SnapshotWriter};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "depthmeasure")]
#[command(about = "Measure the distance between two points of a depth camera stream")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log filter directive, overrides -v and RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure interactively in the terminal
    Run {
        /// Recorded depth frame (.dmf, .xyz, .csv); repeat for a sequence
        #[arg(short, long)]
        source: Vec<PathBuf>,

        /// Restart recorded frames when they run out
        #[arg(long)]
        looping: bool,

        /// Directory for screenshots and measurement exports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Play a command script without a display
    Replay {
        /// Script with one command per line
        #[arg(long)]
        script: PathBuf,

        /// Recorded depth frame; repeat for a sequence
        #[arg(short, long)]
        source: Vec<PathBuf>,

        /// Directory for screenshots and measurement exports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Sample one pixel and print the verdict
    Probe {
        u: u32,
        v: u32,

        /// Recorded depth frame
        #[arg(short, long)]
        source: Vec<PathBuf>,
    },

    /// Write a synthetic depth frame to a file
    Generate {
        /// Output file (.dmf, .xyz, .csv)
        #[arg(short, long)]
        output: PathBuf,

        /// Depth of the back plane in meters
        #[arg(long, default_value = "2.0")]
        depth: f32,

        #[arg(long, default_value = "640")]
        width: u32,

        #[arg(long, default_value = "480")]
        height: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal UI owns the screen, so it only logs to a file
    let target = match (&cli.log_file, &cli.command) {
        (Some(path), _) => LogTarget::File(path),
        (None, Commands::Run { .. }) => LogTarget::Discard,
        (None, _) => LogTarget::Stderr,
    };
    logging::init(cli.verbose, cli.log_level.as_deref(), target)?;

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            source,
            looping,
            output_dir,
        } => run(config.with_source_files(source, looping), output_dir),
        Commands::Replay {
            script,
            source,
            output_dir,
        } => replay(config.with_source_files(source, false), script, output_dir),
        Commands::Probe { u, v, source } => probe(config.with_source_files(source, false), Pixel::new(u, v)),
        Commands::Generate {
            output,
            depth,
            width,
            height,
        } => generate(output, depth, width, height),
    }
}

fn run(config: AppConfig, output_dir: Option<PathBuf>) -> Result<()> {
    let provider = config.source.open()?;
    let resolution = provider.resolution();
    let mut driver = MeasurementLoop::new(provider, config.loop_config())
        .context("depth source unavailable")?;

    let snapshots = SnapshotWriter::new(output_dir.unwrap_or(config.output_dir.clone()));
    let stats = {
        let (mut input, mut display) = open_terminal(resolution, config.frame_interval(), snapshots)?;
        driver.run(&mut input, &mut display)?
    };

    let mut stdout = std::io::stdout();
    write_summary(&mut stdout, driver.session(), &stats)?;
    Ok(())
}

fn replay(config: AppConfig, script: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let steps = load_script(&script)?;
    info!(steps = steps.len(), script = %script.display(), "Loaded script");

    let provider = config.source.open()?;
    let mut driver = MeasurementLoop::new(provider, config.loop_config())
        .context("depth source unavailable")?;

    let snapshots = SnapshotWriter::new(output_dir.unwrap_or(config.output_dir.clone()));
    let mut input = ScriptedInput::new(steps);
    let mut sink = ReplaySink::new(snapshots, std::io::stdout());
    let stats = driver.run(&mut input, &mut sink)?;

    let mut stdout = sink.into_inner();
    write_summary(&mut stdout, driver.session(), &stats)?;
    Ok(())
}

fn probe(config: AppConfig, pixel: Pixel) -> Result<()> {
    let mut provider = config.source.open()?;
    if provider.resolution().is_empty() {
        bail!("depth source reports an empty frame");
    }
    provider
        .grab()
        .map_err(|e| anyhow::anyhow!("failed to grab a frame: {}", e))?;

    let sample = provider.sample_at(pixel);
    let mut stdout = std::io::stdout();
    match classify(&sample) {
        Validity::Accepted(accepted) => {
            let world = accepted.world();
            writeln!(
                stdout,
                "{} accepted: X={:.3}, Y={:.3}, Z={:.3} m",
                pixel, world.x, world.y, world.z
            )?;
        }
        Validity::Rejected(reason) => writeln!(stdout, "{} rejected: {}", pixel, reason)?,
    }
    Ok(())
}

fn generate(output: PathBuf, depth: f32, width: u32, height: u32) -> Result<()> {
    let config = SyntheticConfig {
        width,
        height,
        plane_depth: depth,
        ..SyntheticConfig::default()
    };
    let frame = SyntheticScene::new(config).render_frame();
    write_frame(&frame, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Wrote {}x{} frame to {} ({:.1}% valid)",
        frame.width(),
        frame.height(),
        output.display(),
        frame.valid_fraction() * 100.0
    );
    Ok(())
}
