use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timecode_sync::{config::Config, Synchronizer};

#[derive(Parser)]
#[command(
    name = "timecode-sync",
    version,
    about = "Synchronize video and audio tracks by their SMPTE timecode",
    long_about = "Timecode-Sync re-times the clips of a Final Cut Pro 7 / Premiere Pro XML interchange file so that every track starts where its file timecode places it relative to the sequence timecode. Tracks without a timecode follow the last track with the same name."
)]
struct Cli {
    /// Input XML file
    #[arg(short, long = "inputfile", default_value = "input.xml")]
    input: PathBuf,

    /// Output XML file [default: output_<YYYYMMDD-HHMMSS>.xml]
    #[arg(short, long = "outputfile")]
    output: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process the file and report, without writing any output
    #[arg(long)]
    dry_run: bool,

    /// Write the default configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Some(path) = &cli.init_config {
        Config::default().save_to_file(path)?;
        info!("Default configuration written to {:?}", path);
        return Ok(());
    }

    info!("Starting Timecode-Sync v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    config.validate()?;

    let output = match (&cli.output, cli.dry_run) {
        (_, true) => None,
        (Some(path), false) => Some(path.clone()),
        (None, false) => Some(config.output.default_file_name(&chrono::Local::now())?),
    };

    info!("Input: {:?}", cli.input);
    if let Some(output) = &output {
        info!("Output: {:?}", output);
    }
    info!("NOTE: The sequence timecode must equal or precede the track timecode(s)");

    let synchronizer = Synchronizer::new(&config)?;
    let report = match synchronizer.sync_file(&cli.input, output.as_deref()) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e.into());
        }
    };

    info!(
        "Done. {} sequence(s), {} clip(s) re-timed, {} track(s) skipped, {} unresolved",
        report.sequences.len(),
        report.clips_retimed(),
        report.tracks_skipped(),
        report.unresolved_tracks()
    );
    Ok(())
}
