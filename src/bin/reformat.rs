// Read an XML interchange file and write it straight back out, to check
// that a project survives the load/write cycle before re-timing it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use timecode_sync::{config::OutputConfig, Document};

#[derive(Parser)]
#[command(name = "reformat", version, about = "Read an XML file and write it out again")]
struct Cli {
    /// Input XML file
    #[arg(short, long = "inputfile", default_value = "input.xml")]
    input: PathBuf,

    /// Output XML file [default: output_<YYYYMMDD-HHMMSS>.xml]
    #[arg(short, long = "outputfile")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().init();

    let output = match cli.output {
        Some(path) => path,
        None => OutputConfig::default().default_file_name(&chrono::Local::now())?,
    };

    info!("Reading {:?}...", cli.input);
    let document = Document::from_file(&cli.input)?;

    info!("Writing reformatted XML to {:?}...", output);
    document.write_to_file(&output)?;

    info!("Done.");
    Ok(())
}
