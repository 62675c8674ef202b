use std::fs::File;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser as _;
use gpmf::dump::Stats;
use gpmf::Config;

#[derive(clap::Parser)]
struct Args {
    /// The largest telemetry chunk, in bytes, which will be read into memory.
    #[clap(long)]
    max_chunk_size: Option<u64>,

    /// Text which the name of the telemetry track's handler must contain.
    #[clap(long)]
    handler_name: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List the telemetry chunks of a video.
    Chunks {
        /// Path to the video file.
        file: PathBuf,
    },

    /// Write the decoded telemetry of a video as JSON.
    Dump {
        /// Path to the video file.
        file: PathBuf,
    },

    /// Count the decoded samples of a video per key.
    Stats {
        /// Path to the video file.
        file: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .context("Error initializing logging")?;

    let args = Args::try_parse().context("Error parsing command line arguments")?;

    let mut config = Config::builder();
    if let Some(max_chunk_size) = args.max_chunk_size {
        config.max_chunk_size(max_chunk_size);
    }
    if let Some(handler_name) = args.handler_name {
        config.handler_name(handler_name);
    }
    let config = config.build();

    let mut stdout = io::stdout().lock();
    match args.command {
        Command::Chunks { file } => {
            let input = open(&file)?;
            let chunks = gpmf::locate_chunks_with_config(input, config)
                .with_context(|| format!("Error locating telemetry in {}", file.display()))?;
            for chunk in chunks {
                writeln!(stdout, "{chunk}")?;
            }
        }
        Command::Dump { file } => {
            let elements = decode(&file, config)?;
            gpmf::dump::to_writer(&mut stdout, &elements).context("Error writing dump")?;
            writeln!(stdout)?;
        }
        Command::Stats { file } => {
            let elements = decode(&file, config)?;
            Stats::collect(&elements).results(&mut stdout).context("Error writing stats")?;
        }
    }

    Ok(())
}

fn open(file: &Path) -> Result<File, anyhow::Error> {
    File::open(file).with_context(|| format!("Error opening {}", file.display()))
}

fn decode(file: &Path, config: Config) -> Result<Vec<gpmf::Element>, anyhow::Error> {
    let input = open(file)?;
    gpmf::decode_with_config(input, config).with_context(|| format!("Error decoding {}", file.display()))
}
