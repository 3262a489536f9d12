mod script;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};

use clap::{Args, Parser, Subcommand};
use cover_decor::catalog::CatalogError;
use cover_decor::config::ConfigError;
use cover_decor::persist::{self, PersistError, PersistedKind};
use cover_decor::preview::MemoryPreviews;
use cover_decor::{Catalog, DecorConfig, Stage};
use tracing_subscriber::EnvFilter;

use crate::script::{Replay, ScriptError, parse_line};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("saved stickers: {0}")]
    Persist(#[from] PersistError),
    #[error("script: {0}")]
    Script(#[from] ScriptError),
    #[error("invalid canvas size {width}x{height}")]
    CanvasSize { width: f64, height: f64 },
}

#[derive(Parser, Debug)]
#[command(name = "cover-cli", about = "Replay and inspect diary cover decorations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive a stage from a JSONL event script and print the saved stickers.
    Replay(ReplayArgs),
    /// Validate a saved sticker list and summarize it.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[arg(long, default_value = "-", help = "Event script path, or - for stdin")]
    input: String,

    #[arg(long, env = "COVER_CATALOG", help = "Catalog JSON file")]
    catalog: Option<String>,

    #[arg(long, help = "Saved sticker JSON to open the stage with")]
    restore: Option<String>,

    #[arg(long, default_value_t = 300.0)]
    width: f64,

    #[arg(long, default_value_t = 400.0)]
    height: f64,

    #[arg(long, default_value_t = false, help = "Pretty-print the output")]
    pretty: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(long, default_value = "-", help = "Saved sticker JSON path, or - for stdin")]
    input: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Replay(args) => run_replay(&args),
        Command::Check(args) => run_check(&args),
    };
    if let Err(error) = result {
        tracing::error!(%error, "command failed");
        std::process::exit(1);
    }
}

fn run_replay(args: &ReplayArgs) -> Result<(), CliError> {
    if !(args.width.is_finite() && args.height.is_finite() && args.width > 0.0 && args.height > 0.0) {
        return Err(CliError::CanvasSize { width: args.width, height: args.height });
    }
    let config = DecorConfig::from_env()?;
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_json(&read_file(path)?)?,
        None => Catalog::new(),
    };
    let initial = match &args.restore {
        Some(path) => persist::decode(&read_file(path)?)?,
        None => Vec::new(),
    };

    let mut stage = Stage::open(config, catalog, Box::new(MemoryPreviews::new()), initial);
    stage.set_canvas_size(args.width, args.height);
    let mut replay = Replay::new(stage);

    let reader = open_input(&args.input)?;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| CliError::Io { context: "read script".to_owned(), source })?;
        if let Some(event) = parse_line(index + 1, &line)? {
            replay.apply(index + 1, event)?;
        }
    }

    let (events, actions, commits) = replay.counts();
    tracing::info!(events, actions, commits, stickers = replay.stage().store().len(), "replay complete");

    let saved = replay.into_stage().close();
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&saved).map_err(PersistError::from)?
    } else {
        persist::encode(&saved)?
    };
    println!("{rendered}");
    Ok(())
}

fn run_check(args: &CheckArgs) -> Result<(), CliError> {
    let mut raw = String::new();
    open_input(&args.input)?
        .read_to_string(&mut raw)
        .map_err(|source| CliError::Io { context: "read input".to_owned(), source })?;
    let records = persist::decode(&raw)?;

    let mut counts = [0_usize; 4];
    for record in &records {
        let slot = match record.kind {
            PersistedKind::Predefined { .. } => 0,
            PersistedKind::CustomImage { .. } => 1,
            PersistedKind::CustomText { .. } => 2,
            PersistedKind::ImageToUpload { .. } => 3,
        };
        counts[slot] += 1;
    }
    let config = DecorConfig::from_env()?;
    let before = records.clone();
    let restored = persist::restore(records, &config);
    let repaired = before
        .iter()
        .zip(&restored)
        .filter(|(record, sticker)| {
            record.uuid != sticker.id
                || record.pos_x.to_bits() != sticker.pos_x.to_bits()
                || record.pos_y.to_bits() != sticker.pos_y.to_bits()
                || record.size.to_bits() != sticker.scale.to_bits()
                || record.rotation.to_bits() != sticker.rotation.to_bits()
        })
        .count();

    println!(
        "stickers={} predefined={} custom_image={} custom_text={} image_to_upload={} repaired={}",
        before.len(),
        counts[0],
        counts[1],
        counts[2],
        counts[3],
        repaired
    );
    Ok(())
}

fn open_input(path: &str) -> Result<Box<dyn BufRead>, CliError> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|source| CliError::Io { context: format!("open {path}"), source })?;
    Ok(Box::new(BufReader::new(file)))
}

fn read_file(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io { context: format!("read {path}"), source })
}
