use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use textdex::index::stats::show_stats;
use textdex::{Encoding, IndexConfig, IndexProgress, TextFileAccessor};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "textdex")]
#[command(about = "Random access to large text files by character or line number")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Character encoding of the file
    #[arg(short, long, default_value = "UTF-8", global = true)]
    encoding: String,

    /// JSON file with indexing options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads for indexing (0 = all cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    /// Skip a leading byte-order mark matching the encoding
    #[arg(long, global = true)]
    skip_bom: bool,

    /// Log indexing progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show index statistics
    Stats {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the byte offset of a character
    Char { file: PathBuf, n: u64 },
    /// Print the byte offset of a line
    Line {
        file: PathBuf,
        n: u64,

        /// Also print the line's text
        #[arg(short, long)]
        print: bool,
    },
    /// Print the text from a byte offset to the end of its line
    Seek { file: PathBuf, byte: u64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Stats { file, json } => {
            let accessor = open_accessor(&cli, file)?;
            show_stats(&accessor, *json)?;
        }
        Commands::Char { file, n } => {
            let accessor = open_accessor(&cli, file)?;
            let position = accessor
                .file_position_at_char(*n)
                .with_context(|| format!("failed to locate character {}", n))?;
            println!("{}", position);
        }
        Commands::Line { file, n, print } => {
            let accessor = open_accessor(&cli, file)?;
            let position = accessor
                .file_position_at_line(*n)
                .with_context(|| format!("failed to locate line {}", n))?;
            if *print {
                println!("{}\t{}", position, accessor.read_line(*n)?);
            } else {
                println!("{}", position);
            }
        }
        Commands::Seek { file, byte } => {
            let accessor = open_accessor(&cli, file)?;
            let mut reader = accessor
                .reader_at_file_position(*byte)
                .with_context(|| format!("failed to open reader at byte {}", byte))?;
            let mut line = String::new();
            reader.read_line(&mut line)?;
            println!("{}", line.trim_end_matches(['\r', '\n']));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "textdex=info" } else { "textdex=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve options from the command line and index `file`
fn open_accessor(cli: &Cli, file: &Path) -> Result<TextFileAccessor> {
    let encoding = Encoding::from_name(&cli.encoding)?;

    let mut config = match &cli.config {
        Some(path) => IndexConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => IndexConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config = config.with_worker_threads(threads);
    }
    if cli.skip_bom {
        let skip = config.header_skip_bytes.max(bom_len(file, encoding)?);
        config = config.with_header_skip(skip);
    }

    let progress = if cli.verbose {
        IndexProgress::bar()
    } else {
        IndexProgress::hidden()
    };

    TextFileAccessor::open_with_progress(file, encoding, config, progress)
        .with_context(|| format!("failed to index {}", file.display()))
}

fn bom_len(file: &Path, encoding: Encoding) -> Result<u64> {
    let mut prefix = Vec::with_capacity(4);
    File::open(file)
        .with_context(|| format!("cannot open {}", file.display()))?
        .take(4)
        .read_to_end(&mut prefix)?;
    Ok(encoding.detect_bom_len(&prefix))
}
