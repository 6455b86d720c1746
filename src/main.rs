//! bedcompress: sliding-window compression of sorted BED files
//!
//! Usage: bedcompress -i <FILE|-> -w <SIZE> [OPTIONS]

use clap::Parser;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use bedcompress::bed::BedError;
use bedcompress::config::DEFAULT_SCORE_COLUMN;
use bedcompress::{WindowCompressor, WindowConfig, WindowStats};

/// File name of the staged stdin copy inside `--tmpdir`.
const STAGED_INPUT_NAME: &str = "streamInput.bed";

#[derive(Parser)]
#[command(name = "bedcompress")]
#[command(author = "Manish Kumar Bobbili")]
#[command(version)]
#[command(about = "Compress a sorted BED file into per-window score summaries", long_about = None)]
struct Cli {
    /// Input BED file sorted by chromosome and start (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Window size in bases
    #[arg(short = 'w', long = "window-size")]
    window_size: u64,

    /// Step between window starts (default: window size)
    #[arg(short = 's', long = "step-size")]
    step_size: Option<u64>,

    /// 1-based column holding the score (4 for bedGraph)
    #[arg(short = 'c', long = "score-column", default_value_t = DEFAULT_SCORE_COLUMN)]
    score_column: usize,

    /// Operation applied to the scores of each window
    /// (sum, count, mean, median, min, max, collapse, distinct, stddev, ...)
    #[arg(short = 'o', long = "ops", default_value = "sum")]
    ops: String,

    /// Separator for the collapse operation
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Fixed number of decimals for floating-point results
    #[arg(long)]
    precision: Option<usize>,

    /// Widen zero-length records (start == end) to 1bp instead of rejecting them
    #[arg(long)]
    bedtools_compatible: bool,

    /// Stage stdin into this directory (as streamInput.bed) and keep it
    #[arg(long)]
    tmpdir: Option<PathBuf>,

    /// Print compression statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn build_config(cli: &Cli) -> Result<WindowConfig, BedError> {
    let mut config = WindowConfig::new(cli.window_size)
        .with_score_column(cli.score_column)
        .with_operation_name(&cli.ops)?
        .with_delimiter(cli.delimiter.clone())
        .with_precision(cli.precision)
        .with_bedtools_compatible(cli.bedtools_compatible);
    if let Some(step) = cli.step_size {
        config = config.with_step(step);
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<(), BedError> {
    let config = build_config(&cli)?;
    log::info!(
        "window {} step {} op {} column {}",
        config.window_size,
        config.step(),
        config.operation,
        config.score_column
    );
    let compressor = WindowCompressor::new(config)?;

    let stdout = io::stdout();
    let handle = stdout.lock();

    let from_stdin = cli.input.to_string_lossy() == "-";
    let stats = match (&cli.tmpdir, from_stdin) {
        (Some(dir), true) => {
            let staged = stage_stdin(dir)?;
            compressor.run_path(&staged, handle)?
        }
        (_, true) => compressor.run_stdin(handle)?,
        (_, false) => compressor.run_path(&cli.input, handle)?,
    };

    if cli.stats {
        report(&stats);
    }
    Ok(())
}

/// Copy stdin into `<dir>/streamInput.bed`, creating `dir` if needed.
fn stage_stdin(dir: &Path) -> Result<PathBuf, BedError> {
    if dir.is_file() {
        return Err(BedError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("tmpdir '{}' exists and is not a directory", dir.display()),
        )));
    }
    fs::create_dir_all(dir)?;

    let path = dir.join(STAGED_INPUT_NAME);
    let mut staged = BufWriter::new(File::create(&path)?);
    let copied = io::copy(&mut io::stdin().lock(), &mut staged)?;
    staged.flush()?;
    log::info!("staged {} bytes of stdin to {}", copied, path.display());

    Ok(path)
}

fn report(stats: &WindowStats) {
    eprintln!("Window compression stats: {}", stats);
}
