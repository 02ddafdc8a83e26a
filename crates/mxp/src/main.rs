//! MatrixPipe - Main Entry Point
//!
//! Applies the matrix operations listed in a configuration file to an input
//! matrix and writes the result.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use mxp_pipeline::{run, RunOptions};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// MatrixPipe - run a configured chain of matrix operations
#[derive(Parser, Debug)]
#[command(name = "mxp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file with one `<operation> <operand-file>` per line
    #[arg(value_name = "CONFIG")]
    config: Utf8PathBuf,

    /// Matrix the pipeline starts from
    #[arg(value_name = "INPUT")]
    input: Utf8PathBuf,

    /// Where the resulting matrix is written
    #[arg(value_name = "OUTPUT")]
    output: Utf8PathBuf,

    /// Directory that relative operand files are resolved against
    #[arg(long, value_name = "DIR")]
    operand_dir: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut options = RunOptions::new();
    if let Some(dir) = cli.operand_dir {
        options = options.operand_dir(dir);
    }

    run(&cli.config, &cli.input, &cli.output, &options)
        .with_context(|| format!("pipeline {} failed", cli.config))?;
    Ok(())
}
