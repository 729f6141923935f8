use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Review and repair extracted statement tables", long_about = None)]
pub struct Cli {
    /// Optional YAML file overriding the detection and history defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Flag summary (total/subtotal) rows using the local heuristics
    Detect(DetectArgs),
    /// Check every row's cell formats against a reference row
    Validate(ValidateArgs),
    /// Auto-correct rows that do not match a reference row's formats
    Correct(CorrectArgs),
    /// Print a table with summary rows marked
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Input JSON file with the extracted tables ('-' for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Only process this table (0-based); all tables by default
    #[arg(short, long)]
    pub table: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Input JSON file with the extracted tables ('-' for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Table to validate (0-based)
    #[arg(short, long, default_value_t = 0)]
    pub table: usize,
    /// Row (0-based) whose formats every other row must match
    #[arg(short, long)]
    pub reference: usize,
}

#[derive(Debug, Args)]
pub struct CorrectArgs {
    /// Input JSON file with the extracted tables ('-' for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Table to correct (0-based)
    #[arg(short, long, default_value_t = 0)]
    pub table: usize,
    /// Row (0-based) whose formats every other row must match
    #[arg(short, long)]
    pub reference: usize,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input JSON file with the extracted tables ('-' for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Only show this table (0-based); all tables by default
    #[arg(short, long)]
    pub table: Option<usize>,
    /// Maximum rows to print per table
    #[arg(long)]
    pub rows: Option<usize>,
}
