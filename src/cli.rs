use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer formats and plan tabular data conversions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect the format of a file from its extension and content
    Detect(DetectArgs),
    /// Parse a free-text instruction into a structured command
    Parse(ParseArgs),
    /// Parse an instruction and emit the resulting conversion request
    Plan(PlanArgs),
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// File to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Skip content sampling and rely on the extension alone
    #[arg(long = "no-content")]
    pub no_content: bool,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Instruction text, e.g. "convert data.csv to json"
    #[arg(required = true, num_args = 1..)]
    pub instruction: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Instruction text to turn into a conversion request
    #[arg(required = true, num_args = 1..)]
    pub instruction: Vec<String>,
}
