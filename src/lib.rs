pub mod cli;
pub mod columns;
pub mod command;
pub mod detect;
pub mod error;
pub mod filter;
pub mod keys;
pub mod model;
pub mod request;
pub mod value;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tablecast", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Detect(args) => handle_detect(&args),
        Commands::Parse(args) => handle_parse(&args),
        Commands::Plan(args) => handle_plan(&args),
    }
}

fn handle_detect(args: &cli::DetectArgs) -> Result<()> {
    info!(
        "Detecting format of '{}' (content analysis {})",
        args.input.display(),
        if args.no_content { "off" } else { "on" }
    );
    let report = detect::detect_format(&args.input, !args.no_content)
        .with_context(|| format!("Detecting format of {:?}", args.input))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn handle_parse(args: &cli::ParseArgs) -> Result<()> {
    let instruction = args.instruction.join(" ");
    let parsed = command::parse_command(&instruction);
    info!(
        "Parsed '{}' as {:?} at confidence {:.2}",
        instruction, parsed.action, parsed.confidence
    );
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

fn handle_plan(args: &cli::PlanArgs) -> Result<()> {
    let instruction = args.instruction.join(" ");
    let parsed = command::parse_command(&instruction);
    let request = command::to_conversion_request(&parsed)
        .with_context(|| format!("Building a conversion request from '{instruction}'"))?;
    info!(
        "Planned conversion of '{}' to {}",
        request.source_path, request.target_format
    );
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
