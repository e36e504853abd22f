use clap::{error::ErrorKind, Parser};
use std::{
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

mod config;
mod encoders;
mod engine;
mod error;
mod features;
mod models;
mod types;

use crate::{config::Config, error::AppError, types::PredictionResult};

/// Predicts a ride price from features read on stdin.
#[derive(Parser, Debug)]
#[command(name = "predict", version, about)]
struct Cli {
    /// Path to the serialized model
    model_path: PathBuf,
    /// Path to the serialized categorical encoders
    encoder_path: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => return emit(AppError::Usage.into_result()),
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => return emit(e.into_result()),
    };

    // stdout carries only the result line, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_filter))
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();

    let result = match read_input(config.max_input_bytes) {
        Ok(input) => engine::run(&cli.model_path, &cli.encoder_path, &input),
        Err(e) => e.into_result(),
    };
    emit(result)
}

fn read_input(limit: u64) -> Result<String, AppError> {
    let mut input = Vec::new();
    io::stdin().lock().take(limit.saturating_add(1)).read_to_end(&mut input)?;
    if input.len() as u64 > limit {
        return Err(AppError::InvalidInput(format!(
            "input exceeds {} bytes",
            limit
        )));
    }
    String::from_utf8(input)
        .map_err(|e| AppError::InvalidInput(format!("input is not valid UTF-8: {}", e)))
}

fn emit(result: PredictionResult) -> ExitCode {
    if result.success {
        println!("{}", result.to_json_line());
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", result.to_json_line());
        ExitCode::FAILURE
    }
}
