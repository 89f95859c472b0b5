//! CLI entry point for the transfer tool.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{debug, info};
use transfer_core::auth::load_runtime_cookie_jar;
use transfer_core::{ResultStatus, TransferOutcome, TransferRequest, TransferService};

mod app_config;
mod cli;

use app_config::{FileConfig, load_default_file_config};
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let file_config = load_default_file_config()?.unwrap_or_default();

    init_tracing(&cli, &file_config);
    debug!(?cli, "CLI arguments parsed");

    let mut service = TransferService::new(file_config.transport_config());
    if let Some(cookie_source) = cli.cookies.as_ref().or(file_config.cookies_file.as_ref()) {
        service = service.with_cookie_store(load_runtime_cookie_jar(cookie_source)?);
    }

    let outcome = match cli.command {
        Command::Upload(args) => {
            let mut request = TransferRequest::upload(args.source, args.server);
            request.file_key = args.file_key;
            request.file_name = args.file_name;
            request.mime_type = args.mime_type;
            request.extra_params = args
                .params
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            request.trust_all_certificates = args.trust_all_certificates;
            request.chunked_mode = args.chunked;
            TransferOutcome::from(service.transfer(&request).await)
        }
        Command::Download(args) => {
            let request = TransferRequest::download(args.source, args.target);
            TransferOutcome::from(service.transfer(&request).await)
        }
        Command::Invoke(args) => {
            let positional: Vec<Value> = serde_json::from_str(&args.args)
                .context("Invoke arguments must be a JSON array")?;
            service.execute(&args.action, &positional).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
    info!(status = ?outcome.status(), "Transfer finished");

    Ok(exit_code(outcome.status()))
}

/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > config verbosity > default (info)
fn init_tracing(cli: &Cli, file_config: &FileConfig) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => file_config
                .verbosity
                .map_or("info", |verbosity| verbosity.filter_level()),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the JSON outcome; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(status: ResultStatus) -> ExitCode {
    match status {
        ResultStatus::Ok => ExitCode::SUCCESS,
        ResultStatus::IoError => ExitCode::from(1),
        ResultStatus::MalformedRequest | ResultStatus::InvalidAction => ExitCode::from(2),
    }
}
