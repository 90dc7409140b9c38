//! CLI entry point for the wget tool.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::{debug, info, warn};
use wget_core::download::BACKGROUND_LOG_FILE;
use wget_core::{HttpClient, Mode, RunConfig, TransferLog, download_batch};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Diagnostics go to stderr so they never mix with transfer output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = match RunConfig::resolve(&args.run_options()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {error}");
            warn!(error = %error, "invalid options, nothing transferred");
            return Ok(());
        }
    };

    if matches!(config.mode, Mode::Usage) {
        println!("Invalid usage. Pass a URL, -i FILE, or --mirror URL.\n");
        println!("{}", Args::command().render_usage());
        return Ok(());
    }

    let client = HttpClient::new().context("failed to initialise HTTP client")?;

    match config.mode {
        Mode::Usage => {}
        Mode::Single {
            request,
            background,
        } => {
            let mut log = if background {
                println!("Output will be written to '{BACKGROUND_LOG_FILE}'");
                match TransferLog::create(Path::new(BACKGROUND_LOG_FILE)) {
                    Ok(log) => log,
                    Err(error) => {
                        eprintln!("Error: cannot create {BACKGROUND_LOG_FILE}: {error}");
                        warn!(error = %error, "background log unavailable, nothing transferred");
                        return Ok(());
                    }
                }
            } else {
                TransferLog::stdout()
            };
            // Failures were already written to the log.
            if client.transfer(&request, &mut log).await.is_ok() {
                info!(path = %request.destination.display(), "download finished");
            }
        }
        Mode::Batch {
            input_file,
            download_dir,
        } => {
            let mut log = TransferLog::stdout();
            if let Ok(report) = download_batch(&client, &input_file, &download_dir, &mut log).await
            {
                info!(
                    completed = report.completed.len(),
                    failed = report.failed.len(),
                    total = report.total(),
                    "batch finished"
                );
            }
        }
        Mode::Mirror(job) => {
            let mut log = TransferLog::stdout();
            if let Ok(report) = job.run(&client, &mut log).await {
                info!(
                    index = %report.index_path.display(),
                    downloaded = report.downloaded.len(),
                    "mirror finished"
                );
            }
        }
    }

    Ok(())
}
