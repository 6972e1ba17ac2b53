//! Main entry point for the campsite availability scanner.
//! Loads the job file, then polls every query until interrupted, or checks
//! each one a single time with `--once`.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use campground_scan::scan_config::{self, CAMPSITES_ENV, LoadedQueries};
use clap::Parser;

mod scan_manager;

use scan_manager::ScanManager;

#[derive(Debug, Parser)]
#[command(name = "scanner", about = "Alert on campsite and permit availability")]
struct Cli {
    /// Job file, ignored when the CAMPSITES variable holds the jobs
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Check every query once and exit
    #[arg(long)]
    once: bool,
}

fn load_queries(cli: &Cli) -> Result<LoadedQueries> {
    let loaded = match env::var(CAMPSITES_ENV) {
        Ok(contents) if !contents.trim().is_empty() => {
            log::info!("Loading jobs from the {} variable", CAMPSITES_ENV);
            scan_config::load_from_str(&contents)?
        }
        _ => {
            log::info!("Loading jobs from {}", cli.config.display());
            scan_config::load_from_path(&cli.config)
                .with_context(|| format!("Cannot load {}", cli.config.display()))?
        }
    };

    for rejected in &loaded.rejected {
        log::error!(
            "Skipping {} entry {} from {}: {}",
            rejected.section,
            rejected.name.as_deref().unwrap_or("<unnamed>"),
            rejected.source,
            rejected.error
        );
    }

    Ok(loaded)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    log::info!("🏕️ Starting campsite scanner...");

    let queries = load_queries(&cli)?.queries;
    if queries.is_empty() {
        bail!("No valid job to run");
    }

    let mut manager = ScanManager::new(queries);

    if cli.once {
        let outcomes = manager.run_once().await?;
        log::info!("Single pass finished over {} jobs", outcomes.len());
        return Ok(());
    }

    manager.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    log::info!("Interrupt received, shutting down");

    manager.stop().await;
    Ok(())
}
