mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger,
};
use std::fs;

use bioassay_fetch::{BatchFetcher, HttpTableSource};
use cli::Cli;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Failed to get base directories"))?
        .data_local_dir()
        .join("bioassay-fetch")
        .join("logs");

    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let log_file = log_dir.join(format!(
        "fetch_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .set_location_level(LevelFilter::Debug)
        .build();

    let file_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Warn,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
        WriteLogger::new(file_level, config, fs::File::create(log_file)?),
    ])?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    info!("bioassay-fetch starting");

    let config = cli.resolve_config()?;
    info!("Input: {:?}", config.input_path);
    info!("Base URL: {}", config.base_url);
    info!("Output directory: {:?}", config.output_dir);

    let source = HttpTableSource::new().context("Failed to build HTTP client")?;
    let fetcher = BatchFetcher::new(config, source, cli.dry_run)?;

    match fetcher.run() {
        Ok(report) => {
            info!("{} of {} records written", report.written.len(), report.total);
            Ok(())
        }
        Err(e) => {
            error!("fetch failed: {}", e);
            std::process::exit(1);
        }
    }
}
