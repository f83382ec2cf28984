mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use id_text_locator::{CandidateStrategy, DetectorConfig, TextBox, TextDetector};

use crate::cli::Cli;

/// Per-image JSON report
#[derive(Debug, Serialize)]
struct ImageReport {
    path: PathBuf,
    width: u32,
    height: u32,
    scale: f64,
    strategy: CandidateStrategy,
    boxes: Vec<TextBox>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!(error = %err, "command failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            std::process::exit(1);
        }
    }
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<DetectorConfig> {
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match DetectorConfig::default_path().filter(|p| p.exists()) {
            Some(path) => {
                info!(path = %path.display(), "using default config file");
                DetectorConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
            }
            None => DetectorConfig::default(),
        },
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    Ok(config)
}

/// Returns whether every image was processed successfully
fn run(cli: &Cli) -> Result<bool> {
    let config = load_config(cli)?;
    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(true);
    }

    let detector = TextDetector::new(config).context("invalid detector config")?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.effective_jobs())
        .build_global()
        .context("failed to start worker pool")?;

    let progress = if cli.images.len() > 1 {
        let pb = ProgressBar::new(cli.images.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .context("invalid progress template")?,
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<(PathBuf, Result<ImageReport>)> = cli
        .images
        .par_iter()
        .map(|path| {
            let report = detect_file(&detector, path, cli.original_coords);
            progress.inc(1);
            (path.clone(), report)
        })
        .collect();
    progress.finish_and_clear();

    let mut reports = Vec::new();
    let mut all_ok = true;
    for (path, result) in results {
        match result {
            Ok(report) => {
                info!(path = %path.display(), boxes = report.boxes.len(), "detected");
                reports.push(report);
            }
            Err(err) => {
                error!(path = %path.display(), error = %format!("{err:#}"), "detection failed");
                all_ok = false;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(all_ok)
}

fn detect_file(detector: &TextDetector, path: &Path, original_coords: bool) -> Result<ImageReport> {
    let image =
        image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    let detection = detector.detect(&image)?;

    let (width, height, boxes) = if original_coords {
        (
            detection.original_width,
            detection.original_height,
            detection.to_original(),
        )
    } else {
        (detection.width, detection.height, detection.boxes.clone())
    };

    Ok(ImageReport {
        path: path.to_path_buf(),
        width,
        height,
        scale: detection.scale,
        strategy: detection.strategy,
        boxes,
    })
}
