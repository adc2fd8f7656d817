//! upop-scan - Table catalog scanner
//!
//! Scans a folder of Visual Pinball tables, extracts metadata with vpxtool,
//! matches wheel artwork and reconciles the result into `upopdb.csv`.

use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};
use upop_common::config::{load_or_default, resolve_config_path, CompiledDefaults, ExtractionMode};
use upop_scan::config::{CliOverrides, ScanSettings};
use upop_scan::services::VpxTool;
use upop_scan::Reconciler;

/// Command-line arguments for upop-scan
#[derive(Parser, Debug)]
#[command(name = "upop-scan")]
#[command(about = "Catalog Visual Pinball tables into upopdb.csv")]
#[command(version)]
struct Args {
    /// Folder containing .vpx table files
    #[arg(short, long, env = "UPOP_TABLE_PATH")]
    tables: Option<PathBuf>,

    /// Folder containing wheel images
    #[arg(short, long, env = "UPOP_ASSET_PATH")]
    assets: Option<PathBuf>,

    /// vpxtool executable
    #[arg(long, env = "UPOP_VPXTOOL")]
    vpxtool: Option<PathBuf>,

    /// Catalog file to update
    #[arg(short, long, env = "UPOP_CATALOG")]
    catalog: Option<PathBuf>,

    /// Metadata extraction mode: batch or per-file
    #[arg(short, long, env = "UPOP_EXTRACTION_MODE")]
    mode: Option<ExtractionMode>,

    /// Minimum artwork similarity score (0-100)
    #[arg(long, env = "UPOP_MATCH_THRESHOLD")]
    threshold: Option<f64>,

    /// Config file (default: <config dir>/upop/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the scan report as JSON
    #[arg(long)]
    json: bool,

    /// Scan only this table file (relative to the table folder)
    table: Option<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            table_path: self.tables.clone(),
            asset_path: self.assets.clone(),
            catalog_path: self.catalog.clone(),
            vpxtool_path: self.vpxtool.clone(),
            extraction_mode: self.mode,
            match_threshold: self.threshold,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise start at info and switch to the configured
    // level once the config file has been read
    let env_filter = EnvFilter::try_from_default_env().ok();
    let level_from_env = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| EnvFilter::new("upop_scan=info,upop_common=info")),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config =
        load_or_default(config_path.as_deref()).context("Failed to load configuration")?;

    let settings = ScanSettings::resolve(
        &args.overrides(),
        &toml_config,
        &CompiledDefaults::for_current_platform(),
    )
    .context("Invalid configuration")?;

    if !level_from_env {
        filter_handle
            .reload(EnvFilter::new(settings.log_directives()))
            .context("Failed to apply log level")?;
    }

    info!("Table folder: {}", settings.paths.table_dir.display());
    info!("Artwork folder: {}", settings.paths.asset_dir.display());
    info!("Catalog: {}", settings.paths.catalog_path.display());

    let inspector = VpxTool::new(settings.vpxtool_path.clone());
    if !inspector.is_available() {
        warn!(
            vpxtool = %settings.vpxtool_path.display(),
            "vpxtool not available, tables will be cataloged from their file names"
        );
    }

    let reconciler = Reconciler::new(inspector, settings.paths.clone(), settings.options.clone());

    let report = match &args.table {
        Some(table) => reconciler
            .scan_one(table)
            .with_context(|| format!("Failed to scan {}", table))?,
        None => reconciler
            .scan_all_with_progress(|progress| {
                info!(
                    "[{}/{}] {} ({:?})",
                    progress.completed, progress.total, progress.content_file_name, progress.outcome
                );
                ControlFlow::Continue(())
            })
            .context("Catalog scan failed")?,
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        );
    } else {
        println!("{}", report);
    }

    Ok(())
}
