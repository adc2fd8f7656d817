//! Configuration resolution for upop-scan
//!
//! Each setting is taken from the first tier that provides it:
//! command line / environment (merged by the argument parser) → TOML config
//! → compiled default.

use crate::services::file_scanner::TABLE_EXTENSION;
use crate::services::{ScanOptions, ScanPaths};
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::debug;
use upop_common::config::{validate_threshold, CompiledDefaults, ExtractionMode, TomlConfig};
use upop_common::Result;

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub table_path: Option<PathBuf>,
    pub asset_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub vpxtool_path: Option<PathBuf>,
    pub extraction_mode: Option<ExtractionMode>,
    pub match_threshold: Option<f64>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub paths: ScanPaths,
    pub options: ScanOptions,
    pub vpxtool_path: PathBuf,
    pub log_level: String,
}

impl ScanSettings {
    /// Resolve every setting across the three tiers
    ///
    /// Without an explicit artwork folder, `wheels` inside the resolved table
    /// folder is used.
    pub fn resolve(
        cli: &CliOverrides,
        toml: &TomlConfig,
        defaults: &CompiledDefaults,
    ) -> Result<Self> {
        let table_dir = pick(
            "table_path",
            cli.table_path.clone(),
            toml.table_path.clone(),
            defaults.table_path.clone(),
        );

        let asset_dir = pick(
            "asset_path",
            cli.asset_path.clone(),
            toml.asset_path.clone(),
            table_dir.join("wheels"),
        );

        let catalog_path = pick(
            "catalog_path",
            cli.catalog_path.clone(),
            toml.catalog_path.clone(),
            defaults.catalog_path.clone(),
        );

        let vpxtool_path = pick(
            "vpxtool_path",
            cli.vpxtool_path.clone(),
            toml.vpxtool_path.clone(),
            defaults.vpxtool_path.clone(),
        );

        let extraction_mode = pick(
            "extraction_mode",
            cli.extraction_mode,
            toml.extraction_mode,
            defaults.extraction_mode,
        );

        let match_threshold = pick(
            "match_threshold",
            cli.match_threshold,
            toml.match_threshold,
            defaults.match_threshold,
        );
        validate_threshold(match_threshold)?;

        Ok(Self {
            paths: ScanPaths {
                table_dir,
                asset_dir,
                catalog_path,
            },
            options: ScanOptions {
                extraction_mode,
                match_threshold,
                content_extension: TABLE_EXTENSION.to_string(),
            },
            vpxtool_path,
            log_level: toml.logging.level.clone(),
        })
    }

    /// Tracing filter directives for the configured log level
    pub fn log_directives(&self) -> String {
        let level = &self.log_level;
        format!("upop_scan={level},upop_common={level}")
    }
}

fn pick<T: Debug>(name: &str, cli: Option<T>, toml: Option<T>, default: T) -> T {
    if let Some(value) = cli {
        debug!(setting = name, ?value, "Using command line / environment value");
        value
    } else if let Some(value) = toml {
        debug!(setting = name, ?value, "Using TOML config value");
        value
    } else {
        debug!(setting = name, value = ?default, "Using compiled default");
        default
    }
}
