//! Configuration loading and compiled defaults
//!
//! Values are resolved per field in this order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by the binary's argument parser; this module
//! provides the file model (tier 3) and the defaults (tier 4).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "UPOP_CONFIG";

/// Default catalog file name, as read by the arcade front end
pub const CATALOG_FILE_NAME: &str = "upopdb.csv";

/// Default minimum similarity score (0-100) for artwork matches
pub const DEFAULT_MATCH_THRESHOLD: f64 = 50.0;

/// How table metadata is obtained from the inspection helper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// One `index` invocation covering the whole table directory
    #[default]
    Batch,
    /// One `info` invocation per table file
    PerFile,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Batch => write!(f, "batch"),
            ExtractionMode::PerFile => write!(f, "per-file"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" | "index" => Ok(ExtractionMode::Batch),
            "per-file" | "per_file" | "single" | "info" => Ok(ExtractionMode::PerFile),
            other => Err(Error::InvalidInput(format!(
                "Unknown extraction mode '{}' (expected 'batch' or 'per-file')",
                other
            ))),
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter level (overridden by RUST_LOG)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Contents of `config.toml`
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the `.vpx` table files
    pub table_path: Option<PathBuf>,
    /// Folder holding wheel artwork images
    pub asset_path: Option<PathBuf>,
    /// Catalog CSV file
    pub catalog_path: Option<PathBuf>,
    /// vpxtool executable
    pub vpxtool_path: Option<PathBuf>,
    /// Metadata extraction mode
    pub extraction_mode: Option<ExtractionMode>,
    /// Minimum artwork similarity score (0-100)
    pub match_threshold: Option<f64>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// OS-dependent fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub table_path: PathBuf,
    pub catalog_path: PathBuf,
    pub vpxtool_path: PathBuf,
    pub extraction_mode: ExtractionMode,
    pub match_threshold: f64,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        let table_path = dirs::home_dir()
            .map(|d| d.join("VPXTables"))
            .unwrap_or_else(|| PathBuf::from("./VPXTables"));

        let catalog_path = get_default_data_folder().join(CATALOG_FILE_NAME);

        let vpxtool_path = if cfg!(target_os = "windows") {
            PathBuf::from("vpxtool.exe")
        } else {
            PathBuf::from("vpxtool")
        };

        Self {
            table_path,
            catalog_path,
            vpxtool_path,
            extraction_mode: ExtractionMode::Batch,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Get OS-dependent default data folder path
fn get_default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/upop
        dirs::data_local_dir()
            .map(|d| d.join("upop"))
            .unwrap_or_else(|| PathBuf::from("./upop_data"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/upop
        dirs::data_dir()
            .map(|d| d.join("upop"))
            .unwrap_or_else(|| PathBuf::from("./upop_data"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\upop
        dirs::data_local_dir()
            .map(|d| d.join("upop"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\upop"))
    } else {
        PathBuf::from("./upop_data")
    }
}

/// Per-user config file location (`<config dir>/upop/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("upop").join("config.toml"))
}

/// Pick the config file: explicit argument, then `UPOP_CONFIG`, then the
/// per-user default location
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("Config file not found: {}", path.display()))
        } else {
            Error::Io(e)
        }
    })?;

    let config: TomlConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Load the config file if present
///
/// A missing file is not an error: a warning is logged and defaults are used.
/// A file that exists but cannot be parsed is reported, since silently
/// ignoring it would scan the wrong folders.
pub fn load_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config directory available on this platform, using defaults");
        return Ok(TomlConfig::default());
    };

    match load_toml_config(path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded config file");
            Ok(config)
        }
        Err(Error::NotFound(_)) => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(TomlConfig::default())
        }
        Err(e) => Err(Error::Config(format!(
            "Failed to load {}: {}",
            path.display(),
            e
        ))),
    }
}

fn validate(config: &TomlConfig) -> Result<()> {
    if let Some(threshold) = config.match_threshold {
        validate_threshold(threshold)?;
    }
    Ok(())
}

/// Similarity thresholds live on the 0-100 scale
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(Error::Config(format!(
            "match_threshold must be between 0 and 100, got {}",
            threshold
        )));
    }
    Ok(())
}
