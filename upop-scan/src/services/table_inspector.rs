//! vpxtool inspection client
//!
//! Extracts table metadata by running the `vpxtool` command-line helper:
//! - `vpxtool info <table>` prints labelled lines for one table
//! - `vpxtool index <dir>` writes `vpxtool_index.json` covering every table
//!
//! All process and parsing failures are reported as [`InspectError`]; callers
//! decide whether a failure skips one table or aborts a pass.

use crate::models::metadata::non_blank;
use crate::models::ExtractedMetadata;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

/// File written by `vpxtool index` inside the indexed directory
pub const INDEX_FILE_NAME: &str = "vpxtool_index.json";

/// Inspection errors
#[derive(Debug, Error)]
pub enum InspectError {
    /// vpxtool binary could not be found
    #[error("vpxtool binary not found: {0}")]
    HelperNotFound(PathBuf),

    /// Table file does not exist, so the helper was not started
    #[error("Table file not found: {0}")]
    FileNotFound(PathBuf),

    /// Failed to start the helper process
    #[error("Failed to execute vpxtool: {0}")]
    ExecutionError(String),

    /// Helper ran but reported failure
    #[error("vpxtool exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// Helper output contained nothing recognizable
    #[error("Unrecognized vpxtool output: {0}")]
    Unparseable(String),

    /// `index` exited cleanly without reporting any indexed tables
    #[error("vpxtool index did not confirm indexing: {0:?}")]
    IndexNotConfirmed(String),

    /// `index` succeeded but left no index file behind
    #[error("Index file missing: {0}")]
    IndexMissing(PathBuf),

    /// Index file exists but cannot be decoded
    #[error("Malformed index {path}: {message}")]
    MalformedIndex { path: PathBuf, message: String },

    /// I/O error (index read)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl InspectError {
    /// Errors that make every record of a batch untrustworthy
    pub fn is_fatal(&self) -> bool {
        matches!(self, InspectError::MalformedIndex { .. })
    }
}

/// One table listed by a batch index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTable {
    /// Path relative to the indexed directory, `/`-separated
    pub path: String,
    pub metadata: ExtractedMetadata,
}

/// Source of table metadata
///
/// Implemented by [`VpxTool`]; tests substitute canned implementations.
pub trait TableInspector {
    /// Metadata for one table file, `file` being relative to `table_dir`
    fn describe(&self, table_dir: &Path, file: &str) -> Result<ExtractedMetadata, InspectError>;

    /// Metadata for every table under `table_dir`
    fn index_all(&self, table_dir: &Path) -> Result<Vec<IndexedTable>, InspectError>;
}

/// Process-backed inspector
///
/// Arguments are passed as a vector, never through a shell, so quotes,
/// parentheses and spaces in table names reach vpxtool unmodified.
#[derive(Debug, Clone)]
pub struct VpxTool {
    binary_path: PathBuf,
}

impl VpxTool {
    /// Create client for the given vpxtool executable
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Check if vpxtool can be started
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .is_ok()
    }

    /// Run vpxtool with `args`, blocking until it exits
    fn run(&self, args: &[&OsStr]) -> Result<Output, InspectError> {
        tracing::debug!(
            binary = %self.binary_path.display(),
            args = ?args,
            "Running vpxtool"
        );

        let output = Command::new(&self.binary_path)
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InspectError::HelperNotFound(self.binary_path.clone())
                } else {
                    InspectError::ExecutionError(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(InspectError::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(output)
    }
}

impl TableInspector for VpxTool {
    fn describe(&self, table_dir: &Path, file: &str) -> Result<ExtractedMetadata, InspectError> {
        let table_path = table_dir.join(file);
        if !table_path.is_file() {
            return Err(InspectError::FileNotFound(table_path));
        }

        let output = self.run(&[OsStr::new("info"), table_path.as_os_str()])?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let metadata = parse_info_output(&stdout)?;

        tracing::debug!(
            table = %file,
            title = ?metadata.title,
            version = ?metadata.version,
            "vpxtool info completed"
        );

        Ok(metadata)
    }

    fn index_all(&self, table_dir: &Path) -> Result<Vec<IndexedTable>, InspectError> {
        let index_path = table_dir.join(INDEX_FILE_NAME);

        // Only an index written by this run may be read
        match std::fs::remove_file(&index_path) {
            Ok(()) => tracing::debug!(path = %index_path.display(), "Removed previous index"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(InspectError::IoError(e)),
        }

        let output = self.run(&[OsStr::new("index"), table_dir.as_os_str()])?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.contains("Indexed") {
            let preview: String = stdout.trim().chars().take(120).collect();
            return Err(InspectError::IndexNotConfirmed(preview));
        }

        if !index_path.is_file() {
            return Err(InspectError::IndexMissing(index_path));
        }

        let json = std::fs::read(&index_path)?;
        let tables = decode_index(&json, table_dir).map_err(|message| {
            InspectError::MalformedIndex {
                path: index_path.clone(),
                message,
            }
        })?;

        tracing::info!(
            dir = %table_dir.display(),
            tables = tables.len(),
            "vpxtool index decoded"
        );

        Ok(tables)
    }
}

/// Field a `vpxtool info` label maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfoLabel {
    VpxVersion,
    TableName,
    Version,
    ReleaseDate,
    Author,
    Description,
    Rules,
}

impl InfoLabel {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "VPX Version" => Some(InfoLabel::VpxVersion),
            "Table Name" => Some(InfoLabel::TableName),
            "Version" | "Table Version" => Some(InfoLabel::Version),
            "Release Date" => Some(InfoLabel::ReleaseDate),
            "Author" | "Authors" | "Author Name" => Some(InfoLabel::Author),
            "Description" | "Table Description" => Some(InfoLabel::Description),
            "Rules" | "Table Rules" => Some(InfoLabel::Rules),
            _ => None,
        }
    }
}

/// Parse `vpxtool info` output
///
/// Each line is split at its first `:`; the text before it must equal a known
/// label exactly, so `VPX Version:` never shadows `Version:`. `Rules:` takes
/// the rest of its line and every following line.
pub fn parse_info_output(output: &str) -> Result<ExtractedMetadata, InspectError> {
    let mut metadata = ExtractedMetadata::default();
    let mut recognized = 0usize;

    let lines: Vec<&str> = output.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = InfoLabel::from_label(label.trim()) else {
            continue;
        };
        recognized += 1;

        let value = Some(value.trim().to_string());
        match field {
            InfoLabel::VpxVersion => metadata.vpx_version = non_blank(value),
            InfoLabel::TableName => metadata.title = non_blank(value),
            InfoLabel::Version => metadata.version = non_blank(value),
            InfoLabel::ReleaseDate => metadata.release_date = non_blank(value),
            InfoLabel::Author => metadata.author = non_blank(value),
            InfoLabel::Description => metadata.description = non_blank(value),
            InfoLabel::Rules => {
                let mut rules = vec![value.unwrap_or_default()];
                rules.extend(lines[idx + 1..].iter().map(|l| l.to_string()));
                metadata.rules = non_blank(Some(rules.join("\n")));
                break;
            }
        }
    }

    if recognized == 0 {
        let preview: String = output.trim().chars().take(120).collect();
        return Err(InspectError::Unparseable(preview));
    }

    Ok(metadata)
}

#[derive(Debug, Deserialize)]
struct IndexDocument {
    #[serde(default)]
    tables: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    table_info: Option<IndexTableInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IndexTableInfo {
    table_name: Option<String>,
    author_name: Option<String>,
    table_version: Option<String>,
    release_date: Option<String>,
    table_description: Option<String>,
    table_rules: Option<String>,
}

impl From<IndexTableInfo> for ExtractedMetadata {
    fn from(info: IndexTableInfo) -> Self {
        ExtractedMetadata {
            vpx_version: None,
            title: non_blank(info.table_name),
            version: non_blank(info.table_version),
            release_date: non_blank(info.release_date),
            author: non_blank(info.author_name),
            description: non_blank(info.table_description),
            rules: non_blank(info.table_rules.map(|r| r.replace("\r\n", "\n"))),
        }
    }
}

/// Decode a `vpxtool_index.json` document
///
/// Invalid UTF-8 is a decode failure like any other malformed JSON.
/// Entries without a path are skipped. Paths are made relative to
/// `table_dir` where possible.
pub fn decode_index(json: &[u8], table_dir: &Path) -> Result<Vec<IndexedTable>, String> {
    let document: IndexDocument = serde_json::from_slice(json).map_err(|e| e.to_string())?;

    let mut tables = Vec::with_capacity(document.tables.len());
    for entry in document.tables {
        let Some(path) = entry.path.filter(|p| !p.trim().is_empty()) else {
            tracing::warn!("Index entry without path, skipping");
            continue;
        };

        tables.push(IndexedTable {
            path: relative_key(table_dir, &path),
            metadata: entry.table_info.unwrap_or_default().into(),
        });
    }

    Ok(tables)
}

/// `path` relative to `table_dir` with `/` separators
///
/// Absolute paths outside `table_dir` reduce to their file name.
pub fn relative_key(table_dir: &Path, path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let candidate = Path::new(&normalized);

    let relative = if candidate.is_absolute() {
        let canonical_dir = table_dir.canonicalize().ok();
        candidate
            .strip_prefix(table_dir)
            .ok()
            .or_else(|| {
                canonical_dir
                    .as_deref()
                    .and_then(|dir| candidate.strip_prefix(dir).ok())
            })
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| {
                candidate
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| normalized.clone())
            })
    } else {
        normalized.clone()
    };

    relative
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_OUTPUT: &str = "\
VPX Version: 10.8.0
Table Name: 8 Ball
Version: 1.2.1
Author: Loserman76
Release Date: 2023-04-01
Description: Classic Williams EM
Rules: Shoot the eight ball
Hit targets 1 through 7 to light the 8-ball
Version: not a label any more
";

    #[test]
    fn test_info_output_parsing() {
        let metadata = parse_info_output(INFO_OUTPUT).unwrap();

        assert_eq!(metadata.vpx_version.as_deref(), Some("10.8.0"));
        assert_eq!(metadata.title.as_deref(), Some("8 Ball"));
        assert_eq!(metadata.version.as_deref(), Some("1.2.1"));
        assert_eq!(metadata.author.as_deref(), Some("Loserman76"));
        assert_eq!(metadata.release_date.as_deref(), Some("2023-04-01"));
        assert_eq!(metadata.description.as_deref(), Some("Classic Williams EM"));
    }

    #[test]
    fn test_rules_consume_remaining_lines() {
        let metadata = parse_info_output(INFO_OUTPUT).unwrap();

        assert_eq!(
            metadata.rules.as_deref(),
            Some(
                "Shoot the eight ball\n\
                 Hit targets 1 through 7 to light the 8-ball\n\
                 Version: not a label any more"
            )
        );
        // The line after Rules: did not overwrite the version
        assert_eq!(metadata.version.as_deref(), Some("1.2.1"));
    }

    #[test]
    fn test_vpx_version_does_not_shadow_version() {
        let metadata = parse_info_output("VPX Version: 10.7.3\n").unwrap();
        assert_eq!(metadata.vpx_version.as_deref(), Some("10.7.3"));
        assert_eq!(metadata.version, None);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let metadata = parse_info_output("Table Name:   \nVersion: 2.0\n").unwrap();
        assert_eq!(metadata.title, None);
        assert_eq!(metadata.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_value_may_contain_colons() {
        let metadata = parse_info_output("Table Name: Star Trek: The Next Generation\n").unwrap();
        assert_eq!(
            metadata.title.as_deref(),
            Some("Star Trek: The Next Generation")
        );
    }

    #[test]
    fn test_unrecognized_output_is_error() {
        let result = parse_info_output("thread 'main' panicked at 'bad file'\n");
        assert!(matches!(result, Err(InspectError::Unparseable(_))));

        assert!(matches!(
            parse_info_output(""),
            Err(InspectError::Unparseable(_))
        ));
    }

    #[test]
    fn test_index_decoding() {
        let json = r#"{
            "tables": [
                {
                    "path": "/pinball/tables/8 Ball (Williams 1966) 1.2.1.vpx",
                    "table_info": {
                        "table_name": "8 Ball",
                        "author_name": "Loserman76",
                        "table_version": "1.2.1",
                        "release_date": "2023-04-01",
                        "table_description": null,
                        "table_rules": "Line one\r\nLine two"
                    },
                    "last_modified": "2024-01-01T00:00:00Z"
                },
                {
                    "path": "Bally/Xenon (Bally 1980).vpx",
                    "table_info": {}
                },
                {
                    "table_info": { "table_name": "No path" }
                }
            ]
        }"#;

        let tables = decode_index(json.as_bytes(), Path::new("/pinball/tables")).unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].path, "8 Ball (Williams 1966) 1.2.1.vpx");
        assert_eq!(tables[0].metadata.title.as_deref(), Some("8 Ball"));
        assert_eq!(tables[0].metadata.author.as_deref(), Some("Loserman76"));
        assert_eq!(tables[0].metadata.description, None);
        assert_eq!(tables[0].metadata.rules.as_deref(), Some("Line one\nLine two"));

        assert_eq!(tables[1].path, "Bally/Xenon (Bally 1980).vpx");
        assert!(tables[1].metadata.is_empty());
    }

    #[test]
    fn test_index_without_tables_key_is_empty() {
        let tables = decode_index(b"{}", Path::new("/pinball/tables")).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_malformed_index_is_error() {
        assert!(decode_index(b"{\"tables\": [", Path::new("/t")).is_err());
        assert!(decode_index(b"{\"tables\": 7}", Path::new("/t")).is_err());
    }

    #[test]
    fn test_non_utf8_index_is_malformed() {
        let bytes = b"{\"tables\":[{\"path\":\"\xff\xfe\"}]}";
        assert!(decode_index(bytes, Path::new("/t")).is_err());
    }

    #[test]
    fn test_relative_key() {
        let dir = Path::new("/pinball/tables");
        assert_eq!(relative_key(dir, "/pinball/tables/a/b.vpx"), "a/b.vpx");
        assert_eq!(relative_key(dir, "./b.vpx"), "b.vpx");
        assert_eq!(relative_key(dir, "a\\b.vpx"), "a/b.vpx");
        assert_eq!(relative_key(dir, "/elsewhere/c.vpx"), "c.vpx");
    }

    #[test]
    fn test_missing_table_file_is_distinct_error() {
        let tool = VpxTool::new("vpxtool-that-does-not-exist");
        let temp_dir = tempfile::TempDir::new().unwrap();

        let result = tool.describe(temp_dir.path(), "Missing (Nobody 1900).vpx");
        assert!(matches!(result, Err(InspectError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_helper_is_distinct_error() {
        let tool = VpxTool::new("vpxtool-that-does-not-exist");
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("t.vpx"), b"").unwrap();

        let result = tool.describe(temp_dir.path(), "t.vpx");
        assert!(matches!(result, Err(InspectError::HelperNotFound(_))));
        assert!(!tool.is_available());
    }

    #[test]
    fn test_only_malformed_index_is_fatal() {
        assert!(InspectError::MalformedIndex {
            path: PathBuf::from("x"),
            message: "bad".to_string()
        }
        .is_fatal());
        assert!(!InspectError::IndexMissing(PathBuf::from("x")).is_fatal());
        assert!(!InspectError::IndexNotConfirmed(String::new()).is_fatal());
        assert!(!InspectError::NonZeroExit {
            code: Some(1),
            stderr: String::new()
        }
        .is_fatal());
    }
}
