//! Table and artwork file discovery
//!
//! Table files are found by a recursive walk of the table folder; wheel
//! images by a flat listing of the artwork folder. Both keep the order the
//! file system returns entries in.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Default table file extension
pub const TABLE_EXTENSION: &str = "vpx";

/// Extensions accepted as wheel artwork
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// File scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Path lies outside the scanned folder
    #[error("Path outside scanned folder: {0}")]
    OutsideRoot(PathBuf),

    /// Cannot access file
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

/// Table file scanner
#[derive(Debug, Clone)]
pub struct FileScanner {
    ignore_patterns: Vec<String>,
    extension: String,
    max_depth: Option<usize>,
}

impl FileScanner {
    /// Create new file scanner for `.vpx` tables
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git, and dot-files.
    pub fn new() -> Self {
        Self::with_extension(TABLE_EXTENSION)
    }

    /// Create scanner matching another table extension (case-insensitive)
    pub fn with_extension(extension: &str) -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
                "__MACOSX".to_string(),
            ],
            extension: extension.trim_start_matches('.').to_lowercase(),
            max_depth: None,
        }
    }

    /// Limit recursion depth (1 = only the folder itself)
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Recursively find table files under `root_path`
    ///
    /// Unreadable entries are logged and skipped; only a missing or
    /// non-directory root is an error.
    pub fn scan_tables(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let walker = WalkDir::new(root_path)
            .follow_links(true)
            .max_depth(self.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        let mut tables = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.is_table_file(entry.path()) {
                        tables.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    // Continue scanning, don't abort
                }
            }
        }

        tracing::debug!(
            root = %root_path.display(),
            tables = tables.len(),
            "Table scan complete"
        );

        Ok(tables)
    }

    /// List wheel image file names directly inside `asset_dir`
    ///
    /// A missing artwork folder only means nothing can be matched.
    pub fn scan_assets(&self, asset_dir: &Path) -> Vec<String> {
        let entries = match std::fs::read_dir(asset_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    dir = %asset_dir.display(),
                    error = %e,
                    "Artwork folder unreadable, no wheel images will be matched"
                );
                return Vec::new();
            }
        };

        let mut assets = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if name.starts_with('.') || !path.is_file() {
                continue;
            }
            if has_extension(&path, &IMAGE_EXTENSIONS) {
                assets.push(name);
            }
        }

        tracing::debug!(
            dir = %asset_dir.display(),
            assets = assets.len(),
            "Artwork scan complete"
        );

        assets
    }

    /// Catalog key for a discovered table: path relative to `root`, `/`-separated
    pub fn relative_name(&self, path: &Path, root: &Path) -> Result<String, ScanError> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| ScanError::OutsideRoot(path.to_path_buf()))?;

        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if name.is_empty() {
            return Err(ScanError::FileAccessError(
                path.to_path_buf(),
                "Path names the scanned folder itself".to_string(),
            ));
        }

        Ok(name)
    }

    /// Check if entry should be processed
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        // The root itself may legitimately be a dot-directory
        if entry.depth() == 0 {
            return true;
        }

        let file_name = entry.file_name().to_string_lossy();

        if file_name.starts_with('.') {
            return false;
        }

        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }

    fn is_table_file(&self, path: &Path) -> bool {
        has_extension(path, &[self.extension.as_str()])
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map_or(false, |ext| extensions.contains(&ext.as_str()))
}
