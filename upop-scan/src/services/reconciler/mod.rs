//! Table catalog reconciliation
//!
//! # Pass
//! ENUMERATE → EXTRACT → (per table: IDENTIFY → MERGE → MATCH ARTWORK → UPSERT) → SAVE
//!
//! Processing is sequential and synchronous. A failure to extract one
//! table's metadata never stops a pass: the table is cataloged from its file
//! name instead and counted in the [`ScanReport`]. The catalog is written
//! exactly once, after the last table.

use crate::models::ExtractedMetadata;
use crate::services::asset_matcher::AssetMatcher;
use crate::services::catalog_store::{CatalogError, CatalogStore, Upsert};
use crate::services::file_scanner::{FileScanner, ScanError, TABLE_EXTENSION};
use crate::services::filename_parser::parse_filename;
use crate::services::table_inspector::TableInspector;
use std::ops::ControlFlow;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use upop_common::config::{ExtractionMode, DEFAULT_MATCH_THRESHOLD};

mod extraction;
pub mod merge;
pub mod statistics;

use extraction::MetadataSource;
pub use statistics::ScanReport;

/// Folders and files a pass works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPaths {
    /// Folder holding the table files
    pub table_dir: PathBuf,
    /// Folder holding wheel images
    pub asset_dir: PathBuf,
    /// Catalog CSV file
    pub catalog_path: PathBuf,
}

/// Pass tuning
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub extraction_mode: ExtractionMode,
    /// Minimum artwork similarity score (0-100)
    pub match_threshold: f64,
    /// Table file extension, without the dot
    pub content_extension: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extraction_mode: ExtractionMode::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            content_extension: TABLE_EXTENSION.to_string(),
        }
    }
}

/// Reported to the progress callback after each table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Tables finished so far, including this one
    pub completed: usize,
    /// Tables discovered for this pass
    pub total: usize,
    /// Catalog key of the table just finished
    pub content_file_name: String,
    pub outcome: Upsert,
    /// Helper metadata was available for this table
    pub extracted: bool,
}

/// Errors that abort a pass
///
/// The catalog file is left as it was whenever one of these is returned.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Table folder missing or unreadable
    #[error("Cannot scan table folder: {0}")]
    TableDir(#[from] ScanError),

    /// Single-table pass named a file that does not exist
    #[error("Table file not found: {0}")]
    TableNotFound(PathBuf),

    /// Batch index was produced but cannot be trusted
    #[error("Malformed vpxtool index {path}: {message}")]
    MalformedIndex { path: PathBuf, message: String },

    /// Catalog could not be read or written
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Reconciliation engine
///
/// Owns the inspector and the resolved paths of one table collection. All
/// state of a pass (catalog rows, tallies) lives inside the call.
pub struct Reconciler<I: TableInspector> {
    inspector: I,
    paths: ScanPaths,
    options: ScanOptions,
    scanner: FileScanner,
    matcher: AssetMatcher,
}

impl<I: TableInspector> Reconciler<I> {
    /// Create new reconciler
    ///
    /// # Arguments
    /// * `inspector` - Metadata source (vpxtool, or a stub in tests)
    /// * `paths` - Table folder, artwork folder and catalog file
    /// * `options` - Extraction mode, match threshold, table extension
    pub fn new(inspector: I, paths: ScanPaths, options: ScanOptions) -> Self {
        let scanner = FileScanner::with_extension(&options.content_extension);
        let matcher = AssetMatcher::new(options.match_threshold);

        Self {
            inspector,
            paths,
            options,
            scanner,
            matcher,
        }
    }

    pub fn paths(&self) -> &ScanPaths {
        &self.paths
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn inspector(&self) -> &I {
        &self.inspector
    }

    /// Reconcile every table in the table folder
    pub fn scan_all(&self) -> Result<ScanReport, ReconcileError> {
        self.scan_all_with_progress(|_| ControlFlow::Continue(()))
    }

    /// Reconcile every table, reporting after each one
    ///
    /// Returning `ControlFlow::Break` from `on_progress` stops the pass
    /// before the next table. Tables already processed are still saved and
    /// the report is marked cancelled.
    pub fn scan_all_with_progress<F>(&self, mut on_progress: F) -> Result<ScanReport, ReconcileError>
    where
        F: FnMut(&ScanProgress) -> ControlFlow<()>,
    {
        let table_dir = &self.paths.table_dir;

        tracing::info!(
            tables = %table_dir.display(),
            mode = %self.options.extraction_mode,
            threshold = self.matcher.threshold(),
            "Starting catalog scan"
        );

        let keys = self.phase_enumerate()?;
        let mut catalog = CatalogStore::load(&self.paths.catalog_path)?;
        let source = self.phase_extraction(self.options.extraction_mode, keys.len())?;
        let assets = self.scanner.scan_assets(&self.paths.asset_dir);

        let mut report = ScanReport {
            discovered: keys.len(),
            ..Default::default()
        };

        for key in &keys {
            let progress = self.process_table(&mut catalog, &source, &assets, key, &mut report);

            if on_progress(&progress).is_break() {
                if report.processed < report.discovered {
                    report.cancelled = true;
                    tracing::info!(
                        processed = report.processed,
                        remaining = report.skipped(),
                        "Scan cancelled"
                    );
                }
                break;
            }
        }

        catalog.save(&self.paths.catalog_path)?;

        tracing::info!(%report, "Catalog scan complete");
        Ok(report)
    }

    /// Reconcile a single table, always through a per-file `describe`
    ///
    /// `file_name` is relative to the table folder or an absolute path inside
    /// it; either way the table is cataloged under the same key `scan_all`
    /// would use.
    pub fn scan_one(&self, file_name: &str) -> Result<ScanReport, ReconcileError> {
        let table_path = self.paths.table_dir.join(file_name);
        if !table_path.is_file() {
            return Err(ReconcileError::TableNotFound(table_path));
        }
        let key = self.table_key(&table_path)?;

        tracing::info!(table = %key, "Starting single-table scan");

        let mut catalog = CatalogStore::load(&self.paths.catalog_path)?;
        let assets = self.scanner.scan_assets(&self.paths.asset_dir);

        let mut report = ScanReport {
            discovered: 1,
            ..Default::default()
        };
        self.process_table(&mut catalog, &MetadataSource::PerFile, &assets, &key, &mut report);

        catalog.save(&self.paths.catalog_path)?;

        tracing::info!(%report, "Single-table scan complete");
        Ok(report)
    }

    /// Catalog key of an existing table file
    ///
    /// Compared lexically first; paths that climb with `..` or reach the
    /// folder through another route are compared canonically.
    fn table_key(&self, table_path: &Path) -> Result<String, ReconcileError> {
        let table_dir = &self.paths.table_dir;

        if let Ok(key) = self
            .scanner
            .relative_name(&without_cur_dir(table_path), &without_cur_dir(table_dir))
        {
            if !key.split('/').any(|part| part == "..") {
                return Ok(key);
            }
        }

        let canonical_path = canonical(table_path)?;
        let canonical_dir = canonical(table_dir)?;
        Ok(self.scanner.relative_name(&canonical_path, &canonical_dir)?)
    }

    /// Catalog keys of every table file, in enumeration order
    fn phase_enumerate(&self) -> Result<Vec<String>, ReconcileError> {
        let table_dir = &self.paths.table_dir;
        let paths = self.scanner.scan_tables(table_dir)?;

        let mut keys = Vec::with_capacity(paths.len());
        for path in paths {
            match self.scanner.relative_name(&path, table_dir) {
                Ok(key) => keys.push(key),
                Err(e) => tracing::warn!(error = %e, "Skipping table"),
            }
        }

        tracing::info!(count = keys.len(), "Table files discovered");
        Ok(keys)
    }

    /// Extract, identify, merge, match and upsert one table
    fn process_table(
        &self,
        catalog: &mut CatalogStore,
        source: &MetadataSource,
        assets: &[String],
        key: &str,
        report: &mut ScanReport,
    ) -> ScanProgress {
        let (metadata, extracted) = match self.extract_metadata(source, key) {
            Ok(metadata) => (metadata, true),
            Err(reason) => {
                tracing::warn!(
                    table = %key,
                    reason = %reason,
                    "Metadata extraction failed, using filename identity"
                );
                report.extraction_failures += 1;
                (ExtractedMetadata::default(), false)
            }
        };

        let identity = parse_filename(key);
        let title = merge::merged_title(&metadata, &identity);

        let asset = self.matcher.best_match(title.as_deref(), assets);
        if asset.is_none() {
            report.unmatched_assets += 1;
        }

        let entry = merge::merge_entry(key, &metadata, &identity, asset.map(|m| m.file_name));
        let outcome = catalog.upsert(entry);

        match outcome {
            Upsert::Inserted(_) => report.inserted += 1,
            Upsert::Updated(_) => report.updated += 1,
        }
        report.processed += 1;

        tracing::debug!(table = %key, ?outcome, extracted, "Table reconciled");

        ScanProgress {
            completed: report.processed,
            total: report.discovered,
            content_file_name: key.to_string(),
            outcome,
            extracted,
        }
    }
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn canonical(path: &Path) -> Result<PathBuf, ScanError> {
    path.canonicalize()
        .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))
}
