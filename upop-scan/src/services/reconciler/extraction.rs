//! Metadata extraction phase
//!
//! Batch passes run the helper once and serve every table from the decoded
//! index; per-file passes run the helper once per table.

use super::{ReconcileError, Reconciler};
use crate::models::ExtractedMetadata;
use crate::services::filename_parser::bare_name;
use crate::services::table_inspector::{IndexedTable, InspectError, TableInspector};
use std::collections::HashMap;
use upop_common::config::ExtractionMode;

/// Where table metadata comes from during one pass
pub(super) enum MetadataSource {
    /// `describe` each table as it is reached
    PerFile,
    /// Decoded batch index
    Index(IndexLookup),
    /// Batch index could not be produced; every table uses filename identity
    Unavailable(String),
}

/// Index entries keyed by relative path, with a file-name fallback
pub(super) struct IndexLookup {
    tables: Vec<IndexedTable>,
    by_path: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl IndexLookup {
    pub(super) fn new(tables: Vec<IndexedTable>) -> Self {
        let mut by_path = HashMap::with_capacity(tables.len());
        let mut by_name = HashMap::with_capacity(tables.len());

        for (idx, table) in tables.iter().enumerate() {
            by_path.entry(table.path.clone()).or_insert(idx);
            by_name
                .entry(bare_name(&table.path).to_string())
                .or_insert(idx);
        }

        Self {
            tables,
            by_path,
            by_name,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.tables.len()
    }

    pub(super) fn get(&self, content_file_name: &str) -> Option<&ExtractedMetadata> {
        self.by_path
            .get(content_file_name)
            .or_else(|| self.by_name.get(bare_name(content_file_name)))
            .map(|&idx| &self.tables[idx].metadata)
    }
}

impl<I: TableInspector> Reconciler<I> {
    /// Prepare the metadata source for a pass over `table_count` tables
    ///
    /// Only an undecodable index is fatal: its records cannot be trusted, so
    /// the pass stops before the catalog is touched.
    pub(super) fn phase_extraction(
        &self,
        mode: ExtractionMode,
        table_count: usize,
    ) -> Result<MetadataSource, ReconcileError> {
        match mode {
            ExtractionMode::PerFile => Ok(MetadataSource::PerFile),
            // Nothing to index
            ExtractionMode::Batch if table_count == 0 => Ok(MetadataSource::PerFile),
            ExtractionMode::Batch => match self.inspector.index_all(&self.paths.table_dir) {
                Ok(tables) => {
                    let lookup = IndexLookup::new(tables);
                    tracing::info!(
                        indexed = lookup.len(),
                        tables = table_count,
                        "Batch metadata index ready"
                    );
                    Ok(MetadataSource::Index(lookup))
                }
                Err(InspectError::MalformedIndex { path, message }) => {
                    Err(ReconcileError::MalformedIndex { path, message })
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Batch index unavailable, falling back to filename identity"
                    );
                    Ok(MetadataSource::Unavailable(e.to_string()))
                }
            },
        }
    }

    /// Metadata for one table, or the reason there is none
    pub(super) fn extract_metadata(
        &self,
        source: &MetadataSource,
        content_file_name: &str,
    ) -> Result<ExtractedMetadata, String> {
        match source {
            MetadataSource::PerFile => self
                .inspector
                .describe(&self.paths.table_dir, content_file_name)
                .map_err(|e| e.to_string()),
            MetadataSource::Index(lookup) => lookup
                .get(content_file_name)
                .cloned()
                .ok_or_else(|| "Table missing from batch index".to_string()),
            MetadataSource::Unavailable(reason) => Err(reason.clone()),
        }
    }
}
