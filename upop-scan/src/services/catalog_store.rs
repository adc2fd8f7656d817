//! Catalog persistence (`upopdb.csv`)
//!
//! The store owns the rows of one catalog file. A pass loads it once, upserts
//! every scanned table and saves once at the end. Saving always rewrites the
//! whole file through a temporary sibling so a failed write leaves the
//! previous catalog in place.

use crate::models::catalog::{parse_flag, CATALOG_COLUMNS};
use crate::models::{CatalogEntry, CatalogRow};
use crate::services::filename_parser::file_stem;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Catalog store errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid CSV (or not UTF-8)
    #[error("Catalog CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Atomic replacement of the catalog failed
    #[error("Catalog write failed: {0}")]
    Write(#[from] upop_common::Error),
}

/// Outcome of [`CatalogStore::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted(u32),
    Updated(u32),
}

impl Upsert {
    pub fn id(&self) -> u32 {
        match self {
            Upsert::Inserted(id) | Upsert::Updated(id) => *id,
        }
    }
}

/// Row as read from disk, before defaults are applied
///
/// Aliases cover the column names written by older releases of the scanner.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredRow {
    #[serde(alias = "d", deserialize_with = "lenient_number")]
    id: Option<u32>,
    #[serde(alias = "vpx_file_name")]
    content_file_name: String,
    #[serde(alias = "VPS-ID")]
    external_ref_id: String,
    #[serde(alias = "image_file")]
    asset_file_name: String,
    display_name: String,
    #[serde(alias = "show_in_arcade")]
    visible: Option<String>,
    favorite: Option<String>,
    notes: String,
    #[serde(deserialize_with = "lenient_number")]
    year: Option<u16>,
    manufacturer: String,
}

/// Blank or unparseable numbers read as absent
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// In-memory catalog
#[derive(Debug, Clone)]
pub struct CatalogStore {
    rows: Vec<CatalogRow>,
    next_id: u32,
}

impl CatalogStore {
    /// Empty catalog; the first inserted row gets id 1
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }

    /// Load the catalog at `path`
    ///
    /// A missing file is an empty catalog. Rows keep their file order; rows
    /// without a usable id are numbered after the highest existing id.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            info!(path = %path.display(), "No catalog yet, starting empty");
            return Ok(Self::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let mut stored = Vec::new();
        for record in reader.deserialize::<StoredRow>() {
            stored.push(record?);
        }

        let store = Self::from_stored(stored);

        info!(
            path = %path.display(),
            rows = store.rows.len(),
            next_id = store.next_id,
            "Catalog loaded"
        );

        Ok(store)
    }

    fn from_stored(stored: Vec<StoredRow>) -> Self {
        let max_id = stored.iter().filter_map(|row| row.id).max().unwrap_or(0);
        let mut next_id = max_id + 1;

        let mut rows = Vec::with_capacity(stored.len());
        for row in stored {
            let id = match row.id {
                Some(id) => id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    debug!(key = %row.content_file_name, id, "Assigned id to unnumbered row");
                    id
                }
            };

            rows.push(CatalogRow {
                id,
                content_file_name: row.content_file_name,
                external_ref_id: row.external_ref_id,
                asset_file_name: row.asset_file_name,
                display_name: row.display_name,
                visible: parse_flag(row.visible.as_deref().unwrap_or(""), true),
                favorite: parse_flag(row.favorite.as_deref().unwrap_or(""), false),
                notes: row.notes,
                year: row.year,
                manufacturer: row.manufacturer,
            });
        }

        warn_on_duplicates(&rows);

        Self { rows, next_id }
    }

    /// Rows in catalog order
    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    /// Row stored under `content_file_name` (first occurrence)
    pub fn get(&self, content_file_name: &str) -> Option<&CatalogRow> {
        self.rows
            .iter()
            .find(|row| row.content_file_name == content_file_name)
    }

    /// Id the next inserted row will receive
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Merge `entry` into the row with the same key, or append a new row
    ///
    /// Only non-empty incoming values overwrite stored ones. `id`, `visible`
    /// and `favorite` of an existing row are never changed; its external
    /// reference is filled in only while still empty.
    pub fn upsert(&mut self, entry: CatalogEntry) -> Upsert {
        if let Some(row) = self
            .rows
            .iter_mut()
            .find(|row| row.content_file_name == entry.content_file_name)
        {
            if !entry.display_name.trim().is_empty() {
                row.display_name = entry.display_name;
            }
            if let Some(notes) = filled(entry.notes) {
                row.notes = notes;
            }
            if entry.year.is_some() {
                row.year = entry.year;
            }
            if let Some(manufacturer) = filled(entry.manufacturer) {
                row.manufacturer = manufacturer;
            }
            if let Some(asset) = filled(entry.asset_file_name) {
                row.asset_file_name = asset;
            }
            if row.external_ref_id.is_empty() {
                if let Some(reference) = filled(entry.external_ref_id) {
                    row.external_ref_id = reference;
                }
            }

            debug!(key = %row.content_file_name, id = row.id, "Catalog row updated");
            return Upsert::Updated(row.id);
        }

        let id = self.next_id;
        self.next_id += 1;

        let display_name = if entry.display_name.trim().is_empty() {
            file_stem(&entry.content_file_name)
        } else {
            entry.display_name
        };

        debug!(key = %entry.content_file_name, id, "Catalog row inserted");

        self.rows.push(CatalogRow {
            id,
            content_file_name: entry.content_file_name,
            external_ref_id: entry.external_ref_id.unwrap_or_default(),
            asset_file_name: entry.asset_file_name.unwrap_or_default(),
            display_name,
            visible: true,
            favorite: false,
            notes: entry.notes.unwrap_or_default(),
            year: entry.year,
            manufacturer: entry.manufacturer.unwrap_or_default(),
        });

        Upsert::Inserted(id)
    }

    /// Serialize the catalog with the fixed column header
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, CatalogError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(CATALOG_COLUMNS)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }

        writer
            .into_inner()
            .map_err(|e| CatalogError::Io(e.into_error()))
    }

    /// Replace the catalog file at `path` with the current rows
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let bytes = self.to_csv_bytes()?;
        upop_common::fs::atomic_write(path, &bytes)?;

        info!(path = %path.display(), rows = self.rows.len(), "Catalog saved");
        Ok(())
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn warn_on_duplicates(rows: &[CatalogRow]) {
    let mut keys = HashSet::new();
    let mut ids = HashSet::new();

    for row in rows {
        if !keys.insert(row.content_file_name.as_str()) {
            warn!(
                key = %row.content_file_name,
                "Duplicate catalog entry, scans update the first occurrence only"
            );
        }
        if !ids.insert(row.id) {
            warn!(id = row.id, key = %row.content_file_name, "Duplicate catalog id");
        }
    }
}
