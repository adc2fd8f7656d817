//! Temporary table collections

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use upop_scan::services::{CatalogStore, ScanOptions, ScanPaths};
use upop_common::config::ExtractionMode;

/// Catalog header as written by the store
pub const CATALOG_HEADER: &str =
    "id,content_file_name,external_ref_id,asset_file_name,display_name,visible,favorite,notes,year,manufacturer";

/// Table folder, artwork folder and catalog path inside one temp directory
///
/// The artwork folder is only created once an asset is added.
pub struct TableFixture {
    _temp_dir: TempDir,
    pub paths: ScanPaths,
}

impl TableFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let paths = ScanPaths {
            table_dir: root.join("tables"),
            asset_dir: root.join("wheels"),
            catalog_path: root.join("data").join("upopdb.csv"),
        };
        fs::create_dir_all(&paths.table_dir).unwrap();

        Self {
            _temp_dir: temp_dir,
            paths,
        }
    }

    /// Create an empty table file; `name` may contain `/`
    pub fn add_table(&self, name: &str) -> PathBuf {
        let path = self.paths.table_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"").unwrap();
        path
    }

    pub fn add_asset(&self, name: &str) {
        fs::create_dir_all(&self.paths.asset_dir).unwrap();
        fs::write(self.paths.asset_dir.join(name), b"").unwrap();
    }

    pub fn write_catalog(&self, content: &str) {
        if let Some(parent) = self.paths.catalog_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&self.paths.catalog_path, content).unwrap();
    }

    pub fn catalog_text(&self) -> String {
        fs::read_to_string(&self.paths.catalog_path).unwrap()
    }

    pub fn catalog_bytes(&self) -> Option<Vec<u8>> {
        fs::read(&self.paths.catalog_path).ok()
    }

    pub fn catalog(&self) -> CatalogStore {
        CatalogStore::load(&self.paths.catalog_path).unwrap()
    }

    pub fn table_dir(&self) -> &Path {
        &self.paths.table_dir
    }
}

pub fn options(mode: ExtractionMode) -> ScanOptions {
    ScanOptions {
        extraction_mode: mode,
        ..Default::default()
    }
}
