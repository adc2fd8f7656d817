//! Service modules for table catalog ingestion

pub mod asset_matcher;
pub mod catalog_store;
pub mod file_scanner;
pub mod filename_parser;
pub mod reconciler;
pub mod table_inspector;

pub use asset_matcher::{AssetMatch, AssetMatcher};
pub use catalog_store::{CatalogError, CatalogStore, Upsert};
pub use file_scanner::{FileScanner, ScanError};
pub use filename_parser::{file_stem, parse_filename};
pub use reconciler::{
    ReconcileError, Reconciler, ScanOptions, ScanPaths, ScanProgress, ScanReport,
};
pub use table_inspector::{IndexedTable, InspectError, TableInspector, VpxTool};
