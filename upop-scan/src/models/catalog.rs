//! Catalog rows as persisted in `upopdb.csv`

use serde::{Serialize, Serializer};

/// Column order of the catalog file
pub const CATALOG_COLUMNS: [&str; 10] = [
    "id",
    "content_file_name",
    "external_ref_id",
    "asset_file_name",
    "display_name",
    "visible",
    "favorite",
    "notes",
    "year",
    "manufacturer",
];

/// One cataloged table
///
/// Field order is the on-disk column order. `visible` and `favorite` belong
/// to the user: scans set them on insert and never touch them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    /// Unique, stable once assigned
    pub id: u32,
    /// Reconciliation key: table path relative to the table folder
    pub content_file_name: String,
    /// Opaque external database identifier (may be empty)
    pub external_ref_id: String,
    /// Matched wheel image file name (empty when unmatched)
    pub asset_file_name: String,
    /// Name shown by the front end; never empty
    pub display_name: String,
    #[serde(serialize_with = "serialize_flag")]
    pub visible: bool,
    #[serde(serialize_with = "serialize_flag")]
    pub favorite: bool,
    pub notes: String,
    pub year: Option<u16>,
    pub manufacturer: String,
}

/// Incoming record for [`crate::services::catalog_store::CatalogStore::upsert`]
///
/// `None` (or an empty string) means "nothing new known" and never blanks out
/// a stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogEntry {
    pub content_file_name: String,
    pub display_name: String,
    pub external_ref_id: Option<String>,
    pub asset_file_name: Option<String>,
    pub notes: Option<String>,
    pub year: Option<u16>,
    pub manufacturer: Option<String>,
}

impl CatalogEntry {
    pub fn new(content_file_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            content_file_name: content_file_name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

/// Flags are written the way the arcade front end compares them
fn serialize_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

/// Lenient flag parsing; blank cells take the column default
pub fn parse_flag(raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => default,
        "true" | "1" | "yes" | "y" | "x" => true,
        _ => false,
    }
}
