//! Merging helper metadata with filename identity
//!
//! Merge strategy: helper values win where the helper has them, the filename
//! fills the rest, and the file stem is the display name of last resort.

use crate::models::{CatalogEntry, DerivedIdentity, ExtractedMetadata};
use crate::services::filename_parser::file_stem;

/// Title used for display and artwork matching, if any source knows one
pub fn merged_title(metadata: &ExtractedMetadata, identity: &DerivedIdentity) -> Option<String> {
    metadata
        .title
        .clone()
        .or_else(|| identity.title.clone())
}

/// Build the catalog record for one table
///
/// # Arguments
/// * `content_file_name` - Catalog key (path relative to the table folder)
/// * `metadata` - Helper output, empty when extraction failed
/// * `identity` - Attributes parsed from the file name
/// * `asset_file_name` - Matched wheel image, if any
pub fn merge_entry(
    content_file_name: &str,
    metadata: &ExtractedMetadata,
    identity: &DerivedIdentity,
    asset_file_name: Option<String>,
) -> CatalogEntry {
    let display_name =
        merged_title(metadata, identity).unwrap_or_else(|| file_stem(content_file_name));

    CatalogEntry {
        content_file_name: content_file_name.to_string(),
        display_name,
        external_ref_id: None,
        asset_file_name,
        notes: metadata.notes(),
        year: identity.year,
        manufacturer: identity.manufacturer.clone(),
    }
}
