//! Data models for the table catalog

pub mod catalog;
pub mod metadata;

pub use catalog::{CatalogEntry, CatalogRow};
pub use metadata::{DerivedIdentity, ExtractedMetadata};
