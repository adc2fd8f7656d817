//! upop-scan library interface
//!
//! Catalogs a folder of Visual Pinball tables into `upopdb.csv`. Exposes the
//! reconciliation engine and its services for the binary and for
//! integration testing.

pub mod config;
pub mod models;
pub mod services;

pub use crate::config::ScanSettings;
pub use crate::services::{
    ReconcileError, Reconciler, ScanOptions, ScanPaths, ScanProgress, ScanReport,
};
