//! Scan pass tallies

use serde::Serialize;
use std::fmt;

/// Counts gathered over one reconciliation pass
///
/// Display: "N discovered, N processed (N new, N updated), N extraction
/// failures, N without artwork"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Table files found in the table folder
    pub discovered: usize,
    /// Tables upserted into the catalog
    pub processed: usize,
    /// New catalog rows
    pub inserted: usize,
    /// Existing catalog rows refreshed
    pub updated: usize,
    /// Tables whose metadata could not be extracted (filename identity used)
    pub extraction_failures: usize,
    /// Tables left without a wheel image
    pub unmatched_assets: usize,
    /// Pass stopped early by the caller
    pub cancelled: bool,
}

impl ScanReport {
    /// Tables discovered but never reached (cancelled passes)
    pub fn skipped(&self) -> usize {
        self.discovered.saturating_sub(self.processed)
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} processed ({} new, {} updated), {} extraction failures, {} without artwork",
            self.discovered,
            self.processed,
            self.inserted,
            self.updated,
            self.extraction_failures,
            self.unmatched_assets
        )?;

        if self.cancelled {
            write!(f, ", cancelled with {} skipped", self.skipped())?;
        }

        Ok(())
    }
}
