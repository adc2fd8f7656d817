//! Canned metadata source
//!
//! Stands in for vpxtool. Tables without a canned record fail the way a
//! crashing helper would.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use upop_scan::models::ExtractedMetadata;
use upop_scan::services::{IndexedTable, InspectError, TableInspector};

/// What `index_all` does
#[derive(Debug, Clone)]
enum IndexBehavior {
    /// Return the canned records
    Records,
    /// Helper left no index file behind
    Missing,
    /// Index file present but undecodable
    Malformed,
}

#[derive(Debug)]
pub struct StubInspector {
    records: HashMap<String, ExtractedMetadata>,
    index: IndexBehavior,
    describe_calls: RefCell<Vec<String>>,
    index_calls: Cell<usize>,
}

impl StubInspector {
    /// Inspector that knows nothing: every `describe` fails
    pub fn failing() -> Self {
        Self {
            records: HashMap::new(),
            index: IndexBehavior::Records,
            describe_calls: RefCell::new(Vec::new()),
            index_calls: Cell::new(0),
        }
    }

    /// Add a canned record for `content_file_name`
    pub fn with_record(mut self, content_file_name: &str, metadata: ExtractedMetadata) -> Self {
        self.records.insert(content_file_name.to_string(), metadata);
        self
    }

    pub fn with_missing_index(mut self) -> Self {
        self.index = IndexBehavior::Missing;
        self
    }

    pub fn with_malformed_index(mut self) -> Self {
        self.index = IndexBehavior::Malformed;
        self
    }

    /// Tables passed to `describe`, in call order
    pub fn describe_calls(&self) -> Vec<String> {
        self.describe_calls.borrow().clone()
    }

    pub fn index_calls(&self) -> usize {
        self.index_calls.get()
    }
}

impl TableInspector for StubInspector {
    fn describe(&self, _table_dir: &Path, file: &str) -> Result<ExtractedMetadata, InspectError> {
        self.describe_calls.borrow_mut().push(file.to_string());

        self.records
            .get(file)
            .cloned()
            .ok_or_else(|| InspectError::NonZeroExit {
                code: Some(1),
                stderr: format!("cannot read {}", file),
            })
    }

    fn index_all(&self, table_dir: &Path) -> Result<Vec<IndexedTable>, InspectError> {
        self.index_calls.set(self.index_calls.get() + 1);

        match self.index {
            IndexBehavior::Records => Ok(self
                .records
                .iter()
                .map(|(path, metadata)| IndexedTable {
                    path: path.clone(),
                    metadata: metadata.clone(),
                })
                .collect()),
            IndexBehavior::Missing => Err(InspectError::IndexMissing(
                table_dir.join("vpxtool_index.json"),
            )),
            IndexBehavior::Malformed => Err(InspectError::MalformedIndex {
                path: PathBuf::from(table_dir).join("vpxtool_index.json"),
                message: "expected value at line 1 column 1".to_string(),
            }),
        }
    }
}

/// Metadata carrying only a title
pub fn titled(title: &str) -> ExtractedMetadata {
    ExtractedMetadata {
        title: Some(title.to_string()),
        ..Default::default()
    }
}
