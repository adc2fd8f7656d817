//! Transient metadata records produced while scanning a table file

/// Metadata reported by the inspection helper for one table
///
/// Every field is optional; a helper that knows nothing about a table yields
/// `ExtractedMetadata::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    /// Visual Pinball version the table was saved with
    pub vpx_version: Option<String>,
    /// Table name as stored in the file
    pub title: Option<String>,
    /// Table release version
    pub version: Option<String>,
    /// Table release date (free-form, as reported)
    pub release_date: Option<String>,
    /// Table author(s)
    pub author: Option<String>,
    /// Table description
    pub description: Option<String>,
    /// Rules text, possibly multi-line
    pub rules: Option<String>,
}

impl ExtractedMetadata {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Text for the catalog `notes` column
    ///
    /// The description is preferred; the release date is used when a table
    /// has no description.
    pub fn notes(&self) -> Option<String> {
        self.description
            .clone()
            .or_else(|| self.release_date.as_ref().map(|d| format!("Released {}", d)))
    }
}

/// Identity attributes inferred from a filename such as
/// `Attack from Mars (Bally 1995) 2.0.vpx`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedIdentity {
    /// Machine release year
    pub year: Option<u16>,
    /// Machine title
    pub title: Option<String>,
    /// Machine manufacturer
    pub manufacturer: Option<String>,
}

impl DerivedIdentity {
    /// True when the filename yielded nothing
    pub fn is_unknown(&self) -> bool {
        self.year.is_none() && self.title.is_none() && self.manufacturer.is_none()
    }
}

/// Treat empty or whitespace-only strings as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
