//! Filename identity heuristics
//!
//! Table files are conventionally named `<title> (<manufacturer> <year>)<suffix>.vpx`,
//! e.g. `8 Ball (Williams 1966) 1.2.1.vpx`. Each field is extracted by its own
//! pattern; a pattern that does not match leaves that field unknown.

use crate::models::DerivedIdentity;
use once_cell::sync::Lazy;
use regex::Regex;

/// Four digits after whitespace, closed by `)`
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s(\d{4})\)").unwrap());

/// Everything before the first whitespace-preceded `(`
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)\s\(").unwrap());

/// Parenthesis group ending in the year token
static MANUFACTURER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]*?)\s\d{4}\)").unwrap());

/// Derive title, manufacturer and year from a bare filename
///
/// Never fails: malformed names simply produce more unknown fields.
pub fn parse_filename(file_name: &str) -> DerivedIdentity {
    let name = bare_name(file_name);

    let year = YEAR_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok());

    let title = TITLE_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    let manufacturer = MANUFACTURER_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty());

    let identity = DerivedIdentity {
        year,
        title,
        manufacturer,
    };

    tracing::trace!(file = %name, identity = ?identity, "Parsed filename identity");

    identity
}

/// File name without directories or final extension
///
/// Used as the display name of last resort.
pub fn file_stem(file_name: &str) -> String {
    let name = bare_name(file_name);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

/// Strip any `/` or `\` separated directory prefix
pub(crate) fn bare_name(file_name: &str) -> &str {
    file_name.rsplit(['/', '\\']).next().unwrap_or(file_name)
}
