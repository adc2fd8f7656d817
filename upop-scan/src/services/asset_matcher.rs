//! Wheel artwork matching
//!
//! Picks the image whose bare file name is most similar to a table title.
//! Similarity is normalized Levenshtein on a 0-100 scale.

use super::filename_parser::bare_name;

/// Winning candidate and its score
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMatch {
    /// Candidate exactly as supplied
    pub file_name: String,
    /// Similarity score (0-100)
    pub score: f64,
}

/// Approximate artwork matcher
#[derive(Debug, Clone)]
pub struct AssetMatcher {
    /// Minimum score a winner must reach
    threshold: f64,
}

impl AssetMatcher {
    /// Create matcher with the given minimum score (0-100)
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 100.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best-scoring candidate for `title`
    ///
    /// **Algorithm:**
    /// 1. Strip directory and extension from each candidate; skip empty names
    /// 2. Score each bare name against the title
    /// 3. Keep the strictly highest score (first candidate wins ties)
    /// 4. Discard the winner if it is below the threshold
    ///
    /// Returns `None` for an unknown title or an empty candidate set.
    pub fn best_match(&self, title: Option<&str>, candidates: &[String]) -> Option<AssetMatch> {
        let title = title.map(str::trim).filter(|t| !t.is_empty())?;

        let mut best: Option<AssetMatch> = None;

        for candidate in candidates {
            let name = comparison_name(candidate);
            if name.trim().is_empty() {
                continue;
            }

            let score = similarity(title, name);
            let is_better = best.as_ref().map_or(true, |b| score > b.score);
            if is_better {
                best = Some(AssetMatch {
                    file_name: candidate.clone(),
                    score,
                });
            }
        }

        match best {
            Some(found) if found.score >= self.threshold => {
                tracing::debug!(
                    title = %title,
                    asset = %found.file_name,
                    score = found.score,
                    "Matched artwork"
                );
                Some(found)
            }
            Some(rejected) => {
                tracing::debug!(
                    title = %title,
                    closest = %rejected.file_name,
                    score = rejected.score,
                    threshold = self.threshold,
                    "Closest artwork below threshold"
                );
                None
            }
            None => None,
        }
    }
}

impl Default for AssetMatcher {
    fn default() -> Self {
        Self::new(upop_common::config::DEFAULT_MATCH_THRESHOLD)
    }
}

/// Case-insensitive similarity (0-100)
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_normalized = a.trim().to_lowercase();
    let b_normalized = b.trim().to_lowercase();

    strsim::normalized_levenshtein(&a_normalized, &b_normalized) * 100.0
}

/// Candidate without directory or extension
fn comparison_name(candidate: &str) -> &str {
    let name = bare_name(candidate);
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selects_closest_name() {
        let matcher = AssetMatcher::default();
        let candidates = names(&["FunLand", "Aces High", "Algar"]);

        let found = matcher.best_match(Some("Fun Land"), &candidates).unwrap();
        assert_eq!(found.file_name, "FunLand");
        assert!(found.score > 80.0);
    }

    #[test]
    fn test_path_and_extension_are_ignored_for_scoring() {
        let matcher = AssetMatcher::default();
        let candidates = names(&["wheels/Aces High.png", "wheels/FunLand.png"]);

        let found = matcher.best_match(Some("Fun Land"), &candidates).unwrap();
        assert_eq!(found.file_name, "wheels/FunLand.png");
    }

    #[test]
    fn test_exact_match_scores_100() {
        assert_eq!(similarity("Algar", "algar"), 100.0);
        assert_eq!(similarity("", ""), 100.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let matcher = AssetMatcher::new(0.0);
        let candidates = names(&["Algar.png", "algar.jpg", "ALGAR.gif"]);

        let found = matcher.best_match(Some("Algar"), &candidates).unwrap();
        assert_eq!(found.file_name, "Algar.png");
    }

    #[test]
    fn test_unknown_title_has_no_match() {
        let matcher = AssetMatcher::default();
        let candidates = names(&["FunLand"]);

        assert!(matcher.best_match(None, &candidates).is_none());
        assert!(matcher.best_match(Some("   "), &candidates).is_none());
    }

    #[test]
    fn test_empty_candidates_have_no_match() {
        let matcher = AssetMatcher::default();
        assert!(matcher.best_match(Some("Fun Land"), &[]).is_none());
    }

    #[test]
    fn test_empty_bare_names_are_skipped() {
        let matcher = AssetMatcher::new(0.0);
        let candidates = names(&["", "wheels/", ".png", "Xenon.png"]);

        let found = matcher.best_match(Some("Fun Land"), &candidates).unwrap();
        assert_eq!(found.file_name, "Xenon.png");
    }

    #[test]
    fn test_weak_match_below_threshold_is_rejected() {
        let matcher = AssetMatcher::new(90.0);
        let candidates = names(&["Aces High", "Algar"]);

        assert!(matcher.best_match(Some("Fun Land"), &candidates).is_none());
    }

    #[test]
    fn test_threshold_is_clamped() {
        assert_eq!(AssetMatcher::new(150.0).threshold(), 100.0);
        assert_eq!(AssetMatcher::new(-3.0).threshold(), 0.0);
    }
}
