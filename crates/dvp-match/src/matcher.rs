//! FIO matching for DVP.
//!
//! Compares an applicant name against a name read off a document, trying a
//! fixed list of strategies and stopping at the first one that succeeds.
//! Exact strategies always run before fuzzy ones.

use serde::{Deserialize, Serialize};

use crate::canonicalizer::{canonicalize_as, NameRole, VariantKind, VariantSet};

pub const DEFAULT_FUZZY_THRESHOLD: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum similarity (0-100) accepted by the fuzzy strategies
    pub fuzzy_threshold: u8,
    pub allow_fuzzy_fallback: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            allow_fuzzy_fallback: true,
        }
    }
}

impl MatchConfig {
    pub fn exact_only() -> Self {
        Self {
            allow_fuzzy_fallback: false,
            ..Self::default()
        }
    }
}

/// Strategy that produced a match, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    ExactFull,
    ExactInitials,
    ExactCompact,
    FuzzyFull,
    FuzzyInitials,
}

/// Outcome of one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: bool,
    /// Applicant variant that matched
    pub matched_variant: Option<VariantKind>,
    pub strategy: Option<MatchStrategy>,
    /// Similarity 0-100. For a miss, the best score observed.
    pub score: u8,
    /// Document variant value the score refers to
    pub compared_against: String,
}

impl MatchResult {
    fn hit(
        variant: VariantKind,
        strategy: MatchStrategy,
        score: u8,
        against: &str,
    ) -> Self {
        Self {
            matched: true,
            matched_variant: Some(variant),
            strategy: Some(strategy),
            score,
            compared_against: against.to_string(),
        }
    }

    fn miss(score: u8, against: &str) -> Self {
        Self {
            matched: false,
            matched_variant: None,
            strategy: None,
            score,
            compared_against: against.to_string(),
        }
    }
}

/// Match an applicant-supplied name against a document name. Not symmetric:
/// the document side is canonicalized as OCR output.
pub fn match_names(applicant: &str, document: &str, config: &MatchConfig) -> MatchResult {
    let applicant = canonicalize_as(applicant, NameRole::Applicant);
    let document = canonicalize_as(document, NameRole::Document);
    match_variants(&applicant, &document, config)
}

/// Match already canonicalized variant sets
pub fn match_variants(
    applicant: &VariantSet,
    document: &VariantSet,
    config: &MatchConfig,
) -> MatchResult {
    let (a_full, d_full) = match (applicant.full(), document.full()) {
        (Some(a), Some(d)) => (a, d),
        _ => return MatchResult::miss(0, document.full().unwrap_or_default()),
    };

    // 1. exact full form
    if a_full == d_full {
        return MatchResult::hit(VariantKind::Full, MatchStrategy::ExactFull, 100, d_full);
    }

    // 2. exact initials, then merged initials
    let a_initials = applicant.get(VariantKind::Initials);
    let d_initials = document.get(VariantKind::Initials);
    if let (Some(a), Some(d)) = (a_initials, d_initials) {
        if a == d {
            return MatchResult::hit(VariantKind::Initials, MatchStrategy::ExactInitials, 100, d);
        }
    }
    if let (Some(a), Some(d)) = (
        applicant.get(VariantKind::CompactInitials),
        document.get(VariantKind::Compact),
    ) {
        if a == d {
            return MatchResult::hit(
                VariantKind::CompactInitials,
                MatchStrategy::ExactCompact,
                100,
                d,
            );
        }
    }

    // The full-form score is reported even when fuzzy matching is off
    let full_score = similarity(a_full, d_full);
    let mut best = (full_score, d_full);

    if !config.allow_fuzzy_fallback {
        return MatchResult::miss(best.0, best.1);
    }

    // 3. fuzzy full form
    if full_score >= config.fuzzy_threshold {
        return MatchResult::hit(VariantKind::Full, MatchStrategy::FuzzyFull, full_score, d_full);
    }

    // 4. fuzzy initials, for truncated document names
    if let (Some(a), Some(d)) = (a_initials, d_initials) {
        let score = similarity(a, d);
        if score >= config.fuzzy_threshold {
            return MatchResult::hit(VariantKind::Initials, MatchStrategy::FuzzyInitials, score, d);
        }
        if score > best.0 {
            best = (score, d);
        }
    }

    MatchResult::miss(best.0, best.1)
}

/// Normalized Levenshtein similarity scaled to 0-100
pub fn similarity(a: &str, b: &str) -> u8 {
    let ratio = strsim::normalized_levenshtein(a, b);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(applicant: &str, document: &str) -> MatchResult {
        match_names(applicant, document, &MatchConfig::default())
    }

    #[test]
    fn test_identical_full_names() {
        let r = run("Иванов Иван Иванович", "Иванов Иван Иванович");
        assert!(r.matched);
        assert_eq!(r.matched_variant, Some(VariantKind::Full));
        assert_eq!(r.strategy, Some(MatchStrategy::ExactFull));
        assert_eq!(r.score, 100);
    }

    #[test]
    fn test_initials_document() {
        let r = run("Иванов Иван Иванович", "Иванов И.И.");
        assert!(r.matched);
        assert_eq!(r.matched_variant, Some(VariantKind::Initials));
        assert_eq!(r.compared_against, "иванов и и");
    }

    #[test]
    fn test_merged_initials_document() {
        let r = run("Иванов Иван Иванович", "ИвановИИ");
        assert!(r.matched);
        assert_eq!(r.matched_variant, Some(VariantKind::CompactInitials));
        assert_eq!(r.strategy, Some(MatchStrategy::ExactCompact));

        let spaced = run("Иванов Иван Иванович", "Иванов ИИ");
        assert_eq!(spaced.strategy, Some(MatchStrategy::ExactCompact));
    }

    #[test]
    fn test_different_person() {
        let r = run("Иванов Иван Иванович", "Петров Петр Петрович");
        assert!(!r.matched);
        assert_eq!(r.matched_variant, None);
        assert!(r.score < DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(r.compared_against, "петров петр петрович");
    }

    #[test]
    fn test_same_initials_different_names_do_not_match() {
        let r = run("Иванов Иван Иванович", "Иванов Игорь Ильич");
        assert!(!r.matched);
    }

    #[test]
    fn test_mixed_script_ocr_output() {
        // Latin A, O, B and H in place of Cyrillic capitals
        let r = run("Сахаров Антон", "CAXAPOB AHTOH");
        assert!(r.matched);
        assert_eq!(r.strategy, Some(MatchStrategy::ExactFull));
    }

    #[test]
    fn test_fuzzy_full_fallback() {
        // One dropped letter out of 20
        let r = run("Иванов Иван Иванович", "Иванов Иван Ивановч");
        assert!(r.matched);
        assert_eq!(r.strategy, Some(MatchStrategy::FuzzyFull));
        assert!(r.score >= 85);

        let strict = match_names(
            "Иванов Иван Иванович",
            "Иванов Иван Ивановч",
            &MatchConfig::exact_only(),
        );
        assert!(!strict.matched);
        assert_eq!(strict.score, r.score);
    }

    #[test]
    fn test_fuzzy_initials_fallback() {
        // Truncated document with a misread family name
        let r = run("Константинопольский Иван Иванович", "Константинопольскии И.И.");
        assert!(r.matched);
        assert_eq!(r.strategy, Some(MatchStrategy::FuzzyInitials));
    }

    #[test]
    fn test_partly_truncated_document() {
        let r = run("Иванов Иван Иванович", "Иванов Иван И.");
        assert!(r.matched);
        assert_eq!(r.strategy, Some(MatchStrategy::ExactInitials));
        assert_eq!(r.compared_against, "иванов и и");
    }

    #[test]
    fn test_fuzzy_initials_tolerates_one_letter_at_default_threshold() {
        // Wrong patronymic initial
        let r = run("Иванов Иван Иванович", "Иванов И.П.");
        assert_eq!(r.strategy, Some(MatchStrategy::FuzzyInitials));
        assert_eq!(r.score, 90);

        // Feminine form of the family name
        let r = run("Иванов Иван Иванович", "Иванова И.И.");
        assert_eq!(r.strategy, Some(MatchStrategy::FuzzyInitials));
        assert_eq!(r.score, 91);

        let strict = MatchConfig {
            fuzzy_threshold: 92,
            allow_fuzzy_fallback: true,
        };
        assert!(!match_names("Иванов Иван Иванович", "Иванов И.П.", &strict).matched);
        assert!(!match_names("Иванов Иван Иванович", "Иванова И.И.", &strict).matched);
    }

    #[test]
    fn test_threshold_respected() {
        let config = MatchConfig {
            fuzzy_threshold: 100,
            allow_fuzzy_fallback: true,
        };
        let r = match_names("Иванов Иван Иванович", "Иванов Иван Ивановч", &config);
        assert!(!r.matched);
    }

    #[test]
    fn test_unusable_names() {
        let r = run("Иванов Иван", "");
        assert!(!r.matched);
        assert_eq!(r.score, 0);
        assert_eq!(r.compared_against, "");

        let r = run("...", "Иванов Иван");
        assert!(!r.matched);
        assert_eq!(r.compared_against, "иванов иван");
    }

    #[test]
    fn test_directional() {
        // The truncated name is only granted initials on the document side
        assert!(run("Иванов Иван Иванович", "Иванов И.И.").matched);
        assert!(!run("Иванов И.И.", "Иванов Иван Иванович").matched);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("абв", "абв"), 100);
        assert_eq!(similarity("абв", "где"), 0);
    }
}
