//! Special-circumstance detection for cancellation reasons
//!
//! A keyword heuristic, not a verified claim. A match grants a full refund, so
//! a verified-claims workflow should replace [`detect_special_circumstances`]
//! rather than extending the keyword list.

pub const SPECIAL_CIRCUMSTANCE_KEYWORDS: &[&str] = &[
    "medical emergency",
    "family emergency",
    "death",
    "illness",
    "accident",
    "hospital",
    "doctor",
    "emergency",
    "urgent",
    "unforeseen",
    "unexpected",
    "force majeure",
    "act of god",
    "natural disaster",
    "pandemic",
];

/// First keyword found in `reason`, matched case-insensitively as a substring
pub fn matched_keyword(reason: &str) -> Option<&'static str> {
    let reason = reason.to_lowercase();
    SPECIAL_CIRCUMSTANCE_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| reason.contains(keyword))
}

pub fn detect_special_circumstances(reason: &str) -> bool {
    matched_keyword(reason).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_match_case_insensitively() {
        assert!(detect_special_circumstances("Had a MEDICAL EMERGENCY last night"));
        assert!(detect_special_circumstances("flight cancelled, force majeure"));
        assert_eq!(matched_keyword("My doctor said rest"), Some("doctor"));
    }

    #[test]
    fn test_plain_reasons_do_not_match() {
        assert!(!detect_special_circumstances("schedule changed"));
        assert!(!detect_special_circumstances(""));
    }

    #[test]
    fn test_substring_matching_is_loose() {
        // "deathly" still contains "death"
        assert!(detect_special_circumstances("deathly bored"));
    }
}
