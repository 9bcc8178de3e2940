//! Text comparator: normalized Levenshtein similarity plus word-level
//! disagreement.

use super::ComparisonResult;

/// `1 - distance / len(longer)`, in chars. Two empty texts are identical.
pub fn sequence_similarity(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 1.0;
    }
    1.0 - strsim::levenshtein(a, b) as f64 / longer as f64
}

/// Positional word mismatches over the longer word count, doubled and capped.
pub fn word_variant_score(a: &str, b: &str) -> f64 {
    let wa: Vec<&str> = a.split_whitespace().collect();
    let wb: Vec<&str> = b.split_whitespace().collect();
    let max_len = wa.len().max(wb.len());
    if max_len == 0 {
        return 0.0;
    }
    let mismatches = (0..max_len).filter(|&i| wa.get(i) != wb.get(i)).count();
    (2.0 * mismatches as f64 / max_len as f64).min(1.0)
}

pub fn text_alteration_bucket(similarity: f64) -> f64 {
    if similarity < 0.5 {
        0.9
    } else if similarity < 0.7 {
        0.6
    } else if similarity < 0.9 {
        0.3
    } else {
        0.1
    }
}

pub fn compare_texts(a: &str, b: &str) -> ComparisonResult {
    let similarity = sequence_similarity(a, b);
    let variant = word_variant_score(a, b);
    tracing::debug!(similarity, variant, "text comparison");
    ComparisonResult {
        similarity_score: Some(similarity),
        ..ComparisonResult::new(similarity, variant, text_alteration_bucket(similarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts() {
        let result = compare_texts("the quick brown fox", "the quick brown fox");
        assert_eq!(result.score, 1.0);
        assert_eq!(result.variant_score, 0.0);
        assert_eq!(result.alteration_score, 0.1);
    }

    #[test]
    fn test_empty_texts() {
        assert_eq!(sequence_similarity("", ""), 1.0);
        assert_eq!(word_variant_score("", ""), 0.0);
        assert_eq!(sequence_similarity("abcd", ""), 0.0);
    }

    #[test]
    fn test_one_word_changed() {
        // "brown" -> "black": 4 substitutions over 19 chars
        let result = compare_texts("the quick brown fox", "the quick black fox");
        assert!((result.score - (1.0 - 4.0 / 19.0)).abs() < 1e-12);
        assert_eq!(result.alteration_score, 0.3);
        // 1 of 4 words, doubled
        assert_eq!(result.variant_score, 0.5);
    }

    #[test]
    fn test_unrelated_texts() {
        let result = compare_texts("official statement", "zzzz");
        assert!(result.score < 0.5);
        assert_eq!(result.alteration_score, 0.9);
        assert_eq!(result.variant_score, 1.0);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert!((sequence_similarity("café", "cafe") - 0.75).abs() < 1e-12);
    }
}
