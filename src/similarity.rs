//! String similarity for fuzzy column and alias matching
//!
//! Similarity is normalized edit distance over case-folded, trimmed input:
//! `1 - levenshtein(a, b) / max(len(a), len(b))`, measured in chars.

/// Levenshtein edit distance between two strings (insert/delete/substitute = 1)
///
/// Uses the two-row formulation so memory is O(len(b)).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1) // deletion
                .min(curr[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity in [0, 1]; symmetric, 1.0 for identical input and for two empty strings
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - levenshtein_distance(&a, &b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_levenshtein_known_values() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_similarity_identity_and_empty() {
        assert_eq!(similarity("Claim Date", "Claim Date"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("   ", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_similarity_case_and_whitespace_insensitive() {
        assert_eq!(similarity("  MEDICAL ", "medical"), 1.0);
    }

    #[test]
    fn test_similarity_symmetric() {
        let pairs = [("claimant_id", "Claimant"), ("Rx", "rx_amount"), ("paid", "amount")];
        for (a, b) in pairs {
            assert_relative_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_similarity_partial() {
        // "medical" vs "medical_amount": 7 edits over 14 chars
        assert_relative_eq!(similarity("Medical", "medical_amount"), 0.5);
        let s = similarity("Claim Dt", "claim date");
        assert!(s > 0.7 && s < 1.0);
    }

    #[test]
    fn test_similarity_counts_chars_not_bytes() {
        // é is two bytes but one char
        assert_relative_eq!(similarity("café", "cafe"), 0.75);
    }
}
