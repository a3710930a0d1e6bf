//! Normalized edit-distance similarity.
//!
//! `ratio(a, b) = 100 * 2 * lcs(a, b) / (len(a) + len(b))`, i.e. the
//! insert/delete (Indel) similarity scaled to 0..=100. Lengths count chars.
//! Two empty strings are identical (100).

/// Similarity of `a` and `b` in `[0, 100]`. Case-sensitive; callers
/// normalize case.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Case-insensitive match of `value` against any of the (already lowercased)
/// `queries` at `threshold`.
pub fn matches_any(value: &str, queries: &[String], threshold: f64) -> bool {
    let value = value.to_lowercase();
    queries.iter().any(|q| ratio(&value, q) >= threshold)
}

// Two-row DP over the shorter string.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; short.len() + 1];
    let mut cur = vec![0usize; short.len() + 1];
    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            cur[j + 1] = if lc == sc {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(ratio("bmw", "bmw"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn disjoint_strings_score_0() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn known_ratios() {
        // lcs("audi", "audii") = 4 -> 200*4/9
        assert!((ratio("audi", "audii") - 88.888_888).abs() < 1e-3);
        // lcs("toyota", "toyta") = 5 -> 200*5/11
        assert!((ratio("toyota", "toyta") - 90.909_090).abs() < 1e-3);
        // lcs("ford", "fiat") = 1 -> 25
        assert_eq!(ratio("ford", "fiat"), 25.0);
    }

    #[test]
    fn ratio_is_symmetric() {
        assert_eq!(ratio("mercedes", "merc"), ratio("merc", "mercedes"));
    }

    #[test]
    fn matching_folds_value_case() {
        let queries = vec!["bmw".to_string()];
        assert!(matches_any("BMW", &queries, 80.0));
        assert!(!matches_any("Audi", &queries, 80.0));
        assert!(matches_any("Audi", &queries, 0.0));
    }

    #[test]
    fn multibyte_chars_count_once() {
        assert_eq!(ratio("café", "cafe"), 75.0);
    }
}
