//! String and metadata similarity functions used by the matchers.
//!
//! Everything here is pure: no I/O, no shared state, and no failure modes.
//! Arbitrary input strings are accepted and compared permissively.

mod title;

pub use title::clean_title;

/// Normalize a string for comparison.
///
/// Lowercases, drops every character outside `[a-z0-9]` and whitespace,
/// collapses whitespace runs to a single space and trims the result.
pub fn normalize(s: &str) -> String {
    let filtered: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Levenshtein edit distance between two strings (unit cost for
/// insertion, deletion and substitution).
///
/// Operates on the strings as given; callers normalize first when needed.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}

/// Similarity in `[0, 1]` between two strings after normalization.
///
/// Equal normalized strings score 1.0 (including two strings that both
/// normalize to empty). Otherwise an empty side scores 0.0, and the rest
/// score `1 - distance / longer_length`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = edit_distance(&a, &b);
    let longest = a.chars().count().max(b.chars().count());
    1.0 - distance as f64 / longest as f64
}

/// Similarity of two optional strings, neutral (0.5) when either is absent.
pub fn optional_similarity(a: Option<&str>, b: Option<&str>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => similarity(a, b),
        _ => 0.5,
    }
}

/// Best similarity between `name` and any of `candidates`, 0.0 when empty.
pub fn best_similarity<S: AsRef<str>>(name: &str, candidates: &[S]) -> f64 {
    candidates
        .iter()
        .map(|c| similarity(name, c.as_ref()))
        .fold(0.0, f64::max)
}

/// Whether two durations in milliseconds are within `tolerance_secs` seconds.
pub fn duration_close(d1_ms: u64, d2_ms: u64, tolerance_secs: u64) -> bool {
    d1_ms.abs_diff(d2_ms) <= tolerance_secs * 1000
}

/// Full score inside this window.
const DURATION_FULL_SCORE_SECS: u64 = 5;
/// Zero score at or beyond this difference.
const DURATION_ZERO_SCORE_SECS: u64 = 30;

/// Duration similarity used by fuzzy track scoring.
///
/// 1.0 within 5 seconds, decaying linearly to 0.0 at a 30 second
/// difference. Neutral 0.5 when either duration is unknown.
pub fn duration_similarity(a_ms: Option<u64>, b_ms: Option<u64>) -> f64 {
    let (Some(a), Some(b)) = (a_ms, b_ms) else {
        return 0.5;
    };

    if duration_close(a, b, DURATION_FULL_SCORE_SECS) {
        return 1.0;
    }

    let diff_ms = a.abs_diff(b) as f64;
    let full_ms = (DURATION_FULL_SCORE_SECS * 1000) as f64;
    let zero_ms = (DURATION_ZERO_SCORE_SECS * 1000) as f64;
    (1.0 - (diff_ms - full_ms) / (zero_ms - full_ms)).max(0.0)
}

/// Extract the year from a date string (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
pub fn release_year(date: &str) -> Option<i32> {
    date.trim()
        .split('-')
        .next()
        .filter(|y| y.len() == 4)
        .and_then(|y| y.parse().ok())
}

/// Release-year closeness used by fuzzy album scoring.
///
/// Same year 1.0, one year apart 0.9, within three years 0.7, beyond 0.3.
/// Neutral 0.5 when either year is unknown.
pub fn year_closeness(a: Option<i32>, b: Option<i32>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.5;
    };

    match (a - b).abs() {
        0 => 1.0,
        1 => 0.9,
        2..=3 => 0.7,
        _ => 0.3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("  Hello,   World!! "), "hello world");
        assert_eq!(normalize("AC/DC"), "acdc");
        assert_eq!(normalize("Don't Stop Me Now"), "dont stop me now");
        assert_eq!(normalize("\t\n"), "");
    }

    #[test]
    fn test_normalize_drops_non_ascii_letters() {
        assert_eq!(normalize("Beyoncé"), "beyonc");
        assert_eq!(normalize("Sigur Rós"), "sigur rs");
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("same", "same"), 0);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_edit_distance_does_not_normalize() {
        assert_eq!(edit_distance("Abc", "abc"), 1);
    }

    #[test]
    fn test_similarity_identity() {
        for s in ["", "a", "Let It Be", "!!!", "Sgt. Pepper's"] {
            assert_eq!(similarity(s, s), 1.0);
        }
    }

    #[test]
    fn test_similarity_empty_after_normalization() {
        // Both sides empty are equal after normalization.
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("!!", "??"), 1.0);
        // One side empty is a zero score.
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("...", "abc"), 0.0);
    }

    #[test]
    fn test_similarity_symmetric() {
        let pairs = [
            ("Yesterday", "Yesterdays"),
            ("The Beatles", "Beatles"),
            ("Hey Jude", "Hey Joe"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_similarity_value() {
        // "hey jude" vs "hey joe": distance 2 over length 8
        let score = similarity("Hey Jude", "Hey Joe");
        assert!((score - 0.75).abs() < 1e-9);
        assert_eq!(similarity("LET IT BE", "let it be"), 1.0);
    }

    #[test]
    fn test_best_similarity() {
        let artists = vec!["Paul McCartney".to_string(), "The Beatles".to_string()];
        assert_eq!(best_similarity("the beatles", &artists), 1.0);
        let none: Vec<String> = vec![];
        assert_eq!(best_similarity("the beatles", &none), 0.0);
    }

    #[test]
    fn test_duration_close() {
        assert!(duration_close(242_000, 243_000, 2));
        assert!(duration_close(243_000, 241_000, 2));
        assert!(!duration_close(240_000, 242_001, 2));
        assert!(duration_close(1_000, 1_000, 0));
    }

    #[test]
    fn test_duration_similarity_decay() {
        assert_eq!(duration_similarity(Some(200_000), Some(205_000)), 1.0);
        assert_eq!(duration_similarity(Some(200_000), Some(230_000)), 0.0);
        assert_eq!(duration_similarity(Some(200_000), Some(260_000)), 0.0);
        let mid = duration_similarity(Some(200_000), Some(217_500));
        assert!((mid - 0.5).abs() < 1e-9);
        assert_eq!(duration_similarity(None, Some(200_000)), 0.5);
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year("1969-09-26"), Some(1969));
        assert_eq!(release_year("1969-09"), Some(1969));
        assert_eq!(release_year("1969"), Some(1969));
        assert_eq!(release_year(""), None);
        assert_eq!(release_year("69"), None);
        assert_eq!(release_year("unknown"), None);
    }

    #[test]
    fn test_year_closeness() {
        assert_eq!(year_closeness(Some(2000), Some(2000)), 1.0);
        assert_eq!(year_closeness(Some(2000), Some(2001)), 0.9);
        assert_eq!(year_closeness(Some(2003), Some(2000)), 0.7);
        assert_eq!(year_closeness(Some(1990), Some(2000)), 0.3);
        assert_eq!(year_closeness(None, Some(2000)), 0.5);
    }

    #[test]
    fn test_optional_similarity() {
        assert_eq!(optional_similarity(Some("Abbey Road"), Some("abbey road")), 1.0);
        assert_eq!(optional_similarity(None, Some("Abbey Road")), 0.5);
        assert_eq!(optional_similarity(Some("Abbey Road"), None), 0.5);
    }
}
