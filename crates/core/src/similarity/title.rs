//! Track title cleanup.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Qualifiers that never distinguish one recording's title from another.
static TITLE_QUALIFIERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // (2011 Remaster), (Remastered 2009), (Remastered Version)
        r"(?i)\s*\([^)]*remaster[^)]*\)",
        r"(?i)\s*\([^)]*radio edit[^)]*\)",
        r"(?i)\s*\(live\b[^)]*\)",
        r"(?i)\s*\([^)]*\bversion\)",
        // [Explicit], [Bonus Track], [2019 Mix]
        r"\s*\[[^\]]*\]",
        // "Title - 2009 Remaster", "Title - Remastered 2015"
        r"(?i)\s+-\s+(\d{4}\s+)?remaster(ed)?(\s+\d{4})?(\s+version)?\s*$",
        r"(?i)\s+-\s+radio edit\s*$",
        r"(?i)\s+-\s+live\b.*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("title qualifier pattern"))
    .collect()
});

/// Strip remaster/edit/live/version qualifiers and bracketed annotations
/// from a track title.
///
/// Only meant for track titles; album and artist names are compared as-is.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.to_string();
    for pattern in TITLE_QUALIFIERS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}
