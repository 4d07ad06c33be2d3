//! Institution-name normalization.
//!
//! Both sides of every comparison go through [`normalize_name`]: lowercase,
//! drop a fixed punctuation set, drop domain stopwords wherever they stand as
//! a whole word, then remove all remaining whitespace. The result is only
//! meant for containment checks, never for display.
//!
//! "Whole word" uses Unicode word boundaries, so a stopword next to an
//! apostrophe, an en dash or a bracket is dropped too:
//! `"Warsaw University's"` becomes `"warsaw's"`.

use regex::Regex;
use std::sync::OnceLock;

/// Punctuation stripped before tokenizing.
pub const PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Generic institution words (English and Polish) and type abbreviations.
pub const STOPWORDS: &[&str] = &[
    "university",
    "of",
    "and",
    "in",
    "technology",
    "science",
    "sciences",
    "school",
    "politechnika",
    "uniwersytet",
    "agh",
];

fn stopword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let alternation = STOPWORDS
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"\b(?:{alternation})\b")).expect("stopword pattern is a fixed word list")
    })
}

pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped: String = lowered.chars().filter(|c| !PUNCTUATION.contains(c)).collect();
    stopword_pattern()
        .replace_all(&stripped, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
