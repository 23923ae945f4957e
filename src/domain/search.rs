//! Search term expansion.
//!
//! Listing text is written in an agglutinative language where a final hard
//! consonant softens before a vowel-initial suffix (`bıçak` → `bıçağı`).
//! A buyer typing the dictionary form should still match inflected forms, so
//! the store query receives a small set of alternates instead of one term.

/// Terms shorter than this are returned unexpanded.
pub const MIN_EXPANDABLE_CHARS: usize = 3;

/// Suffixes appended to every alternate.
const SUFFIXES: [&str; 10] = ["lar", "ler", "i", "ı", "u", "ü", "da", "de", "ta", "te"];

/// Suffixes appended to a `k → ğ` softened stem.
const SOFTENED_K_SUFFIXES: [&str; 3] = ["ı", "a", "ın"];

fn soft_counterpart(c: char) -> Option<char> {
    match c {
        'k' => Some('ğ'),
        'p' => Some('b'),
        't' => Some('d'),
        'ç' => Some('c'),
        _ => None,
    }
}

/// Expand `term` into a deduplicated list of alternates, original first.
pub fn expand_search_term(term: &str) -> Vec<String> {
    let term = term.trim();
    if term.chars().count() < MIN_EXPANDABLE_CHARS {
        return vec![term.to_string()];
    }

    let mut alternates = vec![term.to_string()];

    let mut chars = term.chars();
    if let Some(last) = chars.next_back() {
        let stem = chars.as_str();
        let lowered = last.to_lowercase().next().unwrap_or(last);
        if let Some(soft) = soft_counterpart(lowered) {
            let softened = format!("{stem}{soft}");
            if lowered == 'k' {
                for suffix in SOFTENED_K_SUFFIXES {
                    alternates.push(format!("{softened}{suffix}"));
                }
            }
            alternates.insert(1, softened);
        }
    }

    let bases = alternates.clone();
    for base in &bases {
        for suffix in SUFFIXES {
            alternates.push(format!("{base}{suffix}"));
        }
    }

    dedup_preserving_order(alternates)
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
