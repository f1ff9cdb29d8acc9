use crate::types::StoreQuery;

/// Apostrophe-like characters that name comparison ignores.
#[must_use]
pub fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '\u{2018}' | '`' | '\u{b4}')
}

/// Canonical form used for name comparison: lower-case, apostrophes
/// removed, runs of whitespace collapsed to one space.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !is_apostrophe(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips the branch suffix from a store name to get the brand as it
/// appears in POI `name` tags.
///
/// A trailing city name is removed when present ("Denns BioMarkt Erlangen"
/// in Erlangen → "Denns BioMarkt"). Otherwise names with more than two
/// words lose their last word. Short names are returned as-is.
#[must_use]
pub fn brand_token(name: &str, city: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let city_words: Vec<String> = city.split_whitespace().map(str::to_lowercase).collect();

    if !city_words.is_empty() && words.len() > city_words.len() {
        let tail = &words[words.len() - city_words.len()..];
        let city_suffix = tail
            .iter()
            .zip(&city_words)
            .all(|(word, city_word)| word.to_lowercase() == *city_word);
        if city_suffix {
            return words[..words.len() - city_words.len()].join(" ");
        }
    }

    if words.len() > 2 {
        return words[..words.len() - 1].join(" ");
    }

    words.join(" ")
}

/// Deterministic identifier for a store record that arrives without one.
///
/// SHA-256 over the normalized name, street, zip, and city, NUL-separated,
/// hex-encoded.
#[must_use]
pub fn store_key(query: &StoreQuery) -> String {
    use sha2::{Digest, Sha256};
    let input = format!(
        "{}\x00{}\x00{}\x00{}",
        normalize_name(&query.name),
        normalize_name(&query.street),
        query.zip.trim(),
        normalize_name(&query.city),
    );
    format!("{:x}", Sha256::digest(input.as_bytes()))
}
