//! Text folding shared by every case-insensitive predicate.
//!
//! The in-memory store, the partitioner and the REST pattern builder all go
//! through [`fold`], so "contains" and "equals" mean the same thing everywhere.

/// Trims and lower-cases a value.
pub fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Case-insensitive substring test. An empty needle matches nothing.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    let needle = fold(needle);
    if needle.is_empty() {
        return false;
    }
    fold(haystack).contains(&needle)
}

/// Case-insensitive equality.
pub fn equals_folded(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

/// Trims a raw input; empty strings become `None`.
pub fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// First `n` characters, counted in chars rather than bytes.
pub fn char_prefix(value: &str, n: usize) -> &str {
    match value.char_indices().nth(n) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
