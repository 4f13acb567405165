//! Permission string editing
//!
//! Writes always normalise: entries are tokenized, de-duplicated keeping the
//! first occurrence, and joined with `,`.

use std::collections::HashSet;

use crate::tokenizer::{join, tokenize, tokenize_entries};

/// Normalise a permission string
pub fn normalize(raw: &str) -> String {
    join(&dedup(tokenize(raw)))
}

/// Build a normalised permission string from separate entries
pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> String {
    join(&dedup(tokenize_entries(entries)))
}

/// Whether `raw` holds `entry` exactly
pub fn contains(raw: &str, entry: &str) -> bool {
    let entry = entry.trim();
    tokenize(raw).iter().any(|existing| existing == entry)
}

/// Append `entry` unless already present
pub fn add(raw: &str, entry: &str) -> String {
    let mut entries = tokenize(raw);
    entries.extend(tokenize(entry));
    join(&dedup(entries))
}

/// Drop every occurrence of `entry`
pub fn remove(raw: &str, entry: &str) -> String {
    let entry = entry.trim();
    let entries: Vec<String> = tokenize(raw)
        .into_iter()
        .filter(|existing| existing != entry)
        .collect();
    join(&dedup(entries))
}

/// Swap `old` for `new` in place, keeping the entry position
pub fn replace(raw: &str, old: &str, new: &str) -> String {
    let old = old.trim();
    let new = new.trim();
    let entries: Vec<String> = tokenize(raw)
        .into_iter()
        .map(|existing| {
            if existing == old {
                new.to_string()
            } else {
                existing
            }
        })
        .filter(|entry| !entry.is_empty())
        .collect();
    join(&dedup(entries))
}

fn dedup(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
