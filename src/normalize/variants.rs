//! Search-variant generation.
//!
//! Derives alternative spellings of a normalized title so the upstream
//! search (case-sensitive, no lemmatization, inconsistent umlaut storage)
//! still finds the resource. The returned set always contains the input
//! itself and is free of duplicates.

use std::collections::HashSet;

/// Generates the variant set for a normalized title, input first.
pub fn title_variants(title: &str) -> Vec<String> {
    let title = title.trim();
    if title.is_empty() {
        return Vec::new();
    }

    let mut variants = Vec::new();
    let mut seen = HashSet::new();
    add(&mut variants, &mut seen, title.to_string());

    let lower = title.to_lowercase();
    add(&mut variants, &mut seen, lower.clone());
    add(&mut variants, &mut seen, fold_umlauts(&lower));

    if lower.contains('-') {
        add(&mut variants, &mut seen, collapse(&lower.replace('-', "")));
        add(&mut variants, &mut seen, collapse(&lower.replace('-', " ")));
    }

    add(&mut variants, &mut seen, alphanumeric_only(&lower));

    for stripped in ending_stripped_variants(&lower) {
        add(&mut variants, &mut seen, stripped);
    }

    variants
}

/// Replaces German umlauts and sharp s with their ASCII transcriptions.
pub fn fold_umlauts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'ß' => out.push_str("ss"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            _ => out.push(c),
        }
    }
    out
}

fn alphanumeric_only(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse(&replaced)
}

/// One variant per word that carries a German adjective ending
/// (`-e`, `-er`, `-es`, `-en`, `-em`), with that ending removed.
fn ending_stripped_variants(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out = Vec::new();
    for (index, word) in words.iter().enumerate() {
        if word.chars().count() < 5 {
            continue;
        }
        if let Some(stem) = strip_adjective_ending(word) {
            let mut replaced: Vec<String> = words.iter().map(|w| w.to_string()).collect();
            replaced[index] = stem;
            out.push(replaced.join(" "));
        }
    }
    out
}

fn strip_adjective_ending(word: &str) -> Option<String> {
    // Two-letter endings first so "kleiner" strips to "klein", not "kleine".
    for ending in ["er", "es", "en", "em", "e"] {
        if let Some(stem) = word.strip_suffix(ending) {
            if !stem.is_empty() {
                return Some(stem.to_string());
            }
        }
    }
    None
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn add(variants: &mut Vec<String>, seen: &mut HashSet<String>, candidate: String) {
    if !candidate.trim().is_empty() && seen.insert(candidate.to_lowercase()) {
        variants.push(candidate);
    }
}
