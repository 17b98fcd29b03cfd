//! Title canonicalization.

use regex::Regex;
use std::sync::OnceLock;

/// Publisher names that commonly appear as title suffixes in the repository
/// ("Islam - Wikipedia", "Mathematik | Klexikon", ...).
const PUBLISHERS: &[&str] = &[
    "wikipedia",
    "wikibooks",
    "wikiversity",
    "klexikon",
    "lernhelfer",
    "planet-schule",
    "planet schule",
    "lehrer-online",
    "sofatutor",
    "learningapps",
    "serlo",
];

fn publisher_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = PUBLISHERS.join("|");
        Regex::new(&format!(r"(?i)\s*(?:::|[-–—|:(])\s*(?:{}).*$", names)).unwrap()
    })
}

// "(example.de)" style suffixes that name the hosting site.
fn domain_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\([^)]*\.(?:de|com|org|net|edu)\)$").unwrap())
}

/// Strips publisher suffixes from a title and cleans up the remainder.
/// Idempotent: normalizing an already-normalized title is a no-op.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    let stripped = publisher_suffix().replace(trimmed, "");
    let stripped = domain_suffix().replace(&stripped, "");
    let replaced = stripped.replace('&', " ");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
