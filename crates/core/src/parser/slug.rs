//! Title normalisation, slugs and per-source slug aliases.

use std::collections::HashMap;

/// Known listing slugs that differ from the catalog slug.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("60-minutes-us", "60-minutes"),
    ("the-office-us", "the-office"),
    ("house-of-cards-2013", "house-of-cards"),
    ("shameless-us", "shameless-2011"),
    ("doctor-who-2005", "doctor-who"),
    ("the-flash", "the-flash-2014"),
    ("marvels-agents-of-s-h-i-e-l-d", "agents-of-s-h-i-e-l-d"),
    ("scandal-us", "scandal"),
    ("castle-2009", "castle"),
    ("archer-2009", "archer"),
];

/// Turn listing title text into display form: separators become spaces,
/// whitespace is collapsed, dangling punctuation is trimmed.
pub fn normalize_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ':' || c.is_whitespace())
        .to_string()
}

/// Lowercase ASCII alphanumerics joined by single hyphens.
pub fn slugify(title: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            current.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        // anything else (apostrophes, brackets, accents) is dropped in place
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}

/// Whether a string is already a well-formed slug.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Slug remaps applied after slugification.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with the built-in remaps.
    pub fn with_defaults() -> Self {
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self { aliases }
    }

    /// Add or replace remaps; later entries win.
    pub fn extend<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (from, to) in entries {
            self.aliases.insert(from.into(), to.into());
        }
        self
    }

    pub fn resolve(&self, slug: &str) -> String {
        self.aliases
            .get(slug)
            .cloned()
            .unwrap_or_else(|| slug.to_string())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
