//! Configuration loading for the packaging pipeline.
//!
//! The configuration source is a flat two-level text format: unindented
//! `section:` headers open a namespace, two-space-indented `key: value` lines
//! populate it. Comments start with `#`, a leading byte-order mark is
//! tolerated, and values may carry one pair of single or double quotes.
//!
//! The parsed [`ConfigStore`] is immutable; CLI overrides produce a new
//! merged value via [`ConfigStore::with_overrides`] rather than mutating the
//! original parse.

pub mod template;

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Conventional configuration filename in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "solution.cfg";

/// One classified line of configuration input.
///
/// A typed classifier instead of ad hoc regexes: malformed lines fall into
/// [`Line::Other`] and are skipped, never silently misparsed into a section
/// or key.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Comment,
    /// Bare identifier followed by `:` at zero indentation.
    Section(&'a str),
    /// `identifier: value` at exactly two leading spaces.
    KeyValue(&'a str, &'a str),
    /// Anything else; intentionally ignored (no nested structures).
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim_end();
    if trimmed.trim_start().is_empty() {
        return Line::Blank;
    }
    if trimmed.trim_start().starts_with('#') {
        return Line::Comment;
    }
    if let Some(rest) = trimmed.strip_prefix("  ") {
        // Key-value lines carry exactly two indentation units.
        if rest.starts_with(' ') {
            return Line::Other;
        }
        if let Some((key, value)) = rest.split_once(':') {
            if is_identifier(key) {
                return Line::KeyValue(key, value.trim());
            }
        }
        return Line::Other;
    }
    if !line.starts_with([' ', '\t']) {
        if let Some(name) = trimmed.strip_suffix(':') {
            if is_identifier(name) {
                return Line::Section(name);
            }
        }
    }
    Line::Other
}

/// Checks the `[A-Za-z][A-Za-z0-9_]*` identifier form.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strips one matching pair of leading/trailing single or double quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Immutable two-level configuration mapping: section name -> key -> value.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl ConfigStore {
    /// Loads configuration from the given path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Ok(Self::parse(&raw))
    }

    /// Parses configuration text into a store.
    ///
    /// Unrecognized lines are silently ignored; unknown sections and keys are
    /// preserved but not interpreted.
    pub fn parse(source: &str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in source.lines() {
            match classify(line) {
                Line::Section(name) => {
                    // Opening a section clears any prior key state for it.
                    sections.insert(name.to_string(), BTreeMap::new());
                    current = Some(name.to_string());
                }
                Line::KeyValue(key, value) => {
                    if let Some(section) = &current {
                        if let Some(map) = sections.get_mut(section) {
                            map.insert(key.to_string(), unquote(value).to_string());
                        }
                    }
                }
                Line::Blank | Line::Comment | Line::Other => {}
            }
        }

        Self { sections }
    }

    /// Returns the value for `section.key`, or `None` when either level is absent.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|map| map.get(key))
            .map(String::as_str)
    }

    /// Returns the value for `section.key`, or `default` when absent.
    ///
    /// Missing optional keys are not an error.
    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    /// Returns a non-empty value for `section.key`, treating the empty string
    /// as absent.
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|v| !v.is_empty())
    }

    /// Produces a new store with the given `(section, key, value)` overrides
    /// merged on top of this one.
    ///
    /// The original parse is never mutated.
    pub fn with_overrides<I, S>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let mut merged = self.clone();
        for (section, key, value) in overrides {
            merged
                .sections
                .entry(section.into())
                .or_default()
                .insert(key.into(), value.into());
        }
        merged
    }

    /// Returns whether a section exists.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}
