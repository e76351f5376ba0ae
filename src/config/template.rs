//! `{{section.key}}` placeholder substitution over configuration values.
//!
//! Free-text fields (descriptions, localized names, hook arguments) may
//! reference configuration values. Lookups go through a static alias table
//! so templates written against legacy key names keep resolving.

use super::ConfigStore;

/// Alias table: requested `(section, key)` -> candidate keys tried in order.
///
/// The first candidate is always the requested key itself; later entries are
/// legacy spellings still found in older configuration files.
const ALIASES: &[(&str, &str, &[&str])] = &[
    ("solution", "name", &["name", "unique_name"]),
    ("solution", "unique_name", &["unique_name", "name"]),
    ("solution", "display_name", &["display_name", "localized_name"]),
    ("solution", "localized_name", &["localized_name", "display_name"]),
    ("publisher", "name", &["name", "unique_name"]),
    ("publisher", "unique_name", &["unique_name", "name"]),
    ("publisher", "display_name", &["display_name", "localized_name"]),
    ("publisher", "localized_name", &["localized_name", "display_name"]),
];

/// Looks up `section.key` honoring the legacy alias table.
pub fn lookup<'a>(cfg: &'a ConfigStore, section: &str, key: &str) -> Option<&'a str> {
    let candidates = ALIASES
        .iter()
        .find(|(s, k, _)| *s == section && *k == key)
        .map(|(_, _, c)| *c);

    match candidates {
        Some(keys) => keys.iter().find_map(|k| cfg.get_non_empty(section, k)),
        None => cfg.get_non_empty(section, key),
    }
}

/// Substitutes `{{section.key}}` tokens in `template` with configuration
/// values.
///
/// Tokens with no resolvable value are left intact so callers can detect
/// unresolved placeholders. Replacements are independent literal scans, so
/// the result is deterministic and a second pass over fully-resolved output
/// is a no-op.
pub fn resolve(template: &str, cfg: &ConfigStore) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let token = &after[..end];
                match parse_token(token).and_then(|(s, k)| lookup(cfg, s, k)) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(token);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated token, emit verbatim.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Splits a token body into `(section, key)` if both halves are identifiers.
fn parse_token(token: &str) -> Option<(&str, &str)> {
    let (section, key) = token.split_once('.')?;
    (super::is_identifier(section) && super::is_identifier(key)).then_some((section, key))
}
