//! Dotted version identifiers with bounded-component rollover.
//!
//! Versions are tuples of 3 or 4 non-negative integers. Each component is
//! bounded to `[0, 99]` for rollover purposes: incrementing a component past
//! 99 resets it to 0 and carries into the next-higher component. The top
//! component has no bound and grows indefinitely.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Upper bound of every non-leading version component.
const COMPONENT_MAX: u64 = 99;

/// Fallback used when a descriptor carries an unparsable version.
pub const FALLBACK_VERSION: &str = "0.0.1";

/// An ordered tuple of 3 or 4 non-negative integer version components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    /// Parses the dotted-integer form (`major.minor.patch[.build]`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionFormat`] for anything that is not 3 or 4
    /// dot-separated non-negative integers. Callers that can degrade fall
    /// back to [`FALLBACK_VERSION`] instead of aborting.
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<u64> = input
            .trim()
            .split('.')
            .map(|p| p.parse::<u64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| Error::VersionFormat {
                input: input.to_string(),
            })?;

        if parts.len() < 3 || parts.len() > 4 {
            return Err(Error::VersionFormat {
                input: input.to_string(),
            });
        }
        Ok(Self { parts })
    }

    /// The fixed recoverable-degradation default.
    pub fn fallback() -> Self {
        Self {
            parts: vec![0, 0, 1],
        }
    }

    /// Increments the lowest-order component with cascading carry.
    ///
    /// A component exceeding 99 resets to 0 and increments the next-higher
    /// component; the carry stops at the top component, which is unbounded.
    pub fn increment(&self) -> Self {
        let mut parts = self.parts.clone();
        let mut idx = parts.len() - 1;
        loop {
            parts[idx] += 1;
            if parts[idx] <= COMPONENT_MAX || idx == 0 {
                break;
            }
            parts[idx] = 0;
            idx -= 1;
        }
        Self { parts }
    }

    /// Returns the components in order, highest first.
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

/// Writes `version` into the `version` field of every descriptor file.
///
/// Descriptors are JSON documents (the component descriptor and the packaging
/// metadata file); each is read, its top-level `version` field replaced, and
/// written back with unrelated fields preserved, so the descriptors never
/// diverge within one run.
pub fn sync(version: &Version, descriptors: &[&Path]) -> Result<()> {
    let rendered = version.to_string();
    for path in descriptors {
        let raw = std::fs::read_to_string(path)?;
        let mut doc: Value = serde_json::from_str(&raw)?;
        match doc.as_object_mut() {
            Some(obj) => {
                obj.insert("version".to_string(), Value::String(rendered.clone()));
            }
            None => {
                return Err(Error::Config {
                    reason: format!("descriptor {} is not a JSON object", path.display()),
                })
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        log::debug!("synced version {rendered} into {}", path.display());
    }
    Ok(())
}
