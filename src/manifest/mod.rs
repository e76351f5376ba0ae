//! Typed manifest document model and persistence.
//!
//! The manifest describes a packaged solution: an identity node with a
//! nested publisher and the list of root components included in the package.
//! Optional sub-nodes are modelled as `Option` fields so "does this node
//! exist" is an explicit check rather than structural probing.

pub mod transform;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Manifest filename inside the packaging work directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Root of the manifest tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDocument {
    /// Solution identity, including the nested publisher.
    pub identity: Identity,
    /// Components included in the package. Fully replaced, never appended,
    /// on each transformation pass.
    #[serde(default)]
    pub root_components: Vec<RootComponent>,
}

/// Solution identity node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique solution identifier (`[A-Za-z][A-Za-z0-9_]*`).
    pub unique_name: String,
    /// Human-readable display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_name: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dotted version string, kept in sync with the component descriptors.
    pub version: String,
    /// Finalization flag: `true` for the locked/managed variant, `false`
    /// for the editable/unmanaged one. Re-set once per packaging pass.
    pub managed: bool,
    /// Publishing entity.
    pub publisher: Publisher,
}

/// Publishing entity node nested under the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    /// Unique publisher identifier.
    pub unique_name: String,
    /// Human-readable publisher name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_name: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Customization prefix (`[A-Za-z][A-Za-z0-9_]*`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// One entry of the root component list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootComponent {
    /// Numeric component-type code.
    pub component_type: u32,
    /// Fully qualified schema name (`namespace.constructor`).
    pub schema_name: String,
    /// Numeric behavior code.
    pub behavior: u32,
}

impl ManifestDocument {
    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persists the manifest as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Validates the `[A-Za-z][A-Za-z0-9_]*` identifier form for manifest names.
///
/// # Errors
///
/// Returns [`Error::ManifestField`] naming the offending field.
pub fn require_identifier(field: &str, value: &str) -> Result<()> {
    if crate::config::is_identifier(value) {
        Ok(())
    } else {
        Err(Error::ManifestField {
            field: format!("{field} ({value:?} is not a valid identifier)"),
        })
    }
}
