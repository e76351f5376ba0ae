//! Applies configuration onto a manifest document.
//!
//! Required identity/publisher fields abort the stage when missing; optional
//! sub-nodes are only overwritten when the configuration actually carries a
//! replacement value, so re-applying with identical configuration is
//! deterministic and never drops existing nodes.

use super::{ManifestDocument, RootComponent, require_identifier};
use crate::config::{ConfigStore, template};
use crate::error::{Error, Result, Warning};
use serde_json::Value;
use std::path::Path;

/// Component-type code for a custom control entry.
pub const COMPONENT_TYPE_CONTROL: u32 = 66;

/// Behavior code: include the component's subcomponents.
pub const BEHAVIOR_INCLUDE_SUBCOMPONENTS: u32 = 0;

/// The buildable component's own identity, read from its descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReference {
    /// Component namespace.
    pub namespace: String,
    /// Component constructor name.
    pub constructor: String,
}

impl ComponentReference {
    /// Fully qualified schema name (`namespace.constructor`).
    pub fn schema_name(&self) -> String {
        format!("{}.{}", self.namespace, self.constructor)
    }
}

/// Reads the component reference from its JSON descriptor.
///
/// An unreadable or malformed descriptor degrades to configuration-supplied
/// `solution.namespace` / `solution.constructor` values with a warning; it is
/// never fatal.
pub fn load_component_reference(
    descriptor: &Path,
    cfg: &ConfigStore,
) -> (ComponentReference, Option<Warning>) {
    match read_descriptor(descriptor) {
        Ok(reference) => (reference, None),
        Err(e) => {
            log::warn!(
                "component descriptor {} unreadable ({e}), falling back to configuration",
                descriptor.display()
            );
            let fallback = ComponentReference {
                namespace: cfg.get_or("solution", "namespace", "Unknown").to_string(),
                constructor: cfg.get_or("solution", "constructor", "Component").to_string(),
            };
            (
                fallback,
                Some(Warning::DescriptorFallback {
                    path: descriptor.to_path_buf(),
                }),
            )
        }
    }
}

fn read_descriptor(path: &Path) -> Result<ComponentReference> {
    let raw = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&raw)?;
    let field = |name: &str| -> Result<String> {
        doc.get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .ok_or_else(|| Error::Config {
                reason: format!("descriptor {} missing field `{name}`", path.display()),
            })
    };
    Ok(ComponentReference {
        namespace: field("namespace")?,
        constructor: field("constructor")?,
    })
}

/// Applies configuration values onto the manifest for one packaging pass.
///
/// `managed` is the finalization flag for *this* pass; the caller re-applies
/// (or calls [`set_finalization`]) once per requested package variant.
///
/// # Errors
///
/// [`Error::ManifestField`] when a required identity/publisher field is
/// missing or not a valid identifier.
pub fn apply(
    doc: &mut ManifestDocument,
    cfg: &ConfigStore,
    reference: &ComponentReference,
    managed: bool,
) -> Result<()> {
    let unique_name = template::lookup(cfg, "solution", "name")
        .ok_or_else(|| Error::ManifestField {
            field: "solution.name".into(),
        })?
        .to_string();
    require_identifier("solution.name", &unique_name)?;

    let version = cfg
        .get_non_empty("solution", "version")
        .ok_or_else(|| Error::ManifestField {
            field: "solution.version".into(),
        })?
        .to_string();

    doc.identity.unique_name = unique_name;
    doc.identity.version = version;

    if let Some(localized) = template::lookup(cfg, "solution", "localized_name") {
        doc.identity.localized_name = Some(template::resolve(localized, cfg));
    }
    if let Some(description) = cfg.get_non_empty("solution", "description") {
        // Any existing node, including an empty one, is replaced wholesale,
        // never patched in place.
        doc.identity.description = Some(template::resolve(description, cfg));
    }

    let publisher_name = template::lookup(cfg, "publisher", "name")
        .ok_or_else(|| Error::ManifestField {
            field: "publisher.name".into(),
        })?
        .to_string();
    require_identifier("publisher.name", &publisher_name)?;
    doc.identity.publisher.unique_name = publisher_name;

    if let Some(localized) = template::lookup(cfg, "publisher", "localized_name") {
        doc.identity.publisher.localized_name = Some(template::resolve(localized, cfg));
    }
    if let Some(description) = cfg.get_non_empty("publisher", "description") {
        doc.identity.publisher.description = Some(template::resolve(description, cfg));
    }
    if let Some(prefix) = cfg.get_non_empty("publisher", "prefix") {
        require_identifier("publisher.prefix", prefix)?;
        doc.identity.publisher.prefix = Some(prefix.to_string());
    }

    doc.identity.managed = managed;

    replace_root_components(doc, reference);
    Ok(())
}

/// Rebuilds the root component list with exactly one entry for the current
/// component. Full replace: the list always reflects the current component
/// set, never accumulates.
pub fn replace_root_components(doc: &mut ManifestDocument, reference: &ComponentReference) {
    doc.root_components = vec![RootComponent {
        component_type: COMPONENT_TYPE_CONTROL,
        schema_name: reference.schema_name(),
        behavior: BEHAVIOR_INCLUDE_SUBCOMPONENTS,
    }];
}

/// Toggles the finalization flag for a packaging pass.
pub fn set_finalization(doc: &mut ManifestDocument, managed: bool) {
    doc.identity.managed = managed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Identity;

    fn cfg() -> ConfigStore {
        ConfigStore::parse(
            "solution:\n  name: Acme\n  version: 1.2.3\n  localized_name: Acme Solution\npublisher:\n  name: AcmeCorp\n  prefix: acme\n",
        )
    }

    fn reference() -> ComponentReference {
        ComponentReference {
            namespace: "Acme".into(),
            constructor: "Widget".into(),
        }
    }

    #[test]
    fn applies_required_fields() {
        let mut doc = ManifestDocument::default();
        apply(&mut doc, &cfg(), &reference(), false).unwrap();
        assert_eq!(doc.identity.unique_name, "Acme");
        assert_eq!(doc.identity.version, "1.2.3");
        assert_eq!(doc.identity.publisher.unique_name, "AcmeCorp");
        assert_eq!(doc.identity.publisher.prefix.as_deref(), Some("acme"));
        assert!(!doc.identity.managed);
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let mut doc = ManifestDocument::default();
        let no_name = ConfigStore::parse("solution:\n  version: 1.0.0\npublisher:\n  name: P\n");
        let err = apply(&mut doc, &no_name, &reference(), false).unwrap_err();
        assert!(matches!(err, Error::ManifestField { .. }));

        let no_version = ConfigStore::parse("solution:\n  name: Acme\npublisher:\n  name: P\n");
        let err = apply(&mut doc, &no_version, &reference(), false).unwrap_err();
        assert!(matches!(err, Error::ManifestField { .. }));
    }

    #[test]
    fn invalid_identifier_is_fatal() {
        let mut doc = ManifestDocument::default();
        let bad = ConfigStore::parse(
            "solution:\n  name: 9bad\n  version: 1.0.0\npublisher:\n  name: P\n",
        );
        assert!(apply(&mut doc, &bad, &reference(), false).is_err());
    }

    #[test]
    fn absent_config_values_never_drop_existing_nodes() {
        let mut doc = ManifestDocument {
            identity: Identity {
                description: Some("existing description".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        doc.identity.publisher.description = Some("existing publisher blurb".into());

        let minimal = ConfigStore::parse(
            "solution:\n  name: Acme\n  version: 1.0.0\npublisher:\n  name: AcmeCorp\n",
        );
        apply(&mut doc, &minimal, &reference(), false).unwrap();

        assert_eq!(doc.identity.description.as_deref(), Some("existing description"));
        assert_eq!(
            doc.identity.publisher.description.as_deref(),
            Some("existing publisher blurb")
        );
    }

    #[test]
    fn reapply_produces_identical_root_components() {
        let mut doc = ManifestDocument::default();
        apply(&mut doc, &cfg(), &reference(), false).unwrap();
        let first = doc.root_components.clone();
        apply(&mut doc, &cfg(), &reference(), true).unwrap();
        assert_eq!(doc.root_components, first);
        assert_eq!(doc.root_components.len(), 1);
        assert_eq!(doc.root_components[0].schema_name, "Acme.Widget");
    }

    #[test]
    fn descriptions_resolve_templates() {
        let mut doc = ManifestDocument::default();
        let templated = ConfigStore::parse(
            "solution:\n  name: Acme\n  version: 1.0.0\n  description: Package for {{solution.name}}\npublisher:\n  name: AcmeCorp\n",
        );
        apply(&mut doc, &templated, &reference(), false).unwrap();
        assert_eq!(doc.identity.description.as_deref(), Some("Package for Acme"));
    }

    #[test]
    fn unreadable_descriptor_falls_back_to_config() {
        let cfg = ConfigStore::parse("solution:\n  namespace: Cfg\n  constructor: Fallback\n");
        let (reference, warning) =
            load_component_reference(Path::new("/nonexistent/component.json"), &cfg);
        assert_eq!(reference.schema_name(), "Cfg.Fallback");
        assert!(matches!(warning, Some(Warning::DescriptorFallback { .. })));
    }

    #[test]
    fn readable_descriptor_wins_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("component.json");
        std::fs::write(
            &path,
            r#"{"namespace":"Real","constructor":"Widget","version":"0.0.1"}"#,
        )
        .unwrap();
        let cfg = ConfigStore::parse("solution:\n  namespace: Cfg\n  constructor: Fallback\n");
        let (reference, warning) = load_component_reference(&path, &cfg);
        assert_eq!(reference.schema_name(), "Real.Widget");
        assert!(warning.is_none());
    }
}
