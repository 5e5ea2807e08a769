use serde::{Deserialize, Serialize};

use crate::Definition;

/// Serializable bundle of definitions used for import and distribution.
///
/// Raw (uncompiled) bundles feed the compiler; compiled bundles are what the
/// CLI writes out after a successful run.
///
/// # Examples
///
/// ```
/// use definition_core::*;
///
/// let mut package = DefinitionPackage::new("1.0.0", "2024-01-15T10:30:00Z");
/// package.name = Some("case-types".into());
/// package.definitions.push(Definition::new("base"));
/// package.definitions.push(Definition::new("case").with_parent("base"));
///
/// assert_eq!(package.definition_count(), 2);
/// assert!(package.find("case").is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionPackage {
    /// Definition contract version (populated from
    /// [`DEFINITION_CONTRACT_VERSION`](crate::DEFINITION_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Package format version (semver string).
    pub version: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 timestamp for package creation.
    #[serde(default)]
    pub generated_at: String,
    /// Hash of the deterministic definition content.
    #[serde(default)]
    pub bundle_hash: Option<String>,
    pub definitions: Vec<Definition>,
}

impl DefinitionPackage {
    /// Creates a package with required fields.
    pub fn new(version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            schema_version: Some(crate::DEFINITION_CONTRACT_VERSION.to_string()),
            version: version.into(),
            name: None,
            description: None,
            generated_at: generated_at.into(),
            bundle_hash: None,
            definitions: Vec::new(),
        }
    }

    /// Returns the number of definitions in this package.
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Finds a definition by identifier.
    pub fn find(&self, identifier: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.identifier == identifier)
    }
}
