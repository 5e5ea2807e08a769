//! Definition and package validation.
//!
//! Checks the structural invariants that identifier-based merging relies on:
//! non-empty identifiers, unique element identifiers within a scope and unique
//! definitions within a package. Schema correctness beyond that is left to the
//! consumers of compiled definitions.
//!
//! # Examples
//!
//! ```
//! use definition_core::*;
//!
//! let def = Definition::new("case").with_field(Field::new("title"));
//! assert!(validate_definition(&def).is_empty());
//!
//! let bad = Definition::new("case")
//!     .with_field(Field::new("title"))
//!     .with_field(Field::new("title"));
//! assert!(!validate_definition(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Definition, DefinitionPackage, Field};

/// Definition/package validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Package version string is empty.
    #[error("package version cannot be empty")]
    EmptyPackageVersion,
    /// Definition identifier is empty or whitespace-only.
    #[error("definition identifier cannot be empty")]
    EmptyIdentifier,
    /// Two definitions in the same package share an identifier.
    #[error("duplicate definition in package: {0}")]
    DuplicateDefinition(String),
    /// A definition names itself as its parent.
    #[error("definition {0} cannot inherit from itself")]
    SelfParent(String),
    /// A field, region or transition has an empty identifier.
    #[error("empty element identifier in {0}")]
    EmptyElementIdentifier(String),
    /// Two fields in the same scope share a name.
    #[error("duplicate field {name} in {scope}")]
    DuplicateField { scope: String, name: String },
    /// Two regions share an identifier.
    #[error("duplicate region {region} in {definition}")]
    DuplicateRegion { definition: String, region: String },
    /// Two transitions share an identifier.
    #[error("duplicate transition {transition} in {definition}")]
    DuplicateTransition {
        definition: String,
        transition: String,
    },
}

/// Validates a full definition package.
///
/// Checks for an empty version string, duplicate definition identifiers, and
/// validates each definition individually. Stops at the first problem.
///
/// # Examples
///
/// ```
/// use definition_core::*;
///
/// let mut package = DefinitionPackage::new("1.0.0", "2024-01-01T00:00:00Z");
/// package.definitions.push(Definition::new("base"));
/// assert!(validate_package(&package).is_empty());
///
/// package.definitions.push(Definition::new("base"));
/// let errors = validate_package(&package);
/// assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateDefinition(_))));
/// ```
pub fn validate_package(package: &DefinitionPackage) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if package.version.trim().is_empty() {
        errors.push(ValidationError::EmptyPackageVersion);
        return errors;
    }

    errors.extend(validate_definitions(&package.definitions));
    errors
}

/// Validates a batch of definitions: identifier uniqueness, then each
/// definition on its own.
pub fn validate_definitions(definitions: &[Definition]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for definition in definitions {
        let identifier = definition.identifier.as_str();
        if !seen.insert(identifier) {
            errors.push(ValidationError::DuplicateDefinition(identifier.to_string()));
            return errors;
        }
        errors.extend(validate_definition(definition));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

/// Validates one definition.
///
/// Checks for an empty identifier, self-inheritance, and duplicate or empty
/// element identifiers in every scope (top-level fields, each region, each
/// transition, each control).
pub fn validate_definition(definition: &Definition) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let id = definition.identifier.trim();

    if id.is_empty() {
        errors.push(ValidationError::EmptyIdentifier);
        return errors;
    }

    if definition.parent.as_deref() == Some(id) {
        errors.push(ValidationError::SelfParent(id.to_string()));
        return errors;
    }

    errors.extend(validate_fields(&definition.fields, id));
    if !errors.is_empty() {
        return errors;
    }

    let mut regions: HashSet<&str> = HashSet::new();
    for region in &definition.regions {
        let region_id = region.identifier.trim();
        if region_id.is_empty() {
            errors.push(ValidationError::EmptyElementIdentifier(id.to_string()));
            return errors;
        }
        if !regions.insert(region_id) {
            errors.push(ValidationError::DuplicateRegion {
                definition: id.to_string(),
                region: region_id.to_string(),
            });
            return errors;
        }
        errors.extend(validate_fields(&region.fields, &format!("{id}/{region_id}")));
        if !errors.is_empty() {
            return errors;
        }
    }

    let mut transitions: HashSet<&str> = HashSet::new();
    for transition in &definition.transitions {
        let transition_id = transition.identifier.trim();
        if transition_id.is_empty() {
            errors.push(ValidationError::EmptyElementIdentifier(id.to_string()));
            return errors;
        }
        if !transitions.insert(transition_id) {
            errors.push(ValidationError::DuplicateTransition {
                definition: id.to_string(),
                transition: transition_id.to_string(),
            });
            return errors;
        }
        errors.extend(validate_fields(
            &transition.fields,
            &format!("{id}/{transition_id}"),
        ));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_fields(fields: &[Field], scope: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for field in fields {
        let name = field.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyElementIdentifier(scope.to_string()));
            return errors;
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateField {
                scope: scope.to_string(),
                name: name.to_string(),
            });
            return errors;
        }
        if let Some(control) = &field.control {
            errors.extend(validate_fields(
                &control.fields,
                &format!("{scope}/{name}"),
            ));
            if !errors.is_empty() {
                return errors;
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use crate::{ControlDefinition, Region, Transition};

    use super::*;

    #[test]
    fn test_validate_package_rejects_duplicate_definitions() {
        let mut package = DefinitionPackage::new("1.0.0", "2026-02-07T00:00:00Z");
        package.definitions.push(Definition::new("case"));
        package.definitions.push(Definition::new("case"));

        let errors = validate_package(&package);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateDefinition("case".to_string())]
        );
    }

    #[test]
    fn test_validate_package_rejects_empty_version() {
        let package = DefinitionPackage::new(" ", "2026-02-07T00:00:00Z");
        assert_eq!(
            validate_package(&package),
            vec![ValidationError::EmptyPackageVersion]
        );
    }

    #[test]
    fn test_validate_definition_rejects_self_parent() {
        let def = Definition::new("case").with_parent("case");
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::SelfParent("case".to_string())]
        );
    }

    #[test]
    fn test_validate_definition_rejects_duplicate_region_field() {
        let def = Definition::new("case").with_region(
            Region::new("details")
                .with_field(Field::new("owner"))
                .with_field(Field::new("owner")),
        );
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::DuplicateField {
                scope: "case/details".to_string(),
                name: "owner".to_string(),
            }]
        );
    }

    #[test]
    fn test_validate_definition_rejects_duplicate_transition() {
        let def = Definition::new("case")
            .with_transition(Transition::new("approve"))
            .with_transition(Transition::new("approve"));
        assert!(matches!(
            validate_definition(&def).as_slice(),
            [ValidationError::DuplicateTransition { .. }]
        ));
    }

    #[test]
    fn test_validate_definition_checks_control_fields() {
        let control = ControlDefinition::new("picker").with_field(Field::new(""));
        let def = Definition::new("case").with_field(Field::new("title").with_control(control));
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::EmptyElementIdentifier(
                "case/title".to_string()
            )]
        );
    }

    #[test]
    fn test_validate_definition_accepts_same_name_in_different_scopes() {
        let def = Definition::new("case")
            .with_field(Field::new("title"))
            .with_region(Region::new("details").with_field(Field::new("title")));
        assert!(validate_definition(&def).is_empty());
    }
}
