//! Inheritance merging of definitions.
//!
//! [`merge_definitions`] builds the resolved form of a child definition from
//! its already-resolved parent. Neither input is modified; the result is a new
//! [`Definition`].
//!
//! Merge rules:
//!
//! - Scalar attributes: the child's value when declared, otherwise the
//!   parent's.
//! - Element lists (fields, regions, transitions and everything nested in
//!   them) are unioned by identifier. Inherited elements keep the parent's
//!   order; a child element with the same identifier is merged into that slot
//!   attribute by attribute. Child-only elements are appended in child order.
//! - Incompatible redeclarations are rejected with a [`MergeConflict`].
//!
//! # Example
//!
//! ```
//! use definition_core::*;
//!
//! let base = Definition::new("base")
//!     .with_field(Field::new("title").with_type("an..180").mandatory());
//! let child = Definition::new("case")
//!     .with_parent("base")
//!     .with_field(Field::new("title").with_type("an..40"))
//!     .with_field(Field::new("caseNumber").with_type("n..10"));
//!
//! let merged = merge_definitions(&base, &child).unwrap();
//! assert_eq!(merged.identifier, "case");
//! assert_eq!(merged.fields.len(), 2);
//!
//! let title = merged.find_field("title").unwrap();
//! assert_eq!(title.field_type.as_deref(), Some("an..40")); // child wins
//! assert_eq!(title.mandatory, Some(true)); // inherited
//! ```

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
    ControlDefinition, ControlParam, Definition, ElementKind, Field, Region, Transition,
};

/// Reason two declarations of the same identifier cannot be merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictKind {
    /// Both sides declare a field type, and the type families differ.
    #[error("type `{declared}` is incompatible with inherited type `{inherited}`")]
    IncompatibleType { inherited: String, declared: String },
    /// The identifier names a different kind of element on each side.
    #[error("declared as {declared} but inherited as {inherited}")]
    ElementKind {
        inherited: ElementKind,
        declared: ElementKind,
    },
}

/// Two declarations of one identifier with incompatible shapes.
///
/// # Examples
///
/// ```
/// use definition_core::*;
///
/// let base = Definition::new("base").with_field(Field::new("dueDate").with_type("date"));
/// let child = Definition::new("task")
///     .with_parent("base")
///     .with_field(Field::new("dueDate").with_type("n..10"));
///
/// let err = merge_definitions(&base, &child).unwrap_err();
/// assert_eq!(err.identifier, "dueDate");
/// assert!(matches!(err.kind, ConflictKind::IncompatibleType { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conflicting declarations of `{identifier}`: {kind}")]
pub struct MergeConflict {
    pub identifier: String,
    pub kind: ConflictKind,
}

/// Merges `child` with its fully resolved `parent`.
///
/// The returned definition keeps the child's identifier, parent reference and
/// abstract flag. See the [module docs](self) for the element rules.
///
/// # Errors
///
/// Returns [`MergeConflict`] when a field is redeclared with a type of a
/// different family, or when an identifier is a field on one side and a
/// region on the other.
pub fn merge_definitions(
    parent: &Definition,
    child: &Definition,
) -> Result<Definition, MergeConflict> {
    check_element_kinds(parent, child)?;

    Ok(Definition {
        identifier: child.identifier.clone(),
        parent: child.parent.clone(),
        definition_type: inherit(&child.definition_type, &parent.definition_type),
        is_abstract: child.is_abstract,
        purpose: inherit(&child.purpose, &parent.purpose),
        fields: merge_lists(&parent.fields, &child.fields)?,
        regions: merge_lists(&parent.regions, &child.regions)?,
        transitions: merge_lists(&parent.transitions, &child.transitions)?,
    })
}

/// Fills every undeclared attribute of `field` from another declaration of
/// the same field, such as a `System` copy of it in a region.
///
/// `field` keeps its own name, display type, path and region.
///
/// # Errors
///
/// Returns [`MergeConflict`] when both declare types of different families.
///
/// # Examples
///
/// ```
/// use definition_core::*;
///
/// let visible = Field::new("owner");
/// let hidden = Field::new("owner")
///     .with_type("an..50")
///     .with_display_type(DisplayType::System);
///
/// let merged = merge_field(&visible, &hidden).unwrap();
/// assert_eq!(merged.field_type.as_deref(), Some("an..50"));
/// assert_eq!(merged.display_type, None);
/// ```
pub fn merge_field(field: &Field, other: &Field) -> Result<Field, MergeConflict> {
    let mut merged = field.merge_from(other)?;
    merged.display_type = field.display_type;
    merged.path = field.path.clone();
    merged.region = field.region.clone();
    Ok(merged)
}

/// Element that can absorb an inherited declaration of itself.
trait Mergeable: Clone {
    fn key(&self) -> Cow<'_, str>;

    /// Returns `self` with every undeclared attribute taken from `inherited`.
    fn merge_from(&self, inherited: &Self) -> Result<Self, MergeConflict>;
}

fn merge_lists<T: Mergeable>(inherited: &[T], declared: &[T]) -> Result<Vec<T>, MergeConflict> {
    let by_key: HashMap<Cow<'_, str>, &T> = declared.iter().map(|e| (e.key(), e)).collect();
    let mut absorbed: HashSet<Cow<'_, str>> = HashSet::new();
    let mut merged = Vec::with_capacity(inherited.len() + declared.len());

    for parent_element in inherited {
        let key = parent_element.key();
        match by_key.get(key.as_ref()) {
            Some(own) => {
                merged.push(own.merge_from(parent_element)?);
                absorbed.insert(key);
            }
            None => merged.push(parent_element.clone()),
        }
    }

    for own in declared {
        if !absorbed.contains(own.key().as_ref()) {
            merged.push(own.clone());
        }
    }

    Ok(merged)
}

fn inherit<T: Clone>(declared: &Option<T>, inherited: &Option<T>) -> Option<T> {
    declared.clone().or_else(|| inherited.clone())
}

fn merge_controls(
    declared: &Option<ControlDefinition>,
    inherited: &Option<ControlDefinition>,
) -> Result<Option<ControlDefinition>, MergeConflict> {
    match (declared, inherited) {
        (Some(own), Some(parent)) => own.merge_from(parent).map(Some),
        _ => Ok(inherit(declared, inherited)),
    }
}

/// Type family of a declared field type: the leading alphabetic part,
/// so `an..180` and `an40` are both `an`.
fn type_family(field_type: &str) -> &str {
    let trimmed = field_type.trim();
    let end = trimmed
        .find(|c: char| c == '.' || c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].trim()
}

fn check_element_kinds(parent: &Definition, child: &Definition) -> Result<(), MergeConflict> {
    let parent_fields: HashSet<&str> = parent.fields.iter().map(|f| f.name.as_str()).collect();
    let parent_regions: HashSet<&str> = parent
        .regions
        .iter()
        .map(|r| r.identifier.as_str())
        .collect();

    if let Some(region) = child
        .regions
        .iter()
        .find(|r| parent_fields.contains(r.identifier.as_str()))
    {
        return Err(MergeConflict {
            identifier: region.identifier.clone(),
            kind: ConflictKind::ElementKind {
                inherited: ElementKind::Field,
                declared: ElementKind::Region,
            },
        });
    }

    if let Some(field) = child
        .fields
        .iter()
        .find(|f| parent_regions.contains(f.name.as_str()))
    {
        return Err(MergeConflict {
            identifier: field.name.clone(),
            kind: ConflictKind::ElementKind {
                inherited: ElementKind::Region,
                declared: ElementKind::Field,
            },
        });
    }

    Ok(())
}

impl Mergeable for ControlParam {
    fn key(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Owned(format!("{}|{}", self.identifier, name)),
            None => Cow::Borrowed(&self.identifier),
        }
    }

    fn merge_from(&self, inherited: &Self) -> Result<Self, MergeConflict> {
        Ok(Self {
            identifier: self.identifier.clone(),
            name: inherit(&self.name, &inherited.name),
            param_type: inherit(&self.param_type, &inherited.param_type),
            value: inherit(&self.value, &inherited.value),
        })
    }
}

impl Mergeable for ControlDefinition {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.identifier)
    }

    fn merge_from(&self, inherited: &Self) -> Result<Self, MergeConflict> {
        Ok(Self {
            identifier: self.identifier.clone(),
            params: merge_lists(&inherited.params, &self.params)?,
            fields: merge_lists(&inherited.fields, &self.fields)?,
            owner: inherit(&self.owner, &inherited.owner),
        })
    }
}

impl Mergeable for Field {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn merge_from(&self, inherited: &Self) -> Result<Self, MergeConflict> {
        if let (Some(declared), Some(parent_type)) = (&self.field_type, &inherited.field_type) {
            if !type_family(declared).eq_ignore_ascii_case(type_family(parent_type)) {
                return Err(MergeConflict {
                    identifier: self.name.clone(),
                    kind: ConflictKind::IncompatibleType {
                        inherited: parent_type.clone(),
                        declared: declared.clone(),
                    },
                });
            }
        }

        Ok(Self {
            name: self.name.clone(),
            field_type: inherit(&self.field_type, &inherited.field_type),
            default_value: inherit(&self.default_value, &inherited.default_value),
            order: inherit(&self.order, &inherited.order),
            display_type: inherit(&self.display_type, &inherited.display_type),
            mandatory: inherit(&self.mandatory, &inherited.mandatory),
            mandatory_enforced: inherit(&self.mandatory_enforced, &inherited.mandatory_enforced),
            multi_valued: inherit(&self.multi_valued, &inherited.multi_valued),
            is_override: inherit(&self.is_override, &inherited.is_override),
            preview_empty: inherit(&self.preview_empty, &inherited.preview_empty),
            dms_type: inherit(&self.dms_type, &inherited.dms_type),
            uri: inherit(&self.uri, &inherited.uri),
            label_id: inherit(&self.label_id, &inherited.label_id),
            tooltip_id: inherit(&self.tooltip_id, &inherited.tooltip_id),
            max_length: inherit(&self.max_length, &inherited.max_length),
            control: merge_controls(&self.control, &inherited.control)?,
            path: inherit(&self.path, &inherited.path),
            region: inherit(&self.region, &inherited.region),
        })
    }
}

impl Mergeable for Region {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.identifier)
    }

    fn merge_from(&self, inherited: &Self) -> Result<Self, MergeConflict> {
        Ok(Self {
            identifier: self.identifier.clone(),
            order: inherit(&self.order, &inherited.order),
            display_type: inherit(&self.display_type, &inherited.display_type),
            label_id: inherit(&self.label_id, &inherited.label_id),
            fields: merge_lists(&inherited.fields, &self.fields)?,
            control: merge_controls(&self.control, &inherited.control)?,
        })
    }
}

impl Mergeable for Transition {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.identifier)
    }

    fn merge_from(&self, inherited: &Self) -> Result<Self, MergeConflict> {
        Ok(Self {
            identifier: self.identifier.clone(),
            order: inherit(&self.order, &inherited.order),
            display_type: inherit(&self.display_type, &inherited.display_type),
            label_id: inherit(&self.label_id, &inherited.label_id),
            event_id: inherit(&self.event_id, &inherited.event_id),
            next_primary_state: inherit(&self.next_primary_state, &inherited.next_primary_state),
            next_secondary_state: inherit(
                &self.next_secondary_state,
                &inherited.next_secondary_state,
            ),
            purpose: inherit(&self.purpose, &inherited.purpose),
            is_default: inherit(&self.is_default, &inherited.is_default),
            immediate: inherit(&self.immediate, &inherited.immediate),
            fields: merge_lists(&inherited.fields, &self.fields)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::DisplayType;

    use super::*;

    #[test]
    fn test_merge_inherits_missing_elements_in_parent_order() {
        let base = Definition::new("base")
            .with_field(Field::new("f1"))
            .with_field(Field::new("f2"))
            .with_transition(Transition::new("approve").with_event("approve"));
        let child = Definition::new("child")
            .with_parent("base")
            .with_field(Field::new("f3"))
            .with_field(Field::new("f1").with_default_value("x"));

        let merged = merge_definitions(&base, &child).unwrap();
        let names: Vec<&str> = merged.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["f1", "f2", "f3"]);
        assert_eq!(merged.fields[0].default_value.as_deref(), Some("x"));
        assert_eq!(merged.transitions, base.transitions);
    }

    #[test]
    fn test_merge_does_not_touch_inputs() {
        let base = Definition::new("base").with_field(Field::new("f1").mandatory());
        let child = Definition::new("child").with_parent("base");
        let before = child.clone();

        let merged = merge_definitions(&base, &child).unwrap();
        assert_eq!(child, before);
        assert_eq!(merged.fields.len(), 1);
        assert_eq!(merged.parent.as_deref(), Some("base"));
    }

    #[test]
    fn test_merge_keeps_tombstone_of_child() {
        let base = Definition::new("base").with_field(Field::new("f1").with_type("an..10"));
        let child = Definition::new("child")
            .with_parent("base")
            .with_field(Field::deleted("f1"));

        let merged = merge_definitions(&base, &child).unwrap();
        assert_eq!(merged.fields[0].display_type, Some(DisplayType::Delete));
        assert_eq!(merged.fields[0].field_type.as_deref(), Some("an..10"));
    }

    #[test]
    fn test_merge_region_fields_by_name() {
        let base = Definition::new("base").with_region(
            Region::new("details")
                .with_order(1)
                .with_field(Field::new("owner").mandatory()),
        );
        let child = Definition::new("child").with_parent("base").with_region(
            Region::new("details")
                .with_field(Field::new("owner").with_order(5))
                .with_field(Field::new("reviewer")),
        );

        let merged = merge_definitions(&base, &child).unwrap();
        let region = merged.find_region("details").unwrap();
        assert_eq!(region.order, Some(1));
        assert_eq!(region.fields.len(), 2);
        assert_eq!(region.fields[0].mandatory, Some(true));
        assert_eq!(region.fields[0].order, Some(5));
    }

    #[test]
    fn test_merge_control_params_by_identifier_and_name() {
        let base_control = ControlDefinition::new("default_value_pattern")
            .with_param(ControlParam::new("template").with_value("$[title]"));
        let child_control = ControlDefinition::new("default_value_pattern")
            .with_param(ControlParam::new("template").with_value("$[name]"))
            .with_param(ControlParam::new("title").with_name("property_binding"));
        let base =
            Definition::new("base").with_field(Field::new("code").with_control(base_control));
        let child = Definition::new("child")
            .with_parent("base")
            .with_field(Field::new("code").with_control(child_control));

        let merged = merge_definitions(&base, &child).unwrap();
        let params = &merged.fields[0].control.as_ref().unwrap().params;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].value.as_deref(), Some("$[name]"));
    }

    #[test]
    fn test_merge_accepts_same_type_family() {
        let base = Definition::new("base").with_field(Field::new("title").with_type("an..180"));
        let child = Definition::new("child")
            .with_parent("base")
            .with_field(Field::new("title").with_type("AN..40"));
        assert!(merge_definitions(&base, &child).is_ok());
    }

    #[test]
    fn test_merge_rejects_incompatible_field_type() {
        let base = Definition::new("base").with_field(Field::new("title").with_type("an..180"));
        let child = Definition::new("child")
            .with_parent("base")
            .with_field(Field::new("title").with_type("n..10"));

        let err = merge_definitions(&base, &child).unwrap_err();
        assert_eq!(
            err,
            MergeConflict {
                identifier: "title".to_string(),
                kind: ConflictKind::IncompatibleType {
                    inherited: "an..180".to_string(),
                    declared: "n..10".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_merge_rejects_field_redeclared_as_region() {
        let base = Definition::new("base").with_field(Field::new("details"));
        let child = Definition::new("child")
            .with_parent("base")
            .with_region(Region::new("details"));

        let err = merge_definitions(&base, &child).unwrap_err();
        assert_eq!(
            err.kind,
            ConflictKind::ElementKind {
                inherited: ElementKind::Field,
                declared: ElementKind::Region,
            }
        );
    }

    #[test]
    fn test_type_family() {
        assert_eq!(type_family("an..180"), "an");
        assert_eq!(type_family("n..10"), "n");
        assert_eq!(type_family("an40"), "an");
        assert_eq!(type_family("datetime"), "datetime");
    }
}
