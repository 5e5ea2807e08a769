//! Stripping of tombstoned and system elements.

use std::collections::{HashMap, HashSet};

use definition_core::{Definition, Element, Field, MergeConflict, merge_field};
use tracing::{debug, warn};

use crate::report::Removal;

/// Removes every element carrying the `Delete` tombstone.
///
/// Covers definition fields, regions and their fields, transitions and their
/// fields, and fields nested in controls at any depth. Returns one
/// [`Removal`] per stripped element.
///
/// # Examples
///
/// ```
/// use definition_compiler::remove_deleted_elements;
/// use definition_core::{Definition, Field};
///
/// let mut def = Definition::new("case")
///     .with_field(Field::new("title"))
///     .with_field(Field::deleted("legacy"));
///
/// let removed = remove_deleted_elements(&mut def);
/// assert_eq!(removed.len(), 1);
/// assert_eq!(removed[0].identifier, "legacy");
/// assert!(def.find_field("legacy").is_none());
/// ```
pub fn remove_deleted_elements(definition: &mut Definition) -> Vec<Removal> {
    let root = definition.identifier.clone();
    let mut removals = Vec::new();

    strip_fields(&mut definition.fields, &root, &root, &mut removals);

    definition.regions.retain(|region| {
        if region.is_tombstone() {
            removals.push(removed(&root, region, &root));
        }
        !region.is_tombstone()
    });
    for region in &mut definition.regions {
        let scope = format!("{root}/{}", region.identifier);
        strip_fields(&mut region.fields, &root, &scope, &mut removals);
        if let Some(control) = &mut region.control {
            strip_fields(&mut control.fields, &root, &scope, &mut removals);
        }
    }

    definition.transitions.retain(|transition| {
        if transition.is_tombstone() {
            removals.push(removed(&root, transition, &root));
        }
        !transition.is_tombstone()
    });
    for transition in &mut definition.transitions {
        let scope = format!("{root}/{}", transition.identifier);
        strip_fields(&mut transition.fields, &root, &scope, &mut removals);
    }

    removals
}

/// Removes transitions classified `System`.
pub fn remove_system_transitions(definition: &mut Definition) -> Vec<Removal> {
    let root = definition.identifier.clone();
    let mut removals = Vec::new();
    definition.transitions.retain(|transition| {
        if transition.is_system() {
            removals.push(system(&root, transition));
        }
        !transition.is_system()
    });
    removals
}

/// Removes regions classified `System`, together with their fields, then
/// reconciles fields declared under the same name at the top level and in
/// the remaining regions.
///
/// For every name declared more than once:
///
/// - exactly one copy is visible (not `System`): the `System` copies are
///   merged into it and removed;
/// - every copy is `System` and all are identical: the first one is kept;
/// - otherwise all copies stay and a warning is logged.
///
/// # Examples
///
/// ```
/// use definition_compiler::{RemovalReason, remove_system_regions};
/// use definition_core::{Definition, DisplayType, Field, Region};
///
/// let mut def = Definition::new("case")
///     .with_field(
///         Field::new("owner")
///             .with_type("an..50")
///             .with_display_type(DisplayType::System),
///     )
///     .with_region(Region::new("details").with_field(Field::new("owner")));
///
/// let removed = remove_system_regions(&mut def);
/// assert_eq!(removed[0].reason, RemovalReason::Duplicate);
/// assert!(def.fields.is_empty());
/// assert_eq!(
///     def.regions[0].fields[0].field_type.as_deref(),
///     Some("an..50")
/// );
/// ```
pub fn remove_system_regions(definition: &mut Definition) -> Vec<Removal> {
    let root = definition.identifier.clone();
    let mut removals = Vec::new();
    definition.regions.retain(|region| {
        if region.is_system() {
            removals.push(system(&root, region));
        }
        !region.is_system()
    });
    removals.extend(reconcile_duplicate_fields(definition));
    removals
}

/// Position of a field among the top-level and region fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FieldSlot {
    TopLevel(usize),
    Region(usize, usize),
}

fn reconcile_duplicate_fields(definition: &mut Definition) -> Vec<Removal> {
    let root = definition.identifier.clone();

    let mut groups: Vec<(String, Vec<FieldSlot>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let top_level = definition
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| (FieldSlot::TopLevel(i), field));
    let in_regions = definition
        .regions
        .iter()
        .enumerate()
        .flat_map(|(r, region)| {
            region
                .fields
                .iter()
                .enumerate()
                .map(move |(i, field)| (FieldSlot::Region(r, i), field))
        });
    for (slot, field) in top_level.chain(in_regions) {
        let group = *index.entry(field.name.clone()).or_insert_with(|| {
            groups.push((field.name.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[group].1.push(slot);
    }

    let mut redundant: Vec<FieldSlot> = Vec::new();
    for (name, slots) in groups.into_iter().filter(|(_, slots)| slots.len() > 1) {
        let (system, visible): (Vec<FieldSlot>, Vec<FieldSlot>) = slots
            .into_iter()
            .partition(|slot| field_at(definition, *slot).is_system());

        match visible.as_slice() {
            [] => {
                let first = field_at(definition, system[0]);
                if system[1..]
                    .iter()
                    .all(|slot| same_declaration(first, field_at(definition, *slot)))
                {
                    redundant.extend_from_slice(&system[1..]);
                } else {
                    warn!(
                        definition = %root,
                        field = %name,
                        copies = system.len(),
                        "Differing system fields share a name and cannot be reconciled"
                    );
                }
            }
            [keep] => match absorb_system_copies(definition, *keep, &system) {
                Ok(merged) => {
                    *field_at_mut(definition, *keep) = merged;
                    redundant.extend(system);
                }
                Err(conflict) => warn!(
                    definition = %root,
                    field = %name,
                    %conflict,
                    "System field cannot be merged into its visible copy"
                ),
            },
            _ => warn!(
                definition = %root,
                field = %name,
                copies = visible.len(),
                "Field is visible more than once"
            ),
        }
    }

    let mut removals = Vec::with_capacity(redundant.len());
    for slot in &redundant {
        let scope = match *slot {
            FieldSlot::TopLevel(_) => root.clone(),
            FieldSlot::Region(r, _) => format!("{root}/{}", definition.regions[r].identifier),
        };
        let field = field_at(definition, *slot);
        let removal = Removal::duplicate(&root, field.kind(), &field.name, &scope);
        debug!(
            definition = %root,
            identifier = %removal.identifier,
            scope = %removal.scope,
            "Removed duplicate system field"
        );
        removals.push(removal);
    }

    let redundant: HashSet<FieldSlot> = redundant.into_iter().collect();
    let mut i = 0;
    definition.fields.retain(|_| {
        let keep = !redundant.contains(&FieldSlot::TopLevel(i));
        i += 1;
        keep
    });
    for (r, region) in definition.regions.iter_mut().enumerate() {
        let mut i = 0;
        region.fields.retain(|_| {
            let keep = !redundant.contains(&FieldSlot::Region(r, i));
            i += 1;
            keep
        });
    }

    removals
}

fn absorb_system_copies(
    definition: &Definition,
    visible: FieldSlot,
    system: &[FieldSlot],
) -> Result<Field, MergeConflict> {
    system
        .iter()
        .try_fold(field_at(definition, visible).clone(), |merged, slot| {
            merge_field(&merged, field_at(definition, *slot))
        })
}

/// Compares two declarations ignoring where they live.
fn same_declaration(a: &Field, b: &Field) -> bool {
    let (mut a, mut b) = (a.clone(), b.clone());
    for field in [&mut a, &mut b] {
        field.path = None;
        field.region = None;
    }
    a == b
}

fn field_at(definition: &Definition, slot: FieldSlot) -> &Field {
    match slot {
        FieldSlot::TopLevel(i) => &definition.fields[i],
        FieldSlot::Region(r, i) => &definition.regions[r].fields[i],
    }
}

fn field_at_mut(definition: &mut Definition, slot: FieldSlot) -> &mut Field {
    match slot {
        FieldSlot::TopLevel(i) => &mut definition.fields[i],
        FieldSlot::Region(r, i) => &mut definition.regions[r].fields[i],
    }
}

fn strip_fields(fields: &mut Vec<Field>, definition: &str, scope: &str, out: &mut Vec<Removal>) {
    fields.retain(|field| {
        if field.is_tombstone() {
            out.push(removed(definition, field, scope));
        }
        !field.is_tombstone()
    });

    for field in fields {
        let nested = format!("{scope}/{}", field.name);
        if let Some(control) = &mut field.control {
            strip_fields(&mut control.fields, definition, &nested, out);
        }
    }
}

fn removed(definition: &str, element: &impl Element, scope: &str) -> Removal {
    let removal = Removal::deleted(definition, element.kind(), element.identifier(), scope);
    debug!(
        definition,
        kind = %removal.kind,
        identifier = %removal.identifier,
        scope,
        "Removed deleted element"
    );
    removal
}

fn system(definition: &str, element: &impl Element) -> Removal {
    let removal = Removal::system(definition, element.kind(), element.identifier(), definition);
    debug!(
        definition,
        kind = %removal.kind,
        identifier = %removal.identifier,
        "Removed system element"
    );
    removal
}
