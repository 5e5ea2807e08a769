//! Field path normalization.

use definition_core::{Definition, Field};

/// Separator between the segments of a field path.
pub const PATH_SEPARATOR: char = '/';

/// Normalizes the structural attributes of a definition in place.
///
/// - Fields, regions and transitions are stable-sorted by `order`; elements
///   without an order keep their relative position after the ordered ones.
/// - Default values are trimmed.
/// - Alphanumeric (`an..N`, `anN`) and numeric (`n..N`, `n..N,M`) field types
///   set `max_length` to `N`. Other types leave it as declared.
/// - Every field's `path` is set to the path of its container:
///   `<definition>`, `<definition>/<region>`, `<definition>/<transition>`, or
///   `<container path>/<field>` for fields nested in a control.
/// - Back-references are re-linked with
///   [`Definition::init_bidirection`].
///
/// # Examples
///
/// ```
/// use definition_compiler::normalize_fields;
/// use definition_core::{Definition, Field, Region};
///
/// let mut def = Definition::new("case")
///     .with_field(Field::new("b").with_order(2))
///     .with_field(Field::new("a").with_order(1).with_default_value("  x "))
///     .with_region(Region::new("details").with_field(Field::new("owner")));
///
/// normalize_fields(&mut def);
///
/// assert_eq!(def.fields[0].name, "a");
/// assert_eq!(def.fields[0].default_value.as_deref(), Some("x"));
/// assert_eq!(def.fields[0].path.as_deref(), Some("case"));
/// assert_eq!(def.regions[0].fields[0].path.as_deref(), Some("case/details"));
/// ```
pub fn normalize_fields(definition: &mut Definition) {
    let root = definition.identifier.clone();

    normalize_list(&mut definition.fields, &root);

    definition.regions.sort_by_key(|r| order_key(r.order));
    for region in &mut definition.regions {
        let path = join(&root, &region.identifier);
        normalize_list(&mut region.fields, &path);
        if let Some(control) = &mut region.control {
            normalize_list(&mut control.fields, &path);
        }
    }

    definition.transitions.sort_by_key(|t| order_key(t.order));
    for transition in &mut definition.transitions {
        let path = join(&root, &transition.identifier);
        normalize_list(&mut transition.fields, &path);
    }

    definition.init_bidirection();
}

fn normalize_list(fields: &mut [Field], parent_path: &str) {
    fields.sort_by_key(|f| order_key(f.order));

    for field in fields {
        if let Some(value) = &mut field.default_value {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
        }

        if let Some(length) = field.field_type.as_deref().and_then(type_length) {
            field.max_length = Some(length);
        }

        field.path = Some(parent_path.to_string());

        let nested = join(parent_path, &field.name);
        if let Some(control) = &mut field.control {
            normalize_list(&mut control.fields, &nested);
        }
    }
}

/// Length bound of an alphanumeric or numeric type: `an..180` and `an180` give
/// 180, `n..10,2` gives 10.
fn type_length(field_type: &str) -> Option<u32> {
    let lowered = field_type.trim().to_ascii_lowercase();
    let rest = lowered
        .strip_prefix("an")
        .or_else(|| lowered.strip_prefix('n'))?;
    let rest = rest.strip_prefix("..").unwrap_or(rest);
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

fn order_key(order: Option<i32>) -> (bool, i32) {
    (order.is_none(), order.unwrap_or_default())
}

fn join(parent: &str, segment: &str) -> String {
    format!("{parent}{PATH_SEPARATOR}{segment}")
}
