//! Default property values for compiled definitions.

use definition_core::{Definition, DisplayType, Field};

/// Placeholder for string properties that are not used by a field.
pub const NOT_USED_PROPERTY_VALUE: &str = "-";

/// Fills every unset property with its compiled default.
///
/// Fields (top-level, region, transition and control fields): `mandatory`,
/// `mandatory_enforced`, `multi_valued` and `override` default to `false`,
/// `preview_empty` to `true`, `dms_type` and `uri` to
/// [`NOT_USED_PROPERTY_VALUE`], and `display_type` to `Hidden`.
///
/// Regions default to `Normal`. Transitions default to `Normal` and are
/// neither default nor immediate.
///
/// Declared values are never overwritten.
pub fn set_default_properties(definition: &mut Definition) {
    set_field_defaults(&mut definition.fields);

    for region in &mut definition.regions {
        region.display_type.get_or_insert(DisplayType::Normal);
        set_field_defaults(&mut region.fields);
        if let Some(control) = &mut region.control {
            set_field_defaults(&mut control.fields);
        }
    }

    for transition in &mut definition.transitions {
        transition.display_type.get_or_insert(DisplayType::Normal);
        transition.is_default.get_or_insert(false);
        transition.immediate.get_or_insert(false);
        set_field_defaults(&mut transition.fields);
    }
}

fn set_field_defaults(fields: &mut [Field]) {
    for field in fields {
        field.mandatory.get_or_insert(false);
        field.mandatory_enforced.get_or_insert(false);
        field.multi_valued.get_or_insert(false);
        field.is_override.get_or_insert(false);
        field.preview_empty.get_or_insert(true);
        field
            .dms_type
            .get_or_insert_with(|| NOT_USED_PROPERTY_VALUE.to_string());
        field
            .uri
            .get_or_insert_with(|| NOT_USED_PROPERTY_VALUE.to_string());
        field.display_type.get_or_insert(DisplayType::Hidden);

        if let Some(control) = &mut field.control {
            set_field_defaults(&mut control.fields);
        }
    }
}
