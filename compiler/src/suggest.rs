//! Default-value suggestions derived from control templates.
//!
//! A field control may declare a `template` param of type
//! `default_value_pattern` whose value mixes literal text with
//! property bindings (`$[property]`) and functions (`${function}`). The
//! compiler expands every placeholder into its own control param so that
//! consumers can resolve suggestions without re-parsing the template.

use std::collections::HashSet;
use std::sync::LazyLock;

use definition_core::{ControlParam, Definition, Field};
use regex::Regex;
use thiserror::Error;
use tracing::trace;

/// Param type marking default-value templates and the params derived from
/// them.
pub const DEFAULT_VALUE_PATTERN_TYPE: &str = "default_value_pattern";
/// Identifier of the param holding the template.
pub const TEMPLATE_PARAM: &str = "template";
/// Param name of generated property bindings.
pub const PROPERTY_BINDING: &str = "property_binding";
/// Param name of generated function params.
pub const FUNCTION_BINDING: &str = "function";

static BINDING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\[([^\]]+)\]").expect("static regex must compile"));
static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex must compile"));

/// Malformed default-value template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated placeholder in template {0:?}")]
    Unterminated(String),
}

/// Parses a default-value template into generated control params.
///
/// Property bindings come first, then functions, each in template order.
/// Repeated placeholders produce a single param. A function param is
/// identified by the name before its argument list.
///
/// # Examples
///
/// ```
/// use definition_compiler::parse_template;
///
/// let params = parse_template("$[caseNumber]-${today} by $[owner]").unwrap();
/// let ids: Vec<&str> = params.iter().map(|p| p.identifier.as_str()).collect();
/// assert_eq!(ids, vec!["caseNumber", "owner", "today"]);
/// assert_eq!(params[2].name.as_deref(), Some("function"));
/// ```
pub fn parse_template(template: &str) -> Result<Vec<ControlParam>, TemplateError> {
    let stripped = FUNCTION_RE.replace_all(&BINDING_RE.replace_all(template, ""), "").into_owned();
    if stripped.contains("$[") || stripped.contains("${") {
        return Err(TemplateError::Unterminated(template.to_string()));
    }

    let mut seen: HashSet<(String, &str)> = HashSet::new();
    let mut params = Vec::new();

    for captures in BINDING_RE.captures_iter(template) {
        let binding = captures[1].trim();
        if seen.insert((binding.to_string(), PROPERTY_BINDING)) {
            params.push(generated(binding, PROPERTY_BINDING, binding));
        }
    }

    for captures in FUNCTION_RE.captures_iter(template) {
        let expression = captures[1].trim();
        let name = expression
            .split_once('(')
            .map_or(expression, |(name, _)| name)
            .trim();
        if seen.insert((name.to_string(), FUNCTION_BINDING)) {
            params.push(generated(name, FUNCTION_BINDING, expression));
        }
    }

    Ok(params)
}

/// Expands default-value templates of every field control in the definition:
/// top-level, region, region control, transition and nested control fields.
///
/// Generated params are prepended to the control's params. A param already
/// present with the same identifier and name is not generated again, so the
/// operation is idempotent.
pub fn prepare_default_value_suggests(definition: &mut Definition) -> Result<(), TemplateError> {
    for field in definition.all_fields_mut() {
        prepare_field(field)?;
    }
    for control in definition.regions.iter_mut().filter_map(|r| r.control.as_mut()) {
        for field in &mut control.fields {
            prepare_field(field)?;
        }
    }
    for transition in &mut definition.transitions {
        for field in &mut transition.fields {
            prepare_field(field)?;
        }
    }
    Ok(())
}

fn prepare_field(field: &mut Field) -> Result<(), TemplateError> {
    let Some(control) = field.control.as_mut() else {
        return Ok(());
    };

    for nested in &mut control.fields {
        prepare_field(nested)?;
    }

    let templates: Vec<String> = control
        .params
        .iter()
        .filter(|p| is_template(p))
        .filter_map(|p| p.value.clone())
        .collect();
    if templates.is_empty() {
        return Ok(());
    }

    let mut existing: HashSet<(String, Option<String>)> = control
        .params
        .iter()
        .map(|p| (p.identifier.clone(), p.name.clone()))
        .collect();

    let mut generated = Vec::new();
    for template in &templates {
        for param in parse_template(template)? {
            if existing.insert((param.identifier.clone(), param.name.clone())) {
                generated.push(param);
            }
        }
    }

    if !generated.is_empty() {
        trace!(field = %field.name, count = generated.len(), "Generated default value params");
        control.params.splice(0..0, generated);
    }
    Ok(())
}

fn is_template(param: &ControlParam) -> bool {
    param.identifier == TEMPLATE_PARAM
        && param
            .param_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(DEFAULT_VALUE_PATTERN_TYPE))
}

fn generated(identifier: &str, name: &str, value: &str) -> ControlParam {
    ControlParam::new(identifier)
        .with_name(name)
        .with_type(DEFAULT_VALUE_PATTERN_TYPE)
        .with_value(value)
}

#[cfg(test)]
mod tests {
    use definition_core::{ControlDefinition, Region};

    use super::*;

    fn templated(name: &str, template: &str) -> Field {
        Field::new(name).with_control(
            ControlDefinition::new("default_value_pattern").with_param(
                ControlParam::new(TEMPLATE_PARAM)
                    .with_type("DEFAULT_VALUE_PATTERN")
                    .with_value(template),
            ),
        )
    }

    #[test]
    fn test_parse_template_splits_bindings_and_functions() {
        let params = parse_template("${seq(caseSeq)}/$[year]/$[year]").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].identifier, "year");
        assert_eq!(params[0].name.as_deref(), Some(PROPERTY_BINDING));
        assert_eq!(params[1].identifier, "seq");
        assert_eq!(params[1].value.as_deref(), Some("seq(caseSeq)"));
        assert_eq!(params[1].param_type.as_deref(), Some(DEFAULT_VALUE_PATTERN_TYPE));
    }

    #[test]
    fn test_parse_template_rejects_unterminated_placeholder() {
        assert!(matches!(
            parse_template("$[owner"),
            Err(TemplateError::Unterminated(_))
        ));
        assert!(parse_template("plain text").unwrap().is_empty());
    }

    #[test]
    fn test_prepare_prepends_generated_params() {
        let mut def = Definition::new("case")
            .with_region(Region::new("details").with_field(templated("number", "$[type]-${today}")));

        prepare_default_value_suggests(&mut def).unwrap();

        let params = &def.regions[0].fields[0].control.as_ref().unwrap().params;
        let ids: Vec<&str> = params.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["type", "today", "template"]);
    }

    #[test]
    fn test_prepare_covers_region_control_fields() {
        let control = ControlDefinition::new("details_panel").with_field(templated("code", "$[type]"));
        let mut region = Region::new("details");
        region.control = Some(control);
        let mut def = Definition::new("case").with_region(region);

        prepare_default_value_suggests(&mut def).unwrap();

        let code = &def.regions[0].control.as_ref().unwrap().fields[0];
        let ids: Vec<&str> = code
            .control
            .as_ref()
            .unwrap()
            .params
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["type", "template"]);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let mut def = Definition::new("case").with_field(templated("number", "$[type]"));
        prepare_default_value_suggests(&mut def).unwrap();
        let once = def.clone();
        prepare_default_value_suggests(&mut def).unwrap();
        assert_eq!(def, once);
    }

    #[test]
    fn test_fields_without_template_untouched() {
        let control = ControlDefinition::new("picker")
            .with_param(ControlParam::new("template").with_type("other").with_value("$[x]"));
        let mut def = Definition::new("case").with_field(Field::new("a").with_control(control));
        let before = def.clone();
        prepare_default_value_suggests(&mut def).unwrap();
        assert_eq!(def, before);
    }
}
