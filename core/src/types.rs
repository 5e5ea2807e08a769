//! Definition type model.
//!
//! A [`Definition`] describes one content type: its fields, the regions that
//! group further fields, and the transitions (state-change actions) allowed on
//! instances of the type. Definitions form a single-parent inheritance forest
//! through [`Definition::parent`].
//!
//! Every optional attribute is `None` until either the definition declares it
//! or it is inherited during compilation. This is what makes
//! "replace if not set" merging possible: a child only overrides what it
//! actually declares.

use serde::{Deserialize, Serialize};

/// Version of the definition contract (semver).
///
/// Embedded in every [`DefinitionPackage`](crate::DefinitionPackage) to track
/// compatibility across serialized bundles.
pub const DEFINITION_CONTRACT_VERSION: &str = "1.0.0";

/// Display classification of a field, region or transition.
///
/// `System` elements are internal and stripped from compiled output.
/// `Delete` is the tombstone an overriding definition uses to retract an
/// inherited element.
///
/// # Examples
///
/// ```
/// use definition_core::DisplayType;
///
/// let normal: DisplayType = serde_json::from_str("\"editable\"").unwrap();
/// assert_eq!(normal, DisplayType::Normal);
/// assert!(DisplayType::System.is_system());
/// assert!(DisplayType::Delete.is_tombstone());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayType {
    /// Visible and editable.
    #[serde(alias = "editable")]
    Normal,
    /// Visible, not editable.
    ReadOnly,
    /// Present in the model but not shown.
    Hidden,
    /// Internal only; removed from the compiled definition.
    System,
    /// Tombstone; the element is removed after merging.
    Delete,
}

impl DisplayType {
    /// Returns `true` for [`DisplayType::System`].
    pub fn is_system(self) -> bool {
        self == Self::System
    }

    /// Returns `true` for [`DisplayType::Delete`].
    pub fn is_tombstone(self) -> bool {
        self == Self::Delete
    }
}

/// Kind of element a definition is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Field,
    Region,
    Transition,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::Region => write!(f, "region"),
            Self::Transition => write!(f, "transition"),
        }
    }
}

/// Common view over fields, regions and transitions.
pub trait Element {
    /// Identifier used to match the element against inherited declarations.
    fn identifier(&self) -> &str;

    /// Declared display classification, if any.
    fn display_type(&self) -> Option<DisplayType>;

    /// Element kind, used in reports and errors.
    fn kind(&self) -> ElementKind;

    /// Returns `true` when the element carries the `Delete` tombstone.
    fn is_tombstone(&self) -> bool {
        self.display_type().is_some_and(DisplayType::is_tombstone)
    }

    /// Returns `true` when the element is classified `System`.
    fn is_system(&self) -> bool {
        self.display_type().is_some_and(DisplayType::is_system)
    }
}

/// Parameter of a field or region control.
///
/// Controls describe how a value is edited or computed. Parameters of type
/// `default_value_pattern` carry default-value templates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParam {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ControlParam {
    /// Creates a parameter with the given identifier.
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ..Default::default()
        }
    }

    /// Sets the parameter name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the parameter type.
    pub fn with_type(mut self, param_type: &str) -> Self {
        self.param_type = Some(param_type.to_string());
        self
    }

    /// Sets the parameter value.
    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

/// Control attached to a field or region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlDefinition {
    pub identifier: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ControlParam>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    /// Identifier of the owning field or region. Maintained by
    /// [`Definition::init_bidirection`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ControlDefinition {
    /// Creates a control with the given identifier.
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ..Default::default()
        }
    }

    /// Adds a parameter.
    pub fn with_param(mut self, param: ControlParam) -> Self {
        self.params.push(param);
        self
    }

    /// Adds a nested field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    fn link(&mut self, owner: &str) {
        self.owner = Some(owner.to_string());
        for field in &mut self.fields {
            field.region = None;
            field.link_control();
        }
    }
}

/// A single typed property slot.
///
/// # Examples
///
/// ```
/// use definition_core::{DisplayType, Field};
///
/// let title = Field::new("title")
///     .with_type("an..180")
///     .with_order(10)
///     .with_display_type(DisplayType::Normal);
/// assert_eq!(title.name, "title");
/// assert_eq!(title.field_type.as_deref(), Some("an..180"));
/// assert!(title.path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub name: String,
    /// Declared type such as `an..180`, `n..10` or `date`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_type: Option<DisplayType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory_enforced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_valued: Option<bool>,
    #[serde(rename = "override", skip_serializing_if = "Option::is_none")]
    pub is_override: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dms_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlDefinition>,
    /// Parent path derived from the field's structural position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Identifier of the enclosing region, if any. Maintained by
    /// [`Definition::init_bidirection`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Field {
    /// Creates a field with the given name and nothing else declared.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the declared type.
    pub fn with_type(mut self, field_type: &str) -> Self {
        self.field_type = Some(field_type.to_string());
        self
    }

    /// Sets the default value.
    pub fn with_default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    /// Sets the ordinal used when sorting.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the display classification.
    pub fn with_display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = Some(display_type);
        self
    }

    /// Marks the field as mandatory.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = Some(true);
        self
    }

    /// Attaches a control.
    pub fn with_control(mut self, control: ControlDefinition) -> Self {
        self.control = Some(control);
        self
    }

    /// Marks the field as a tombstone retracting an inherited field.
    pub fn deleted(name: &str) -> Self {
        Self::new(name).with_display_type(DisplayType::Delete)
    }

    fn link_control(&mut self) {
        if let Some(control) = &mut self.control {
            control.link(&self.name);
        }
    }
}

impl Element for Field {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn display_type(&self) -> Option<DisplayType> {
        self.display_type
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Field
    }
}

/// A named grouping of fields.
///
/// # Examples
///
/// ```
/// use definition_core::{DisplayType, Field, Region};
///
/// let region = Region::new("details")
///     .with_display_type(DisplayType::System)
///     .with_field(Field::new("createdBy"));
/// assert_eq!(region.fields.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_type: Option<DisplayType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlDefinition>,
}

impl Region {
    /// Creates an empty region.
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ..Default::default()
        }
    }

    /// Sets the ordinal used when sorting.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the display classification.
    pub fn with_display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = Some(display_type);
        self
    }

    /// Adds a field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

impl Element for Region {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn display_type(&self) -> Option<DisplayType> {
        self.display_type
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Region
    }
}

/// A named state-change action allowed on instances of a definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Transition {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_type: Option<DisplayType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_primary_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_secondary_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

impl Transition {
    /// Creates a transition with the given identifier.
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ..Default::default()
        }
    }

    /// Sets the ordinal used when sorting.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the display classification.
    pub fn with_display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = Some(display_type);
        self
    }

    /// Sets the event fired by the transition.
    pub fn with_event(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    /// Adds a field shown when the transition is executed.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

impl Element for Transition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn display_type(&self) -> Option<DisplayType> {
        self.display_type
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Transition
    }
}

/// A named, identifiable content-type schema.
///
/// # Examples
///
/// ```
/// use definition_core::*;
///
/// let base = Definition::new("base")
///     .with_field(Field::new("title").with_type("an..180"))
///     .with_region(Region::new("audit").with_field(Field::new("createdBy")));
/// let child = Definition::new("case").with_parent("base");
///
/// assert!(base.is_root());
/// assert_eq!(child.parent.as_deref(), Some("base"));
/// assert_eq!(base.all_fields().count(), 2);
/// assert!(base.find_field("createdBy").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Definition {
    pub identifier: String,
    /// Identifier of the definition this one inherits from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub definition_type: Option<String>,
    /// Abstract definitions are templates; this flag is never inherited.
    #[serde(rename = "abstract", skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Region>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
}

impl Definition {
    /// Creates an empty root definition.
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ..Default::default()
        }
    }

    /// Sets the parent identifier.
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Adds a top-level field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a region.
    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    /// Adds a transition.
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Returns `true` when the definition has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Iterates over top-level fields followed by region fields.
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .chain(self.regions.iter().flat_map(|r| r.fields.iter()))
    }

    /// Mutable variant of [`all_fields`](Self::all_fields).
    pub fn all_fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields
            .iter_mut()
            .chain(self.regions.iter_mut().flat_map(|r| r.fields.iter_mut()))
    }

    /// Finds a field by name among top-level and region fields.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.all_fields().find(|f| f.name == name)
    }

    /// Finds a region by identifier.
    pub fn find_region(&self, identifier: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.identifier == identifier)
    }

    /// Finds a transition by identifier.
    pub fn find_transition(&self, identifier: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.identifier == identifier)
    }

    /// Re-links back-references after a structural change.
    ///
    /// Region fields point at their region, controls point at the field or
    /// region that owns them. Top-level and transition fields carry no
    /// region.
    pub fn init_bidirection(&mut self) {
        for field in &mut self.fields {
            field.region = None;
            field.link_control();
        }
        for region in &mut self.regions {
            for field in &mut region.fields {
                field.region = Some(region.identifier.clone());
                field.link_control();
            }
            if let Some(control) = &mut region.control {
                control.link(&region.identifier);
            }
        }
        for transition in &mut self.transitions {
            for field in &mut transition.fields {
                field.region = None;
                field.link_control();
            }
        }
    }
}
