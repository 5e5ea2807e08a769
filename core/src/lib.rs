//! Core definition types and shared package primitives.
//!
//! This crate defines the model of hierarchical content-type definitions:
//!
//! - [`Definition`]: a named schema with fields, regions and transitions,
//!   optionally inheriting from a parent definition.
//! - [`Field`]: a typed property slot, optionally carrying a
//!   [`ControlDefinition`].
//! - [`Region`]: a named grouping of fields.
//! - [`Transition`]: a named state-change action.
//! - [`DisplayType`]: the display classification used to hide, strip
//!   (`System`) or retract (`Delete`) elements.
//! - [`DefinitionPackage`]: a versioned bundle of definitions.
//!
//! Merging ([`merge_definitions`]) resolves a child against its resolved
//! parent and rejects incompatible redeclarations with a [`MergeConflict`].
//!
//! Validation ([`validate_definition`], [`validate_package`]) catches
//! structural problems such as duplicate element identifiers.
//!
//! # Example
//!
//! ```
//! use definition_core::*;
//!
//! let base = Definition::new("base")
//!     .with_field(Field::new("title").with_type("an..180"))
//!     .with_transition(Transition::new("approve").with_event("approve"));
//! let case = Definition::new("case")
//!     .with_parent("base")
//!     .with_field(Field::new("caseNumber").with_type("n..10"));
//!
//! assert!(validate_definition(&case).is_empty());
//!
//! let resolved = merge_definitions(&base, &case).unwrap();
//! assert!(resolved.find_field("title").is_some());
//! assert!(resolved.find_transition("approve").is_some());
//! ```

mod merge;
mod package;
mod types;
mod validate;

pub use merge::{ConflictKind, MergeConflict, merge_definitions, merge_field};
pub use package::DefinitionPackage;
pub use types::*;
pub use validate::{ValidationError, validate_definition, validate_definitions, validate_package};
