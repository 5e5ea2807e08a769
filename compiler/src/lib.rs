//! Inheritance compiler for content-type definitions.
//!
//! Takes a flat batch of [`Definition`](definition_core::Definition)s that
//! reference their parents by identifier and produces fully resolved
//! definitions:
//!
//! 1. [`build_forest`] arranges the batch into one tree per root definition,
//!    rejecting duplicate identifiers, dangling parents and cycles.
//! 2. Every tree is merged parent before child, so each definition is merged
//!    with an already resolved parent.
//! 3. Each merged definition runs through the cleanup pipeline: tombstoned
//!    and system elements are removed, default-value suggestions are
//!    prepared and unset properties get defaults.
//!
//! The normalization and cleanup capabilities are pluggable through
//! [`DefinitionCallback`]; [`DefaultCallback`] uses the built-in helpers.
//!
//! # Example
//!
//! ```
//! use definition_compiler::{Compiler, CompilerOptions, DefaultCallback, RemovalReason};
//! use definition_core::{Definition, DisplayType, Field, Transition};
//!
//! let base = Definition::new("base")
//!     .with_field(Field::new("title").with_order(1))
//!     .with_transition(Transition::new("sync").with_display_type(DisplayType::System));
//! let case = Definition::new("case")
//!     .with_parent("base")
//!     .with_field(Field::new("caseNumber").with_order(2))
//!     .with_field(Field::deleted("title"));
//!
//! let compilation = Compiler::new(DefaultCallback)
//!     .with_options(CompilerOptions::default())
//!     .compile(vec![base, case])
//!     .unwrap();
//!
//! let case = compilation.get("case").unwrap();
//! assert!(case.find_field("title").is_none());
//! assert!(case.find_transition("sync").is_none());
//! assert_eq!(compilation.report.count(RemovalReason::System), 2);
//! assert_eq!(compilation.report.count(RemovalReason::Deleted), 1);
//! ```

mod callback;
mod cleanup;
mod compiler;
mod defaults;
mod engine;
mod error;
mod normalize;
mod remove;
mod report;
mod stage;
mod suggest;
mod tree;

pub use callback::{DefaultCallback, DefinitionCallback};
pub use compiler::{Compilation, Compiler, CompilerOptions, compile};
pub use defaults::{NOT_USED_PROPERTY_VALUE, set_default_properties};
pub use error::{CallbackError, CompileError, DanglingParent, Result, StructuralError};
pub use normalize::{PATH_SEPARATOR, normalize_fields};
pub use remove::{remove_deleted_elements, remove_system_regions, remove_system_transitions};
pub use report::{CompilationReport, Removal, RemovalReason};
pub use stage::{CallbackStep, CompilationStage};
pub use suggest::{
    DEFAULT_VALUE_PATTERN_TYPE, FUNCTION_BINDING, PROPERTY_BINDING, TEMPLATE_PARAM, TemplateError,
    parse_template, prepare_default_value_suggests,
};
pub use tree::{DefinitionNode, build_forest};
