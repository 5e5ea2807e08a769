//! Pluggable compilation capabilities.

use definition_core::Definition;

use crate::error::CallbackError;
use crate::report::Removal;
use crate::{defaults, normalize, remove, suggest};

/// Capabilities the compiler invokes while merging and cleaning definitions.
///
/// Every method has a default implementation backed by the built-in
/// helpers, so an implementation only overrides what it customizes. The
/// trait is `Send + Sync` because parallel compilation shares one callback
/// across worker threads.
///
/// # Examples
///
/// ```
/// use definition_compiler::{CallbackError, Compiler, DefinitionCallback};
/// use definition_core::Definition;
///
/// struct RejectDrafts;
///
/// impl DefinitionCallback for RejectDrafts {
///     fn set_default_properties(&self, definition: &mut Definition) -> Result<(), CallbackError> {
///         if definition.purpose.as_deref() == Some("draft") {
///             return Err(CallbackError::new("drafts cannot be compiled"));
///         }
///         definition_compiler::set_default_properties(definition);
///         Ok(())
///     }
/// }
///
/// let mut draft = Definition::new("case");
/// draft.purpose = Some("draft".into());
/// let err = Compiler::new(RejectDrafts).compile(vec![draft]).unwrap_err();
/// assert_eq!(err.definition(), Some("case"));
/// ```
pub trait DefinitionCallback: Send + Sync {
    /// Sorts elements and recomputes field paths and back-references.
    fn normalize_fields(&self, definition: &mut Definition) -> Result<(), CallbackError> {
        normalize::normalize_fields(definition);
        Ok(())
    }

    /// Strips tombstoned elements and reports what was removed.
    fn remove_deleted_elements(
        &self,
        definition: &mut Definition,
    ) -> Result<Vec<Removal>, CallbackError> {
        Ok(remove::remove_deleted_elements(definition))
    }

    /// Expands default-value templates into suggestion params.
    fn prepare_default_value_suggests(
        &self,
        definition: &mut Definition,
    ) -> Result<(), CallbackError> {
        suggest::prepare_default_value_suggests(definition)
            .map_err(|err| CallbackError::new(err.to_string()))
    }

    /// Fills unset properties with their compiled defaults.
    fn set_default_properties(&self, definition: &mut Definition) -> Result<(), CallbackError> {
        defaults::set_default_properties(definition);
        Ok(())
    }
}

/// Callback using the built-in helpers for every capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCallback;

impl DefinitionCallback for DefaultCallback {}
