//! Error types for definition compilation.
//!
//! Compilation is all-or-nothing: the first error aborts the batch and no
//! partially compiled definitions are returned.

use std::fmt;

use definition_core::{MergeConflict, ValidationError};
use thiserror::Error;

use crate::stage::{CallbackStep, CompilationStage};

/// A child definition whose parent identifier never resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DanglingParent {
    /// Identifier of the definition naming the missing parent.
    pub definition: String,
    /// The parent identifier that no definition in the batch declares.
    pub parent: String,
}

impl fmt::Display for DanglingParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.definition, self.parent)
    }
}

/// Problems with the shape of the inheritance forest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// Two definitions in the batch share an identifier.
    #[error("duplicate definition identifier: {0}")]
    DuplicateIdentifier(String),

    /// One or more definitions reference a parent that is not in the batch.
    /// Entries are sorted by child identifier.
    #[error("unresolved parent definitions: {}", join_dangling(.0))]
    DanglingParent(Vec<DanglingParent>),

    /// Parent links form a cycle, rendered as `a -> b -> a`.
    #[error("inheritance cycle: {0}")]
    Cycle(String),
}

fn join_dangling(entries: &[DanglingParent]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure reported by a [`DefinitionCallback`](crate::DefinitionCallback)
/// capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    /// Creates a callback error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that abort a compilation run.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The inheritance forest could not be built.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A callback capability failed for a definition.
    #[error("{step} failed for definition {definition} (stage {stage}): {source}")]
    Callback {
        definition: String,
        stage: CompilationStage,
        step: CallbackStep,
        #[source]
        source: CallbackError,
    },

    /// The definition declares empty or repeated element identifiers.
    #[error("invalid definition {definition}: {source}")]
    InvalidDefinition {
        definition: String,
        #[source]
        source: ValidationError,
    },

    /// The definition could not be merged with its resolved parent.
    #[error("cannot merge definition {definition} with parent {parent}: {source}")]
    MergeConflict {
        definition: String,
        parent: String,
        #[source]
        source: MergeConflict,
    },

    /// The worker pool for parallel compilation could not be created.
    #[error("failed to start compiler worker pool: {0}")]
    WorkerPool(String),
}

impl CompileError {
    /// Identifier of the definition the error is attributed to, if any.
    pub fn definition(&self) -> Option<&str> {
        match self {
            Self::Callback { definition, .. }
            | Self::MergeConflict { definition, .. }
            | Self::InvalidDefinition { definition, .. } => Some(definition),
            Self::Structural(StructuralError::DuplicateIdentifier(id)) => Some(id),
            Self::Structural(_) | Self::WorkerPool(_) => None,
        }
    }
}

/// Convenience alias for results with [`CompileError`].
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_parent_message_lists_every_reference() {
        let err = StructuralError::DanglingParent(vec![
            DanglingParent {
                definition: "claim".into(),
                parent: "missing".into(),
            },
            DanglingParent {
                definition: "order".into(),
                parent: "gone".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "unresolved parent definitions: claim -> missing, order -> gone"
        );
    }

    #[test]
    fn test_callback_error_names_definition_and_stage() {
        let err = CompileError::Callback {
            definition: "case".into(),
            stage: CompilationStage::Merged,
            step: CallbackStep::SetDefaultProperties,
            source: CallbackError::new("boom"),
        };
        assert_eq!(
            err.to_string(),
            "set_default_properties failed for definition case (stage merged): boom"
        );
        assert_eq!(err.definition(), Some("case"));
    }
}
