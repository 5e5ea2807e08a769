use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single definition during compilation.
///
/// Stages only move forward: `Loaded -> TreeAttached -> Merged -> Cleaned ->
/// Compiled`. There are no retries; a failure at any stage aborts the batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CompilationStage {
    /// Read from input, not yet placed in the inheritance forest.
    Loaded,
    /// Attached to its tree node; parent resolved.
    TreeAttached,
    /// Merged with its resolved parent (roots: normalized only).
    Merged,
    /// Post-merge cleanup pipeline applied.
    Cleaned,
    /// Part of the final output.
    Compiled,
}

impl fmt::Display for CompilationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::TreeAttached => "tree_attached",
            Self::Merged => "merged",
            Self::Cleaned => "cleaned",
            Self::Compiled => "compiled",
        };
        f.write_str(name)
    }
}

/// Callback capability invoked by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStep {
    NormalizeFields,
    RemoveDeletedElements,
    PrepareDefaultValueSuggests,
    SetDefaultProperties,
}

impl fmt::Display for CallbackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NormalizeFields => "normalize_fields",
            Self::RemoveDeletedElements => "remove_deleted_elements",
            Self::PrepareDefaultValueSuggests => "prepare_default_value_suggests",
            Self::SetDefaultProperties => "set_default_properties",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_ordered() {
        assert!(CompilationStage::Loaded < CompilationStage::TreeAttached);
        assert!(CompilationStage::TreeAttached < CompilationStage::Merged);
        assert!(CompilationStage::Merged < CompilationStage::Cleaned);
        assert!(CompilationStage::Cleaned < CompilationStage::Compiled);
    }
}
