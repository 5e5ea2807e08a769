use std::fmt;

use definition_core::ElementKind;
use serde::{Deserialize, Serialize};

/// Why an element was stripped from a compiled definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The element carried the `Delete` tombstone.
    Deleted,
    /// The element was classified `System`.
    System,
    /// The field was a `System` copy of another field of the same name.
    Duplicate,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => f.write_str("deleted"),
            Self::System => f.write_str("system"),
            Self::Duplicate => f.write_str("duplicate"),
        }
    }
}

/// One element stripped during cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    /// Definition the element was removed from.
    pub definition: String,
    pub kind: ElementKind,
    pub identifier: String,
    /// Path of the container the element lived in, e.g. `case/details`.
    pub scope: String,
    pub reason: RemovalReason,
}

impl Removal {
    pub fn deleted(definition: &str, kind: ElementKind, identifier: &str, scope: &str) -> Self {
        Self {
            definition: definition.to_string(),
            kind,
            identifier: identifier.to_string(),
            scope: scope.to_string(),
            reason: RemovalReason::Deleted,
        }
    }

    pub fn system(definition: &str, kind: ElementKind, identifier: &str, scope: &str) -> Self {
        Self {
            reason: RemovalReason::System,
            ..Self::deleted(definition, kind, identifier, scope)
        }
    }

    pub fn duplicate(definition: &str, kind: ElementKind, identifier: &str, scope: &str) -> Self {
        Self {
            reason: RemovalReason::Duplicate,
            ..Self::deleted(definition, kind, identifier, scope)
        }
    }
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} removed from {} ({})",
            self.reason, self.kind, self.identifier, self.scope, self.definition
        )
    }
}

/// Elements stripped during compilation, grouped by definition in input
/// order and in pipeline order within a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationReport {
    pub removals: Vec<Removal>,
}

impl CompilationReport {
    /// Returns `true` when nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty()
    }

    /// Removals recorded for one definition.
    pub fn removals_for<'a>(&'a self, definition: &'a str) -> impl Iterator<Item = &'a Removal> {
        self.removals
            .iter()
            .filter(move |r| r.definition == definition)
    }

    /// Number of removals with the given reason.
    pub fn count(&self, reason: RemovalReason) -> usize {
        self.removals.iter().filter(|r| r.reason == reason).count()
    }
}
