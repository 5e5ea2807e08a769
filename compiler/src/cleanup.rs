//! Post-merge cleanup pipeline.

use definition_core::Definition;
use tracing::trace;

use crate::callback::DefinitionCallback;
use crate::engine::callback_failed;
use crate::error::{CallbackError, Result};
use crate::remove;
use crate::report::Removal;
use crate::stage::{CallbackStep, CompilationStage};
use crate::tree::DefinitionNode;

/// A definition that went through the whole pipeline.
pub(crate) struct CompiledDefinition {
    pub position: usize,
    pub definition: Definition,
    pub removals: Vec<Removal>,
}

/// Cleans every definition of a fully merged tree, parent before child, and
/// flattens the tree into `out`.
pub(crate) fn clean_tree<C>(
    root: DefinitionNode,
    callback: &C,
    out: &mut Vec<CompiledDefinition>,
) -> Result<()>
where
    C: DefinitionCallback + ?Sized,
{
    let mut stack = vec![root];
    while let Some(mut node) = stack.pop() {
        let removals = clean_definition(&mut node.definition, node.stage, callback)?;
        node.advance(CompilationStage::Cleaned);
        node.advance(CompilationStage::Compiled);

        stack.extend(std::mem::take(&mut node.children).into_iter().rev());
        out.push(CompiledDefinition {
            position: node.position,
            definition: std::mem::take(&mut node.definition),
            removals,
        });
    }
    Ok(())
}

/// Runs the cleanup steps on one merged definition:
///
/// 1. normalize field paths
/// 2. remove tombstoned elements
/// 3. remove system transitions
/// 4. prepare default-value suggestions
/// 5. remove system regions
/// 6. set default properties
/// 7. normalize field paths again
fn clean_definition<C>(
    definition: &mut Definition,
    stage: CompilationStage,
    callback: &C,
) -> Result<Vec<Removal>>
where
    C: DefinitionCallback + ?Sized,
{
    let mut removals = Vec::new();

    run(definition, stage, CallbackStep::NormalizeFields, |d| {
        callback.normalize_fields(d)
    })?;
    removals.extend(run(
        definition,
        stage,
        CallbackStep::RemoveDeletedElements,
        |d| callback.remove_deleted_elements(d),
    )?);
    removals.extend(remove::remove_system_transitions(definition));
    run(
        definition,
        stage,
        CallbackStep::PrepareDefaultValueSuggests,
        |d| callback.prepare_default_value_suggests(d),
    )?;
    removals.extend(remove::remove_system_regions(definition));
    run(definition, stage, CallbackStep::SetDefaultProperties, |d| {
        callback.set_default_properties(d)
    })?;
    run(definition, stage, CallbackStep::NormalizeFields, |d| {
        callback.normalize_fields(d)
    })?;

    trace!(
        definition = %definition.identifier,
        removed = removals.len(),
        "Cleaned definition"
    );
    Ok(removals)
}

fn run<T>(
    definition: &mut Definition,
    stage: CompilationStage,
    step: CallbackStep,
    capability: impl FnOnce(&mut Definition) -> std::result::Result<T, CallbackError>,
) -> Result<T> {
    trace!(definition = %definition.identifier, %step, "Cleanup step");
    capability(definition).map_err(|source| callback_failed(definition, stage, step, source))
}
