//! Merge engine: resolves every node of a tree against its merged parent.

use definition_core::{Definition, merge_definitions};
use tracing::debug;

use crate::callback::DefinitionCallback;
use crate::error::{CallbackError, CompileError, Result};
use crate::stage::{CallbackStep, CompilationStage};
use crate::tree::DefinitionNode;

/// Merges a whole tree, parent before child.
///
/// Each node is normalized, merged with its parent's already merged
/// definition (roots skip the merge), normalized again, then its children
/// are processed in order. The walk keeps its own stack.
pub(crate) fn merge_tree<C>(root: &mut DefinitionNode, callback: &C) -> Result<()>
where
    C: DefinitionCallback + ?Sized,
{
    let mut stack: Vec<(&mut DefinitionNode, Option<&Definition>)> = vec![(root, None)];
    while let Some((node, parent)) = stack.pop() {
        merge_node(node, parent, callback)?;

        let DefinitionNode {
            definition,
            children,
            ..
        } = node;
        let merged: &Definition = definition;
        for child in children.iter_mut().rev() {
            stack.push((child, Some(merged)));
        }
    }
    Ok(())
}

fn merge_node<C>(node: &mut DefinitionNode, parent: Option<&Definition>, callback: &C) -> Result<()>
where
    C: DefinitionCallback + ?Sized,
{
    let stage = node.stage;
    normalize(&mut node.definition, stage, callback)?;

    if let Some(parent) = parent {
        node.definition = merge_definitions(parent, &node.definition).map_err(|source| {
            CompileError::MergeConflict {
                definition: node.definition.identifier.clone(),
                parent: parent.identifier.clone(),
                source,
            }
        })?;
        debug!(
            definition = %node.definition.identifier,
            parent = %parent.identifier,
            fields = node.definition.fields.len(),
            regions = node.definition.regions.len(),
            transitions = node.definition.transitions.len(),
            "Merged definition"
        );
    }

    normalize(&mut node.definition, stage, callback)?;
    node.advance(CompilationStage::Merged);
    Ok(())
}

fn normalize<C>(definition: &mut Definition, stage: CompilationStage, callback: &C) -> Result<()>
where
    C: DefinitionCallback + ?Sized,
{
    callback
        .normalize_fields(definition)
        .map_err(|source| callback_failed(definition, stage, CallbackStep::NormalizeFields, source))
}

pub(crate) fn callback_failed(
    definition: &Definition,
    stage: CompilationStage,
    step: CallbackStep,
    source: CallbackError,
) -> CompileError {
    CompileError::Callback {
        definition: definition.identifier.clone(),
        stage,
        step,
        source,
    }
}
