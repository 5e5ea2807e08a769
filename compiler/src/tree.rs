//! Inheritance forest construction.
//!
//! [`build_forest`] turns a flat batch of definitions into one tree per root
//! definition (a definition without a parent). Each [`DefinitionNode`] owns its
//! definition and its child nodes, so independent trees can be handed to
//! separate workers.
//!
//! Construction is a single pass over an arena with an identifier index:
//! every definition fetches or creates its own slot and its parent's slot.
//! Slots that are referenced as a parent but never receive a definition are
//! dangling parents. Slots that hold a definition but cannot be reached from
//! any root sit on or below a parent cycle.
//!
//! # Examples
//!
//! ```
//! use definition_compiler::build_forest;
//! use definition_core::Definition;
//!
//! let forest = build_forest(vec![
//!     Definition::new("case").with_parent("base"),
//!     Definition::new("base"),
//!     Definition::new("task"),
//! ])
//! .unwrap();
//!
//! assert_eq!(forest.len(), 2);
//! assert_eq!(forest[0].identifier(), "base");
//! assert_eq!(forest[0].children()[0].identifier(), "case");
//! assert_eq!(forest[1].identifier(), "task");
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use definition_core::Definition;
use tracing::trace;

use crate::error::{DanglingParent, StructuralError};
use crate::stage::CompilationStage;

/// A definition in the inheritance forest together with its children.
///
/// Traversal, construction and drop never recurse, so inheritance chains of
/// any depth are safe on small worker stacks.
pub struct DefinitionNode {
    pub(crate) definition: Definition,
    pub(crate) position: usize,
    pub(crate) stage: CompilationStage,
    pub(crate) children: Vec<DefinitionNode>,
}

impl DefinitionNode {
    /// Identifier of the definition held by this node.
    pub fn identifier(&self) -> &str {
        &self.definition.identifier
    }

    /// The definition held by this node.
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Position of the definition in the input batch.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current lifecycle stage of the definition.
    pub fn stage(&self) -> CompilationStage {
        self.stage
    }

    /// Direct children, in input order.
    pub fn children(&self) -> &[DefinitionNode] {
        &self.children
    }

    /// Number of definitions in this subtree, including this node.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Always `false`: a node holds at least its own definition.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth-first, parent-before-child traversal of the subtree.
    pub fn walk(&self) -> Vec<(usize, &DefinitionNode)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    pub(crate) fn advance(&mut self, next: CompilationStage) {
        debug_assert!(
            next > self.stage,
            "stage of {} cannot move from {} to {}",
            self.definition.identifier,
            self.stage,
            next
        );
        trace!(
            definition = %self.definition.identifier,
            from = %self.stage,
            to = %next,
            "Definition stage"
        );
        self.stage = next;
    }
}

impl fmt::Debug for DefinitionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<&str> = self.children.iter().map(DefinitionNode::identifier).collect();
        f.debug_struct("DefinitionNode")
            .field("definition", &self.definition.identifier)
            .field("position", &self.position)
            .field("stage", &self.stage)
            .field("children", &children)
            .finish()
    }
}

impl Drop for DefinitionNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[derive(Default)]
struct Slot {
    definition: Option<Definition>,
    position: usize,
    children: Vec<usize>,
}

/// Builds the inheritance forest from a flat batch of definitions.
///
/// Roots are returned in the order they appear in the input; children keep
/// input order as well.
///
/// # Errors
///
/// - [`StructuralError::DuplicateIdentifier`] when two definitions share an
///   identifier.
/// - [`StructuralError::DanglingParent`] listing every definition whose
///   parent is missing from the batch.
/// - [`StructuralError::Cycle`] when parent links loop, including a
///   definition naming itself as parent.
pub fn build_forest(definitions: Vec<Definition>) -> Result<Vec<DefinitionNode>, StructuralError> {
    let mut slots: Vec<Slot> = Vec::with_capacity(definitions.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(definitions.len());
    let mut roots: Vec<usize> = Vec::new();

    for (position, definition) in definitions.into_iter().enumerate() {
        let id = slot_for(&mut slots, &mut index, &definition.identifier);
        if slots[id].definition.is_some() {
            return Err(StructuralError::DuplicateIdentifier(definition.identifier));
        }

        match definition.parent.as_deref() {
            Some(parent) => {
                let parent_id = slot_for(&mut slots, &mut index, parent);
                slots[parent_id].children.push(id);
            }
            None => roots.push(id),
        }

        let slot = &mut slots[id];
        slot.position = position;
        slot.definition = Some(definition);
    }

    check_dangling(&slots, &index)?;
    check_cycles(&slots, &index, &roots)?;

    let mut forest = Vec::with_capacity(roots.len());
    for root in roots {
        forest.push(assemble(&mut slots, root));
    }
    Ok(forest)
}

fn slot_for(slots: &mut Vec<Slot>, index: &mut HashMap<String, usize>, identifier: &str) -> usize {
    if let Some(&id) = index.get(identifier) {
        return id;
    }
    let id = slots.len();
    slots.push(Slot::default());
    index.insert(identifier.to_string(), id);
    id
}

fn check_dangling(slots: &[Slot], index: &HashMap<String, usize>) -> Result<(), StructuralError> {
    let mut dangling: Vec<DanglingParent> = Vec::new();
    for (parent, &id) in index {
        if slots[id].definition.is_some() {
            continue;
        }
        for &child in &slots[id].children {
            if let Some(definition) = &slots[child].definition {
                dangling.push(DanglingParent {
                    definition: definition.identifier.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    if dangling.is_empty() {
        return Ok(());
    }
    dangling.sort();
    Err(StructuralError::DanglingParent(dangling))
}

fn check_cycles(
    slots: &[Slot],
    index: &HashMap<String, usize>,
    roots: &[usize],
) -> Result<(), StructuralError> {
    let mut reachable = vec![false; slots.len()];
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(id) = stack.pop() {
        if reachable[id] {
            continue;
        }
        reachable[id] = true;
        stack.extend(slots[id].children.iter().copied());
    }

    // Earliest unreachable definition in input order, for a stable message.
    let start = slots
        .iter()
        .enumerate()
        .filter(|(id, slot)| !reachable[*id] && slot.definition.is_some())
        .min_by_key(|(_, slot)| slot.position)
        .map(|(id, _)| id);

    match start {
        Some(start) => Err(StructuralError::Cycle(cycle_path(slots, index, start))),
        None => Ok(()),
    }
}

/// Follows parent links from `start` until an identifier repeats and renders
/// the repeating part.
fn cycle_path(slots: &[Slot], index: &HashMap<String, usize>, start: usize) -> String {
    let mut chain: Vec<&str> = Vec::new();
    let mut seen: HashSet<usize> = HashSet::new();
    let mut current = start;

    while seen.insert(current) {
        let Some(definition) = &slots[current].definition else {
            break;
        };
        chain.push(&definition.identifier);
        match definition.parent.as_deref().and_then(|p| index.get(p)) {
            Some(&parent) => current = parent,
            None => break,
        }
    }

    let Some(repeat) = slots[current].definition.as_ref().map(|d| d.identifier.as_str()) else {
        return chain.join(" -> ");
    };
    let from = chain.iter().position(|id| *id == repeat).unwrap_or(0);
    let mut cycle: Vec<&str> = chain[from..].to_vec();
    cycle.push(repeat);
    cycle.join(" -> ")
}

/// Moves the definitions reachable from `root` out of the arena into an
/// owned tree. Nodes are built children first, from the reversed pre-order.
fn assemble(slots: &mut [Slot], root: usize) -> DefinitionNode {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        order.push(id);
        stack.extend(slots[id].children.iter().copied());
    }

    let mut built: HashMap<usize, DefinitionNode> = HashMap::with_capacity(order.len());
    for &id in order[1..].iter().rev() {
        let node = attach(&mut slots[id], &mut built);
        built.insert(id, node);
    }
    attach(&mut slots[root], &mut built)
}

fn attach(slot: &mut Slot, built: &mut HashMap<usize, DefinitionNode>) -> DefinitionNode {
    let children = std::mem::take(&mut slot.children)
        .into_iter()
        .filter_map(|child| built.remove(&child))
        .collect();

    let mut node = DefinitionNode {
        definition: slot.definition.take().unwrap_or_default(),
        position: slot.position,
        stage: CompilationStage::Loaded,
        children,
    };
    node.advance(CompilationStage::TreeAttached);
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(forest: &[DefinitionNode]) -> Vec<&str> {
        forest.iter().map(DefinitionNode::identifier).collect()
    }

    #[test]
    fn test_roots_keep_input_order() {
        let forest = build_forest(vec![
            Definition::new("b"),
            Definition::new("a"),
            Definition::new("c"),
        ])
        .unwrap();
        assert_eq!(ids(&forest), vec!["b", "a", "c"]);
        assert!(forest.iter().all(|n| n.stage() == CompilationStage::TreeAttached));
    }

    #[test]
    fn test_children_attach_before_parent_is_seen() {
        let forest = build_forest(vec![
            Definition::new("c2").with_parent("base"),
            Definition::new("c1").with_parent("base"),
            Definition::new("base"),
            Definition::new("grandchild").with_parent("c1"),
        ])
        .unwrap();

        assert_eq!(ids(&forest), vec!["base"]);
        let base = &forest[0];
        assert_eq!(ids(base.children()), vec!["c2", "c1"]);
        assert_eq!(ids(base.children()[1].children()), vec!["grandchild"]);
        assert_eq!(base.len(), 4);
        assert_eq!(base.children()[0].position(), 0);
    }

    #[test]
    fn test_walk_is_parent_before_child() {
        let forest = build_forest(vec![
            Definition::new("a"),
            Definition::new("b").with_parent("a"),
            Definition::new("c").with_parent("b"),
            Definition::new("d").with_parent("a"),
        ])
        .unwrap();
        let walked: Vec<(usize, &str)> = forest[0]
            .walk()
            .into_iter()
            .map(|(depth, node)| (depth, node.identifier()))
            .collect();
        assert_eq!(walked, vec![(0, "a"), (1, "b"), (2, "c"), (1, "d")]);
    }

    #[test]
    fn test_deep_chain_builds_without_recursion() {
        let depth = 20_000;
        let mut defs = vec![Definition::new("d0")];
        for i in 1..depth {
            defs.push(Definition::new(&format!("d{i}")).with_parent(&format!("d{}", i - 1)));
        }

        let forest = build_forest(defs).unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].len(), depth);
        let (deepest, leaf) = *forest[0].walk().last().unwrap();
        assert_eq!(deepest, depth - 1);
        assert_eq!(leaf.identifier(), format!("d{}", depth - 1));
    }

    #[test]
    fn test_duplicate_identifier_is_rejected() {
        let err = build_forest(vec![Definition::new("a"), Definition::new("a")]).unwrap_err();
        assert_eq!(err, StructuralError::DuplicateIdentifier("a".into()));
    }

    #[test]
    fn test_all_dangling_parents_are_reported() {
        let err = build_forest(vec![
            Definition::new("z").with_parent("missing"),
            Definition::new("base"),
            Definition::new("a").with_parent("gone"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            StructuralError::DanglingParent(vec![
                DanglingParent {
                    definition: "a".into(),
                    parent: "gone".into(),
                },
                DanglingParent {
                    definition: "z".into(),
                    parent: "missing".into(),
                },
            ])
        );
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let err = build_forest(vec![Definition::new("a").with_parent("a")]).unwrap_err();
        assert_eq!(err, StructuralError::Cycle("a -> a".into()));
    }

    #[test]
    fn test_longer_cycle_reports_path() {
        let err = build_forest(vec![
            Definition::new("root"),
            Definition::new("a").with_parent("c"),
            Definition::new("b").with_parent("a"),
            Definition::new("c").with_parent("b"),
        ])
        .unwrap_err();
        assert_eq!(err, StructuralError::Cycle("a -> c -> b -> a".into()));
    }

    #[test]
    fn test_descendant_of_cycle_reports_cycle_only() {
        let err = build_forest(vec![
            Definition::new("leaf").with_parent("x"),
            Definition::new("x").with_parent("y"),
            Definition::new("y").with_parent("x"),
        ])
        .unwrap_err();
        assert_eq!(err, StructuralError::Cycle("x -> y -> x".into()));
    }
}
