use prism_core::AssetId;
use rustc_hash::{FxHashMap, FxHashSet};

/// One processed template in the pass's dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: AssetId,
    pub name: String,
    /// Templates that link to this one
    pub dependents: Vec<AssetId>,
    pub changes: usize,
}

/// Arena of the templates discovered during one pass, keyed by asset id.
///
/// The graph may contain cycles; it is only ever grown by the pass that owns
/// it and each id is inserted at most once.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: FxHashMap<AssetId, GraphNode>,
    order: Vec<AssetId>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a processed node. Returns `false` if `id` was already present.
    pub fn insert(&mut self, node: GraphNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.order.push(node.id);
        self.nodes.insert(node.id, node);
        true
    }

    #[must_use]
    pub fn get(&self, id: AssetId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: AssetId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Processing order.
    #[must_use]
    pub fn order(&self) -> &[AssetId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Orders the templates discovered by a pass so that every template comes
/// after all of its ancestors in `discovered`.
///
/// `discovered` is the breadth-first discovery order and `dependents` maps
/// each discovered id to the ids linking to it. Among ready templates the
/// earliest discovered goes first. When only templates on a cycle remain,
/// the earliest discovered of them is taken even though an ancestor is still
/// pending.
#[must_use]
pub fn processing_order(discovered: &[AssetId], dependents: &FxHashMap<AssetId, Vec<AssetId>>) -> Vec<AssetId> {
    let mut waiting: FxHashMap<AssetId, usize> = discovered.iter().map(|&id| (id, 0)).collect();
    for (ancestor, linked) in dependents {
        for dependent in linked {
            if dependent == ancestor {
                continue;
            }
            if let Some(count) = waiting.get_mut(dependent) {
                *count += 1;
            }
        }
    }

    let mut done: FxHashSet<AssetId> = FxHashSet::default();
    let mut order = Vec::with_capacity(discovered.len());
    while order.len() < discovered.len() {
        let ready = discovered
            .iter()
            .copied()
            .find(|id| !done.contains(id) && waiting.get(id).copied().unwrap_or(0) == 0);
        let Some(next) = ready.or_else(|| discovered.iter().copied().find(|id| !done.contains(id))) else {
            break;
        };
        if ready.is_none() {
            log::debug!("Dependency cycle through {next}, processing it before its ancestors");
        }

        done.insert(next);
        order.push(next);
        for dependent in dependents.get(&next).map(Vec::as_slice).unwrap_or_default() {
            if done.contains(dependent) {
                continue;
            }
            if let Some(count) = waiting.get_mut(dependent) {
                *count = count.saturating_sub(1);
            }
        }
    }
    order
}
