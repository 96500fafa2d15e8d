use prism_resources::MaterialRef;
use prism_scene::NodeHandle;
use smallvec::SmallVec;

/// Point one slot at an ancestor's material.
#[derive(Debug, Clone)]
pub struct SlotReplacement {
    pub renderer: usize,
    pub slot: usize,
    pub material: MaterialRef,
}

/// Every replacement planned for one node.
#[derive(Debug, Clone)]
pub struct NodePlan {
    pub node: NodeHandle,
    pub replacements: SmallVec<[SlotReplacement; 4]>,
}

/// Output of a walk: which slots to repoint, grouped by node in walk order.
///
/// A plan is consumed exactly once, by value, when it is committed.
#[derive(Debug, Default)]
pub struct ReplacementPlan {
    nodes: Vec<NodePlan>,
}

impl ReplacementPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeHandle, replacement: SlotReplacement) {
        if let Some(existing) = self.nodes.iter_mut().rev().find(|p| p.node == node) {
            existing.replacements.push(replacement);
            return;
        }
        let mut replacements = SmallVec::new();
        replacements.push(replacement);
        self.nodes.push(NodePlan { node, replacements });
    }

    /// Total number of slot replacements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().map(|p| p.replacements.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn get(&self, node: NodeHandle) -> Option<&NodePlan> {
        self.nodes.iter().find(|p| p.node == node)
    }

    /// Nodes touched by the plan.
    pub fn nodes(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes.iter().map(|p| p.node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodePlan> {
        self.nodes.iter()
    }
}

impl IntoIterator for ReplacementPlan {
    type Item = NodePlan;
    type IntoIter = std::vec::IntoIter<NodePlan>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
