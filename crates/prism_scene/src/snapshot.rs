//! Material-slot snapshots.
//!
//! A [`Snapshot`] records, for a set of nodes, the material reference in
//! every slot plus the node's override records. It is a *shallow* capture:
//! only the arrays of references are cloned, never the materials behind them.
//!
//! Snapshots back two flows:
//! - preview: capture, apply a plan in memory, inspect, restore
//! - rollback: capture before commit, restore when a durable write fails

use prism_core::{PrismError, Result};
use prism_resources::MaterialRef;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::NodeHandle;
use crate::hierarchy::Hierarchy;
use crate::node::SlotOverride;

#[derive(Debug, Clone)]
struct NodeState {
    slots: SmallVec<[Vec<Option<MaterialRef>>; 1]>,
    overrides: Vec<SlotOverride>,
}

/// Immutable capture of material slots, owned by the pass that created it.
#[derive(Debug)]
pub struct Snapshot {
    hierarchy: Uuid,
    entries: Vec<(NodeHandle, NodeState)>,
}

impl Snapshot {
    /// Captures the given nodes. Unknown handles and duplicates are ignored.
    pub fn capture(hierarchy: &Hierarchy, nodes: impl IntoIterator<Item = NodeHandle>) -> Self {
        let mut entries: Vec<(NodeHandle, NodeState)> = Vec::new();
        for handle in nodes {
            if entries.iter().any(|(h, _)| *h == handle) {
                continue;
            }
            let Some(node) = hierarchy.get(handle) else {
                continue;
            };
            let state = NodeState {
                slots: node.renderers.iter().map(|r| r.slots.clone()).collect(),
                overrides: node.overrides().to_vec(),
            };
            entries.push((handle, state));
        }
        log::trace!("Captured {} node(s) of '{}'", entries.len(), hierarchy.name);
        Self {
            hierarchy: hierarchy.id(),
            entries,
        }
    }

    /// Captures every renderable node of the hierarchy.
    #[must_use]
    pub fn capture_all(hierarchy: &Hierarchy) -> Self {
        Self::capture(hierarchy, hierarchy.renderable_nodes())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.entries.iter().any(|(h, _)| *h == handle)
    }

    /// Captured material of one slot. `None` when not captured; `Some(None)`
    /// for a captured null slot.
    #[must_use]
    pub fn captured_slot(&self, handle: NodeHandle, renderer: usize, slot: usize) -> Option<Option<&MaterialRef>> {
        let (_, state) = self.entries.iter().find(|(h, _)| *h == handle)?;
        state.slots.get(renderer)?.get(slot).map(Option::as_ref)
    }

    /// Writes every captured slot array and override list back, consuming the
    /// snapshot. Dirty flags are left untouched.
    ///
    /// Restoring unchanged nodes is a no-op. Nodes removed since capture are
    /// skipped. Returns the number of nodes restored.
    pub fn restore(self, hierarchy: &mut Hierarchy) -> Result<usize> {
        if self.hierarchy != hierarchy.id() {
            return Err(PrismError::SnapshotMismatch {
                expected: self.hierarchy,
                found: hierarchy.id(),
            });
        }

        let mut restored = 0;
        for (handle, state) in self.entries {
            let Some(node) = hierarchy.get_mut(handle) else {
                log::warn!("Snapshot node {handle:?} no longer exists, skipping");
                continue;
            };
            for (renderer, slots) in node.renderers.iter_mut().zip(state.slots) {
                renderer.slots = slots;
            }
            node.set_overrides(state.overrides);
            restored += 1;
        }
        log::debug!("Restored {restored} node(s) of '{}'", hierarchy.name);
        Ok(restored)
    }
}
