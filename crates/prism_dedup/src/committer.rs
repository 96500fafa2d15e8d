//! Writes an accepted plan into a live hierarchy.

use prism_assets::TemplateStore;
use prism_core::{PrismError, Result};
use prism_scene::{Hierarchy, SlotOverride};

use crate::plan::{NodePlan, ReplacementPlan};

/// What a commit changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub nodes: usize,
    pub slots: usize,
}

/// Applies a [`ReplacementPlan`] and persists the resulting overrides.
///
/// Nodes are committed in plan order. For each node every replacement is
/// written into the slot, the node is flagged dirty and the slot override is
/// recorded; then the overrides are handed to the store. When a store write
/// fails the node's in-memory change is kept, later nodes are left untouched,
/// and the failure surfaces as [`PrismError::CommitFailed`].
///
/// Template working copies are committed with persistence off: their override
/// records reach the store inside the document written by `save_asset`.
pub struct ApplyCommitter<'a> {
    store: &'a dyn TemplateStore,
    persist_overrides: bool,
}

impl<'a> ApplyCommitter<'a> {
    #[must_use]
    pub fn new(store: &'a dyn TemplateStore, persist_overrides: bool) -> Self {
        Self {
            store,
            persist_overrides,
        }
    }

    pub fn commit(&self, hierarchy: &mut Hierarchy, plan: ReplacementPlan) -> Result<CommitSummary> {
        let mut summary = CommitSummary::default();
        for node_plan in plan {
            let written = self.commit_node(hierarchy, node_plan)?;
            if written > 0 {
                summary.nodes += 1;
                summary.slots += written;
            }
        }
        log::debug!(
            "Committed {} slot(s) on {} node(s) of '{}'",
            summary.slots,
            summary.nodes,
            hierarchy.name
        );
        Ok(summary)
    }

    fn commit_node(&self, hierarchy: &mut Hierarchy, node_plan: NodePlan) -> Result<usize> {
        let handle = node_plan.node;
        let Some(node) = hierarchy.get_mut(handle) else {
            log::warn!("Planned node vanished from '{}', skipped", hierarchy.name);
            return Ok(0);
        };

        let mut written = Vec::with_capacity(node_plan.replacements.len());
        for replacement in node_plan.replacements {
            if !node.set_slot(replacement.renderer, replacement.slot, Some(replacement.material.clone())) {
                log::warn!(
                    "Slot {}:{} out of range on '{}', skipped",
                    replacement.renderer,
                    replacement.slot,
                    node.name
                );
                continue;
            }
            node.record_override(SlotOverride {
                renderer: replacement.renderer,
                slot: replacement.slot,
                material: replacement.material.clone(),
            });
            written.push(replacement);
        }
        if written.is_empty() {
            return Ok(0);
        }
        node.mark_dirty();

        if self.persist_overrides {
            let display = hierarchy.display_path(handle);
            let path = hierarchy.path_of(handle).ok_or_else(|| PrismError::CommitFailed {
                path: display.clone(),
                source: Box::new(PrismError::InvalidInput("node is detached from the root".into())),
            })?;
            for replacement in &written {
                self.store
                    .save_override(
                        hierarchy.id(),
                        &path,
                        replacement.renderer,
                        replacement.slot,
                        &replacement.material,
                    )
                    .map_err(|source| {
                        log::error!("Failed to persist override on '{display}': {source}");
                        PrismError::CommitFailed {
                            path: display.clone(),
                            source: Box::new(source),
                        }
                    })?;
            }
        }

        Ok(written.len())
    }
}

/// Writes the plan's slots in memory only: no dirty flags, overrides or
/// store writes. Used by preview passes before restoring a snapshot.
pub fn apply_slots(hierarchy: &mut Hierarchy, plan: &ReplacementPlan) -> usize {
    let mut applied = 0;
    for node_plan in plan.iter() {
        let Some(node) = hierarchy.get_mut(node_plan.node) else {
            continue;
        };
        for r in &node_plan.replacements {
            if node.set_slot(r.renderer, r.slot, Some(r.material.clone())) {
                applied += 1;
            }
        }
    }
    applied
}
