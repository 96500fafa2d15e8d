//! Positional alignment of an instance subtree with its ancestor template.

use prism_resources::FingerprintCache;
use prism_scene::{Hierarchy, NodeHandle};
use rustc_hash::FxHashSet;

use crate::differ::SlotDiffer;
use crate::plan::{ReplacementPlan, SlotReplacement};
use crate::report::PassWarning;

/// Walks an instance subtree in lockstep with its ancestor.
///
/// Nodes are paired by sibling position, never by name. Children beyond the
/// shorter side are not visited. The walker remembers every instance node it
/// aligned so nested template links covered by an enclosing walk are not
/// walked twice.
pub struct HierarchyWalker<'a> {
    differ: SlotDiffer<'a>,
    aligned: FxHashSet<NodeHandle>,
    warnings: Vec<PassWarning>,
}

impl<'a> HierarchyWalker<'a> {
    #[must_use]
    pub fn new(cache: &'a FingerprintCache) -> Self {
        Self {
            differ: SlotDiffer::new(cache),
            aligned: FxHashSet::default(),
            warnings: Vec::new(),
        }
    }

    /// Aligns `instance_node` with `ancestor_node` and appends every
    /// deduplicable slot to `plan`. Returns whether anything was planned.
    pub fn walk(
        &mut self,
        instance: &Hierarchy,
        instance_node: NodeHandle,
        ancestor: &Hierarchy,
        ancestor_node: NodeHandle,
        plan: &mut ReplacementPlan,
    ) -> bool {
        let mut changed = false;
        let mut stack = vec![(instance_node, ancestor_node)];

        while let Some((mine, theirs)) = stack.pop() {
            let (Some(inst), Some(anc)) = (instance.get(mine), ancestor.get(theirs)) else {
                continue;
            };
            self.aligned.insert(mine);

            if inst.renderers.len() != anc.renderers.len() {
                let node = instance.display_path(mine);
                log::warn!(
                    "'{node}': {} renderer(s) vs {} on ancestor '{}'",
                    inst.renderers.len(),
                    anc.renderers.len(),
                    ancestor.name
                );
                self.warnings.push(PassWarning::RendererCountMismatch {
                    node,
                    instance: inst.renderers.len(),
                    ancestor: anc.renderers.len(),
                });
            }

            for (renderer, (r_inst, r_anc)) in inst.renderers.iter().zip(&anc.renderers).enumerate() {
                let diff = self.differ.diff(&r_inst.slots, &r_anc.slots);
                if let Some((instance_len, ancestor_len)) = diff.mismatch {
                    self.warnings.push(PassWarning::SlotCountMismatch {
                        node: instance.display_path(mine),
                        renderer,
                        instance: instance_len,
                        ancestor: ancestor_len,
                    });
                }
                for (slot, material) in diff.replacements {
                    changed = true;
                    plan.push(mine, SlotReplacement { renderer, slot, material });
                }
            }

            let pairs = inst.children().len().min(anc.children().len());
            for i in (0..pairs).rev() {
                stack.push((inst.children()[i], anc.children()[i]));
            }
        }

        changed
    }

    /// Whether `handle` was aligned by a previous walk.
    #[must_use]
    pub fn is_aligned(&self, handle: NodeHandle) -> bool {
        self.aligned.contains(&handle)
    }

    pub fn warn(&mut self, warning: PassWarning) {
        self.warnings.push(warning);
    }

    pub fn take_warnings(&mut self) -> Vec<PassWarning> {
        std::mem::take(&mut self.warnings)
    }
}
