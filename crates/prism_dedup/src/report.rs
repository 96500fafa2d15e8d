use std::fmt;

use prism_core::AssetId;
use uuid::Uuid;

use crate::graph::DependencyGraph;

/// A structural mismatch found during a pass.
///
/// Warnings never stop a pass; the mismatching part is simply left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassWarning {
    /// A renderer's slot count differs from its ancestor's.
    SlotCountMismatch {
        node: String,
        renderer: usize,
        instance: usize,
        ancestor: usize,
    },
    /// A node has a different number of renderers than its ancestor.
    RendererCountMismatch {
        node: String,
        instance: usize,
        ancestor: usize,
    },
    /// A template link could not be resolved.
    MissingAncestor {
        node: String,
        template: AssetId,
        reason: String,
    },
}

impl fmt::Display for PassWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotCountMismatch {
                node,
                renderer,
                instance,
                ancestor,
            } => write!(
                f,
                "'{node}' renderer {renderer}: {instance} slot(s) vs {ancestor} on ancestor, skipped"
            ),
            Self::RendererCountMismatch {
                node,
                instance,
                ancestor,
            } => write!(
                f,
                "'{node}': {instance} renderer(s) vs {ancestor} on ancestor, compared common prefix"
            ),
            Self::MissingAncestor { node, template, reason } => {
                write!(f, "'{node}': ancestor template {template} unavailable ({reason})")
            }
        }
    }
}

/// Changes applied to one hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeReport {
    pub hierarchy: Uuid,
    pub asset: Option<AssetId>,
    pub name: String,
    pub changes: usize,
}

/// Outcome of an optimization pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub trees: Vec<TreeReport>,
    pub warnings: Vec<PassWarning>,
    /// Templates processed, with their discovered dependents
    pub graph: DependencyGraph,
    /// `false` for preview passes
    pub committed: bool,
}

impl PassReport {
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.trees.iter().map(|t| t.changes).sum()
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    /// Changes applied to template `asset`, `None` if it was not processed.
    #[must_use]
    pub fn changes_for(&self, asset: AssetId) -> Option<usize> {
        self.trees.iter().find(|t| t.asset == Some(asset)).map(|t| t.changes)
    }

    /// Templates in the order they were processed.
    #[must_use]
    pub fn visited(&self) -> &[AssetId] {
        self.graph.order()
    }
}
