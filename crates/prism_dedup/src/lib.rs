//! Material deduplication passes
//!
//! Leaves first:
//! - [`SlotDiffer`]: compares one slot array with its ancestor's
//! - [`HierarchyWalker`]: aligns an instance subtree with its template by position
//! - [`ApplyCommitter`]: writes an accepted [`ReplacementPlan`] and records overrides
//! - [`DependencyOptimizer`]: runs a pass over a template and everything depending on it
//! - [`TriggerPolicy`]: decides when a pass runs and keeps passes from overlapping

pub mod committer;
pub mod differ;
pub mod graph;
pub mod optimizer;
pub mod plan;
pub mod report;
pub mod trigger;
pub mod walker;

pub use committer::{ApplyCommitter, CommitSummary};
pub use differ::{SlotDiff, SlotDiffer};
pub use graph::{DependencyGraph, GraphNode};
pub use optimizer::DependencyOptimizer;
pub use plan::{NodePlan, ReplacementPlan, SlotReplacement};
pub use report::{PassReport, PassWarning, TreeReport};
pub use trigger::{TriggerPolicy, TriggerReason};
pub use walker::HierarchyWalker;
