//! Object hierarchy system
//!
//! Manages the structures an optimization pass works on:
//! - Node: a hierarchy node (children, renderers, template link, overrides)
//! - Renderer: an ordered array of material slots
//! - Hierarchy: an arena-backed tree of nodes, either a template or a placed instance
//! - NodePath: position-based node address that survives reloads
//! - Snapshot: shallow capture of material slots for rollback and preview

pub mod hierarchy;
pub mod node;
pub mod path;
pub mod snapshot;

pub use hierarchy::Hierarchy;
pub use node::{Node, NodeFlags, Renderer, SlotOverride};
pub use path::NodePath;
pub use snapshot::Snapshot;

use slotmap::new_key_type;

new_key_type! {
    /// Handle of a node inside one loaded [`Hierarchy`]. Not stable across reloads.
    pub struct NodeHandle;
}
