use prism_core::AssetId;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::NodeHandle;
use crate::node::{Node, NodeFlags};
use crate::path::NodePath;

/// An object hierarchy: a template asset's working copy or a placed instance.
///
/// Nodes live in an arena and reference each other by [`NodeHandle`].
/// Children order is significant and preserved by every operation.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    id: Uuid,
    asset: Option<AssetId>,
    pub name: String,
    nodes: SlotMap<NodeHandle, Node>,
    root: NodeHandle,
}

impl Hierarchy {
    /// Creates a free-standing hierarchy (e.g. a scene instance) with a root node.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_root(Uuid::new_v4(), None, name, Node::new(name))
    }

    /// Creates the hierarchy of template asset `asset`.
    #[must_use]
    pub fn for_asset(asset: AssetId, name: &str) -> Self {
        Self::with_root(asset.uuid(), Some(asset), name, Node::new(name))
    }

    /// Creates a hierarchy around an explicit root node.
    #[must_use]
    pub fn with_root(id: Uuid, asset: Option<AssetId>, name: &str, mut root: Node) -> Self {
        root.parent = None;
        root.children.clear();
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Self {
            id,
            asset,
            name: name.to_string(),
            nodes,
            root,
        }
    }

    /// Places a new instance of `template`.
    ///
    /// The instance shares every material reference with the template, links
    /// its root to the template asset and starts without overrides.
    #[must_use]
    pub fn instantiate(template: &Hierarchy, name: &str) -> Self {
        let mut nodes = template.nodes.clone();
        for (_, node) in &mut nodes {
            node.overrides.clear();
            node.flags = NodeFlags::empty();
        }
        if let Some(root) = nodes.get_mut(template.root) {
            root.name = name.to_string();
            if template.asset.is_some() {
                root.template = template.asset;
            }
        }
        Self {
            id: Uuid::new_v4(),
            asset: None,
            name: name.to_string(),
            nodes,
            root: template.root,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Template asset this hierarchy is the working copy of, if any.
    #[inline]
    #[must_use]
    pub fn asset(&self) -> Option<AssetId> {
        self.asset
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Children of `handle`, empty for unknown handles.
    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(handle).map_or(&[], |n| n.children.as_slice())
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// An unknown parent attaches the node to the root instead.
    pub fn add_child(&mut self, parent: NodeHandle, mut child: Node) -> NodeHandle {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            log::error!("Parent node not found in '{}', attaching to root", self.name);
            self.root
        };
        child.parent = Some(parent);
        child.children.clear();
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Removes a node and its whole subtree. The root cannot be removed.
    pub fn remove_subtree(&mut self, handle: NodeHandle) {
        if handle == self.root {
            log::warn!("Cannot remove the root of '{}'", self.name);
            return;
        }
        let Some(parent) = self.nodes.get(handle).and_then(Node::parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent)
            && let Some(pos) = p.children.iter().position(|&c| c == handle)
        {
            p.children.remove(pos);
        }
        for node in self.descendants(handle) {
            self.nodes.remove(node);
        }
    }

    /// `handle` and all of its descendants in pre-order (parents before
    /// children, siblings in order).
    #[must_use]
    pub fn descendants(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut order = Vec::new();
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            order.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Every node in pre-order from the root.
    #[must_use]
    pub fn iter_depth_first(&self) -> Vec<NodeHandle> {
        self.descendants(self.root)
    }

    /// Nodes owning at least one renderer, in pre-order.
    #[must_use]
    pub fn renderable_nodes(&self) -> Vec<NodeHandle> {
        self.iter_depth_first()
            .into_iter()
            .filter(|&h| self.nodes[h].is_renderable())
            .collect()
    }

    /// Nodes carrying a template link, in pre-order.
    #[must_use]
    pub fn template_links(&self) -> Vec<(NodeHandle, AssetId)> {
        self.iter_depth_first()
            .into_iter()
            .filter_map(|h| self.nodes[h].template.map(|t| (h, t)))
            .collect()
    }

    // ========================================================================
    // Position-based addressing
    // ========================================================================

    /// Sibling-index path from the root to `handle`.
    #[must_use]
    pub fn path_of(&self, handle: NodeHandle) -> Option<NodePath> {
        let mut indices = Vec::new();
        let mut current = handle;
        loop {
            let node = self.nodes.get(current)?;
            let Some(parent) = node.parent else {
                break;
            };
            let index = self.nodes.get(parent)?.children.iter().position(|&c| c == current)?;
            indices.push(index as u32);
            current = parent;
        }
        if current != self.root {
            return None;
        }
        indices.reverse();
        Some(NodePath::from_indices(indices))
    }

    /// Resolves a path produced by [`path_of`](Self::path_of).
    #[must_use]
    pub fn node_at(&self, path: &NodePath) -> Option<NodeHandle> {
        let mut current = self.root;
        for &index in path.indices() {
            current = *self.nodes.get(current)?.children.get(index as usize)?;
        }
        Some(current)
    }

    /// Human-readable path for logs, e.g. `Crate/Lid/Hinge`.
    #[must_use]
    pub fn display_path(&self, handle: NodeHandle) -> String {
        let mut names = Vec::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            let Some(node) = self.nodes.get(h) else {
                break;
            };
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Clears the dirty flag on every node.
    pub fn clear_dirty(&mut self) {
        for (_, node) in &mut self.nodes {
            node.clear_dirty();
        }
    }

    /// Nodes currently flagged dirty.
    #[must_use]
    pub fn dirty_nodes(&self) -> Vec<NodeHandle> {
        self.iter_depth_first()
            .into_iter()
            .filter(|&h| self.nodes[h].is_dirty())
            .collect()
    }
}
