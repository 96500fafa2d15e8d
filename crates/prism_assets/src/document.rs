//! Serialized template documents.
//!
//! A [`TemplateDocument`] is the durable form of a template hierarchy. Like a
//! prefab file it stores nodes flat, with children referenced by index, and
//! records material bindings by uuid only. Index 0 is always the root.

use prism_core::{AssetId, PrismError, Result};
use prism_scene::{Hierarchy, Node, NodeHandle, NodePath, Renderer, SlotOverride};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::library::MaterialLibrary;

/// One node of a serialized template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub name: String,
    /// Children, as indices into [`TemplateDocument::nodes`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children_indices: Vec<usize>,
    /// Slot bindings per renderer, by material uuid
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renderers: Vec<Vec<Option<Uuid>>>,
    /// Template this node's subtree was instantiated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<AssetId>,
}

/// A persisted slot override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub path: NodePath,
    pub renderer: usize,
    pub slot: usize,
    pub material: Uuid,
}

impl OverrideRecord {
    /// Whether both records target the same slot.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        self.path == other.path && self.renderer == other.renderer && self.slot == other.slot
    }
}

/// Serialized template asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub id: AssetId,
    pub name: String,
    pub nodes: Vec<DocumentNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideRecord>,
}

impl TemplateDocument {
    /// Flattens `hierarchy` (pre-order) into a document for asset `id`.
    #[must_use]
    pub fn from_hierarchy(id: AssetId, hierarchy: &Hierarchy) -> Self {
        let order = hierarchy.iter_depth_first();
        let index_of: FxHashMap<NodeHandle, usize> =
            order.iter().enumerate().map(|(i, &h)| (h, i)).collect();

        let mut nodes = Vec::with_capacity(order.len());
        let mut overrides = Vec::new();

        for &handle in &order {
            let Some(node) = hierarchy.get(handle) else {
                continue;
            };
            nodes.push(DocumentNode {
                name: node.name.clone(),
                children_indices: node.children().iter().filter_map(|c| index_of.get(c).copied()).collect(),
                renderers: node
                    .renderers
                    .iter()
                    .map(|r| r.slots.iter().map(|s| s.as_ref().map(|m| m.uuid())).collect())
                    .collect(),
                template: node.template,
            });

            if !node.overrides().is_empty() {
                let Some(path) = hierarchy.path_of(handle) else {
                    continue;
                };
                overrides.extend(node.overrides().iter().map(|o| OverrideRecord {
                    path: path.clone(),
                    renderer: o.renderer,
                    slot: o.slot,
                    material: o.material.uuid(),
                }));
            }
        }

        Self {
            id,
            name: hierarchy.name.clone(),
            nodes,
            overrides,
        }
    }

    /// Template assets referenced by any node of this document.
    #[must_use]
    pub fn links(&self) -> Vec<AssetId> {
        let mut links: Vec<AssetId> = self.nodes.iter().filter_map(|n| n.template).collect();
        links.sort_unstable();
        links.dedup();
        links
    }

    /// Adds or replaces an override record.
    pub fn upsert_override(&mut self, record: OverrideRecord) {
        match self.overrides.iter_mut().find(|o| o.same_slot(&record)) {
            Some(existing) => *existing = record,
            None => self.overrides.push(record),
        }
    }

    /// Rebuilds the hierarchy, resolving material uuids through `library`.
    pub fn to_hierarchy(&self, library: &MaterialLibrary) -> Result<Hierarchy> {
        let corrupt = |reason: String| PrismError::CorruptDocument { asset: self.id, reason };

        let Some(root_doc) = self.nodes.first() else {
            return Err(corrupt("document has no nodes".to_string()));
        };

        let mut hierarchy = Hierarchy::with_root(
            self.id.uuid(),
            Some(self.id),
            &self.name,
            self.build_node(root_doc, library)?,
        );

        let mut placed = vec![false; self.nodes.len()];
        placed[0] = true;
        let mut stack = vec![(0usize, hierarchy.root())];
        while let Some((index, handle)) = stack.pop() {
            let mut children = Vec::with_capacity(self.nodes[index].children_indices.len());
            for &child_index in &self.nodes[index].children_indices {
                let Some(child_doc) = self.nodes.get(child_index) else {
                    return Err(corrupt(format!("child index {child_index} out of range")));
                };
                if std::mem::replace(&mut placed[child_index], true) {
                    return Err(corrupt(format!("node {child_index} is referenced twice")));
                }
                let child = hierarchy.add_child(handle, self.build_node(child_doc, library)?);
                children.push((child_index, child));
            }
            stack.extend(children.into_iter().rev());
        }

        for record in &self.overrides {
            let Some(handle) = hierarchy.node_at(&record.path) else {
                log::warn!("Override at {} in '{}' points at a missing node", record.path, self.name);
                continue;
            };
            let material = self.resolve(library, record.material)?;
            if let Some(node) = hierarchy.get_mut(handle) {
                node.record_override(SlotOverride {
                    renderer: record.renderer,
                    slot: record.slot,
                    material,
                });
            }
        }

        Ok(hierarchy)
    }

    fn build_node(&self, doc: &DocumentNode, library: &MaterialLibrary) -> Result<Node> {
        let mut node = Node::new(&doc.name);
        node.template = doc.template;
        for slots in &doc.renderers {
            let slots = slots
                .iter()
                .map(|slot| slot.map(|uuid| self.resolve(library, uuid)).transpose())
                .collect::<Result<Vec<_>>>()?;
            node.renderers.push(Renderer::new(slots));
        }
        Ok(node)
    }

    fn resolve(&self, library: &MaterialLibrary, uuid: Uuid) -> Result<prism_resources::MaterialRef> {
        library.get(&uuid).ok_or_else(|| PrismError::CorruptDocument {
            asset: self.id,
            reason: format!("unknown material {}", uuid.simple()),
        })
    }
}
