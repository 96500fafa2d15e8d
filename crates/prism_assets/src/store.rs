//! Durable template store.
//!
//! [`TemplateStore`] is the boundary between a dedup pass and wherever
//! template assets actually live. A pass only ever:
//! - loads a transient working copy of a template ([`TemplateStore::load_template`])
//!   and hands it back when done ([`TemplateStore::release_template`])
//! - asks which templates depend on a template ([`TemplateStore::dependents`])
//! - writes slot overrides and whole templates back
//!
//! Methods take `&self`; implementations guard their state internally so a
//! working copy can be held while writes go through.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use prism_core::{AssetId, PrismError, Result};
use prism_resources::MaterialRef;
use prism_scene::{Hierarchy, NodePath};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::document::{OverrideRecord, TemplateDocument};
use crate::library::MaterialLibrary;

/// Durable storage of template assets.
pub trait TemplateStore {
    /// Whether `id` names a stored template.
    fn contains(&self, id: AssetId) -> bool;

    /// Loads a fresh, transient working copy of a template.
    fn load_template(&self, id: AssetId) -> Result<Hierarchy>;

    /// Called once a working copy obtained from `load_template` is discarded.
    fn release_template(&self, _id: AssetId) {}

    /// Templates containing a node linked to `id`, excluding `id` itself.
    fn dependents(&self, id: AssetId) -> Result<Vec<AssetId>>;

    /// Persists one slot override of the hierarchy identified by `owner`.
    fn save_override(
        &self,
        owner: Uuid,
        path: &NodePath,
        renderer: usize,
        slot: usize,
        material: &MaterialRef,
    ) -> Result<()>;

    /// Replaces the stored template `id` with `hierarchy`.
    fn save_asset(&self, id: AssetId, hierarchy: &Hierarchy) -> Result<()>;
}

/// Operation counters of an [`InMemoryTemplateStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub loads: usize,
    pub releases: usize,
    pub asset_saves: usize,
    pub override_saves: usize,
    pub dependents_queries: usize,
}

impl StoreStats {
    /// Working copies loaded but not yet released.
    #[must_use]
    pub fn open_copies(&self) -> usize {
        self.loads.saturating_sub(self.releases)
    }
}

#[derive(Debug, Default)]
struct Counters {
    loads: AtomicUsize,
    releases: AtomicUsize,
    asset_saves: AtomicUsize,
    override_saves: AtomicUsize,
    dependents_queries: AtomicUsize,
}

struct StoredTemplate {
    json: String,
    links: Vec<AssetId>,
}

/// Store keeping every template as a serialized JSON [`TemplateDocument`].
///
/// Overrides written for hierarchies that are not stored templates (placed
/// scene instances) are journaled per hierarchy id.
#[derive(Default)]
pub struct InMemoryTemplateStore {
    materials: MaterialLibrary,
    templates: RwLock<FxHashMap<AssetId, StoredTemplate>>,
    instance_overrides: RwLock<FxHashMap<Uuid, Vec<OverrideRecord>>>,
    counters: Counters,
}

impl InMemoryTemplateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Registers a material so stored documents can resolve it.
    pub fn register_material(&self, material: impl Into<MaterialRef>) -> MaterialRef {
        self.materials.add(material)
    }

    /// Stores a template hierarchy under its own asset id.
    pub fn insert(&self, hierarchy: &Hierarchy) -> Result<AssetId> {
        let Some(id) = hierarchy.asset() else {
            return Err(PrismError::InvalidInput(format!(
                "'{}' is not a template hierarchy",
                hierarchy.name
            )));
        };
        self.write_template(id, hierarchy)?;
        Ok(id)
    }

    /// Parsed document of a stored template.
    pub fn document(&self, id: AssetId) -> Result<TemplateDocument> {
        let guard = self.templates.read();
        let stored = guard.get(&id).ok_or(PrismError::TemplateNotFound(id))?;
        Ok(serde_json::from_str(&stored.json)?)
    }

    /// Serialized JSON of a stored template.
    #[must_use]
    pub fn document_json(&self, id: AssetId) -> Option<String> {
        self.templates.read().get(&id).map(|t| t.json.clone())
    }

    /// Journaled overrides of a non-template hierarchy.
    #[must_use]
    pub fn instance_overrides(&self, owner: Uuid) -> Vec<OverrideRecord> {
        self.instance_overrides.read().get(&owner).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn template_ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self.templates.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            loads: self.counters.loads.load(Ordering::Relaxed),
            releases: self.counters.releases.load(Ordering::Relaxed),
            asset_saves: self.counters.asset_saves.load(Ordering::Relaxed),
            override_saves: self.counters.override_saves.load(Ordering::Relaxed),
            dependents_queries: self.counters.dependents_queries.load(Ordering::Relaxed),
        }
    }

    fn write_template(&self, id: AssetId, hierarchy: &Hierarchy) -> Result<()> {
        for handle in hierarchy.iter_depth_first() {
            let Some(node) = hierarchy.get(handle) else {
                continue;
            };
            for material in node.renderers.iter().flat_map(|r| r.slots.iter().flatten()) {
                self.materials.add(material.clone());
            }
            for record in node.overrides() {
                self.materials.add(record.material.clone());
            }
        }

        let document = TemplateDocument::from_hierarchy(id, hierarchy);
        let links = document.links();
        let json = serde_json::to_string(&document)?;
        self.templates.write().insert(id, StoredTemplate { json, links });
        Ok(())
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn contains(&self, id: AssetId) -> bool {
        self.templates.read().contains_key(&id)
    }

    fn load_template(&self, id: AssetId) -> Result<Hierarchy> {
        let document = self.document(id)?;
        let hierarchy = document.to_hierarchy(&self.materials)?;
        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        log::trace!("Loaded working copy of '{}' ({id})", hierarchy.name);
        Ok(hierarchy)
    }

    fn release_template(&self, id: AssetId) {
        self.counters.releases.fetch_add(1, Ordering::Relaxed);
        log::trace!("Released working copy of {id}");
    }

    fn dependents(&self, id: AssetId) -> Result<Vec<AssetId>> {
        self.counters.dependents_queries.fetch_add(1, Ordering::Relaxed);
        let guard = self.templates.read();
        if !guard.contains_key(&id) {
            return Err(PrismError::TemplateNotFound(id));
        }
        let mut dependents: Vec<AssetId> = guard
            .iter()
            .filter(|(other, stored)| **other != id && stored.links.contains(&id))
            .map(|(other, _)| *other)
            .collect();
        dependents.sort_unstable();
        Ok(dependents)
    }

    fn save_override(
        &self,
        owner: Uuid,
        path: &NodePath,
        renderer: usize,
        slot: usize,
        material: &MaterialRef,
    ) -> Result<()> {
        self.materials.add(material.clone());
        let record = OverrideRecord {
            path: path.clone(),
            renderer,
            slot,
            material: material.uuid(),
        };

        self.counters.override_saves.fetch_add(1, Ordering::Relaxed);

        let asset = AssetId::from_uuid(owner);
        {
            let mut templates = self.templates.write();
            if let Some(stored) = templates.get_mut(&asset) {
                let mut document: TemplateDocument = serde_json::from_str(&stored.json)?;
                document.upsert_override(record);
                stored.json = serde_json::to_string(&document)?;
                return Ok(());
            }
        }

        let mut journal = self.instance_overrides.write();
        let records = journal.entry(owner).or_default();
        match records.iter_mut().find(|r| r.same_slot(&record)) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    fn save_asset(&self, id: AssetId, hierarchy: &Hierarchy) -> Result<()> {
        self.write_template(id, hierarchy)?;
        self.counters.asset_saves.fetch_add(1, Ordering::Relaxed);
        log::debug!("Saved template '{}' ({id})", hierarchy.name);
        Ok(())
    }
}
