//! Export handoff.
//!
//! After a pass, the packaging step needs the final dependency list of the
//! optimized root: every template reachable through template links, every
//! material bound in any of them, and the content id of every texture those
//! materials sample. Collection happens after dedup, so collapsed duplicates
//! no longer appear.

use prism_core::{AssetId, PrismError, Result};
use rustc_hash::FxHashSet;
use serde::Serialize;
use uuid::Uuid;

use crate::store::TemplateStore;

/// Dependencies of one exported root, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleManifest {
    pub root: Option<AssetId>,
    pub templates: Vec<AssetId>,
    pub materials: Vec<Uuid>,
    pub textures: Vec<String>,
}

/// Collects the transitive dependencies of template `root`.
///
/// Linked templates that cannot be loaded are logged and left out.
pub fn collect_bundle(store: &dyn TemplateStore, root: AssetId) -> Result<BundleManifest> {
    if !store.contains(root) {
        return Err(PrismError::TemplateNotFound(root));
    }

    let mut manifest = BundleManifest {
        root: Some(root),
        ..Default::default()
    };
    let mut seen_templates = FxHashSet::default();
    let mut seen_materials = FxHashSet::default();
    let mut seen_textures = FxHashSet::default();
    let mut queue = vec![root];
    seen_templates.insert(root);

    while let Some(id) = queue.pop() {
        let hierarchy = match store.load_template(id) {
            Ok(h) => h,
            Err(err) if id != root => {
                log::warn!("Skipping unloadable dependency {id}: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };
        manifest.templates.push(id);

        for handle in hierarchy.iter_depth_first() {
            let Some(node) = hierarchy.get(handle) else {
                continue;
            };
            if let Some(link) = node.template
                && seen_templates.insert(link)
            {
                queue.push(link);
            }
            for material in node.renderers.iter().flat_map(|r| r.slots.iter().flatten()) {
                if !seen_materials.insert(material.uuid()) {
                    continue;
                }
                manifest.materials.push(material.uuid());
                for texture in material.textures() {
                    if seen_textures.insert(texture.content_id().to_string()) {
                        manifest.textures.push(texture.content_id().to_string());
                    }
                }
            }
        }
        store.release_template(id);
    }

    log::debug!(
        "Bundle for {root}: {} template(s), {} material(s), {} texture(s)",
        manifest.templates.len(),
        manifest.materials.len(),
        manifest.textures.len()
    );
    Ok(manifest)
}
