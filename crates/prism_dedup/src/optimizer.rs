//! Dependency-graph deduplication passes.
//!
//! A pass starts at one template and first discovers, breadth-first along
//! "is linked by" edges, every template depending on it. The discovered
//! templates are then processed so that each one comes after all of its
//! discovered ancestors: it is loaded as a transient working copy, compared
//! against the templates it links to, committed and saved. Dependents
//! therefore see their ancestors in their already-deduplicated state. Only
//! templates on a dependency cycle can be processed before an ancestor.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use prism_assets::TemplateStore;
use prism_core::{AssetId, DedupSettings, PrismError, Result};
use prism_resources::FingerprintCache;
use prism_scene::{Hierarchy, Snapshot};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::committer::{ApplyCommitter, apply_slots};
use crate::graph::{GraphNode, processing_order};
use crate::plan::ReplacementPlan;
use crate::report::{PassReport, PassWarning, TreeReport};
use crate::walker::HierarchyWalker;

/// A template loaded for the duration of one step. Released on drop.
struct WorkingCopy<'s> {
    store: &'s dyn TemplateStore,
    id: AssetId,
    hierarchy: Hierarchy,
}

impl<'s> WorkingCopy<'s> {
    fn load(store: &'s dyn TemplateStore, id: AssetId) -> Result<Self> {
        let hierarchy = store.load_template(id)?;
        Ok(Self { store, id, hierarchy })
    }
}

impl Deref for WorkingCopy<'_> {
    type Target = Hierarchy;

    fn deref(&self) -> &Hierarchy {
        &self.hierarchy
    }
}

impl DerefMut for WorkingCopy<'_> {
    fn deref_mut(&mut self) -> &mut Hierarchy {
        &mut self.hierarchy
    }
}

impl Drop for WorkingCopy<'_> {
    fn drop(&mut self) {
        self.store.release_template(self.id);
    }
}

enum PassCache<'a> {
    Owned(FingerprintCache),
    Shared(&'a FingerprintCache),
}

impl PassCache<'_> {
    fn get(&self) -> &FingerprintCache {
        match self {
            Self::Owned(cache) => cache,
            Self::Shared(cache) => cache,
        }
    }
}

/// Runs deduplication passes against a [`TemplateStore`].
///
/// The optimizer holds no state between passes except the fingerprint cache,
/// and only when one is shared in through [`with_cache`](Self::with_cache).
pub struct DependencyOptimizer<'a> {
    store: &'a dyn TemplateStore,
    settings: DedupSettings,
    cache: PassCache<'a>,
}

impl<'a> DependencyOptimizer<'a> {
    /// Creates an optimizer owning its fingerprint cache.
    #[must_use]
    pub fn new(store: &'a dyn TemplateStore, settings: &DedupSettings) -> Self {
        let cache = if settings.use_fingerprint_cache {
            FingerprintCache::new()
        } else {
            FingerprintCache::disabled()
        };
        Self {
            store,
            settings: settings.clone(),
            cache: PassCache::Owned(cache),
        }
    }

    /// Creates an optimizer memoizing into a cache the caller keeps alive
    /// across passes. Ignored when `use_fingerprint_cache` is off.
    #[must_use]
    pub fn with_cache(store: &'a dyn TemplateStore, settings: &DedupSettings, cache: &'a FingerprintCache) -> Self {
        if !settings.use_fingerprint_cache {
            return Self::new(store, settings);
        }
        Self {
            store,
            settings: settings.clone(),
            cache: PassCache::Shared(cache),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &DedupSettings {
        &self.settings
    }

    #[must_use]
    pub fn cache(&self) -> &FingerprintCache {
        self.cache.get()
    }

    fn committer(&self) -> ApplyCommitter<'a> {
        ApplyCommitter::new(self.store, self.settings.persist_overrides)
    }

    // ========================================================================
    // Template passes
    // ========================================================================

    /// Deduplicates `root` and every template transitively depending on it.
    ///
    /// Each template is processed at most once, so cyclic and diamond-shaped
    /// dependency graphs terminate. An unknown root is rejected before
    /// anything is touched.
    pub fn optimize_from(&self, root: AssetId) -> Result<PassReport> {
        if !self.store.contains(root) {
            return Err(PrismError::InvalidInput(format!("unknown root template {root}")));
        }
        log::info!("Deduplication pass from {root}");

        let mut report = PassReport {
            committed: true,
            ..PassReport::default()
        };
        let (discovered, dependents) = self.discover(root)?;
        let mut visited: FxHashSet<AssetId> = FxHashSet::default();

        for id in processing_order(&discovered, &dependents) {
            if !visited.insert(id) {
                continue;
            }
            let linked = dependents.get(&id).cloned().unwrap_or_default();
            self.process_template(id, linked, &mut report)?;
        }

        log::info!(
            "Pass from {root} finished: {} template(s), {} change(s), {} warning(s)",
            report.graph.len(),
            report.total_changes(),
            report.warnings.len()
        );
        Ok(report)
    }

    /// Breadth-first discovery of `root` and its transitive dependents.
    /// Each template's dependents are queried exactly once.
    fn discover(&self, root: AssetId) -> Result<(Vec<AssetId>, FxHashMap<AssetId, Vec<AssetId>>)> {
        let mut discovered = Vec::new();
        let mut dependents = FxHashMap::default();
        let mut seen = FxHashSet::from_iter([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(id) = queue.pop_front() {
            discovered.push(id);
            let linked = self.store.dependents(id)?;
            queue.extend(linked.iter().copied().filter(|d| seen.insert(*d)));
            dependents.insert(id, linked);
        }
        log::debug!("Discovered {} template(s) from {root}", discovered.len());
        Ok((discovered, dependents))
    }

    fn process_template(&self, id: AssetId, dependents: Vec<AssetId>, report: &mut PassReport) -> Result<()> {
        let mut copy = WorkingCopy::load(self.store, id)?;
        let (plan, warnings) = self.plan(&copy);
        report.warnings.extend(warnings);

        let changes = if plan.is_empty() {
            0
        } else {
            // The override records travel inside the document written by
            // `save_asset`, so the template is replaced in a single write.
            let summary = ApplyCommitter::new(self.store, false).commit(&mut copy, plan)?;
            self.store.save_asset(id, &copy)?;
            copy.clear_dirty();
            summary.slots
        };
        log::debug!("'{}' ({id}): {changes} change(s)", copy.name);

        report.trees.push(TreeReport {
            hierarchy: copy.id(),
            asset: Some(id),
            name: copy.name.clone(),
            changes,
        });

        report.graph.insert(GraphNode {
            id,
            name: copy.name.clone(),
            dependents,
            changes,
        });
        Ok(())
    }

    // ========================================================================
    // Planning
    // ========================================================================

    /// Compares every template link of `hierarchy` with its immediate
    /// ancestor and returns the replacements it would make.
    ///
    /// Links are visited in pre-order, so an enclosing link is walked before
    /// the links nested inside it, and nodes it already aligned are skipped.
    #[must_use]
    pub fn plan(&self, hierarchy: &Hierarchy) -> (ReplacementPlan, Vec<PassWarning>) {
        let mut walker = HierarchyWalker::new(self.cache.get());
        let mut plan = ReplacementPlan::new();
        let mut ancestors: FxHashMap<AssetId, Option<WorkingCopy<'a>>> = FxHashMap::default();

        for (handle, link) in hierarchy.template_links() {
            if walker.is_aligned(handle) {
                continue;
            }
            if hierarchy.asset() == Some(link) {
                log::warn!("'{}' links to itself, skipped", hierarchy.display_path(handle));
                continue;
            }

            if !ancestors.contains_key(&link) {
                let loaded = match WorkingCopy::load(self.store, link) {
                    Ok(copy) => Some(copy),
                    Err(err) => {
                        let node = hierarchy.display_path(handle);
                        log::warn!("'{node}': ancestor {link} unavailable: {err}");
                        walker.warn(PassWarning::MissingAncestor {
                            node,
                            template: link,
                            reason: err.to_string(),
                        });
                        None
                    }
                };
                ancestors.insert(link, loaded);
            }
            let Some(Some(ancestor)) = ancestors.get(&link) else {
                continue;
            };

            walker.walk(hierarchy, handle, ancestor, ancestor.root(), &mut plan);
        }

        (plan, walker.take_warnings())
    }

    // ========================================================================
    // Instance passes
    // ========================================================================

    /// Deduplicates a live instance against the templates it links to.
    ///
    /// The affected nodes are captured before commit. When a store write
    /// fails and `rollback_on_failure` is set they are restored before the
    /// error is returned.
    pub fn optimize_instance(&self, instance: &mut Hierarchy) -> Result<PassReport> {
        ensure_derived(instance)?;
        let (plan, warnings) = self.plan(instance);
        let snapshot = Snapshot::capture(instance, plan.nodes().collect::<Vec<_>>());

        match self.committer().commit(instance, plan) {
            Ok(summary) => Ok(PassReport {
                trees: vec![TreeReport {
                    hierarchy: instance.id(),
                    asset: instance.asset(),
                    name: instance.name.clone(),
                    changes: summary.slots,
                }],
                warnings,
                committed: true,
                ..PassReport::default()
            }),
            Err(err) => {
                if self.settings.rollback_on_failure {
                    roll_back(snapshot, instance);
                }
                Err(err)
            }
        }
    }

    /// Reports what [`optimize_instance`](Self::optimize_instance) would
    /// change, leaving the instance exactly as it was.
    pub fn preview_instance(&self, instance: &mut Hierarchy) -> Result<PassReport> {
        ensure_derived(instance)?;
        let (plan, warnings) = self.plan(instance);
        let snapshot = Snapshot::capture(instance, plan.nodes().collect::<Vec<_>>());

        let changes = apply_slots(instance, &plan);
        let report = PassReport {
            trees: vec![TreeReport {
                hierarchy: instance.id(),
                asset: instance.asset(),
                name: instance.name.clone(),
                changes,
            }],
            warnings,
            committed: false,
            ..PassReport::default()
        };
        snapshot.restore(instance)?;
        Ok(report)
    }
}

/// Restores `snapshot` after a failed commit. A failing restore is logged so
/// the commit error stays the one reported to the caller.
fn roll_back(snapshot: Snapshot, instance: &mut Hierarchy) {
    match snapshot.restore(instance) {
        Ok(restored) => log::warn!("Rolled back {restored} node(s) of '{}'", instance.name),
        Err(err) => log::error!("Rollback of '{}' failed: {err}", instance.name),
    }
}

fn ensure_derived(instance: &Hierarchy) -> Result<()> {
    if instance.template_links().is_empty() {
        return Err(PrismError::NotDerived(instance.name.clone()));
    }
    Ok(())
}
