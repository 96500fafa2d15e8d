//! Deduplication Pass Tests
//!
//! Tests for:
//! - Slot replacement: duplicate slots point at the ancestor's material
//! - Divergence preservation: visually different slots are never touched
//! - Idempotence: a second pass changes nothing
//! - Dependency graph: chains, diamonds and cycles, each template once,
//!   every template after the ancestors it links to
//! - Nested links: the immediate ancestor is the comparison target
//! - Structural mismatches: warnings, common-prefix comparison
//! - Invalid input: unknown roots, hierarchies with no template link

use glam::Vec4;
use prism::assets::{InMemoryTemplateStore, TemplateStore};
use prism::core::{AssetId, DedupSettings, PrismError};
use prism::dedup::{DependencyOptimizer, PassWarning};
use prism::resources::{FingerprintCache, Material, MaterialRef, PropertyKind, ShaderDescriptor, ShaderRef};
use prism::scene::{Hierarchy, Node, Renderer};
use uuid::Uuid;

fn lit() -> ShaderRef {
    ShaderDescriptor::new("Lit")
        .with_property("_Tint", PropertyKind::Color)
        .with_property("_Smoothness", PropertyKind::Float)
        .into_ref()
}

fn tinted(name: &str, r: f32) -> MaterialRef {
    Material::builder(lit())
        .name(name)
        .color("_Tint", Vec4::new(r, 0.2, 0.2, 1.0))
        .float("_Smoothness", 0.5)
        .build_ref()
}

/// Template `name` with a single renderable child `Body`, its root linked to `link`.
fn prop(name: &str, link: Option<AssetId>, slots: Vec<MaterialRef>) -> Hierarchy {
    let mut h = Hierarchy::for_asset(AssetId::from_name(name), name);
    let root = h.root();
    h.get_mut(root).unwrap().template = link;
    h.add_child(root, Node::new("Body").with_renderer(Renderer::with_materials(slots)));
    h
}

fn body_slots(store: &InMemoryTemplateStore, id: AssetId) -> Vec<Option<MaterialRef>> {
    let h = store.load_template(id).unwrap();
    store.release_template(id);
    let body = h.children(h.root())[0];
    h.get(body).unwrap().renderers[0].slots.clone()
}

fn same(slot: &Option<MaterialRef>, expected: &MaterialRef) -> bool {
    slot.as_ref().is_some_and(|m| MaterialRef::ptr_eq(m, expected))
}

// ============================================================================
// Slot Replacement
// ============================================================================

#[test]
fn duplicate_slot_points_at_ancestor_and_divergent_slot_stays() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let mat_a_prime = tinted("A'", 1.0);
    let mat_b_prime = tinted("B'", 0.0);
    let mat_a = tinted("A", 1.0);
    let mat_b = tinted("B", 0.6);

    let base = store
        .insert(&prop("Crate", None, vec![mat_a_prime.clone(), mat_b_prime.clone()]))
        .unwrap();
    let variant = store
        .insert(&prop("CrateRusty", Some(base), vec![mat_a, mat_b.clone()]))
        .unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert_eq!(report.visited(), &[base, variant]);
    assert_eq!(report.changes_for(base), Some(0));
    assert_eq!(report.changes_for(variant), Some(1));
    assert!(report.warnings.is_empty());

    let slots = body_slots(&store, variant);
    assert!(same(&slots[0], &mat_a_prime));
    assert!(same(&slots[1], &mat_b));
}

#[test]
fn override_is_persisted_on_the_variant() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let shared = tinted("Shared", 0.4);
    let base = store.insert(&prop("Barrel", None, vec![shared.clone()])).unwrap();
    let variant = store
        .insert(&prop("BarrelBlue", Some(base), vec![tinted("Copy", 0.4)]))
        .unwrap();

    DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();

    let document = store.document(variant).unwrap();
    assert_eq!(document.overrides.len(), 1);
    assert_eq!(document.overrides[0].material, shared.uuid());
    assert_eq!(store.stats().asset_saves, 1);
}

#[test]
fn overrides_not_persisted_when_disabled() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings {
        persist_overrides: false,
        ..DedupSettings::default()
    };

    let base = store.insert(&prop("Barrel", None, vec![tinted("Shared", 0.4)])).unwrap();
    store
        .insert(&prop("BarrelBlue", Some(base), vec![tinted("Copy", 0.4)]))
        .unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert_eq!(report.total_changes(), 1);
    assert_eq!(store.stats().override_saves, 0);
}

#[test]
fn empty_and_already_shared_slots_are_untouched() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let shared = tinted("Shared", 0.1);
    let mut base = prop("Lamp", None, vec![shared.clone()]);
    let body = base.children(base.root())[0];
    base.get_mut(body).unwrap().renderers[0].slots.push(None);
    let base_id = store.insert(&base).unwrap();

    let mut variant = prop("LampTall", Some(base_id), vec![shared.clone()]);
    let body = variant.children(variant.root())[0];
    variant.get_mut(body).unwrap().renderers[0].slots.push(Some(tinted("Extra", 0.1)));
    store.insert(&variant).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base_id).unwrap();
    assert_eq!(report.total_changes(), 0);
    assert_eq!(store.stats().asset_saves, 0);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn second_pass_changes_nothing() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let base = store
        .insert(&prop("Crate", None, vec![tinted("A", 1.0), tinted("B", 0.0)]))
        .unwrap();
    let variant = store
        .insert(&prop("CrateRed", Some(base), vec![tinted("A2", 1.0), tinted("B2", 0.0)]))
        .unwrap();
    store
        .insert(&prop("CrateRedSmall", Some(variant), vec![tinted("A3", 1.0), tinted("B3", 0.7)]))
        .unwrap();

    let optimizer = DependencyOptimizer::new(&store, &settings);
    let first = optimizer.optimize_from(base).unwrap();
    assert_eq!(first.total_changes(), 3);

    let second = optimizer.optimize_from(base).unwrap();
    assert_eq!(second.total_changes(), 0);
    assert_eq!(second.visited(), first.visited());
}

#[test]
fn shared_cache_is_reused_across_passes() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();
    let cache = FingerprintCache::new();

    let base = store.insert(&prop("Crate", None, vec![tinted("A", 1.0)])).unwrap();
    store.insert(&prop("CrateRed", Some(base), vec![tinted("A2", 1.0)])).unwrap();

    DependencyOptimizer::with_cache(&store, &settings, &cache)
        .optimize_from(base)
        .unwrap();
    let misses = cache.stats().misses;
    assert!(misses > 0);

    DependencyOptimizer::with_cache(&store, &settings, &cache)
        .optimize_from(base)
        .unwrap();
    assert_eq!(cache.stats().misses, misses);
}

// ============================================================================
// Dependency Graph
// ============================================================================

#[test]
fn chain_sees_deduplicated_ancestors() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let original = tinted("Original", 0.9);
    let base = store.insert(&prop("Door", None, vec![original.clone()])).unwrap();
    let mid = store.insert(&prop("DoorOld", Some(base), vec![tinted("Copy1", 0.9)])).unwrap();
    let leaf = store.insert(&prop("DoorOldBroken", Some(mid), vec![tinted("Copy2", 0.9)])).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert_eq!(report.visited(), &[base, mid, leaf]);

    assert!(same(&body_slots(&store, mid)[0], &original));
    assert!(same(&body_slots(&store, leaf)[0], &original));
}

#[test]
fn diamond_visits_shared_dependent_once() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let base = store.insert(&prop("Base", None, vec![tinted("M", 0.3)])).unwrap();
    let left = store.insert(&prop("Left", Some(base), vec![tinted("M", 0.3)])).unwrap();
    let right = store.insert(&prop("Right", Some(base), vec![tinted("M", 0.3)])).unwrap();

    let mut joined = Hierarchy::for_asset(AssetId::from_name("Joined"), "Joined");
    let root = joined.root();
    for (name, link) in [("L", left), ("R", right)] {
        let half = joined.add_child(root, Node::new(name).with_template(link));
        joined.add_child(half, Node::new("Body").with_renderer(Renderer::with_materials([tinted("M", 0.3)])));
    }
    let joined = store.insert(&joined).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    let visited = report.visited();
    assert_eq!(visited.len(), 4);
    assert_eq!(visited.iter().filter(|&&id| id == joined).count(), 1);
    assert_eq!(visited[0], base);
    assert_eq!(report.changes_for(joined), Some(2));
    assert_eq!(store.stats().open_copies(), 0);

    let again = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert_eq!(again.total_changes(), 0);
}

#[test]
fn dependent_waits_for_every_linked_ancestor() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    // Ids chosen so the shared dependent sorts before its intermediate ancestor.
    let base_id = AssetId::from_uuid(Uuid::from_u128(1));
    let shelf_id = AssetId::from_uuid(Uuid::from_u128(2));
    let bracket_id = AssetId::from_uuid(Uuid::from_u128(3));

    let steel = tinted("Steel", 0.5);
    let mut base = Hierarchy::for_asset(base_id, "Bracket");
    let root = base.root();
    base.add_child(root, Node::new("Body").with_renderer(Renderer::with_materials([steel.clone()])));
    store.insert(&base).unwrap();

    let mut bracket = Hierarchy::for_asset(bracket_id, "BracketWorn");
    let root = bracket.root();
    bracket.get_mut(root).unwrap().template = Some(base_id);
    bracket.add_child(root, Node::new("Body").with_renderer(Renderer::with_materials([tinted("Steel2", 0.5)])));
    store.insert(&bracket).unwrap();

    let mut shelf = Hierarchy::for_asset(shelf_id, "Shelf");
    let root = shelf.root();
    for (name, link) in [("ViaWorn", bracket_id), ("ViaBase", base_id)] {
        let mount = shelf.add_child(root, Node::new(name).with_template(link));
        shelf.add_child(mount, Node::new("Body").with_renderer(Renderer::with_materials([tinted("Steel3", 0.5)])));
    }
    store.insert(&shelf).unwrap();

    let optimizer = DependencyOptimizer::new(&store, &settings);
    let first = optimizer.optimize_from(base_id).unwrap();
    assert_eq!(first.visited(), &[base_id, bracket_id, shelf_id]);
    assert_eq!(first.total_changes(), 3);

    let copy = store.load_template(shelf_id).unwrap();
    store.release_template(shelf_id);
    for &mount in copy.children(copy.root()) {
        let body = copy.children(mount)[0];
        assert!(MaterialRef::ptr_eq(copy.get(body).unwrap().renderers[0].slot(0).unwrap(), &steel));
    }

    let second = optimizer.optimize_from(base_id).unwrap();
    assert_eq!(second.total_changes(), 0);
}

#[test]
fn cycle_terminates_and_visits_each_once() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let a_id = AssetId::from_name("A");
    let b_id = AssetId::from_name("B");
    store.insert(&prop("A", Some(b_id), vec![tinted("MA", 0.8)])).unwrap();
    store.insert(&prop("B", Some(a_id), vec![tinted("MB", 0.8)])).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(a_id).unwrap();
    assert_eq!(report.visited(), &[a_id, b_id]);
    assert_eq!(report.graph.get(a_id).unwrap().dependents, vec![b_id]);
    assert_eq!(report.graph.get(b_id).unwrap().dependents, vec![a_id]);

    // A adopts B's material; B then already shares it.
    assert_eq!(report.changes_for(a_id), Some(1));
    assert_eq!(report.changes_for(b_id), Some(0));
    assert_eq!(store.stats().asset_saves, 1);
    assert_eq!(store.stats().open_copies(), 0);
}

#[test]
fn unrelated_templates_are_not_visited() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let base = store.insert(&prop("Tree", None, vec![tinted("Bark", 0.3)])).unwrap();
    let other = store.insert(&prop("Rock", None, vec![tinted("Stone", 0.3)])).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert!(!report.graph.contains(other));
    assert_eq!(report.visited(), &[base]);
}

// ============================================================================
// Nested Links
// ============================================================================

#[test]
fn immediate_ancestor_wins_over_nested_link() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    // Gem <- (nested in) Ring <- RingGold. Ring recolors its gem; RingGold's
    // gem equals the original Gem material but not Ring's recolor.
    let gem_material = tinted("Gem", 0.1);
    let gem = store.insert(&prop("Gem", None, vec![gem_material])).unwrap();

    let mut ring = Hierarchy::for_asset(AssetId::from_name("Ring"), "Ring");
    let root = ring.root();
    let slot = ring.add_child(root, Node::new("Gem").with_template(gem));
    ring.add_child(slot, Node::new("Body").with_renderer(Renderer::with_materials([tinted("Ruby", 0.9)])));
    let ring_id = store.insert(&ring).unwrap();

    let mut gold = Hierarchy::for_asset(AssetId::from_name("RingGold"), "RingGold");
    let root = gold.root();
    gold.get_mut(root).unwrap().template = Some(ring_id);
    let slot = gold.add_child(root, Node::new("Gem").with_template(gem));
    gold.add_child(slot, Node::new("Body").with_renderer(Renderer::with_materials([tinted("GemCopy", 0.1)])));
    let gold_id = store.insert(&gold).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(gem).unwrap();
    assert_eq!(report.visited(), &[gem, ring_id, gold_id]);
    assert_eq!(report.changes_for(ring_id), Some(0));
    assert_eq!(report.changes_for(gold_id), Some(0));
}

#[test]
fn links_below_unlinked_root_are_walked() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let chair_material = tinted("Oak", 0.5);
    let chair = store.insert(&prop("Chair", None, vec![chair_material.clone()])).unwrap();

    let mut set = Hierarchy::for_asset(AssetId::from_name("DiningSet"), "DiningSet");
    let root = set.root();
    for side in ["North", "South"] {
        let seat = set.add_child(root, Node::new(side).with_template(chair));
        set.add_child(seat, Node::new("Body").with_renderer(Renderer::with_materials([tinted("OakCopy", 0.5)])));
    }
    let set_id = store.insert(&set).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(chair).unwrap();
    assert_eq!(report.changes_for(set_id), Some(2));

    let copy = store.load_template(set_id).unwrap();
    store.release_template(set_id);
    for &seat in copy.children(copy.root()) {
        let body = copy.children(seat)[0];
        let slot = copy.get(body).unwrap().renderers[0].slot(0).unwrap();
        assert!(MaterialRef::ptr_eq(slot, &chair_material));
    }
}

// ============================================================================
// Structural Mismatches
// ============================================================================

#[test]
fn slot_count_mismatch_warns_and_skips() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let base = store.insert(&prop("Table", None, vec![tinted("Top", 0.2)])).unwrap();
    let variant = store
        .insert(&prop("TableLong", Some(base), vec![tinted("Top2", 0.2), tinted("Leg", 0.7)]))
        .unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert_eq!(report.changes_for(variant), Some(0));
    assert!(matches!(
        report.warnings.as_slice(),
        [PassWarning::SlotCountMismatch {
            renderer: 0,
            instance: 2,
            ancestor: 1,
            ..
        }]
    ));
}

#[test]
fn extra_children_are_not_visited() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let base = store.insert(&prop("Shelf", None, vec![tinted("Wood", 0.6)])).unwrap();
    let mut variant = prop("ShelfWide", Some(base), vec![tinted("Wood2", 0.6)]);
    let root = variant.root();
    variant.add_child(root, Node::new("Extra").with_renderer(Renderer::with_materials([tinted("Wood3", 0.6)])));
    let variant = store.insert(&variant).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert_eq!(report.changes_for(variant), Some(1));
}

#[test]
fn renderer_count_mismatch_compares_common_prefix() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let base = store.insert(&prop("Sign", None, vec![tinted("Paint", 0.5)])).unwrap();
    let mut variant = prop("SignLit", Some(base), vec![tinted("Paint2", 0.5)]);
    let body = variant.children(variant.root())[0];
    variant
        .get_mut(body)
        .unwrap()
        .renderers
        .push(Renderer::with_materials([tinted("Glow", 1.0)]));
    let variant = store.insert(&variant).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(base).unwrap();
    assert_eq!(report.changes_for(variant), Some(1));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, PassWarning::RendererCountMismatch { instance: 2, ancestor: 1, .. })));
}

#[test]
fn missing_ancestor_is_a_warning() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let ghost = AssetId::from_name("Deleted");
    let orphan = store.insert(&prop("Orphan", Some(ghost), vec![tinted("M", 0.5)])).unwrap();

    let report = DependencyOptimizer::new(&store, &settings).optimize_from(orphan).unwrap();
    assert_eq!(report.total_changes(), 0);
    assert!(matches!(
        report.warnings.as_slice(),
        [PassWarning::MissingAncestor { template, .. }] if *template == ghost
    ));
}

// ============================================================================
// Invalid Input
// ============================================================================

#[test]
fn unknown_root_is_rejected_before_any_work() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();
    store.insert(&prop("Crate", None, vec![tinted("A", 1.0)])).unwrap();

    let err = DependencyOptimizer::new(&store, &settings)
        .optimize_from(AssetId::from_name("Nope"))
        .unwrap_err();
    assert!(matches!(err, PrismError::InvalidInput(_)));
    assert_eq!(store.stats().loads, 0);
    assert_eq!(store.stats().dependents_queries, 0);
}

#[test]
fn instance_without_link_is_not_derived() {
    let store = InMemoryTemplateStore::new();
    let settings = DedupSettings::default();

    let mut loose = Hierarchy::new("Loose");
    let root = loose.root();
    let mat = tinted("M", 0.5);
    let body = loose.add_child(root, Node::new("Body").with_renderer(Renderer::with_materials([mat.clone()])));

    let err = DependencyOptimizer::new(&store, &settings)
        .optimize_instance(&mut loose)
        .unwrap_err();
    assert!(matches!(err, PrismError::NotDerived(_)));
    let slot = loose.get(body).unwrap().renderers[0].slot(0).unwrap();
    assert!(MaterialRef::ptr_eq(slot, &mat));
}
