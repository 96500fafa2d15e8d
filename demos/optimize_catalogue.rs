//! Optimize Catalogue Demo
//!
//! Builds a small prop catalogue in an in-memory store, with variants that
//! carry private copies of their base's materials, then runs a pass from the
//! base template and prints what changed and what the export bundle holds.
//!
//! Run with `RUST_LOG=debug cargo run --example optimize_catalogue` to see
//! per-template progress.

use glam::Vec4;
use prism::prelude::*;

fn paint(shader: &ShaderRef, name: &str, color: Vec4) -> MaterialRef {
    Material::builder(shader.clone())
        .name(name)
        .color("_BaseColor", color)
        .float("_Smoothness", 0.4)
        .build_ref()
}

fn crate_template(name: &str, link: Option<AssetId>, planks: MaterialRef, bands: MaterialRef) -> Hierarchy {
    let mut h = Hierarchy::for_asset(AssetId::from_name(name), name);
    let root = h.root();
    if let Some(node) = h.get_mut(root) {
        node.template = link;
    }
    h.add_child(root, Node::new("Planks").with_renderer(Renderer::with_materials([planks])));
    h.add_child(root, Node::new("Bands").with_renderer(Renderer::with_materials([bands])));
    h
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let shader = ShaderDescriptor::new("Lit")
        .with_property("_BaseColor", PropertyKind::Color)
        .with_property("_Smoothness", PropertyKind::Float)
        .into_ref();
    let oak = Vec4::new(0.55, 0.4, 0.25, 1.0);
    let iron = Vec4::new(0.3, 0.3, 0.32, 1.0);
    let rust = Vec4::new(0.5, 0.25, 0.1, 1.0);

    let store = InMemoryTemplateStore::new();
    let base = store.insert(&crate_template(
        "Crate",
        None,
        paint(&shader, "Oak", oak),
        paint(&shader, "Iron", iron),
    ))?;
    let rusty = store.insert(&crate_template(
        "CrateRusty",
        Some(base),
        paint(&shader, "Oak (Copy)", oak),
        paint(&shader, "Rust", rust),
    ))?;
    store.insert(&crate_template(
        "CrateRustySmall",
        Some(rusty),
        paint(&shader, "Oak (Copy 2)", oak),
        paint(&shader, "Rust (Copy)", rust),
    ))?;

    let settings = DedupSettings::default();
    let policy = TriggerPolicy::new(&settings);
    let optimizer = DependencyOptimizer::new(&store, &settings);

    policy.request_manual(base);
    if let Some(root) = policy.poll(std::time::Instant::now()) {
        let report = policy.run_pass(root, |r| optimizer.optimize_from(r))?;
        for tree in &report.trees {
            println!("{:<18} {} change(s)", tree.name, tree.changes);
        }
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        println!("total: {} slot(s) deduplicated", report.total_changes());
    }

    let manifest = collect_bundle(&store, rusty)?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}
