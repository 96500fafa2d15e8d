//! Fingerprint Tests
//!
//! Tests for:
//! - Determinism: same state, same fingerprint, across separate allocations
//! - Soundness: property and keyword insertion order are irrelevant
//! - Sensitivity: a single differing scalar, keyword or texture changes the digest
//! - Canonical form: undeclared and mistyped values, no-shader sentinel
//! - FingerprintCache: hits, misses, version invalidation, clearing

use glam::{Vec2, Vec4};
use prism::resources::{
    FingerprintCache, Material, MaterialFingerprint, PropertyKind, ShaderDescriptor, ShaderRef, Texture,
    canonical_state, fingerprint,
};

fn lit() -> ShaderRef {
    ShaderDescriptor::new("Lit")
        .with_property("_BaseColor", PropertyKind::Color)
        .with_property("_BaseMap", PropertyKind::Texture)
        .with_property("_Smoothness", PropertyKind::Float)
        .with_property("_QueueOffset", PropertyKind::Int)
        .into_ref()
}

fn painted(r: f32, smoothness: f32) -> Material {
    Material::builder(lit())
        .color("_BaseColor", Vec4::new(r, 0.5, 0.25, 1.0))
        .float("_Smoothness", smoothness)
        .int("_QueueOffset", 0)
        .keyword("_NORMALMAP")
        .build()
}

// ============================================================================
// Determinism & Soundness
// ============================================================================

#[test]
fn fingerprint_is_deterministic() {
    let a = painted(1.0, 0.5);
    assert_eq!(fingerprint(&a), fingerprint(&a));
    assert_eq!(fingerprint(&a).to_hex(), fingerprint(&a).to_hex());
}

#[test]
fn equal_state_in_separate_materials_matches() {
    let a = painted(1.0, 0.5);
    let b = painted(1.0, 0.5);
    assert_ne!(a.uuid(), b.uuid());
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn names_do_not_take_part() {
    let mut a = painted(1.0, 0.5);
    let b = painted(1.0, 0.5);
    a.name = Some("Crate_Red (Copy)".to_string());
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn insertion_order_is_irrelevant() {
    let forward = Material::builder(lit())
        .color("_BaseColor", Vec4::ONE)
        .float("_Smoothness", 0.3)
        .keyword("A_KW")
        .keyword("B_KW")
        .build();
    let backward = Material::builder(lit())
        .keyword("B_KW")
        .float("_Smoothness", 0.3)
        .keyword("A_KW")
        .color("_BaseColor", Vec4::ONE)
        .build();
    assert_eq!(fingerprint(&forward), fingerprint(&backward));
}

#[test]
fn declaration_order_is_irrelevant() {
    let ab = ShaderDescriptor::new("Lit")
        .with_property("_A", PropertyKind::Float)
        .with_property("_B", PropertyKind::Float)
        .into_ref();
    let ba = ShaderDescriptor::new("Lit")
        .with_property("_B", PropertyKind::Float)
        .with_property("_A", PropertyKind::Float)
        .into_ref();

    let x = Material::builder(ab).float("_A", 1.0).float("_B", 2.0).build();
    let y = Material::builder(ba).float("_A", 1.0).float("_B", 2.0).build();
    assert_eq!(fingerprint(&x), fingerprint(&y));
}

#[test]
fn negative_zero_matches_zero() {
    let a = painted(0.0, 0.0);
    let b = painted(-0.0, -0.0);
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

// ============================================================================
// Sensitivity
// ============================================================================

#[test]
fn single_scalar_difference_changes_fingerprint() {
    let a = painted(1.0, 0.5);
    let b = painted(1.0, 0.51);
    assert_ne!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn keyword_difference_changes_fingerprint() {
    let a = painted(1.0, 0.5);
    let mut b = painted(1.0, 0.5);
    b.enable_keyword("_EMISSION");
    assert_ne!(fingerprint(&a), fingerprint(&b));

    b.disable_keyword("_EMISSION");
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn shader_identity_takes_part() {
    let other = ShaderDescriptor::new("Unlit")
        .with_property("_BaseColor", PropertyKind::Color)
        .into_ref();
    let a = Material::builder(lit()).color("_BaseColor", Vec4::ONE).build();
    let b = Material::builder(other).color("_BaseColor", Vec4::ONE).build();
    assert_ne!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn texture_identity_is_by_content() {
    let rust = Texture::new("textures/rust_albedo.png").into_ref();
    let rust_again = Texture::new("textures/rust_albedo.png").with_name("Rust").into_ref();
    let moss = Texture::new("textures/moss_albedo.png").into_ref();

    let a = Material::builder(lit()).texture("_BaseMap", rust, Vec2::ONE, Vec2::ZERO).build();
    let b = Material::builder(lit()).texture("_BaseMap", rust_again.clone(), Vec2::ONE, Vec2::ZERO).build();
    let c = Material::builder(lit()).texture("_BaseMap", moss, Vec2::ONE, Vec2::ZERO).build();
    let tiled = Material::builder(lit())
        .texture("_BaseMap", rust_again, Vec2::splat(2.0), Vec2::ZERO)
        .build();

    assert_eq!(fingerprint(&a), fingerprint(&b));
    assert_ne!(fingerprint(&a), fingerprint(&c));
    assert_ne!(fingerprint(&a), fingerprint(&tiled));
}

// ============================================================================
// Canonical Form
// ============================================================================

#[test]
fn undeclared_and_mistyped_values_are_ignored() {
    let base = Material::builder(lit()).float("_Smoothness", 0.5).build();
    let noisy = Material::builder(lit())
        .float("_Smoothness", 0.5)
        .float("_NotDeclared", 9.0)
        .float("_BaseColor", 1.0)
        .absent("_QueueOffset")
        .build();
    assert_eq!(canonical_state(&base), canonical_state(&noisy));
    assert_eq!(fingerprint(&base), fingerprint(&noisy));
}

#[test]
fn shaderless_material_is_empty_sentinel() {
    let a = Material::without_shader();
    assert!(canonical_state(&a).is_none());
    assert_eq!(fingerprint(&a), MaterialFingerprint::EMPTY);
    assert!(fingerprint(&a).is_empty());
    assert!(!fingerprint(&painted(1.0, 0.5)).is_empty());
}

#[test]
fn hex_rendering_is_lowercase_32_chars() {
    let hex = fingerprint(&painted(1.0, 0.5)).to_hex();
    assert_eq!(hex.len(), 32);
    assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

// ============================================================================
// FingerprintCache
// ============================================================================

#[test]
fn cache_hits_on_unchanged_material() {
    let cache = FingerprintCache::new();
    let mat = painted(1.0, 0.5);

    let first = cache.get_or_compute(&mat);
    let second = cache.get_or_compute(&mat);
    assert_eq!(first, second);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn cache_recomputes_after_edit() {
    let cache = FingerprintCache::new();
    let mut mat = painted(1.0, 0.5);
    let before = cache.get_or_compute(&mat);

    mat.set_float("_Smoothness", 0.9);
    let after = cache.get_or_compute(&mat);
    assert_ne!(before, after);
    assert_eq!(after, fingerprint(&mat));
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn cache_clear_is_deterministic() {
    let cache = FingerprintCache::new();
    cache.get_or_compute(&painted(1.0, 0.5));
    cache.get_or_compute(&painted(0.0, 0.5));
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits + cache.stats().misses, 0);
}

#[test]
fn disabled_cache_never_stores() {
    let cache = FingerprintCache::disabled();
    let mat = painted(1.0, 0.5);
    assert_eq!(cache.get_or_compute(&mat), fingerprint(&mat));
    assert_eq!(cache.get_or_compute(&mat), fingerprint(&mat));
    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits, 0);
}
