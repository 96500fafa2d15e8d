//! # Prism
//!
//! Template/instance material deduplication for hierarchical scene assets.
//!
//! Instances and variants of a template often end up holding private copies
//! of materials that are visually identical to the template's own. Prism
//! finds those copies by fingerprinting material state and repoints the
//! slots at the ancestor's shared material, recording each change as an
//! override so it survives reloads.
//!
//! ## Crates
//!
//! - [`core`]: error type, asset ids and settings
//! - [`resources`]: shaders, materials, textures and fingerprints
//! - [`scene`]: node hierarchies, paths and slot snapshots
//! - [`assets`]: template documents and the template store
//! - [`dedup`]: the passes themselves
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use prism::prelude::*;
//!
//! let store = InMemoryTemplateStore::new();
//! let settings = DedupSettings::default();
//! let report = DependencyOptimizer::new(&store, &settings).optimize_from(root)?;
//! println!("{} slot(s) deduplicated", report.total_changes());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub use prism_assets as assets;
pub use prism_core as core;
pub use prism_dedup as dedup;
pub use prism_resources as resources;
pub use prism_scene as scene;

pub use prism_core::{AssetId, DedupSettings, PrismError, Result};

pub mod prelude {
    pub use prism_assets::{BundleManifest, InMemoryTemplateStore, TemplateStore, collect_bundle};
    pub use prism_core::{AssetId, DedupSettings, PrismError, Result};
    pub use prism_dedup::{DependencyOptimizer, PassReport, PassWarning, TriggerPolicy};
    pub use prism_resources::{
        FingerprintCache, Material, MaterialFingerprint, MaterialRef, PropertyKind, ShaderDescriptor, ShaderRef,
        Texture, fingerprint,
    };
    pub use prism_scene::{Hierarchy, Node, NodeHandle, NodePath, Renderer, Snapshot};
}
