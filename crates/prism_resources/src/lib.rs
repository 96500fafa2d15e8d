//! Material system resources
//!
//! - [`ShaderDescriptor`]: declared property table of a shader
//! - [`Material`] / [`MaterialRef`]: typed material state and shared references to it
//! - [`Texture`] / [`TextureBinding`]: texture identity plus tiling/offset
//! - [`fingerprint`]: canonical hashing of a material's visual state
//! - [`FingerprintCache`]: explicit, caller-owned memoization of fingerprints

pub mod cache;
pub mod fingerprint;
pub mod material;
pub mod material_builder;
pub mod shader;
pub mod texture;

pub use cache::{CacheStats, FingerprintCache};
pub use fingerprint::{MaterialFingerprint, canonical_state, fingerprint};
pub use material::{Material, MaterialRef, PropertyValue};
pub use material_builder::MaterialBuilder;
pub use shader::{PropertyDecl, PropertyKind, ShaderDescriptor, ShaderRef};
pub use texture::{Texture, TextureBinding, TextureRef};
