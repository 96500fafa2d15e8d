//! Template assets and their durable representation
//!
//! - [`MaterialLibrary`]: uuid-keyed registry resolving serialized material ids to shared references
//! - [`TemplateDocument`]: serializable form of a template hierarchy
//! - [`TemplateStore`]: the durable store interface passes read from and write to
//! - [`InMemoryTemplateStore`]: JSON-document backed store implementation
//! - [`bundle`]: dependency collection handed to the export step

pub mod bundle;
pub mod document;
pub mod library;
pub mod store;

pub use bundle::{BundleManifest, collect_bundle};
pub use document::{DocumentNode, OverrideRecord, TemplateDocument};
pub use library::MaterialLibrary;
pub use store::{InMemoryTemplateStore, StoreStats, TemplateStore};
