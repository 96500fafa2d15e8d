//! Foundational types shared by every Prism crate.
//!
//! - [`errors`]: the [`PrismError`] type and the crate-wide [`Result`] alias
//! - [`ids`]: stable asset identifiers
//! - [`settings`]: dedup pass configuration

pub mod errors;
pub mod ids;
pub mod settings;

pub use errors::{PrismError, Result};
pub use ids::AssetId;
pub use settings::DedupSettings;
