//! Dedup Pass Settings
//!
//! [`DedupSettings`] is consumed by every optimization pass and by the
//! trigger policy. It can be built in code or loaded from a JSON file shipped
//! with the editor integration.
//!
//! ```rust,ignore
//! use prism_core::DedupSettings;
//!
//! let settings = DedupSettings {
//!     debounce_ms: 250,
//!     ..Default::default()
//! };
//!
//! let from_disk = DedupSettings::from_json_str(r#"{ "rollback_on_failure": false }"#)?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Configuration shared by optimization passes.
///
/// | Field                   | Description                                        | Default |
/// |-------------------------|----------------------------------------------------|---------|
/// | `rollback_on_failure`   | Restore the instance snapshot when a commit fails  | `true`  |
/// | `persist_overrides`     | Write each accepted slot override to the store     | `true`  |
/// | `debounce_ms`           | Quiet period before a structural change triggers   | `500`   |
/// | `use_fingerprint_cache` | Memoize fingerprints across the pass               | `true`  |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub rollback_on_failure: bool,
    pub persist_overrides: bool,
    pub debounce_ms: u64,
    pub use_fingerprint_cache: bool,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            persist_overrides: true,
            debounce_ms: 500,
            use_fingerprint_cache: true,
        }
    }
}

impl DedupSettings {
    /// Parses settings from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = DedupSettings::from_json_str(r#"{ "debounce_ms": 40 }"#).unwrap();
        assert_eq!(settings.debounce_ms, 40);
        assert!(settings.rollback_on_failure);
        assert!(settings.persist_overrides);
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let settings = DedupSettings {
            rollback_on_failure: false,
            ..Default::default()
        };
        let json = settings.to_json_string().unwrap();
        assert_eq!(DedupSettings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(DedupSettings::from_json_str("{ nope").is_err());
    }
}
