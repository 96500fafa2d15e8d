use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for name-derived asset ids (see [`AssetId::from_name`]).
const ASSET_NAMESPACE: Uuid = Uuid::from_u128(0x6a0f_3c1e_52d4_4b8e_9a71_2f0c_d1e8_b3a5);

/// Stable identifier of a template asset in the durable store.
///
/// Unlike node handles, which only live as long as a loaded hierarchy, an
/// `AssetId` survives reloads and is what the dependency graph is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Creates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives a deterministic id from an asset path or name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&ASSET_NAMESPACE, name.as_bytes()))
    }

    #[inline]
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl From<Uuid> for AssetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
