use parking_lot::RwLock;
use prism_resources::MaterialRef;
use rustc_hash::FxHashMap;
use uuid::Uuid;

/// Thread-safe material registry keyed by material uuid.
///
/// Serialized documents only store material uuids. Resolving them through
/// the library hands back the *same* [`MaterialRef`] every time, which keeps
/// reference identity stable across template reloads.
#[derive(Default)]
pub struct MaterialLibrary {
    inner: RwLock<FxHashMap<Uuid, MaterialRef>>,
}

impl MaterialLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::default(),
        }
    }

    /// [Write] Registers a material. If its uuid is already known the
    /// existing reference is kept and returned.
    pub fn add(&self, material: impl Into<MaterialRef>) -> MaterialRef {
        let material = material.into();
        let mut guard = self.inner.write();
        guard.entry(material.uuid()).or_insert(material).clone()
    }

    /// [Read] Resolves a uuid.
    #[must_use]
    pub fn get(&self, uuid: &Uuid) -> Option<MaterialRef> {
        self.inner.read().get(uuid).cloned()
    }

    #[must_use]
    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.inner.read().contains_key(uuid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
