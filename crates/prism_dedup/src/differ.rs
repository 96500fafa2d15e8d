//! Slot-array comparison.

use prism_resources::{FingerprintCache, MaterialRef};
use smallvec::SmallVec;

/// Result of comparing an instance's slot array with its ancestor's.
#[derive(Debug, Default)]
pub struct SlotDiff {
    /// `(slot index, ancestor material)` pairs to repoint.
    pub replacements: SmallVec<[(usize, MaterialRef); 4]>,
    /// `(instance len, ancestor len)` when the arrays could not be aligned.
    pub mismatch: Option<(usize, usize)>,
}

impl SlotDiff {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.replacements.is_empty()
    }
}

/// Compares slot arrays by material fingerprint.
pub struct SlotDiffer<'a> {
    cache: &'a FingerprintCache,
}

impl<'a> SlotDiffer<'a> {
    #[must_use]
    pub fn new(cache: &'a FingerprintCache) -> Self {
        Self { cache }
    }

    /// Finds instance slots holding a duplicate of the ancestor's material.
    ///
    /// Slots are paired by index. Empty slots and slots already sharing the
    /// ancestor's reference are skipped. Arrays of different length produce
    /// no replacements at all.
    #[must_use]
    pub fn diff(&self, instance: &[Option<MaterialRef>], ancestor: &[Option<MaterialRef>]) -> SlotDiff {
        if instance.len() != ancestor.len() {
            log::warn!(
                "Slot count mismatch: instance has {}, ancestor has {}",
                instance.len(),
                ancestor.len()
            );
            return SlotDiff {
                replacements: SmallVec::new(),
                mismatch: Some((instance.len(), ancestor.len())),
            };
        }

        let mut replacements = SmallVec::new();
        for (index, (mine, theirs)) in instance.iter().zip(ancestor).enumerate() {
            let (Some(mine), Some(theirs)) = (mine, theirs) else {
                continue;
            };
            if MaterialRef::ptr_eq(mine, theirs) {
                continue;
            }
            if self.cache.get_or_compute(mine) == self.cache.get_or_compute(theirs) {
                log::trace!("Slot {index}: {} duplicates {}", mine.label(), theirs.label());
                replacements.push((index, theirs.clone()));
            }
        }

        SlotDiff {
            replacements,
            mismatch: None,
        }
    }
}
