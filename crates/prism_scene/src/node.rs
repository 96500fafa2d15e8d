use bitflags::bitflags;
use prism_core::AssetId;
use prism_resources::MaterialRef;
use smallvec::SmallVec;

use crate::NodeHandle;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        /// Slots changed since the hierarchy was last persisted.
        const DIRTY         = 1 << 0;
        /// The node carries at least one recorded slot override.
        const HAS_OVERRIDES = 1 << 1;
    }
}

/// A renderable surface: an ordered array of material slots.
///
/// `None` is a null slot (no material bound).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renderer {
    pub slots: Vec<Option<MaterialRef>>,
}

impl Renderer {
    #[must_use]
    pub fn new(slots: Vec<Option<MaterialRef>>) -> Self {
        Self { slots }
    }

    /// A renderer whose slots are all bound.
    pub fn with_materials(materials: impl IntoIterator<Item = MaterialRef>) -> Self {
        Self {
            slots: materials.into_iter().map(Some).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&MaterialRef> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Instance-level record that a slot deliberately points somewhere other than
/// the template's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOverride {
    pub renderer: usize,
    pub slot: usize,
    pub material: MaterialRef,
}

/// A hierarchy node.
///
/// # Hierarchy
///
/// - `parent`: handle of the parent node (`None` for the root)
/// - `children`: ordered child handles; order is significant, since template
///   alignment is positional
///
/// # Template link
///
/// `template` is set when this node's subtree was instantiated from another
/// template asset (a variant root or a nested instance). That template is the
/// node's *immediate ancestor* for deduplication.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    pub renderers: SmallVec<[Renderer; 1]>,
    pub template: Option<AssetId>,
    pub(crate) overrides: Vec<SlotOverride>,
    pub(crate) flags: NodeFlags,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            renderers: SmallVec::new(),
            template: None,
            overrides: Vec::new(),
            flags: NodeFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderers.push(renderer);
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: AssetId) -> Self {
        self.template = Some(template);
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        !self.renderers.is_empty()
    }

    /// Slot array of the `renderer`-th renderer.
    #[must_use]
    pub fn slots(&self, renderer: usize) -> Option<&[Option<MaterialRef>]> {
        self.renderers.get(renderer).map(|r| r.slots.as_slice())
    }

    /// Writes a slot. Returns `false` when the renderer or slot does not exist.
    pub fn set_slot(&mut self, renderer: usize, slot: usize, material: Option<MaterialRef>) -> bool {
        match self.renderers.get_mut(renderer).and_then(|r| r.slots.get_mut(slot)) {
            Some(target) => {
                *target = material;
                true
            }
            None => false,
        }
    }

    // --- Overrides ---

    #[inline]
    #[must_use]
    pub fn overrides(&self) -> &[SlotOverride] {
        &self.overrides
    }

    /// Records an override, replacing an earlier one for the same slot.
    pub fn record_override(&mut self, record: SlotOverride) {
        match self
            .overrides
            .iter_mut()
            .find(|o| o.renderer == record.renderer && o.slot == record.slot)
        {
            Some(existing) => *existing = record,
            None => self.overrides.push(record),
        }
        self.flags.insert(NodeFlags::HAS_OVERRIDES);
    }

    pub(crate) fn set_overrides(&mut self, overrides: Vec<SlotOverride>) {
        self.flags.set(NodeFlags::HAS_OVERRIDES, !overrides.is_empty());
        self.overrides = overrides;
    }

    // --- Flags ---

    #[inline]
    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.flags.insert(NodeFlags::DIRTY);
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.flags.remove(NodeFlags::DIRTY);
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(NodeFlags::DIRTY)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("Node")
    }
}
