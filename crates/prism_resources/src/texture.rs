use std::sync::Arc;

use glam::Vec2;
use uuid::Uuid;

/// A texture asset as seen by the material system.
///
/// Only the *content identity* matters for fingerprinting: two texture objects
/// with the same `content_id` (e.g. the same source file GUID or pixel hash)
/// are treated as the same image.
#[derive(Debug)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: Option<String>,
    content_id: String,
}

impl Texture {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            content_id: content_id.into(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[inline]
    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    #[must_use]
    pub fn into_ref(self) -> TextureRef {
        Arc::new(self)
    }
}

/// Thread-safe shared texture reference.
pub type TextureRef = Arc<Texture>;

/// A texture bound to a material property, with its UV transform.
#[derive(Debug, Clone)]
pub struct TextureBinding {
    pub texture: Option<TextureRef>,
    /// UV scale
    pub tiling: Vec2,
    /// UV offset
    pub offset: Vec2,
}

impl TextureBinding {
    /// Binds `texture` with identity tiling and zero offset.
    #[must_use]
    pub fn new(texture: Option<TextureRef>) -> Self {
        Self {
            texture,
            tiling: Vec2::ONE,
            offset: Vec2::ZERO,
        }
    }

    #[must_use]
    pub fn with_tiling(mut self, tiling: Vec2) -> Self {
        self.tiling = tiling;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }
}

impl Default for TextureBinding {
    fn default() -> Self {
        Self::new(None)
    }
}
