//! Shader property declarations.
//!
//! A material's state is only meaningful relative to the shader that reads it.
//! [`ShaderDescriptor`] is the explicit property table filled in when a shader
//! is loaded: each entry names a property and tags the kind of value the
//! shader expects for it. Fingerprinting walks this table instead of
//! introspecting material fields at runtime.

use std::sync::Arc;

/// Type tag of a declared shader property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Color,
    Vector,
    Float,
    Int,
    Texture,
}

impl PropertyKind {
    /// Tag emitted into the canonical fingerprint string.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Vector => "vector",
            Self::Float => "float",
            Self::Int => "int",
            Self::Texture => "texture",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub kind: PropertyKind,
}

/// Declared interface of a shader, in declaration order.
#[derive(Clone, Debug)]
pub struct ShaderDescriptor {
    name: String,
    properties: Vec<PropertyDecl>,
}

impl ShaderDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Appends a property declaration.
    #[must_use]
    pub fn with_property(mut self, name: &str, kind: PropertyKind) -> Self {
        self.properties.push(PropertyDecl {
            name: name.to_string(),
            kind,
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in shader order.
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[PropertyDecl] {
        &self.properties
    }

    #[must_use]
    pub fn into_ref(self) -> ShaderRef {
        Arc::new(self)
    }
}

/// Thread-safe shared shader reference.
pub type ShaderRef = Arc<ShaderDescriptor>;
