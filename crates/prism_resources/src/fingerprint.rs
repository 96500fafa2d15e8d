//! Material Fingerprinting
//!
//! A [`MaterialFingerprint`] is a 128-bit digest of everything that affects
//! how a material looks: shader identity, the typed values of every declared
//! shader property, texture content identity with tiling/offset, and the set
//! of enabled keywords. Two materials with equal fingerprints can replace each
//! other in any material slot without a visible difference.
//!
//! # Canonical form
//!
//! The digest is taken over a canonical string:
//!
//! ```text
//! shader:Standard;_Color:color<1.000000,0.500000,0.000000,1.000000>;_Glossiness:float<0.250000>;#_EMISSION;
//! ```
//!
//! - Properties come from the shader's declaration table, sorted by name.
//!   Values that are absent, missing or of the wrong kind are skipped.
//! - Floats use exactly [`FLOAT_PRECISION`] decimals, so formatting never
//!   drifts between platforms. Negative zero prints as zero.
//! - Keywords are sorted and appended as `#KEYWORD;`.
//! - Separator characters inside shader names, property names, keywords and
//!   texture content ids are backslash-escaped.
//!
//! Nothing identity-related (uuid, name, allocation, version) takes part.

use std::fmt::{self, Write};

use glam::{Vec2, Vec4};
use xxhash_rust::xxh3::xxh3_128;

use crate::material::{Material, PropertyValue};
use crate::shader::PropertyDecl;
use crate::texture::TextureBinding;

/// Number of decimals used when formatting floats.
pub const FLOAT_PRECISION: usize = 6;

/// Opaque, totally ordered digest of a material's visual state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialFingerprint([u8; 16]);

impl MaterialFingerprint {
    /// Sentinel for materials without a shader.
    pub const EMPTY: Self = Self([0; 16]);

    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Lowercase hex rendering (32 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MaterialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for MaterialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaterialFingerprint({self})")
    }
}

/// Computes the fingerprint of `material`. Pure and total.
#[must_use]
pub fn fingerprint(material: &Material) -> MaterialFingerprint {
    match canonical_state(material) {
        Some(canonical) => MaterialFingerprint(xxh3_128(canonical.as_bytes()).to_be_bytes()),
        None => MaterialFingerprint::EMPTY,
    }
}

/// Builds the canonical state string that [`fingerprint`] digests.
///
/// Returns `None` when the material has no shader.
#[must_use]
pub fn canonical_state(material: &Material) -> Option<String> {
    let shader = material.shader()?;

    let mut out = String::with_capacity(64 + shader.properties().len() * 32);
    out.push_str("shader:");
    push_escaped(&mut out, shader.name());
    out.push(';');

    let mut declared: Vec<&PropertyDecl> = Vec::with_capacity(shader.properties().len());
    for decl in shader.properties() {
        if !declared.iter().any(|seen| seen.name == decl.name) {
            declared.push(decl);
        }
    }
    declared.sort_by(|a, b| a.name.cmp(&b.name));

    for decl in declared {
        let Some(value) = material.get(&decl.name) else {
            continue;
        };
        if value.kind() != Some(decl.kind) {
            if value.kind().is_some() {
                log::trace!(
                    "Skipping '{}' on {}: declared {:?}, stored {:?}",
                    decl.name,
                    material.uuid(),
                    decl.kind,
                    value.kind()
                );
            }
            continue;
        }

        push_escaped(&mut out, &decl.name);
        out.push(':');
        out.push_str(decl.kind.tag());
        out.push('<');
        push_value(&mut out, value);
        out.push_str(">;");
    }

    let mut keywords: Vec<&str> = material.keywords().collect();
    keywords.sort_unstable();
    for keyword in keywords {
        out.push('#');
        push_escaped(&mut out, keyword);
        out.push(';');
    }

    Some(out)
}

/// Appends free-form text, backslash-escaping every separator so that no
/// name, keyword or content id can forge the structure around it.
fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        if matches!(c, '\\' | ';' | ':' | '#' | '<' | '>' | '|' | ',') {
            out.push('\\');
        }
        out.push(c);
    }
}

fn push_value(out: &mut String, value: &PropertyValue) {
    match value {
        PropertyValue::Color(v) | PropertyValue::Vector(v) => push_vec4(out, *v),
        PropertyValue::Float(v) => push_float(out, *v),
        PropertyValue::Int(v) => {
            let _ = write!(out, "{v}");
        }
        PropertyValue::Texture(binding) => push_texture(out, binding),
        PropertyValue::Absent => {}
    }
}

fn push_texture(out: &mut String, binding: &TextureBinding) {
    match &binding.texture {
        Some(texture) => push_escaped(out, texture.content_id()),
        None => out.push_str("none"),
    }
    out.push('|');
    push_vec2(out, binding.tiling);
    out.push(',');
    push_vec2(out, binding.offset);
}

fn push_vec4(out: &mut String, v: Vec4) {
    for (i, component) in v.to_array().into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_float(out, component);
    }
}

fn push_vec2(out: &mut String, v: Vec2) {
    push_float(out, v.x);
    out.push(',');
    push_float(out, v.y);
}

fn push_float(out: &mut String, value: f32) {
    let start = out.len();
    let _ = write!(out, "{:.*}", FLOAT_PRECISION, value);

    // "-0.000000" and "0.000000" must hash the same.
    let written = &out[start..];
    if let Some(magnitude) = written.strip_prefix('-')
        && magnitude.bytes().all(|b| b == b'0' || b == b'.')
    {
        out.remove(start);
    }
}
