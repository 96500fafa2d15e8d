use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a node by sibling position, starting at the hierarchy root.
///
/// `[]` is the root, `[0, 2]` is the third child of the root's first child.
/// Template-derived hierarchies are aligned by position, so a path stays
/// meaningful across reloads of the same asset where node handles do not.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<u32>);

impl NodePath {
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn from_indices(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    /// Path of the `index`-th child of this node.
    #[must_use]
    pub fn child(&self, index: u32) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}
