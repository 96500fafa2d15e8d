//! Error Types
//!
//! This module defines the error types used throughout the dedup toolkit.
//!
//! # Overview
//!
//! The main error type [`PrismError`] covers every failure mode a pass can
//! surface to its caller:
//! - Invalid input (unknown root asset, instance with no ancestor)
//! - Durable store reads and writes
//! - Snapshot restore misuse
//! - Pass scheduling conflicts
//!
//! Structural mismatches (slot-count divergence, missing ancestors) are *not*
//! errors. They are collected as warnings in the pass report.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism_core::errors::{PrismError, Result};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;
use uuid::Uuid;

use crate::ids::AssetId;

/// The main error type for Prism.
#[derive(Error, Debug)]
pub enum PrismError {
    // ========================================================================
    // Invalid Input
    // ========================================================================
    /// The pass was started with input it cannot work on.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The hierarchy handed to an instance pass links to no template.
    #[error("Hierarchy '{0}' is not derived from any template")]
    NotDerived(String),

    // ========================================================================
    // Durable Store Errors
    // ========================================================================
    /// The requested template asset was not found in the store.
    #[error("Template not found: {0}")]
    TemplateNotFound(AssetId),

    /// A stored template document references something that does not exist.
    #[error("Corrupt template document {asset}: {reason}")]
    CorruptDocument {
        /// Template whose document failed to load
        asset: AssetId,
        /// What was wrong with it
        reason: String,
    },

    /// The store rejected a write.
    #[error("Durable write failed for {owner}: {reason}")]
    StoreWrite {
        /// Hierarchy the write belonged to
        owner: Uuid,
        /// Store-provided failure description
        reason: String,
    },

    /// Committing a replacement plan failed after the in-memory slot update.
    #[error("Commit failed at node '{path}': {source}")]
    CommitFailed {
        /// Structural path of the node being committed
        path: String,
        /// Underlying store failure
        #[source]
        source: Box<PrismError>,
    },

    // ========================================================================
    // Snapshot & Scheduling Errors
    // ========================================================================
    /// A snapshot was restored onto a hierarchy it was not captured from.
    #[error("Snapshot captured from {expected} cannot be restored onto {found}")]
    SnapshotMismatch {
        /// Hierarchy the snapshot belongs to
        expected: Uuid,
        /// Hierarchy it was restored onto
        found: Uuid,
    },

    /// A pass was requested while another pass is still running.
    #[error("An optimization pass is already in progress")]
    PassInProgress,

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PrismError {
    /// Returns `true` for failures raised by the durable store write path.
    #[must_use]
    pub fn is_durable_write(&self) -> bool {
        match self {
            Self::StoreWrite { .. } => true,
            Self::CommitFailed { source, .. } => source.is_durable_write(),
            _ => false,
        }
    }
}

/// Alias for `Result<T, PrismError>`.
pub type Result<T> = std::result::Result<T, PrismError>;
