//! # Rig Error Types
//!
//! Errors that abort a generation step. Per-voxel and per-bone anomalies
//! are not errors: they are logged and collected in reports instead.

use thiserror::Error;

/// Errors that can occur while building or configuring a rig.
#[derive(Error, Debug)]
pub enum RigError {
    /// The generated joint list does not line up with the canonical bone list.
    ///
    /// Bind poses and weight indices are index-aligned with the canonical
    /// list, so continuing would silently corrupt the mesh.
    #[error("structural mismatch: expected {expected} joints, got {actual}")]
    StructuralMismatch {
        /// Length of the canonical bone list.
        expected: usize,
        /// Length of the joint list that was produced.
        actual: usize,
    },

    /// A canonical bone name could not be parsed.
    #[error("unknown canonical bone: {0}")]
    UnknownBone(String),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rig operations.
pub type RigResult<T> = Result<T, RigError>;
