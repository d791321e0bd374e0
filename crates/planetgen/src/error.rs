//! Error type shared by every generator in the crate.

use thiserror::Error;

/// Failures that abort a regeneration pass.
#[derive(Debug, Error)]
pub enum PlanetError {
    /// Settings that would produce a degenerate mesh (zero radius, resolution < 2, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A worker produced a NaN or infinite vertex. The whole pass is discarded.
    #[error("non-finite vertex {index} on {mesh}")]
    NonFiniteVertex { mesh: &'static str, index: usize },

    /// Index buffer references a missing vertex or repeats a vertex within a triangle.
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),
}

impl PlanetError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PlanetError::InvalidConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PlanetError>;
