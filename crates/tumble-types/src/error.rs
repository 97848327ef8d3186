//! Error types and the severe-error sink.

use thiserror::Error;

/// Errors that can occur while building or mutating a world.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TumbleError {
    /// A fixed-capacity arena is full.
    #[error("capacity exceeded: {what} is limited to {capacity}")]
    CapacityExceeded {
        /// Which arena overflowed.
        what: &'static str,
        /// The fixed capacity of that arena.
        capacity: usize,
    },

    /// A body index does not refer to a live body.
    #[error("invalid body id: {0}")]
    InvalidBodyId(usize),

    /// A geometry index does not refer to a live geometry.
    #[error("invalid geometry id: {0}")]
    InvalidGeometryId(usize),

    /// The operation requires a rigid body but the geometry is scenery.
    #[error("geometry {0} is scenery and has no rigid body")]
    SceneryHasNoBody(usize),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl TumbleError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Short identifier for the severe-error sink.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "tumble:capacity",
            Self::InvalidBodyId(_) => "tumble:badBodyId",
            Self::InvalidGeometryId(_) => "tumble:badGeometryId",
            Self::SceneryHasNoBody(_) => "tumble:scenery",
            Self::InvalidConfig { .. } => "tumble:badConfig",
        }
    }
}

/// Convenience result alias for fallible world operations.
pub type Result<T> = std::result::Result<T, TumbleError>;

/// Sink for unrecoverable misuse reports.
///
/// The embedder installs one on the world; the core invokes it with a stable
/// identifier and a human-readable message before the offending call returns
/// an error. A plain function pointer keeps the world cheap to clone and
/// debuggable.
pub type SevereErrorSink = fn(id: &str, message: &str);

/// Default severe-error sink: logs through `tracing` at error level.
pub fn log_severe_error(id: &str, message: &str) {
    tracing::error!(target: "tumble", "severe error [{id}]: {message}");
}
