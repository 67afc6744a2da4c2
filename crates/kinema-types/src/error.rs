//! Error types for the Kinema engine.
//!
//! All crates return `KinemaResult<T>` from fallible operations.

use thiserror::Error;

use crate::ids::BodyId;

/// Unified error type for the Kinema engine.
#[derive(Debug, Error)]
pub enum KinemaError {
    /// The world already holds the configured maximum number of bodies.
    #[error("Body capacity exceeded (limit: {limit})")]
    CapacityExceeded { limit: usize },

    /// Shape data is malformed (too few points, non-convex, zero area).
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Configuration value is invalid or names an unknown strategy.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation referenced a body that does not exist.
    #[error("Unknown body: {0}")]
    UnknownBody(BodyId),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An internal invariant was violated (e.g. degenerate covariance).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, KinemaError>`.
pub type KinemaResult<T> = Result<T, KinemaError>;
