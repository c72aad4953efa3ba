//! Error types for the stream harness.

use driftgen_core::{DriftError, ModelError};
use thiserror::Error;

/// Errors raised while configuring or constructing a stream generator.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StreamError {
    /// The majority fraction of an imbalanced stream must exceed one half.
    #[error("percent_majority must lie in [0.51, 1.0) (got {got})")]
    InvalidMajorityFraction {
        /// The invalid fraction supplied by the caller.
        got: f64,
    },
    /// The drift magnitude of a drifting stream is capped below extreme
    /// distances the search cannot reliably reach.
    #[error("drift magnitude must lie in (0, 0.9] (got {got})")]
    InvalidDriftMagnitude {
        /// The invalid magnitude supplied by the caller.
        got: f64,
    },
    /// The underlying mixture engine rejected the configuration.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The drift search failed or rejected its configuration.
    #[error(transparent)]
    Drift(#[from] DriftError),
}

impl StreamError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> StreamErrorCode {
        match self {
            Self::InvalidMajorityFraction { .. } => StreamErrorCode::InvalidMajorityFraction,
            Self::InvalidDriftMagnitude { .. } => StreamErrorCode::InvalidDriftMagnitude,
            Self::Model(_) => StreamErrorCode::Model,
            Self::Drift(_) => StreamErrorCode::Drift,
        }
    }
}

/// Machine-readable error codes for [`StreamError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StreamErrorCode {
    /// The majority fraction was outside `[0.51, 1.0)`.
    InvalidMajorityFraction,
    /// The drift magnitude was outside `(0, 0.9]`.
    InvalidDriftMagnitude,
    /// The underlying mixture engine rejected the configuration.
    Model,
    /// The drift search failed or rejected its configuration.
    Drift,
}

impl StreamErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidMajorityFraction => "STREAM_INVALID_MAJORITY_FRACTION",
            Self::InvalidDriftMagnitude => "STREAM_INVALID_DRIFT_MAGNITUDE",
            Self::Model => "STREAM_MODEL",
            Self::Drift => "STREAM_DRIFT",
        }
    }
}
