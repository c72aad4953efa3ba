//! Error types for the driftgen core library.
//!
//! Each concern exposes its own error enum alongside a stable machine-readable
//! code enum for logging and metrics surfaces.

use thiserror::Error;

/// Errors raised while constructing or mutating a [`crate::MixtureModel`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    /// A mixture needs at least one component.
    #[error("num_components must be at least 1 (got {got})")]
    InvalidComponentCount {
        /// The invalid component count supplied by the caller.
        got: usize,
    },
    /// A mixture needs at least one dimension.
    #[error("dimensions must be at least 1 (got {got})")]
    InvalidDimensions {
        /// The invalid dimensionality supplied by the caller.
        got: usize,
    },
    /// The range scale must be a positive finite value.
    #[error("range_scale must be positive and finite (got {got})")]
    InvalidRangeScale {
        /// The invalid range scale supplied by the caller.
        got: f64,
    },
    /// A per-component accessor or mutation referenced a missing component.
    #[error("component index {index} is out of bounds for {num_components} components")]
    ComponentOutOfBounds {
        /// The requested component index.
        index: usize,
        /// Number of components in the mixture.
        num_components: usize,
    },
    /// A density query used a point of the wrong dimensionality.
    #[error("point has dimension {got} but the mixture has dimension {expected}")]
    PointDimensionMismatch {
        /// Dimensionality of the supplied point.
        got: usize,
        /// Dimensionality of the mixture.
        expected: usize,
    },
    /// The interpolation factor for a derived mixture must lie in `[0, 1]`.
    #[error("target_distance must lie in [0, 1] (got {got})")]
    InvalidTargetDistance {
        /// The invalid target distance supplied by the caller.
        got: f64,
    },
    /// The majority block must leave at least one minority component.
    #[error("num_majority {num_majority} must be in 1..{num_components}")]
    InvalidMajoritySplit {
        /// The requested majority block size.
        num_majority: usize,
        /// Number of components in the mixture.
        num_components: usize,
    },
    /// The majority weight total must be a probability.
    #[error("majority_total must lie in [0, 1] (got {got})")]
    InvalidMajorityTotal {
        /// The invalid majority total supplied by the caller.
        got: f64,
    },
}

impl ModelError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> ModelErrorCode {
        match self {
            Self::InvalidComponentCount { .. } => ModelErrorCode::InvalidComponentCount,
            Self::InvalidDimensions { .. } => ModelErrorCode::InvalidDimensions,
            Self::InvalidRangeScale { .. } => ModelErrorCode::InvalidRangeScale,
            Self::ComponentOutOfBounds { .. } => ModelErrorCode::ComponentOutOfBounds,
            Self::PointDimensionMismatch { .. } => ModelErrorCode::PointDimensionMismatch,
            Self::InvalidTargetDistance { .. } => ModelErrorCode::InvalidTargetDistance,
            Self::InvalidMajoritySplit { .. } => ModelErrorCode::InvalidMajoritySplit,
            Self::InvalidMajorityTotal { .. } => ModelErrorCode::InvalidMajorityTotal,
        }
    }
}

/// Machine-readable error codes for [`ModelError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ModelErrorCode {
    /// A mixture needs at least one component.
    InvalidComponentCount,
    /// A mixture needs at least one dimension.
    InvalidDimensions,
    /// The range scale must be a positive finite value.
    InvalidRangeScale,
    /// A per-component operation referenced a missing component.
    ComponentOutOfBounds,
    /// A density query used a point of the wrong dimensionality.
    PointDimensionMismatch,
    /// The interpolation factor for a derived mixture was out of range.
    InvalidTargetDistance,
    /// The majority block size was invalid.
    InvalidMajoritySplit,
    /// The majority weight total was not a probability.
    InvalidMajorityTotal,
}

impl ModelErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidComponentCount => "MODEL_INVALID_COMPONENT_COUNT",
            Self::InvalidDimensions => "MODEL_INVALID_DIMENSIONS",
            Self::InvalidRangeScale => "MODEL_INVALID_RANGE_SCALE",
            Self::ComponentOutOfBounds => "MODEL_COMPONENT_OUT_OF_BOUNDS",
            Self::PointDimensionMismatch => "MODEL_POINT_DIMENSION_MISMATCH",
            Self::InvalidTargetDistance => "MODEL_INVALID_TARGET_DISTANCE",
            Self::InvalidMajoritySplit => "MODEL_INVALID_MAJORITY_SPLIT",
            Self::InvalidMajorityTotal => "MODEL_INVALID_MAJORITY_TOTAL",
        }
    }
}

/// Errors raised while configuring or running the Hellinger estimator.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EstimatorError {
    /// The integration range must be a positive finite value.
    #[error("integrate_range must be positive and finite (got {got})")]
    InvalidIntegrateRange {
        /// The invalid integration range supplied by the caller.
        got: f64,
    },
    /// The convergence tolerance must be a positive finite value.
    #[error("tolerance must be positive and finite (got {got})")]
    InvalidTolerance {
        /// The invalid tolerance supplied by the caller.
        got: f64,
    },
    /// The two mixtures must share a dimensionality.
    #[error("mixture dimensions differ: left={left}, right={right}")]
    DimensionMismatch {
        /// Dimensionality of the first mixture.
        left: usize,
        /// Dimensionality of the second mixture.
        right: usize,
    },
}

impl EstimatorError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> EstimatorErrorCode {
        match self {
            Self::InvalidIntegrateRange { .. } => EstimatorErrorCode::InvalidIntegrateRange,
            Self::InvalidTolerance { .. } => EstimatorErrorCode::InvalidTolerance,
            Self::DimensionMismatch { .. } => EstimatorErrorCode::DimensionMismatch,
        }
    }
}

/// Machine-readable error codes for [`EstimatorError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EstimatorErrorCode {
    /// The integration range was not positive and finite.
    InvalidIntegrateRange,
    /// The convergence tolerance was not positive and finite.
    InvalidTolerance,
    /// The two mixtures did not share a dimensionality.
    DimensionMismatch,
}

impl EstimatorErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIntegrateRange => "ESTIMATOR_INVALID_INTEGRATE_RANGE",
            Self::InvalidTolerance => "ESTIMATOR_INVALID_TOLERANCE",
            Self::DimensionMismatch => "ESTIMATOR_DIMENSION_MISMATCH",
        }
    }
}

/// Errors raised while configuring or running the drift search.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DriftError {
    /// The target distance must lie strictly inside `(0, 1)`.
    #[error("target_distance must lie in (0, 1) (got {got})")]
    InvalidTargetDistance {
        /// The invalid target distance supplied by the caller.
        got: f64,
    },
    /// The precision tolerance must be a positive finite value.
    #[error("precision must be positive and finite (got {got})")]
    InvalidPrecision {
        /// The invalid precision supplied by the caller.
        got: f64,
    },
    /// An attempt or restart budget was zero.
    #[error("{budget} must be at least 1")]
    EmptyBudget {
        /// Name of the offending budget parameter.
        budget: &'static str,
    },
    /// Every candidate and restart budget was exhausted without converging.
    #[error(
        "drift search exhausted after {pre_restarts} reference models and \
         {post_attempts} candidates without reaching the target distance"
    )]
    SearchExhausted {
        /// Number of reference (`pre`) models tried.
        pre_restarts: u32,
        /// Total number of candidate (`post`) models measured.
        post_attempts: u32,
    },
    /// Model construction failed inside the search.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The distance estimator rejected its configuration.
    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

impl DriftError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> DriftErrorCode {
        match self {
            Self::InvalidTargetDistance { .. } => DriftErrorCode::InvalidTargetDistance,
            Self::InvalidPrecision { .. } => DriftErrorCode::InvalidPrecision,
            Self::EmptyBudget { .. } => DriftErrorCode::EmptyBudget,
            Self::SearchExhausted { .. } => DriftErrorCode::SearchExhausted,
            Self::Model(_) => DriftErrorCode::Model,
            Self::Estimator(_) => DriftErrorCode::Estimator,
        }
    }
}

/// Machine-readable error codes for [`DriftError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DriftErrorCode {
    /// The target distance was outside `(0, 1)`.
    InvalidTargetDistance,
    /// The precision tolerance was not positive and finite.
    InvalidPrecision,
    /// An attempt or restart budget was zero.
    EmptyBudget,
    /// Every candidate and restart budget was exhausted.
    SearchExhausted,
    /// Model construction failed inside the search.
    Model,
    /// The distance estimator rejected its configuration.
    Estimator,
}

impl DriftErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTargetDistance => "DRIFT_INVALID_TARGET_DISTANCE",
            Self::InvalidPrecision => "DRIFT_INVALID_PRECISION",
            Self::EmptyBudget => "DRIFT_EMPTY_BUDGET",
            Self::SearchExhausted => "DRIFT_SEARCH_EXHAUSTED",
            Self::Model => "DRIFT_MODEL",
            Self::Estimator => "DRIFT_ESTIMATOR",
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T, E = ModelError> = core::result::Result<T, E>;
