//! Errors for time-indexed series, targets, and evaluators.
//!
//! [`TargetError`] covers construction-time validation of observed data
//! (indices, weights, noise parameters) and the few evaluation-time failures
//! that are structural rather than numerical: a missing calibrated noise
//! parameter or a modelled series shorter than the simulation grid.
//! Numerical edge cases during evaluation are never errors; non-finite log
//! densities propagate as values.

/// Result alias for operations in the `targets` layer.
pub type TargetResult<T> = Result<T, TargetError>;

/// Unified error type for targets.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetError {
    // ---- Time index / series ----
    /// Time coordinates must be finite.
    NonFiniteTime { time: f64 },

    /// Time coordinates must be unique.
    DuplicateTime { time: f64 },

    /// Values and index lengths must agree.
    LengthMismatch { expected: usize, found: usize },

    /// An auxiliary series must share the data index exactly.
    IndexMismatch { target: String, series: &'static str },

    // ---- Target construction ----
    /// Target names must be non-empty.
    EmptyName,

    /// Targets need at least one observation.
    EmptyData { target: String },

    /// Target weight must be finite and > 0.
    InvalidWeight { value: f64 },

    /// Time weights must be finite and >= 0.
    InvalidTimeWeight { time: f64, value: f64 },

    /// Binomial sample sizes must be finite and >= 0.
    InvalidSampleSize { time: f64, value: f64 },

    /// A fixed noise parameter is out of range.
    InvalidNoiseParam { target: String, param: &'static str, value: f64 },

    /// Truncation range must satisfy lo < hi.
    InvalidTruncRange { lo: f64, hi: f64 },

    // ---- Evaluation ----
    /// No observation time falls on the simulation grid.
    NoOverlap { target: String },

    /// A calibrated noise parameter is absent from the parameter map.
    MissingParameter { target: String, param: String },

    /// The modelled series does not cover the evaluator's positions.
    ModelledTooShort { target: String, needed: usize, found: usize },
}

impl std::error::Error for TargetError {}

impl std::fmt::Display for TargetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Time index / series ----
            TargetError::NonFiniteTime { time } => {
                write!(f, "Time coordinates must be finite; got {time}")
            }
            TargetError::DuplicateTime { time } => {
                write!(f, "Duplicate time coordinate {time}")
            }
            TargetError::LengthMismatch { expected, found } => {
                write!(f, "Length mismatch: expected {expected} values, found {found}")
            }
            TargetError::IndexMismatch { target, series } => {
                write!(f, "Target '{target}': {series} must share the data index")
            }

            // ---- Target construction ----
            TargetError::EmptyName => write!(f, "Target name must be non-empty"),
            TargetError::EmptyData { target } => {
                write!(f, "Target '{target}' has no observations")
            }
            TargetError::InvalidWeight { value } => {
                write!(f, "Target weight must be finite and > 0; got {value}")
            }
            TargetError::InvalidTimeWeight { time, value } => {
                write!(f, "Time weight at t = {time} must be finite and >= 0; got {value}")
            }
            TargetError::InvalidSampleSize { time, value } => {
                write!(f, "Sample size at t = {time} must be finite and >= 0; got {value}")
            }
            TargetError::InvalidNoiseParam { target, param, value } => {
                write!(f, "Target '{target}': invalid {param} {value}")
            }
            TargetError::InvalidTruncRange { lo, hi } => {
                write!(f, "Truncation range must satisfy lo < hi; got ({lo}, {hi})")
            }

            // ---- Evaluation ----
            TargetError::NoOverlap { target } => {
                write!(f, "Target '{target}' has no observation on the simulation grid")
            }
            TargetError::MissingParameter { target, param } => {
                write!(f, "Target '{target}' needs parameter '{param}', which was not supplied")
            }
            TargetError::ModelledTooShort { target, needed, found } => {
                write!(
                    f,
                    "Target '{target}': modelled series has {found} points, needs at least {needed}"
                )
            }
        }
    }
}
