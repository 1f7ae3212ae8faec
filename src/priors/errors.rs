//! Errors for prior construction, distribution fitting, and fit options.
//!
//! This module defines [`PriorError`], the single error surface for the
//! `priors` layer, and the [`PriorResult`] alias. Construction-time validation
//! failures (bad moments, inverted intervals, non-positive scales) and
//! numerical fitting failures (solver errors, non-convergence) are kept in
//! separate groups so callers can react to an infeasible fit without string
//! matching.
//!
//! ## Conventions
//! - Every variant carries the offending value(s) so messages are actionable.
//! - Solver errors coming from `argmin` are downcast into their own variants
//!   (mirroring `argmin::core::ArgminError`); anything else becomes
//!   [`PriorError::BackendError`].
//! - `statrs` constructor errors are normalized into
//!   [`PriorError::InvalidDistribution`] with the family name attached.
use argmin::core::{ArgminError, Error};
use statrs::distribution::{BetaError, GammaError, NormalError, UniformError};

/// Result alias for operations in the `priors` layer.
pub type PriorResult<T> = Result<T, PriorError>;

/// Unified error type for priors.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorError {
    // ---- Identity ----
    /// Prior names must be non-empty.
    EmptyName,

    /// Vector priors need at least one component.
    InvalidSize { size: usize },

    // ---- Moment / parameter validation ----
    /// A mean (or mode) is outside its admissible domain.
    InvalidMean { value: f64, reason: &'static str },

    /// A credible interval is malformed (ordering or domain).
    InvalidInterval { lo: f64, hi: f64, reason: &'static str },

    /// Credible-interval width must lie strictly inside (0, 1).
    InvalidCiWidth { width: f64 },

    /// Uniform domain must be finite with start < end.
    InvalidDomain { start: f64, end: f64 },

    /// Standard deviations must be finite and > 0.
    InvalidStdev { value: f64 },

    /// Shape-type parameters must be finite and > 0.
    InvalidShape { value: f64 },

    /// Scale-type parameters must be finite and > 0.
    InvalidScale { value: f64 },

    /// Upper credible bound must be finite and > 0.
    InvalidUpperCi { value: f64 },

    /// A confidence mass passed to `bounds` must lie in (0, 1].
    InvalidConfidence { value: f64 },

    /// A numeric fit option is out of range.
    InvalidOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Fitting ----
    /// The fitter finished but produced an unusable solution.
    FitFailed { prior: String, reason: String },

    /// The fitter never reached the requested tolerance.
    FitNotConverged { prior: String, loss: f64, tol: f64 },

    // ---- statrs ----
    /// A `statrs` constructor rejected the resolved parameters.
    InvalidDistribution { family: &'static str, text: String },

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for PriorError {}

impl std::fmt::Display for PriorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Identity ----
            PriorError::EmptyName => write!(f, "Prior name must be non-empty"),
            PriorError::InvalidSize { size } => {
                write!(f, "Prior size must be at least 1; got {size}")
            }

            // ---- Moment / parameter validation ----
            PriorError::InvalidMean { value, reason } => {
                write!(f, "Invalid mean {value}: {reason}")
            }
            PriorError::InvalidInterval { lo, hi, reason } => {
                write!(f, "Invalid credible interval ({lo}, {hi}): {reason}")
            }
            PriorError::InvalidCiWidth { width } => {
                write!(f, "Credible interval width must lie in (0, 1); got {width}")
            }
            PriorError::InvalidDomain { start, end } => {
                write!(f, "Uniform domain must be finite with start < end; got ({start}, {end})")
            }
            PriorError::InvalidStdev { value } => {
                write!(f, "Standard deviation must be finite and > 0; got {value}")
            }
            PriorError::InvalidShape { value } => {
                write!(f, "Shape parameter must be finite and > 0; got {value}")
            }
            PriorError::InvalidScale { value } => {
                write!(f, "Scale parameter must be finite and > 0; got {value}")
            }
            PriorError::InvalidUpperCi { value } => {
                write!(f, "Upper credible bound must be finite and > 0; got {value}")
            }
            PriorError::InvalidConfidence { value } => {
                write!(f, "Confidence mass must lie in (0, 1]; got {value}")
            }
            PriorError::InvalidOption { name, value, reason } => {
                write!(f, "Invalid fit option {name} = {value}: {reason}")
            }

            // ---- Fitting ----
            PriorError::FitFailed { prior, reason } => {
                write!(f, "Fitting prior '{prior}' failed: {reason}")
            }
            PriorError::FitNotConverged { prior, loss, tol } => {
                write!(
                    f,
                    "Fitting prior '{prior}' did not converge: normalized loss {loss} exceeds tolerance {tol}"
                )
            }

            // ---- statrs ----
            PriorError::InvalidDistribution { family, text } => {
                write!(f, "Invalid {family} distribution: {text}")
            }

            // ---- Argmin ----
            PriorError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            PriorError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            PriorError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            PriorError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            PriorError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            PriorError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Fallback ----
            PriorError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for PriorError {
    fn from(original_err: Error) -> Self {
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => PriorError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => PriorError::NotImplemented { text },
                ArgminError::NotInitialized { text } => PriorError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => PriorError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => PriorError::PotentialBug { text },
                _ => PriorError::UnknownError,
            },
            Err(err) => match err.downcast::<PriorError>() {
                Ok(prior_err) => prior_err,
                Err(other) => PriorError::BackendError { text: other.to_string() },
            },
        }
    }
}

impl From<BetaError> for PriorError {
    fn from(err: BetaError) -> Self {
        PriorError::InvalidDistribution { family: "Beta", text: err.to_string() }
    }
}

impl From<GammaError> for PriorError {
    fn from(err: GammaError) -> Self {
        PriorError::InvalidDistribution { family: "Gamma", text: err.to_string() }
    }
}

impl From<NormalError> for PriorError {
    fn from(err: NormalError) -> Self {
        PriorError::InvalidDistribution { family: "Normal", text: err.to_string() }
    }
}

impl From<UniformError> for PriorError {
    fn from(err: UniformError) -> Self {
        PriorError::InvalidDistribution { family: "Uniform", text: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // A `PriorError` raised inside an argmin cost function must come back out
    // of the executor unchanged rather than being flattened to a string.
    //
    // Given
    // -----
    // - A `PriorError::InvalidShape` wrapped into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - Converting back yields the identical variant.
    fn argmin_error_round_trips_prior_error() {
        let original = PriorError::InvalidShape { value: -1.0 };
        let wrapped: Error = original.clone().into();

        assert_eq!(PriorError::from(wrapped), original);
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds map onto the dedicated wrapper variants.
    //
    // Given
    // -----
    // - An `ArgminError::InvalidParameter` wrapped into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `PriorError::InvalidParameter` with the same text.
    fn argmin_invalid_parameter_maps_to_wrapper_variant() {
        let wrapped: Error = ArgminError::InvalidParameter { text: "bad".to_string() }.into();

        assert_eq!(PriorError::from(wrapped), PriorError::InvalidParameter { text: "bad".into() });
    }
}
