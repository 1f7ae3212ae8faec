//! Errors for the calibration orchestrator and simulator collaboration.
//!
//! [`CalibrationError`] is the outer error surface of the crate: it wraps the
//! prior and target layers, carries simulator failures ([`ModelError`]), and
//! adds the orchestrator's own construction and evaluation failures.
use crate::{priors::errors::PriorError, targets::errors::TargetError};

/// Result alias for calibration operations.
pub type CalibResult<T> = Result<T, CalibrationError>;

/// Failure reported by a simulator or one of its runners.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A parameter the simulator needs was neither supplied nor in the baseline.
    MissingParameter { name: String },
    /// The simulator cannot build a runner for this configuration.
    InvalidConfiguration { reason: String },
    /// The simulation itself failed.
    Simulation { reason: String },
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::MissingParameter { name } => {
                write!(f, "Simulator parameter '{name}' is missing")
            }
            ModelError::InvalidConfiguration { reason } => {
                write!(f, "Invalid simulator configuration: {reason}")
            }
            ModelError::Simulation { reason } => write!(f, "Simulation failed: {reason}"),
        }
    }
}

/// Unified error type for calibration.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    // ---- Wrapped layers ----
    Prior(PriorError),
    Target(TargetError),
    Model(ModelError),

    // ---- Construction ----
    /// Two different priors share a name.
    DuplicatePrior { name: String },

    /// Two targets share a name.
    DuplicateTarget { name: String },

    /// A target has no observation on the simulation grid.
    EmptyTarget { target: String },

    // ---- Evaluation ----
    /// The simulator did not return an output a target needs.
    MissingOutput { output: String },

    /// A prior has no value in the parameter map.
    MissingParameter { name: String },

    /// A parameter vector has the wrong length.
    ThetaLength { expected: usize, found: usize },

    /// Finite differences produced a non-finite gradient entry.
    NonFiniteGradient { index: usize, value: f64 },
}

impl std::error::Error for CalibrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalibrationError::Prior(err) => Some(err),
            CalibrationError::Target(err) => Some(err),
            CalibrationError::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Wrapped layers ----
            CalibrationError::Prior(err) => write!(f, "Prior error: {err}"),
            CalibrationError::Target(err) => write!(f, "Target error: {err}"),
            CalibrationError::Model(err) => write!(f, "Model error: {err}"),

            // ---- Construction ----
            CalibrationError::DuplicatePrior { name } => {
                write!(f, "Different priors share the name '{name}'")
            }
            CalibrationError::DuplicateTarget { name } => {
                write!(f, "More than one target is named '{name}'")
            }
            CalibrationError::EmptyTarget { target } => {
                write!(f, "Target '{target}' has no observation on the simulation grid")
            }

            // ---- Evaluation ----
            CalibrationError::MissingOutput { output } => {
                write!(f, "Simulator returned no derived output '{output}'")
            }
            CalibrationError::MissingParameter { name } => {
                write!(f, "No value supplied for prior '{name}'")
            }
            CalibrationError::ThetaLength { expected, found } => {
                write!(f, "Parameter vector has length {found}; expected {expected}")
            }
            CalibrationError::NonFiniteGradient { index, value } => {
                write!(f, "Gradient entry {index} is not finite: {value}")
            }
        }
    }
}

impl From<PriorError> for CalibrationError {
    fn from(err: PriorError) -> Self {
        CalibrationError::Prior(err)
    }
}

impl From<TargetError> for CalibrationError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::NoOverlap { target } => CalibrationError::EmptyTarget { target },
            other => CalibrationError::Target(other),
        }
    }
}

impl From<ModelError> for CalibrationError {
    fn from(err: ModelError) -> Self {
        CalibrationError::Model(err)
    }
}
