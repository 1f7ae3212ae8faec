//! calibration — orchestrator, simulator interfaces, and composed densities.
//!
//! Purpose
//! -------
//! Turn a simulator, a prior set, and a target set into one log-likelihood
//! (plus log-prior and log-posterior) that external optimizers and samplers
//! can call with named parameter values or a flat parameter vector.
//!
//! Key behaviors
//! -------------
//! - [`BayesianCompartmentalModel::new`] merges target-declared priors,
//!   selects calibrated parameters (simulator inputs ∩ prior names), builds
//!   restricted and full runners, and aligns targets to the simulation grid.
//! - [`CompiledLogLikelihood::evaluate`] runs the restricted runner with
//!   simulator inputs only and scores every target with the full mapping.
//! - [`LogDensity`] exposes the densities over a `Theta` vector with
//!   finite-difference gradients and per-coordinate prior bounds.
//! - [`BayesianCompartmentalModel::run`] / `run_raw` run the full runner for
//!   post-calibration inspection.
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything captured by a [`CompiledLogLikelihood`] is immutable and
//!   `Send + Sync`; concurrent evaluations with different parameters are
//!   safe.
//! - Choices that do not depend on parameter values (fixed vs calibrated
//!   noise parameters, output positions) are resolved at construction.
//! - No I/O and no retries; a failed or non-finite evaluation is returned
//!   as-is.
//!
//! Conventions
//! -----------
//! - The simulator is a collaborator behind [`CompartmentalModel`] and
//!   [`ModelRunner`]; its failures surface as [`CalibrationError::Model`].
//! - Parameter maps are [`Parameters`] (`BTreeMap<String, f64>`), so
//!   iteration order is deterministic. A prior of size `n` is calibrated
//!   through keys `name[0]` .. `name[n-1]`, which reach the simulator as-is.
pub mod bcm;
pub mod density;
pub mod errors;
pub mod loglik;
pub mod model;
pub mod results;

pub use self::{
    bcm::BayesianCompartmentalModel,
    density::{DensityKind, Grad, LogDensity, Theta},
    errors::{CalibResult, CalibrationError, ModelError},
    loglik::{CompiledLogLikelihood, ExtraLogLikelihood},
    model::{
        CompartmentalModel, ModelResults, ModelRunner, Parameters, base_name, vector_parameter,
    },
    results::ResultsData,
};

pub mod prelude {
    pub use super::{
        BayesianCompartmentalModel, CalibResult, CalibrationError, CompartmentalModel,
        CompiledLogLikelihood, DensityKind, ExtraLogLikelihood, LogDensity, ModelError,
        ModelResults, ModelRunner, Parameters, ResultsData, Theta, vector_parameter,
    };
}
