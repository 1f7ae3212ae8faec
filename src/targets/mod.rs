//! targets — observed data, noise models, and per-target evaluators.
//!
//! Purpose
//! -------
//! Describe what the calibrated model is compared against. A [`Target`]
//! names one simulator output, carries its observed [`TimeSeries`], a
//! weight, optional per-time weights, and a [`NoiseModel`] whose dispersion
//! or spread may itself be a calibrated prior ([`DistriParam`]).
//!
//! Key behaviors
//! -------------
//! - [`Target::filtered`] restricts a target to a time grid, carrying
//!   auxiliary series along and renormalizing time weights.
//! - [`Target::get_evaluator`] aligns a target to the simulation grid once
//!   and returns a stateless [`TargetEvaluator`] computing the weighted
//!   log-likelihood contribution of a modelled series.
//!
//! Invariants & assumptions
//! ------------------------
//! - Targets are values: filtering and evaluator construction never mutate
//!   the source target.
//! - Auxiliary series and time weights share the data index exactly.
//! - Evaluators resolve noise parameters at build time to a fixed value or
//!   a parameter name, so evaluation does no type dispatch on priors.
//!
//! Conventions
//! -----------
//! - Noise-model densities come from [`crate::numerics::special`].
//! - Construction errors are [`TargetError`]; evaluation reports only
//!   structural problems as errors and lets non-finite densities through.
pub mod errors;
pub mod evaluator;
pub mod series;
pub mod target;

pub use self::{
    errors::{TargetError, TargetResult},
    evaluator::{ResolvedParam, TargetEvaluator},
    series::{TimeIndex, TimeSeries},
    target::{CustomEval, DistriParam, NoiseModel, Target, get_target_sd},
};

pub mod prelude {
    pub use super::{
        CustomEval, DistriParam, NoiseModel, Target, TargetError, TargetEvaluator, TargetResult,
        TimeIndex, TimeSeries, get_target_sd,
    };
}
