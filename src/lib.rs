//! compartmental_calibration — Bayesian calibration for compartmental models.
//!
//! Purpose
//! -------
//! Build the log-likelihood, log-prior, and log-posterior of a compartmental
//! simulator against observed data, for use by external optimizers and MCMC
//! samplers. The crate never advances the model itself; it consumes a
//! simulator through traits.
//!
//! Key behaviors
//! -------------
//! - `priors`: named prior distributions, including Beta and Gamma priors
//!   fitted from user-friendly moments with `argmin`.
//! - `targets`: observed time series with noise models (Normal, truncated
//!   Normal, negative binomial, binomial, custom) and per-target evaluators.
//! - `calibration`: the orchestrator partitioning parameters into calibrated
//!   and fixed sets and composing one immutable likelihood.
//! - `numerics`: special functions and log densities shared by the above.
//!
//! Invariants & assumptions
//! ------------------------
//! - Priors, targets, and evaluators are immutable after construction, so
//!   one orchestrator can serve concurrent evaluations.
//! - Construction errors (bad moments, name collisions, infeasible fits,
//!   targets off the grid) fail fast; evaluation-time numerical edge cases
//!   are clamped or returned as non-finite values.
//!
//! Conventions
//! -----------
//! - Each module has its own error enum and result alias; the calibration
//!   layer wraps the others in `CalibrationError`.
//! - Logging goes through `tracing`; the library installs no subscriber.
//! - Feature `sampling` enables inverse-CDF draws from priors via `rand`.
pub mod calibration;
pub mod numerics;
pub mod priors;
pub mod targets;

pub mod prelude {
    pub use crate::calibration::prelude::*;
    pub use crate::priors::prelude::*;
    pub use crate::targets::prelude::*;
}
