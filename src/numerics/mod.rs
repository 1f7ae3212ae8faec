//! numerics — special functions and guarded log densities shared by priors
//! and target evaluators.
//!
//! Purpose
//! -------
//! Collect the small numerical building blocks that both the prior layer and
//! the noise-model evaluators need: standard-normal helpers built on `statrs`
//! error functions, a bracketed quantile fallback for when the `statrs`
//! Gamma quantile does not converge, `xlogy`-style products that stay finite at zero,
//! and the per-point log densities used by the noise models.
//!
//! Key behaviors
//! -------------
//! - [`special::invert_cdf`] bisects a monotone CDF to machine precision
//!   inside a known (or doubled-until-found) bracket.
//! - [`special::std_normal_cdf`] / [`special::std_normal_ppf`] avoid
//!   constructing fallible `statrs` distribution objects in inner loops.
//! - [`special::normal_ln_pdf`], [`special::truncnorm_ln_pdf`],
//!   [`special::nbinom_ln_pmf`], [`special::binom_ln_pmf`] evaluate the
//!   noise-model log densities with the same conventions as the reference
//!   scientific stacks (location/scale, standardized truncation bounds,
//!   `(n, p)` count parameterizations).
//!
//! Invariants & assumptions
//! ------------------------
//! - Functions never panic and never return `Err`; out-of-support inputs
//!   yield `-∞` and invalid parameters yield `NaN`, so non-finite values
//!   are the signaling mechanism for infeasible points.
//!
//! Conventions
//! -----------
//! - This module performs no I/O and no logging; it is safe inside tight
//!   likelihood loops.
pub mod special;

pub mod prelude {
    pub use super::special::{
        binom_ln_pmf, invert_cdf, nbinom_ln_pmf, normal_ln_pdf, std_normal_cdf, std_normal_ppf,
        truncnorm_ln_pdf,
    };
}
