//! Moment-based fitting of prior distribution parameters.
//!
//! Purpose
//! -------
//! Translate the moments calibration users actually know (a mean plus a
//! credible interval, or a mode plus an upper credible bound) into native
//! Beta / Gamma parameters by constrained numerical minimization with
//! `argmin`.
//!
//! Key behaviors
//! -------------
//! - [`fit_beta_from_mean_ci`]: enforce the mean through `b = a(1 − m)/m` and
//!   minimize the squared distance between the central-interval percentiles
//!   and the requested interval over `ln a` with Brent's method.
//! - [`fit_gamma`]: minimize `|moment(k, θ) − target| + |ppf(upper) − u|`
//!   over `(ln k, ln θ)` with Nelder–Mead, restarting from the previous best
//!   up to `max_retries` times until the normalized loss drops below `tol`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated before any solver runs; invalid moments are
//!   construction errors, not fitting errors.
//! - Gamma parameters are clamped below by [`GAMMA_PARAM_EPS`] inside the
//!   cost, so the search space is the open positive quadrant.
//! - A Gamma fit that never reaches tolerance is an error
//!   ([`PriorError::FitNotConverged`]) carrying the achieved loss; an unfit
//!   distribution is never returned.
//!
//! Conventions
//! -----------
//! - Costs are `argmin::core::CostFunction`s over `f64` (Brent) or
//!   [`FitVector`] (Nelder–Mead); solver errors surface as [`PriorError`]
//!   through its `From<argmin::core::Error>` conversion.
use crate::priors::{
    distributions::PriorDistribution,
    errors::{PriorError, PriorResult},
    options::FitOptions,
};
use argmin::{
    core::{CostFunction, Error, Executor, State},
    solver::{brent::BrentOpt, neldermead::NelderMead},
};
use ndarray::{Array1, array};
use tracing::{debug, warn};

/// Parameter vector for the Nelder–Mead Gamma search: `(ln k, ln θ)`.
pub type FitVector = Array1<f64>;

/// Lower clamp applied to Gamma shape and scale during the search.
pub const GAMMA_PARAM_EPS: f64 = 1e-6;

/// Half-width of the `ln a` bracket searched for Beta fits, centred on `a = 1`.
pub const BETA_LN_A_BRACKET: f64 = 12.0;

/// Absolute tolerance for the Beta Brent search.
pub const BETA_ABS_TOL: f64 = 1e-32;

/// Edge length of the initial Nelder–Mead simplex in log-parameter space.
const SIMPLEX_STEP: f64 = 0.5;

/// Standard-deviation tolerance on simplex costs for one Nelder–Mead run.
const SIMPLEX_SD_TOL: f64 = 1e-14;

/// Which Gamma moment is matched alongside the upper credible bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaMoment {
    /// Mode `(k − 1)θ` (zero when `k < 1`).
    Mode,
    /// Mean `kθ`.
    Mean,
}

impl GammaMoment {
    fn evaluate(self, shape: f64, scale: f64) -> f64 {
        match self {
            GammaMoment::Mode => PriorDistribution::gamma_mode(shape, scale),
            GammaMoment::Mean => shape * scale,
        }
    }

    fn seed(self, target: f64) -> FitVector {
        match self {
            GammaMoment::Mode => array![2.0_f64.ln(), target.ln()],
            GammaMoment::Mean => array![2.0_f64.ln(), (target / 2.0).ln()],
        }
    }
}

/// Resolved Beta parameters plus the residual squared distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaFit {
    pub a: f64,
    pub b: f64,
    pub residual: f64,
}

/// Resolved Gamma parameters plus the normalized loss and attempts used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaFit {
    pub shape: f64,
    pub scale: f64,
    pub loss: f64,
    pub attempts: usize,
}

/// Squared distance between Beta central percentiles and a target interval,
/// as a function of `ln a`.
struct BetaIntervalDistance {
    mean: f64,
    ci: (f64, f64),
    percentiles: (f64, f64),
}

impl BetaIntervalDistance {
    fn shapes(&self, ln_a: f64) -> (f64, f64) {
        let a = ln_a.exp();
        (a, a * (1.0 - self.mean) / self.mean)
    }
}

impl CostFunction for BetaIntervalDistance {
    type Param = f64;
    type Output = f64;

    fn cost(&self, ln_a: &Self::Param) -> Result<Self::Output, Error> {
        let (a, b) = self.shapes(*ln_a);
        let dist = PriorDistribution::beta(a, b)?;
        let low = dist.ppf(self.percentiles.0) - self.ci.0;
        let up = dist.ppf(self.percentiles.1) - self.ci.1;
        Ok(low * low + up * up)
    }
}

/// L1 distance between a Gamma moment / upper percentile pair and targets,
/// as a function of `(ln k, ln θ)`.
struct GammaMomentDistance {
    moment: GammaMoment,
    target: f64,
    upper_ci: f64,
    upper_percentile: f64,
}

impl GammaMomentDistance {
    fn params(theta: &FitVector) -> (f64, f64) {
        (theta[0].exp().max(GAMMA_PARAM_EPS), theta[1].exp().max(GAMMA_PARAM_EPS))
    }

    fn loss(&self, shape: f64, scale: f64) -> PriorResult<f64> {
        let dist = PriorDistribution::gamma(shape, scale)?;
        let upper = dist.ppf(self.upper_percentile);
        Ok((self.moment.evaluate(shape, scale) - self.target).abs()
            + (upper - self.upper_ci).abs())
    }
}

impl CostFunction for GammaMomentDistance {
    type Param = FitVector;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let (shape, scale) = Self::params(theta);
        match self.loss(shape, scale) {
            Ok(loss) if loss.is_finite() => Ok(loss),
            _ => Ok(f64::MAX),
        }
    }
}

/// Fit Beta `(a, b)` from a mean and a central credible interval.
///
/// Parameters
/// ----------
/// - `name`: prior name (for errors and logs).
/// - `mean`: target mean, strictly inside (0, 1).
/// - `ci`: `(lo, hi)` with `0 < lo < hi < 1`.
/// - `opts`: fit options; `opts.ci_width()` sets the interval mass.
///
/// Returns
/// -------
/// [`BetaFit`] with `b = a(1 − mean)/mean` and the residual squared distance.
///
/// Errors
/// ------
/// - [`PriorError::InvalidMean`] / [`PriorError::InvalidInterval`] on bad inputs.
/// - Solver errors converted from `argmin`.
/// - [`PriorError::FitFailed`] if the solver returns no finite solution.
pub fn fit_beta_from_mean_ci(
    name: &str, mean: f64, ci: (f64, f64), opts: &FitOptions,
) -> PriorResult<BetaFit> {
    let (lo, hi) = ci;
    if !(lo < hi) {
        return Err(PriorError::InvalidInterval { lo, hi, reason: "Interval must satisfy lo < hi." });
    }
    if !(lo > 0.0 && lo < 1.0 && hi > 0.0 && hi < 1.0) {
        return Err(PriorError::InvalidInterval {
            lo,
            hi,
            reason: "Interval bounds must lie strictly inside (0, 1).",
        });
    }
    if !(mean > 0.0 && mean < 1.0) {
        return Err(PriorError::InvalidMean {
            value: mean,
            reason: "Beta mean must lie strictly inside (0, 1).",
        });
    }

    let problem =
        BetaIntervalDistance { mean, ci, percentiles: FitOptions::percentiles(opts.ci_width()) };
    let solver = BrentOpt::new(-BETA_LN_A_BRACKET, BETA_LN_A_BRACKET)
        .set_tolerance(f64::EPSILON.sqrt(), BETA_ABS_TOL);
    let mut state = Executor::new(problem, solver)
        .configure(|state| state.max_iters(opts.max_iters()))
        .run()?
        .state()
        .clone();
    let residual = state.get_best_cost();
    let ln_a = state.take_best_param().ok_or_else(|| PriorError::FitFailed {
        prior: name.to_string(),
        reason: "Solver returned no parameter.".to_string(),
    })?;

    let a = ln_a.exp();
    let b = a * (1.0 - mean) / mean;
    if !(a.is_finite() && b.is_finite() && residual.is_finite()) {
        return Err(PriorError::FitFailed {
            prior: name.to_string(),
            reason: format!("Non-finite solution a = {a}, b = {b}, residual = {residual}."),
        });
    }
    if residual > opts.beta_warn_residual() {
        warn!(prior = name, residual, "beta prior cannot match requested interval exactly");
    }
    debug!(prior = name, a, b, residual, "fitted beta prior");
    Ok(BetaFit { a, b, residual })
}

/// Fit Gamma `(k, θ)` from a mode or mean and an upper credible bound.
///
/// Parameters
/// ----------
/// - `name`: prior name (for errors and logs).
/// - `moment`: whether `target` is the mode or the mean.
/// - `target`: finite and > 0.
/// - `upper_ci`: upper bound of the central `opts.gamma_ci()` interval; finite and > 0.
/// - `opts`: retry count, tolerance, and per-run iteration cap.
///
/// Returns
/// -------
/// [`GammaFit`] whose normalized loss (`loss / upper_ci`) is below `opts.tol()`.
///
/// Errors
/// ------
/// - [`PriorError::InvalidMean`] / [`PriorError::InvalidUpperCi`] on bad inputs.
/// - [`PriorError::FitNotConverged`] with the best normalized loss when no
///   attempt reaches `opts.tol()`.
/// - Solver errors converted from `argmin`.
pub fn fit_gamma(
    name: &str, moment: GammaMoment, target: f64, upper_ci: f64, opts: &FitOptions,
) -> PriorResult<GammaFit> {
    if !(target.is_finite() && target > 0.0) {
        return Err(PriorError::InvalidMean {
            value: target,
            reason: "Gamma mode/mean must be finite and > 0.",
        });
    }
    if !(upper_ci.is_finite() && upper_ci > 0.0) {
        return Err(PriorError::InvalidUpperCi { value: upper_ci });
    }

    let upper_percentile = FitOptions::percentiles(opts.gamma_ci()).1;
    let mut best = moment.seed(target);
    let mut best_loss = f64::INFINITY;

    for attempt in 1..=opts.max_retries() {
        let problem = GammaMomentDistance { moment, target, upper_ci, upper_percentile };
        let solver = NelderMead::new(initial_simplex(&best)).with_sd_tolerance(SIMPLEX_SD_TOL)?;
        let mut state = Executor::new(problem, solver)
            .configure(|state| state.max_iters(opts.max_iters()))
            .run()?
            .state()
            .clone();
        if let Some(candidate) = state.take_best_param() {
            let (shape, scale) = GammaMomentDistance::params(&candidate);
            let probe = GammaMomentDistance { moment, target, upper_ci, upper_percentile };
            let loss = probe.loss(shape, scale)? / upper_ci;
            if loss < best_loss {
                best_loss = loss;
                best = candidate;
            }
        }
        debug!(prior = name, attempt, loss = best_loss, "gamma prior fit attempt");
        if best_loss < opts.tol() {
            let (shape, scale) = GammaMomentDistance::params(&best);
            debug!(prior = name, shape, scale, "fitted gamma prior");
            return Ok(GammaFit { shape, scale, loss: best_loss, attempts: attempt });
        }
    }

    Err(PriorError::FitNotConverged { prior: name.to_string(), loss: best_loss, tol: opts.tol() })
}

fn initial_simplex(center: &FitVector) -> Vec<FitVector> {
    let mut shape_step = center.clone();
    shape_step[0] += SIMPLEX_STEP;
    let mut scale_step = center.clone();
    scale_step[1] += SIMPLEX_STEP;
    vec![center.clone(), shape_step, scale_step]
}
