//! priors — named prior distributions over calibratable parameters.
//!
//! Purpose
//! -------
//! Represent the prior beliefs attached to calibrated parameters. A [`Prior`]
//! pairs a unique name (and an optional vector size) with one backing
//! [`PriorDistribution`], built either from native parameters or by fitting
//! user-friendly moments (mean + credible interval for Beta, mode/mean +
//! upper credible bound for Gamma).
//!
//! Key behaviors
//! -------------
//! - Construct priors through validating constructors; moment-based ones run
//!   the numerical fitters in [`fitting`] once, at construction.
//! - Evaluate `ppf`, `cdf`, `pdf`, `logpdf`, and central `bounds`.
//! - Tabulate the density or CDF for inspection ([`Prior::get_series`]).
//! - Describe the prior to external MCMC model builders ([`SamplerSpec`]),
//!   and, with the `sampling` feature, draw i.i.d. values by inverse CDF.
//!
//! Invariants & assumptions
//! ------------------------
//! - A `Prior` is immutable once built; calibration code shares it through
//!   `Arc<Prior>` between targets and the orchestrator.
//! - Names are non-empty and `size >= 1`.
//! - A fitted Gamma prior always satisfies the fit tolerance; an infeasible
//!   request is an error, never a silently unfit distribution.
//!
//! Conventions
//! -----------
//! - Vector priors (`size > 1`) are i.i.d. replications; scalar parameter
//!   maps address their components as `name[i]` (see
//!   [`Prior::component_names`]).
//! - All fallible operations return [`PriorResult`].
pub mod distributions;
pub mod errors;
pub mod fitting;
pub mod options;
#[cfg(feature = "sampling")]
pub mod sampling;

use crate::priors::{
    distributions::PriorDistribution,
    errors::{PriorError, PriorResult},
    fitting::{GammaMoment, fit_beta_from_mean_ci, fit_gamma},
    options::FitOptions,
};
use ndarray::Array1;
use std::fmt;

/// Whether this build can draw random values from priors.
pub const SAMPLING_AVAILABLE: bool = cfg!(feature = "sampling");

/// Confidence mass shown by `Display` and used by [`Prior::get_series`].
pub const DISPLAY_CONFIDENCE: f64 = 0.99;

/// Number of grid points in [`Prior::get_series`].
pub const SERIES_POINTS: usize = 100;

/// Which function [`Prior::get_series`] tabulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitFunc {
    Pdf,
    Cdf,
}

/// Native parameterization handed to an external sampler.
///
/// Gamma is expressed with a rate (`beta = 1/θ`), matching the common
/// probabilistic-programming convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerFamily {
    Beta { alpha: f64, beta: f64 },
    Uniform { lower: f64, upper: f64 },
    TruncatedNormal { mu: f64, sigma: f64, lower: f64, upper: f64 },
    Normal { mu: f64, sigma: f64 },
    Gamma { alpha: f64, beta: f64 },
}

/// Description of a prior as one vector-shaped random variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSpec {
    pub name: String,
    pub shape: [usize; 1],
    pub family: SamplerFamily,
}

/// A named prior distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Prior {
    name: String,
    size: usize,
    distribution: PriorDistribution,
    fitted: bool,
}

impl Prior {
    fn build(name: &str, distribution: PriorDistribution, fitted: bool) -> PriorResult<Self> {
        if name.is_empty() {
            return Err(PriorError::EmptyName);
        }
        Ok(Self { name: name.to_string(), size: 1, distribution, fitted })
    }

    /// Beta prior fitted to a mean and a 95% central credible interval.
    ///
    /// # Errors
    /// Validation errors for the moments, or fitter failures.
    pub fn beta(name: &str, mean: f64, ci: (f64, f64)) -> PriorResult<Self> {
        Self::beta_with_options(name, mean, ci, &FitOptions::default())
    }

    /// Beta prior fitted with custom [`FitOptions`] (interval width, etc.).
    ///
    /// # Errors
    /// Validation errors for the moments, or fitter failures.
    pub fn beta_with_options(
        name: &str, mean: f64, ci: (f64, f64), opts: &FitOptions,
    ) -> PriorResult<Self> {
        if name.is_empty() {
            return Err(PriorError::EmptyName);
        }
        let fit = fit_beta_from_mean_ci(name, mean, ci, opts)?;
        Self::build(name, PriorDistribution::beta(fit.a, fit.b)?, true)
    }

    /// Beta prior from native shape parameters.
    ///
    /// # Errors
    /// [`PriorError::InvalidShape`] for non-positive shapes.
    pub fn beta_from_params(name: &str, a: f64, b: f64) -> PriorResult<Self> {
        Self::build(name, PriorDistribution::beta(a, b)?, false)
    }

    /// Uniform prior on `domain`.
    ///
    /// # Errors
    /// [`PriorError::InvalidDomain`] unless `start < end`, both finite.
    pub fn uniform(name: &str, domain: (f64, f64)) -> PriorResult<Self> {
        Self::build(name, PriorDistribution::uniform(domain)?, false)
    }

    /// Normal prior truncated to `trunc_range` (bounds may be infinite).
    ///
    /// # Errors
    /// Validation errors for the mean, standard deviation, or range.
    pub fn trunc_normal(
        name: &str, mean: f64, stdev: f64, trunc_range: (f64, f64),
    ) -> PriorResult<Self> {
        Self::build(name, PriorDistribution::trunc_normal(mean, stdev, trunc_range)?, false)
    }

    /// Normal prior.
    ///
    /// # Errors
    /// Validation errors for the mean or standard deviation.
    pub fn normal(name: &str, mean: f64, stdev: f64) -> PriorResult<Self> {
        Self::build(name, PriorDistribution::normal(mean, stdev)?, false)
    }

    /// Gamma prior fitted to a mode and the upper bound of its 99% central interval.
    ///
    /// # Errors
    /// Validation errors, or [`PriorError::FitNotConverged`] for infeasible targets.
    pub fn gamma_from_mode(name: &str, mode: f64, upper_ci: f64) -> PriorResult<Self> {
        Self::gamma_from_mode_with_options(name, mode, upper_ci, &FitOptions::default())
    }

    /// [`Prior::gamma_from_mode`] with custom [`FitOptions`].
    ///
    /// # Errors
    /// As [`Prior::gamma_from_mode`].
    pub fn gamma_from_mode_with_options(
        name: &str, mode: f64, upper_ci: f64, opts: &FitOptions,
    ) -> PriorResult<Self> {
        Self::fitted_gamma(name, GammaMoment::Mode, mode, upper_ci, opts)
    }

    /// Gamma prior fitted to a mean and the upper bound of its 99% central interval.
    ///
    /// # Errors
    /// Validation errors, or [`PriorError::FitNotConverged`] for infeasible targets.
    pub fn gamma_from_mean(name: &str, mean: f64, upper_ci: f64) -> PriorResult<Self> {
        Self::gamma_from_mean_with_options(name, mean, upper_ci, &FitOptions::default())
    }

    /// [`Prior::gamma_from_mean`] with custom [`FitOptions`].
    ///
    /// # Errors
    /// As [`Prior::gamma_from_mean`].
    pub fn gamma_from_mean_with_options(
        name: &str, mean: f64, upper_ci: f64, opts: &FitOptions,
    ) -> PriorResult<Self> {
        Self::fitted_gamma(name, GammaMoment::Mean, mean, upper_ci, opts)
    }

    /// Gamma prior from native shape `k` and scale `θ`.
    ///
    /// # Errors
    /// [`PriorError::InvalidShape`] / [`PriorError::InvalidScale`].
    pub fn gamma_from_params(name: &str, shape: f64, scale: f64) -> PriorResult<Self> {
        Self::build(name, PriorDistribution::gamma(shape, scale)?, false)
    }

    fn fitted_gamma(
        name: &str, moment: GammaMoment, target: f64, upper_ci: f64, opts: &FitOptions,
    ) -> PriorResult<Self> {
        if name.is_empty() {
            return Err(PriorError::EmptyName);
        }
        let fit = fit_gamma(name, moment, target, upper_ci, opts)?;
        Self::build(name, PriorDistribution::gamma(fit.shape, fit.scale)?, true)
    }

    /// Turn this prior into an i.i.d. vector prior of `size` components.
    ///
    /// # Errors
    /// [`PriorError::InvalidSize`] if `size == 0`.
    pub fn with_size(mut self, size: usize) -> PriorResult<Self> {
        if size == 0 {
            return Err(PriorError::InvalidSize { size });
        }
        self.size = size;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn distribution(&self) -> &PriorDistribution {
        &self.distribution
    }

    /// Parameter-map keys for this prior: `[name]` for scalars,
    /// `name[0] .. name[size-1]` for vector priors.
    pub fn component_names(&self) -> Vec<String> {
        if self.size == 1 {
            vec![self.name.clone()]
        } else {
            (0..self.size).map(|i| format!("{}[{i}]", self.name)).collect()
        }
    }

    pub fn ppf(&self, q: f64) -> f64 {
        self.distribution.ppf(q)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.distribution.cdf(x)
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.distribution.pdf(x)
    }

    pub fn logpdf(&self, x: f64) -> f64 {
        self.distribution.logpdf(x)
    }

    /// Central interval of mass `confidence`; `1.0` gives the full support.
    ///
    /// # Errors
    /// [`PriorError::InvalidConfidence`] unless `confidence ∈ (0, 1]`.
    pub fn bounds(&self, confidence: f64) -> PriorResult<(f64, f64)> {
        self.distribution.interval(confidence)
    }

    /// Tabulate the density or CDF on an even grid over the 99% bounds.
    ///
    /// Returns `(x, y)` with [`SERIES_POINTS`] entries each.
    ///
    /// # Errors
    /// Propagates [`Prior::bounds`] errors.
    pub fn get_series(&self, func: FitFunc) -> PriorResult<(Array1<f64>, Array1<f64>)> {
        let (lo, hi) = self.bounds(DISPLAY_CONFIDENCE)?;
        let x = Array1::linspace(lo, hi, SERIES_POINTS);
        let y = match func {
            FitFunc::Pdf => x.mapv(|v| self.pdf(v)),
            FitFunc::Cdf => x.mapv(|v| self.cdf(v)),
        };
        Ok((x, y))
    }

    /// Native-parameter description for external sampler construction.
    pub fn sampler_spec(&self) -> SamplerSpec {
        let family = match *self.distribution() {
            PriorDistribution::Beta { a, b, .. } => SamplerFamily::Beta { alpha: a, beta: b },
            PriorDistribution::Uniform { start, end, .. } => {
                SamplerFamily::Uniform { lower: start, upper: end }
            }
            PriorDistribution::TruncNormal { mean, stdev, lower, upper, .. } => {
                SamplerFamily::TruncatedNormal { mu: mean, sigma: stdev, lower, upper }
            }
            PriorDistribution::Normal { mean, stdev, .. } => {
                SamplerFamily::Normal { mu: mean, sigma: stdev }
            }
            PriorDistribution::Gamma { shape, scale, .. } => {
                SamplerFamily::Gamma { alpha: shape, beta: 1.0 / scale }
            }
        };
        SamplerSpec { name: self.name.clone(), shape: [self.size], family }
    }
}

impl fmt::Display for Prior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.distribution.family(), self.name)?;
        match *self.distribution() {
            PriorDistribution::Beta { a, b, .. } => write!(f, " {{a: {a}, b: {b}}}")?,
            PriorDistribution::Uniform { start, end, .. } => {
                write!(f, " {{start: {start}, end: {end}}}")?
            }
            PriorDistribution::TruncNormal { mean, stdev, lower, upper, .. } => {
                write!(f, " {{mean: {mean}, stdev: {stdev}, range: [{lower}, {upper}]}}")?
            }
            PriorDistribution::Normal { mean, stdev, .. } => {
                write!(f, " {{mean: {mean}, stdev: {stdev}}}")?
            }
            PriorDistribution::Gamma { shape, scale, .. } => {
                write!(f, " {{shape: {shape}, scale: {scale}}}")?
            }
        }
        if self.size > 1 {
            write!(f, " x{}", self.size)?;
        }
        if self.fitted {
            if let Ok((lo, hi)) = self.bounds(DISPLAY_CONFIDENCE) {
                write!(f, " (99% bounds: [{lo:.6}, {hi:.6}])")?;
            }
        }
        Ok(())
    }
}

pub mod prelude {
    pub use super::{
        FitFunc, Prior, SAMPLING_AVAILABLE, SamplerFamily, SamplerSpec,
        distributions::PriorDistribution,
        errors::{PriorError, PriorResult},
        options::FitOptions,
    };
    #[cfg(feature = "sampling")]
    pub use super::sampling::PriorSampler;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // `ppf(cdf(x)) ≈ x` in the support interior for every variant.
    fn ppf_inverts_cdf_for_every_variant() {
        let priors = [
            Prior::beta_from_params("a", 2.5, 7.0).unwrap(),
            Prior::uniform("b", (-1.0, 3.0)).unwrap(),
            Prior::trunc_normal("c", 0.5, 2.0, (0.0, f64::INFINITY)).unwrap(),
            Prior::normal("d", 1.0, 0.3).unwrap(),
            Prior::gamma_from_params("e", 3.0, 1.5).unwrap(),
        ];
        for prior in &priors {
            let (lo, hi) = prior.bounds(0.9).unwrap();
            for i in 1..10 {
                let x = lo + (hi - lo) * i as f64 / 10.0;
                let back = prior.ppf(prior.cdf(x));
                assert!((back - x).abs() < 1e-7 * x.abs().max(1.0), "{prior}: x = {x}");
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Identity validation: empty names and zero sizes are rejected.
    fn rejects_empty_name_and_zero_size() {
        assert_eq!(Prior::normal("", 0.0, 1.0).unwrap_err(), PriorError::EmptyName);
        assert_eq!(Prior::beta("", 0.5, (0.2, 0.8)).unwrap_err(), PriorError::EmptyName);
        let err = Prior::normal("x", 0.0, 1.0).unwrap().with_size(0).unwrap_err();
        assert_eq!(err, PriorError::InvalidSize { size: 0 });
    }

    #[test]
    // Purpose
    // -------
    // Vector priors address components as `name[i]` and report their shape.
    fn vector_priors_expose_component_names_and_shape() {
        let prior = Prior::uniform("w", (0.0, 1.0)).unwrap().with_size(3).unwrap();
        assert_eq!(prior.component_names(), vec!["w[0]", "w[1]", "w[2]"]);
        assert_eq!(prior.sampler_spec().shape, [3]);

        let scalar = Prior::uniform("w", (0.0, 1.0)).unwrap();
        assert_eq!(scalar.component_names(), vec!["w"]);
    }

    #[test]
    // Purpose
    // -------
    // Gamma sampler specs use the rate convention.
    fn sampler_spec_uses_gamma_rate() {
        let prior = Prior::gamma_from_params("g", 2.0, 4.0).unwrap();
        assert_eq!(
            prior.sampler_spec().family,
            SamplerFamily::Gamma { alpha: 2.0, beta: 0.25 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Series tabulation spans the 99% bounds and the CDF is monotone.
    fn get_series_spans_display_bounds() {
        let prior = Prior::normal("n", 0.0, 1.0).unwrap();
        let (x, y) = prior.get_series(FitFunc::Cdf).unwrap();
        let (lo, hi) = prior.bounds(0.99).unwrap();

        assert_eq!(x.len(), SERIES_POINTS);
        assert!((x[0] - lo).abs() < 1e-12 && (x[SERIES_POINTS - 1] - hi).abs() < 1e-12);
        assert!(y.windows(2).into_iter().all(|w| w[1] >= w[0]));
        assert!((y[0] - 0.005).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Fitted priors show their resolved 99% bounds; closed-form ones do not.
    fn display_shows_bounds_for_fitted_priors() {
        let fitted = Prior::beta("p", 0.3, (0.2, 0.4)).unwrap();
        let text = fitted.to_string();
        assert!(text.starts_with("BetaPrior p {a: "), "{text}");
        assert!(text.contains("99% bounds"), "{text}");

        let plain = Prior::uniform("u", (0.0, 2.0)).unwrap().to_string();
        assert_eq!(plain, "UniformPrior u {start: 0, end: 2}");
    }

    #[test]
    // Purpose
    // -------
    // The capability flag tracks the `sampling` feature.
    fn sampling_flag_matches_feature() {
        assert_eq!(SAMPLING_AVAILABLE, cfg!(feature = "sampling"));
    }
}
