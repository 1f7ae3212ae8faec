//! Backing distributions for priors.
//!
//! Purpose
//! -------
//! Provide the closed set of distribution families a [`Prior`](crate::priors::Prior)
//! can wrap, each exposing the same capability set: `ppf`, `cdf`, `pdf`,
//! `logpdf`, `support`, and central `interval`s. Dispatch is an explicit
//! `match` over [`PriorDistribution`]; there is no open-ended trait object.
//!
//! Key behaviors
//! -------------
//! - Densities and CDFs delegate to `statrs` where it has the family
//!   (Beta, Uniform, Normal, Gamma); the truncated normal is written out
//!   from standard-normal helpers.
//! - Quantiles: `statrs` `inverse_cdf` for Beta and Normal, closed form for
//!   Uniform and the truncated Normal (evaluated in whichever tail the range
//!   sits). Gamma quantiles come from `statrs` and are re-solved by bracketed
//!   bisection when its Newton step fails to converge.
//!
//! Invariants & assumptions
//! ------------------------
//! - Variants are only built through the validating constructors below, so
//!   the stored `statrs` objects always exist and parameters are finite.
//! - `ppf(q)` returns `NaN` for `q ∉ [0, 1]`, and the support edges at
//!   `q = 0` / `q = 1`.
use crate::{
    numerics::special::{invert_cdf, std_normal_cdf, std_normal_mass, std_normal_ppf},
    priors::errors::{PriorError, PriorResult},
};
use statrs::{
    consts::LN_SQRT_2PI,
    distribution::{Beta, Continuous, ContinuousCDF, Gamma, Normal, Uniform},
};

/// Closed set of prior distribution families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriorDistribution {
    /// Beta(a, b) on (0, 1).
    Beta { a: f64, b: f64, dist: Beta },
    /// Uniform on `[start, end]`.
    Uniform { start: f64, end: f64, dist: Uniform },
    /// Normal(mean, stdev) truncated to `[lower, upper]`.
    TruncNormal { mean: f64, stdev: f64, lower: f64, upper: f64, mass: f64 },
    /// Normal(mean, stdev).
    Normal { mean: f64, stdev: f64, dist: Normal },
    /// Gamma with shape `k` and scale `θ` (mean `kθ`).
    Gamma { shape: f64, scale: f64, dist: Gamma },
}

impl PriorDistribution {
    /// Beta distribution from native shape parameters.
    ///
    /// # Errors
    /// [`PriorError::InvalidShape`] if `a` or `b` is non-finite or ≤ 0.
    pub fn beta(a: f64, b: f64) -> PriorResult<Self> {
        let a = verify_shape(a)?;
        let b = verify_shape(b)?;
        Ok(PriorDistribution::Beta { a, b, dist: Beta::new(a, b)? })
    }

    /// Uniform distribution on `domain = (start, end)`.
    ///
    /// # Errors
    /// [`PriorError::InvalidDomain`] unless both ends are finite and `start < end`.
    pub fn uniform(domain: (f64, f64)) -> PriorResult<Self> {
        let (start, end) = domain;
        if !(start.is_finite() && end.is_finite() && start < end) {
            return Err(PriorError::InvalidDomain { start, end });
        }
        Ok(PriorDistribution::Uniform { start, end, dist: Uniform::new(start, end)? })
    }

    /// Normal distribution truncated to `trunc_range`.
    ///
    /// Bounds may be infinite (half-truncated or untruncated), but the range
    /// must be ordered and carry positive probability mass.
    ///
    /// # Errors
    /// - [`PriorError::InvalidMean`] if `mean` is not finite.
    /// - [`PriorError::InvalidStdev`] if `stdev` is not finite and > 0.
    /// - [`PriorError::InvalidInterval`] for an unordered or massless range.
    pub fn trunc_normal(mean: f64, stdev: f64, trunc_range: (f64, f64)) -> PriorResult<Self> {
        if !mean.is_finite() {
            return Err(PriorError::InvalidMean { value: mean, reason: "Mean must be finite." });
        }
        let stdev = verify_stdev(stdev)?;
        let (lower, upper) = trunc_range;
        if lower.is_nan() || upper.is_nan() || lower >= upper {
            return Err(PriorError::InvalidInterval {
                lo: lower,
                hi: upper,
                reason: "Truncation range must satisfy lower < upper.",
            });
        }
        let mass = std_normal_mass((lower - mean) / stdev, (upper - mean) / stdev);
        if !(mass > 0.0) {
            return Err(PriorError::InvalidInterval {
                lo: lower,
                hi: upper,
                reason: "Truncation range carries no probability mass.",
            });
        }
        Ok(PriorDistribution::TruncNormal { mean, stdev, lower, upper, mass })
    }

    /// Normal distribution.
    ///
    /// # Errors
    /// - [`PriorError::InvalidMean`] if `mean` is not finite.
    /// - [`PriorError::InvalidStdev`] if `stdev` is not finite and > 0.
    pub fn normal(mean: f64, stdev: f64) -> PriorResult<Self> {
        if !mean.is_finite() {
            return Err(PriorError::InvalidMean { value: mean, reason: "Mean must be finite." });
        }
        let stdev = verify_stdev(stdev)?;
        Ok(PriorDistribution::Normal { mean, stdev, dist: Normal::new(mean, stdev)? })
    }

    /// Gamma distribution from shape `k` and scale `θ`.
    ///
    /// # Errors
    /// - [`PriorError::InvalidShape`] if `shape` is non-finite or ≤ 0.
    /// - [`PriorError::InvalidScale`] if `scale` is non-finite or ≤ 0.
    pub fn gamma(shape: f64, scale: f64) -> PriorResult<Self> {
        let shape = verify_shape(shape)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(PriorError::InvalidScale { value: scale });
        }
        Ok(PriorDistribution::Gamma { shape, scale, dist: Gamma::new(shape, 1.0 / scale)? })
    }

    /// Human-readable family name.
    pub fn family(&self) -> &'static str {
        match self {
            PriorDistribution::Beta { .. } => "BetaPrior",
            PriorDistribution::Uniform { .. } => "UniformPrior",
            PriorDistribution::TruncNormal { .. } => "TruncNormalPrior",
            PriorDistribution::Normal { .. } => "NormalPrior",
            PriorDistribution::Gamma { .. } => "GammaPrior",
        }
    }

    /// Full support `(min, max)` of the distribution.
    pub fn support(&self) -> (f64, f64) {
        match *self {
            PriorDistribution::Beta { .. } => (0.0, 1.0),
            PriorDistribution::Uniform { start, end, .. } => (start, end),
            PriorDistribution::TruncNormal { lower, upper, .. } => (lower, upper),
            PriorDistribution::Normal { .. } => (f64::NEG_INFINITY, f64::INFINITY),
            PriorDistribution::Gamma { .. } => (0.0, f64::INFINITY),
        }
    }

    /// Percent point function (inverse CDF) at `q`.
    pub fn ppf(&self, q: f64) -> f64 {
        if !(0.0..=1.0).contains(&q) {
            return f64::NAN;
        }
        match *self {
            PriorDistribution::Beta { dist, .. } => dist.inverse_cdf(q),
            PriorDistribution::Uniform { start, end, .. } => start + q * (end - start),
            PriorDistribution::TruncNormal { mean, stdev, lower, upper, mass } => {
                if q == 0.0 {
                    return lower;
                }
                if q == 1.0 {
                    return upper;
                }
                let alpha = (lower - mean) / stdev;
                let z = if alpha > 0.0 {
                    // Upper-tail range: Φ(alpha) rounds to 1, so count mass down from beta.
                    let beta = (upper - mean) / stdev;
                    -std_normal_ppf(std_normal_cdf(-beta) + (1.0 - q) * mass)
                } else {
                    std_normal_ppf(std_normal_cdf(alpha) + q * mass)
                };
                (mean + stdev * z).clamp(lower, upper)
            }
            PriorDistribution::Normal { dist, .. } => dist.inverse_cdf(q),
            PriorDistribution::Gamma { dist, .. } => gamma_ppf(&dist, q),
        }
    }

    /// Cumulative distribution function at `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        match *self {
            PriorDistribution::Beta { dist, .. } => dist.cdf(x),
            PriorDistribution::Uniform { dist, .. } => dist.cdf(x),
            PriorDistribution::TruncNormal { mean, stdev, lower, upper, mass } => {
                if x <= lower {
                    0.0
                } else if x >= upper {
                    1.0
                } else {
                    let alpha = (lower - mean) / stdev;
                    let z = (x - mean) / stdev;
                    (std_normal_mass(alpha, z) / mass).clamp(0.0, 1.0)
                }
            }
            PriorDistribution::Normal { dist, .. } => dist.cdf(x),
            PriorDistribution::Gamma { dist, .. } => dist.cdf(x),
        }
    }

    /// Probability density function at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        match *self {
            PriorDistribution::TruncNormal { .. } => self.logpdf(x).exp(),
            PriorDistribution::Beta { dist, .. } => dist.pdf(x),
            PriorDistribution::Uniform { dist, .. } => dist.pdf(x),
            PriorDistribution::Normal { dist, .. } => dist.pdf(x),
            PriorDistribution::Gamma { dist, .. } => dist.pdf(x),
        }
    }

    /// Log probability density function at `x`; `-∞` outside the support.
    pub fn logpdf(&self, x: f64) -> f64 {
        match *self {
            PriorDistribution::Beta { dist, .. } => dist.ln_pdf(x),
            PriorDistribution::Uniform { dist, .. } => dist.ln_pdf(x),
            PriorDistribution::TruncNormal { mean, stdev, lower, upper, mass } => {
                if x.is_nan() {
                    return f64::NAN;
                }
                if x < lower || x > upper {
                    return f64::NEG_INFINITY;
                }
                let z = (x - mean) / stdev;
                -0.5 * z * z - LN_SQRT_2PI - stdev.ln() - mass.ln()
            }
            PriorDistribution::Normal { dist, .. } => dist.ln_pdf(x),
            PriorDistribution::Gamma { dist, .. } => dist.ln_pdf(x),
        }
    }

    /// Central interval containing mass `confidence`.
    ///
    /// `confidence == 1.0` returns the full support.
    ///
    /// # Errors
    /// [`PriorError::InvalidConfidence`] unless `confidence ∈ (0, 1]`.
    pub fn interval(&self, confidence: f64) -> PriorResult<(f64, f64)> {
        if !(confidence > 0.0 && confidence <= 1.0) {
            return Err(PriorError::InvalidConfidence { value: confidence });
        }
        if confidence == 1.0 {
            return Ok(self.support());
        }
        let tail = (1.0 - confidence) / 2.0;
        Ok((self.ppf(tail), self.ppf(1.0 - tail)))
    }

    /// Mode of a Gamma-shaped distribution, `(k − 1)θ` for `k ≥ 1` and `0` otherwise.
    pub(crate) fn gamma_mode(shape: f64, scale: f64) -> f64 {
        if shape >= 1.0 { (shape - 1.0) * scale } else { 0.0 }
    }
}

/// Largest `|cdf(x) − q|` accepted from the `statrs` Gamma quantile.
const GAMMA_PPF_CDF_TOL: f64 = 1e-12;

/// Gamma quantile.
///
/// `statrs` runs eight bisection steps and then an unguarded Newton iteration.
/// For shapes below one the Newton step can leave the support and return
/// `NaN`, or stop short of convergence. Those results are re-solved by
/// bracketed bisection on the CDF.
fn gamma_ppf(dist: &Gamma, q: f64) -> f64 {
    let x = dist.inverse_cdf(q);
    if x.is_finite() && x > 0.0 && (dist.cdf(x) - q).abs() <= GAMMA_PPF_CDF_TOL {
        return x;
    }
    invert_cdf(|t| dist.cdf(t), q, 0.0, None)
}

fn verify_shape(value: f64) -> PriorResult<f64> {
    if !(value.is_finite() && value > 0.0) {
        return Err(PriorError::InvalidShape { value });
    }
    Ok(value)
}

fn verify_stdev(value: f64) -> PriorResult<f64> {
    if !(value.is_finite() && value > 0.0) {
        return Err(PriorError::InvalidStdev { value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Constructor validation for every family.
    // - ppf/cdf consistency in the support interior.
    // - Truncated-normal normalization and support handling.
    //
    // These tests intentionally DO NOT cover:
    // - Moment fitting (see `priors::fitting`).
    // -------------------------------------------------------------------------

    fn all_families() -> Vec<PriorDistribution> {
        vec![
            PriorDistribution::beta(2.5, 7.0).unwrap(),
            PriorDistribution::uniform((-1.0, 3.0)).unwrap(),
            PriorDistribution::trunc_normal(0.5, 2.0, (0.0, 4.0)).unwrap(),
            PriorDistribution::normal(-2.0, 0.7).unwrap(),
            PriorDistribution::gamma(3.0, 1.5).unwrap(),
        ]
    }

    #[test]
    // Purpose
    // -------
    // `ppf` inverts `cdf` across the interior of every family's support.
    //
    // Given
    // -----
    // - One instance per family and the 1%..99% central range.
    //
    // Expect
    // ------
    // - `ppf(cdf(x)) ≈ x` to 1e-8 (relative to |x| ∨ 1).
    fn ppf_inverts_cdf_in_interior() {
        for dist in all_families() {
            let (lo, hi) = dist.interval(0.98).unwrap();
            for i in 1..20 {
                let x = lo + (hi - lo) * (i as f64) / 20.0;
                let back = dist.ppf(dist.cdf(x));
                assert!(
                    (back - x).abs() <= 1e-8 * x.abs().max(1.0),
                    "{}: x = {x}, ppf(cdf(x)) = {back}",
                    dist.family()
                );
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Full-confidence intervals are the support; others are nested in it.
    fn interval_full_mass_is_support() {
        for dist in all_families() {
            assert_eq!(dist.interval(1.0).unwrap(), dist.support());
            let (lo, hi) = dist.interval(0.5).unwrap();
            let (slo, shi) = dist.support();
            assert!(slo <= lo && lo < hi && hi <= shi);
        }
        let dist = PriorDistribution::normal(0.0, 1.0).unwrap();
        assert!(matches!(dist.interval(0.0), Err(PriorError::InvalidConfidence { .. })));
        assert!(matches!(dist.interval(1.5), Err(PriorError::InvalidConfidence { .. })));
    }

    #[test]
    // Purpose
    // -------
    // The truncated normal integrates to one over its range and vanishes
    // outside it.
    //
    // Given
    // -----
    // - Normal(0.5, 2) truncated to [0, 4]; trapezoid rule on 4000 panels.
    //
    // Expect
    // ------
    // - Integral ≈ 1, `pdf` zero and `logpdf` `-∞` outside the range.
    fn trunc_normal_is_normalized() {
        let dist = PriorDistribution::trunc_normal(0.5, 2.0, (0.0, 4.0)).unwrap();
        let n = 4000;
        let h = 4.0 / n as f64;
        let mut integral = 0.5 * (dist.pdf(0.0) + dist.pdf(4.0));
        for i in 1..n {
            integral += dist.pdf(i as f64 * h);
        }
        integral *= h;
        assert!((integral - 1.0).abs() < 1e-6, "integral = {integral}");
        assert_eq!(dist.pdf(-0.1), 0.0);
        assert_eq!(dist.logpdf(4.1), f64::NEG_INFINITY);
        assert_eq!(dist.cdf(5.0), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Constructors reject invalid native parameters.
    fn constructors_validate_parameters() {
        assert!(matches!(PriorDistribution::beta(0.0, 1.0), Err(PriorError::InvalidShape { .. })));
        assert!(matches!(
            PriorDistribution::uniform((2.0, 1.0)),
            Err(PriorError::InvalidDomain { .. })
        ));
        assert!(matches!(
            PriorDistribution::trunc_normal(0.0, 1.0, (3.0, 1.0)),
            Err(PriorError::InvalidInterval { .. })
        ));
        assert!(matches!(PriorDistribution::normal(0.0, -1.0), Err(PriorError::InvalidStdev { .. })));
        assert!(matches!(
            PriorDistribution::gamma(2.0, f64::INFINITY),
            Err(PriorError::InvalidScale { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A truncation range far in the upper tail keeps distinct quantiles.
    //
    // Given
    // -----
    // - N(0, 1) truncated to [10, 20], where Φ(10) rounds to 1. The median
    //   solves Φ(−x) = Φ(−10)/2, near 10 + ln 2 / 10.
    //
    // Expect
    // ------
    // - `ppf(0.5)` close to 10.068, strictly inside the range.
    // - `ppf(cdf(x)) ≈ x` near the lower edge.
    // - The mirrored range [−20, −10] gives the mirrored median.
    fn trunc_normal_far_tail_quantiles() {
        let dist = PriorDistribution::trunc_normal(0.0, 1.0, (10.0, 20.0)).unwrap();
        let median = dist.ppf(0.5);
        assert!(median > 10.05 && median < 10.09, "median = {median}");
        assert!((dist.cdf(median) - 0.5).abs() < 1e-9);
        for x in [10.01, 10.05, 10.2, 10.5] {
            let back = dist.ppf(dist.cdf(x));
            assert!((back - x).abs() < 1e-8, "x = {x}, ppf(cdf(x)) = {back}");
        }

        let mirrored = PriorDistribution::trunc_normal(0.0, 1.0, (-20.0, -10.0)).unwrap();
        assert!((mirrored.ppf(0.5) + median).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Gamma quantiles stay accurate where the `statrs` Newton step diverges.
    //
    // Given
    // -----
    // - Gamma(k = 0.5, θ = 10) at q = 0.01 (statrs rate 0.1). Its quantile
    //   overshoots below zero and comes back as a non-finite value.
    //
    // Expect
    // ------
    // - `statrs` alone is non-finite; `ppf` is finite, positive and
    //   satisfies `cdf(ppf(q)) ≈ q`.
    fn gamma_ppf_recovers_from_statrs_divergence() {
        let raw = Gamma::new(0.5, 0.1).unwrap().inverse_cdf(0.01);
        assert!(!raw.is_finite(), "statrs quantile = {raw}");

        let dist = PriorDistribution::gamma(0.5, 10.0).unwrap();
        let x = dist.ppf(0.01);
        assert!(x.is_finite() && x > 0.0);
        assert!((dist.cdf(x) - 0.01).abs() < 1e-12, "x = {x}");
    }

    #[test]
    // Purpose
    // -------
    // The Gamma variant uses the shape/scale parameterization (mean kθ).
    //
    // Given
    // -----
    // - Gamma(k = 3, θ = 1.5): median ≈ 4.011090.
    //
    // Expect
    // ------
    // - `ppf(0.5)` matches the reference median.
    fn gamma_uses_scale_parameterization() {
        let dist = PriorDistribution::gamma(3.0, 1.5).unwrap();
        assert!((dist.ppf(0.5) - 4.011_090_47).abs() < 1e-7);
        assert_eq!(PriorDistribution::gamma_mode(3.0, 1.5), 3.0);
        assert_eq!(PriorDistribution::gamma_mode(0.5, 1.5), 0.0);
    }
}
