//! Special functions and guarded log densities.
//!
//! The densities here mirror the conventions of the scientific stacks that
//! calibration users compare against:
//! - `normal_ln_pdf(x, loc, scale)`
//! - `truncnorm_ln_pdf(x, loc, scale, a, b)` with **standardized** bounds
//!   `a = (lo - loc) / scale`, `b = (hi - loc) / scale`
//! - `nbinom_ln_pmf(k, n, p)`: failures `k` before `n` successes with
//!   success probability `p`
//! - `binom_ln_pmf(k, n, p)`: continuous in `k` via log-gamma
use statrs::{
    consts::LN_SQRT_2PI,
    function::{
        erf::{erfc, erfc_inv},
        gamma::ln_gamma,
    },
};
use std::f64::consts::SQRT_2;

/// Hard cap on bisection steps in [`invert_cdf`].
pub const QUANTILE_MAX_ITERS: usize = 2200;

/// Standard normal CDF `Φ(z)`.
pub fn std_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// Standard normal quantile `Φ⁻¹(p)` for `p ∈ [0, 1]`; `NaN` otherwise.
pub fn std_normal_ppf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Mass of the standard normal between `a` and `b` (`a < b`).
///
/// Evaluated in whichever tail keeps the difference well conditioned.
pub fn std_normal_mass(a: f64, b: f64) -> f64 {
    if a > 0.0 { std_normal_cdf(-a) - std_normal_cdf(-b) } else { std_normal_cdf(b) - std_normal_cdf(a) }
}

/// `x * ln(y)`, defined as `0` when `x == 0` (even if `y == 0`).
pub fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 && !y.is_nan() { 0.0 } else { x * y.ln() }
}

/// `x * ln(1 + y)`, defined as `0` when `x == 0`.
pub fn xlog1py(x: f64, y: f64) -> f64 {
    if x == 0.0 && !y.is_nan() { 0.0 } else { x * y.ln_1p() }
}

/// Invert a monotone non-decreasing CDF by bisection.
///
/// Parameters
/// ----------
/// - `cdf`: the distribution function.
/// - `q`: target probability in `[0, 1]`.
/// - `lower`: finite lower edge of the support.
/// - `upper`: finite upper edge of the support, or `None` for unbounded
///   support (the bracket is then doubled until it contains `q`).
///
/// Returns
/// -------
/// The smallest bracketed `x` with `cdf(x) >= q`, to within a couple of ulps,
/// `lower`/`upper` at the endpoints, and `NaN` for `q` outside `[0, 1]`.
pub fn invert_cdf<F: Fn(f64) -> f64>(cdf: F, q: f64, lower: f64, upper: Option<f64>) -> f64 {
    if !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    if q == 0.0 {
        return lower;
    }
    let mut high = match upper {
        Some(u) => {
            if q == 1.0 {
                return u;
            }
            u
        }
        None => {
            if q == 1.0 {
                return f64::INFINITY;
            }
            let mut h = lower.abs().max(1.0) + lower;
            while cdf(h) < q {
                h = lower + 2.0 * (h - lower);
                if !h.is_finite() {
                    return f64::INFINITY;
                }
            }
            h
        }
    };
    let mut low = lower;
    for _ in 0..QUANTILE_MAX_ITERS {
        let mid = low + 0.5 * (high - low);
        if mid <= low || mid >= high {
            break;
        }
        if cdf(mid) < q {
            low = mid;
        } else {
            high = mid;
        }
        if high - low <= 2.0 * f64::EPSILON * high.abs() {
            break;
        }
    }
    high
}

/// Normal log density at `x` with location `loc` and scale `scale`.
pub fn normal_ln_pdf(x: f64, loc: f64, scale: f64) -> f64 {
    if !(scale > 0.0) {
        return f64::NAN;
    }
    let z = (x - loc) / scale;
    -0.5 * z * z - scale.ln() - LN_SQRT_2PI
}

/// Truncated-normal log density at `x`.
///
/// `a` and `b` are the truncation bounds expressed in standard deviations
/// from `loc`. Points outside `[a, b]` give `-∞`.
pub fn truncnorm_ln_pdf(x: f64, loc: f64, scale: f64, a: f64, b: f64) -> f64 {
    if !(scale > 0.0) || !(a < b) {
        return f64::NAN;
    }
    let z = (x - loc) / scale;
    if z < a || z > b {
        return f64::NEG_INFINITY;
    }
    -0.5 * z * z - LN_SQRT_2PI - scale.ln() - std_normal_mass(a, b).ln()
}

/// Negative-binomial log PMF: `k` failures before `n` successes, success
/// probability `p`.
///
/// `ln Γ(n+k) − ln Γ(k+1) − ln Γ(n) + n ln p + k ln(1−p)`.
pub fn nbinom_ln_pmf(k: f64, n: f64, p: f64) -> f64 {
    if !(n > 0.0) || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if k < 0.0 {
        return f64::NEG_INFINITY;
    }
    let coeff = ln_gamma(n + k) - ln_gamma(k + 1.0) - ln_gamma(n);
    coeff + xlogy(n, p) + xlog1py(k, -p)
}

/// Binomial log PMF with `n` trials and success probability `p`,
/// continuous in `k` through log-gamma.
pub fn binom_ln_pmf(k: f64, n: f64, p: f64) -> f64 {
    if !(n >= 0.0) || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if k < 0.0 || k > n {
        return f64::NEG_INFINITY;
    }
    let coeff = ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0);
    coeff + xlogy(k, p) + xlog1py(n - k, -p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::{Binomial, Discrete, NegativeBinomial};

    const TOL: f64 = 1e-10;

    #[test]
    // Purpose
    // -------
    // The erf-based standard normal helpers invert each other.
    //
    // Given
    // -----
    // - A grid of probabilities in (0, 1).
    //
    // Expect
    // ------
    // - `Φ(Φ⁻¹(p)) ≈ p`.
    fn std_normal_ppf_inverts_cdf() {
        for p in [1e-6, 0.025, 0.3, 0.5, 0.8, 0.975, 1.0 - 1e-6] {
            let z = std_normal_ppf(p);
            assert!((std_normal_cdf(z) - p).abs() < 1e-12, "p = {p}");
        }
        assert!(std_normal_ppf(-0.1).is_nan());
        assert_eq!(std_normal_ppf(0.0), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Bisection recovers a known quantile on bounded and unbounded supports.
    //
    // Given
    // -----
    // - The exponential(1) CDF `1 - e^{-x}` (unbounded above).
    // - The uniform(0, 1) CDF on a bounded support.
    //
    // Expect
    // ------
    // - `invert_cdf` matches `-ln(1 - q)` and `q` respectively.
    fn invert_cdf_recovers_known_quantiles() {
        let exp_cdf = |x: f64| if x <= 0.0 { 0.0 } else { -(-x).exp_m1() };
        for q in [0.01, 0.5, 0.99, 0.9999] {
            let x = invert_cdf(exp_cdf, q, 0.0, None);
            assert!((x + (-q).ln_1p()).abs() < 1e-12, "q = {q}");
        }
        let unif_cdf = |x: f64| x.clamp(0.0, 1.0);
        assert!((invert_cdf(unif_cdf, 0.3, 0.0, Some(1.0)) - 0.3).abs() < 1e-14);
        assert_eq!(invert_cdf(unif_cdf, 1.0, 0.0, Some(1.0)), 1.0);
        assert!(invert_cdf(unif_cdf, 1.5, 0.0, Some(1.0)).is_nan());
    }

    #[test]
    // Purpose
    // -------
    // Count densities agree with `statrs` at integer arguments.
    //
    // Given
    // -----
    // - NB(r = 3.5, p = 0.4) and Binomial(n = 20, p = 0.3) at several counts.
    //
    // Expect
    // ------
    // - Identical log masses to within `TOL`.
    fn count_densities_match_statrs() {
        let nb = NegativeBinomial::new(3.5, 0.4).unwrap();
        let bin = Binomial::new(0.3, 20).unwrap();
        for k in [0_u64, 1, 4, 11] {
            assert!((nbinom_ln_pmf(k as f64, 3.5, 0.4) - nb.ln_pmf(k)).abs() < TOL);
            assert!((binom_ln_pmf(k as f64, 20.0, 0.3) - bin.ln_pmf(k)).abs() < TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // Degenerate probabilities stay finite when the matching count is zero.
    //
    // Expect
    // ------
    // - `binom_ln_pmf(0, n, 0) == 0` and `binom_ln_pmf(n, n, 1) == 0`.
    // - `nbinom_ln_pmf(0, n, 1) == 0`.
    fn degenerate_probabilities_use_xlogy_convention() {
        assert_eq!(binom_ln_pmf(0.0, 10.0, 0.0), 0.0);
        assert!(binom_ln_pmf(10.0, 10.0, 1.0).abs() < TOL);
        assert!(nbinom_ln_pmf(0.0, 2.0, 1.0).abs() < TOL);
    }

    #[test]
    // Purpose
    // -------
    // With infinitely wide bounds the truncated normal reduces to the normal,
    // and the density is `-∞` outside its bounds.
    fn truncnorm_reduces_to_normal_and_respects_bounds() {
        let a = truncnorm_ln_pdf(1.3, 1.0, 0.5, f64::NEG_INFINITY, f64::INFINITY);
        assert!((a - normal_ln_pdf(1.3, 1.0, 0.5)).abs() < TOL);
        assert_eq!(truncnorm_ln_pdf(3.0, 1.0, 0.5, -1.0, 1.0), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // The standard normal log density at its mode is `ln(1/√(2π))`.
    fn normal_ln_pdf_at_mode() {
        let expected = (1.0 / (2.0 * std::f64::consts::PI).sqrt()).ln();
        assert!((normal_ln_pdf(10.0, 10.0, 1.0) - expected).abs() < 1e-14);
    }
}
