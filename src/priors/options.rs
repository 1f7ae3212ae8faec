//! Fit options for moment-based prior construction.
//!
//! Purpose
//! -------
//! Centralize the numeric knobs used when translating user-friendly moments
//! (mean, mode, credible intervals) into native distribution parameters. The
//! defaults reproduce the established calibration behavior; callers only
//! build a custom [`FitOptions`] when they need a different interval width
//! or a tighter convergence criterion.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ci_width` and `gamma_ci` lie strictly inside (0, 1).
//! - `tol`, `beta_warn_residual` are finite and strictly positive.
//! - `max_retries` and `max_iters` are strictly positive.
//!
//! Conventions
//! -----------
//! - Fields are private. Every way of building a [`FitOptions`] (`new`,
//!   `Default`, the `with_*` setters) validates, so the fitters treat a
//!   value as internally consistent.
use crate::priors::errors::{PriorError, PriorResult};

/// Default central width of the Beta credible interval.
pub const DEFAULT_CI_WIDTH: f64 = 0.95;

/// Default central mass whose upper bound the Gamma fitters match.
pub const DEFAULT_GAMMA_CI: f64 = 0.99;

/// Default number of Nelder–Mead restarts for Gamma fits.
pub const DEFAULT_MAX_RETRIES: usize = 8;

/// Default normalized-loss tolerance for Gamma fits.
pub const DEFAULT_TOL: f64 = 1e-6;

/// Default iteration cap for a single solver run.
pub const DEFAULT_MAX_ITERS: u64 = 1000;

/// Default squared-distance residual above which a Beta fit is logged.
pub const DEFAULT_BETA_WARN_RESIDUAL: f64 = 1e-8;

/// Numeric configuration for prior fitting.
///
/// Fields:
/// - `ci_width`: central mass of the interval matched by Beta fits (0.95).
/// - `gamma_ci`: central mass whose upper bound Gamma fits match (0.99).
/// - `max_retries`: Nelder–Mead restarts for Gamma fits (8).
/// - `tol`: normalized-loss tolerance for Gamma fits (1e-6).
/// - `max_iters`: iteration cap per solver run (1000).
/// - `beta_warn_residual`: Beta residual that triggers a warning log (1e-8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    ci_width: f64,
    gamma_ci: f64,
    max_retries: usize,
    tol: f64,
    max_iters: u64,
    beta_warn_residual: f64,
}

impl FitOptions {
    /// Construct validated fit options.
    ///
    /// # Errors
    /// - [`PriorError::InvalidCiWidth`] if `ci_width` or `gamma_ci` is outside (0, 1).
    /// - [`PriorError::InvalidOption`] for non-positive counts or tolerances.
    pub fn new(
        ci_width: f64, gamma_ci: f64, max_retries: usize, tol: f64, max_iters: u64,
        beta_warn_residual: f64,
    ) -> PriorResult<Self> {
        verify_unit_width(ci_width)?;
        verify_unit_width(gamma_ci)?;
        verify_count("max_retries", max_retries as u64)?;
        verify_count("max_iters", max_iters)?;
        verify_positive("tol", tol)?;
        verify_positive("beta_warn_residual", beta_warn_residual)?;
        Ok(Self { ci_width, gamma_ci, max_retries, tol, max_iters, beta_warn_residual })
    }

    /// Return a copy with a different Beta interval width.
    ///
    /// # Errors
    /// [`PriorError::InvalidCiWidth`] if `ci_width` is outside (0, 1).
    pub fn with_ci_width(mut self, ci_width: f64) -> PriorResult<Self> {
        verify_unit_width(ci_width)?;
        self.ci_width = ci_width;
        Ok(self)
    }

    /// Return a copy with a different Gamma interval mass.
    ///
    /// # Errors
    /// [`PriorError::InvalidCiWidth`] if `gamma_ci` is outside (0, 1).
    pub fn with_gamma_ci(mut self, gamma_ci: f64) -> PriorResult<Self> {
        verify_unit_width(gamma_ci)?;
        self.gamma_ci = gamma_ci;
        Ok(self)
    }

    /// # Errors
    /// [`PriorError::InvalidOption`] if `max_retries == 0`.
    pub fn with_max_retries(mut self, max_retries: usize) -> PriorResult<Self> {
        verify_count("max_retries", max_retries as u64)?;
        self.max_retries = max_retries;
        Ok(self)
    }

    /// # Errors
    /// [`PriorError::InvalidOption`] unless `tol` is finite and > 0.
    pub fn with_tol(mut self, tol: f64) -> PriorResult<Self> {
        verify_positive("tol", tol)?;
        self.tol = tol;
        Ok(self)
    }

    /// # Errors
    /// [`PriorError::InvalidOption`] if `max_iters == 0`.
    pub fn with_max_iters(mut self, max_iters: u64) -> PriorResult<Self> {
        verify_count("max_iters", max_iters)?;
        self.max_iters = max_iters;
        Ok(self)
    }

    /// # Errors
    /// [`PriorError::InvalidOption`] unless `residual` is finite and > 0.
    pub fn with_beta_warn_residual(mut self, residual: f64) -> PriorResult<Self> {
        verify_positive("beta_warn_residual", residual)?;
        self.beta_warn_residual = residual;
        Ok(self)
    }

    pub fn ci_width(&self) -> f64 {
        self.ci_width
    }

    pub fn gamma_ci(&self) -> f64 {
        self.gamma_ci
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn max_iters(&self) -> u64 {
        self.max_iters
    }

    pub fn beta_warn_residual(&self) -> f64 {
        self.beta_warn_residual
    }

    /// Lower and upper percentiles of the central interval of mass `width`.
    pub(crate) fn percentiles(width: f64) -> (f64, f64) {
        let low = (1.0 - width) / 2.0;
        (low, 1.0 - low)
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            ci_width: DEFAULT_CI_WIDTH,
            gamma_ci: DEFAULT_GAMMA_CI,
            max_retries: DEFAULT_MAX_RETRIES,
            tol: DEFAULT_TOL,
            max_iters: DEFAULT_MAX_ITERS,
            beta_warn_residual: DEFAULT_BETA_WARN_RESIDUAL,
        }
    }
}

fn verify_unit_width(width: f64) -> PriorResult<()> {
    if !(width.is_finite() && width > 0.0 && width < 1.0) {
        return Err(PriorError::InvalidCiWidth { width });
    }
    Ok(())
}

fn verify_count(name: &'static str, value: u64) -> PriorResult<()> {
    if value == 0 {
        return Err(PriorError::InvalidOption {
            name,
            value: 0.0,
            reason: "Count must be greater than zero.",
        });
    }
    Ok(())
}

fn verify_positive(name: &'static str, value: f64) -> PriorResult<()> {
    if !value.is_finite() {
        return Err(PriorError::InvalidOption { name, value, reason: "Value must be finite." });
    }
    if value <= 0.0 {
        return Err(PriorError::InvalidOption { name, value, reason: "Value must be positive." });
    }
    Ok(())
}
