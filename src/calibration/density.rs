//! Vector view of the calibration densities for optimizers and samplers.
//!
//! A [`LogDensity`] lays the prior components out as one `Theta` vector
//! (sorted by prior name, vector priors expanded as `name[i]`) and evaluates
//! the log-likelihood, log-prior, or log-posterior at that vector. Gradients
//! are finite differences: central first, forward when the central stencil
//! hits an evaluation error or produces a non-finite entry.
use crate::{
    calibration::{
        errors::{CalibResult, CalibrationError},
        loglik::CompiledLogLikelihood,
        model::Parameters,
    },
    priors::Prior,
};
use finitediff::FiniteDiff;
use ndarray::Array1;
use std::{cell::RefCell, sync::Arc};

/// Parameter vector.
pub type Theta = Array1<f64>;

/// Gradient vector.
pub type Grad = Array1<f64>;

/// Which density a [`LogDensity`] evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityKind {
    LogLikelihood,
    LogPrior,
    LogPosterior,
}

/// Sum of prior log densities over every component of `priors`.
///
/// # Errors
/// [`CalibrationError::MissingParameter`] for a component absent from `params`.
pub(crate) fn sum_log_prior<'a>(
    priors: impl IntoIterator<Item = &'a Arc<Prior>>, params: &Parameters,
) -> CalibResult<f64> {
    let mut total = 0.0;
    for prior in priors {
        for name in prior.component_names() {
            let value = params
                .get(&name)
                .ok_or_else(|| CalibrationError::MissingParameter { name: name.clone() })?;
            total += prior.logpdf(*value);
        }
    }
    Ok(total)
}

/// Densities as functions of a flat parameter vector.
#[derive(Debug, Clone)]
pub struct LogDensity {
    kind: DensityKind,
    names: Vec<String>,
    priors: Vec<Arc<Prior>>,
    loglikelihood: Arc<CompiledLogLikelihood>,
}

impl LogDensity {
    /// `priors` must be sorted by name.
    pub(crate) fn new(
        kind: DensityKind, priors: Vec<Arc<Prior>>, loglikelihood: Arc<CompiledLogLikelihood>,
    ) -> Self {
        let names = priors.iter().flat_map(|p| p.component_names()).collect();
        Self { kind, names, priors, loglikelihood }
    }

    pub fn kind(&self) -> DensityKind {
        self.kind
    }

    /// Coordinate names, in `Theta` order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn dim(&self) -> usize {
        self.names.len()
    }

    /// # Errors
    /// [`CalibrationError::ThetaLength`] on a length mismatch.
    pub fn parameters_from_theta(&self, theta: &Theta) -> CalibResult<Parameters> {
        if theta.len() != self.dim() {
            return Err(CalibrationError::ThetaLength { expected: self.dim(), found: theta.len() });
        }
        Ok(self.names.iter().cloned().zip(theta.iter().copied()).collect())
    }

    /// # Errors
    /// [`CalibrationError::MissingParameter`] for an absent coordinate.
    pub fn theta_from_parameters(&self, params: &Parameters) -> CalibResult<Theta> {
        self.names
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .copied()
                    .ok_or_else(|| CalibrationError::MissingParameter { name: name.clone() })
            })
            .collect()
    }

    /// Per-coordinate central intervals of mass `confidence`, for box constraints.
    ///
    /// # Errors
    /// Prior interval errors for an invalid `confidence`.
    pub fn bounds(&self, confidence: f64) -> CalibResult<Vec<(f64, f64)>> {
        let mut out = Vec::with_capacity(self.dim());
        for prior in &self.priors {
            let interval = prior.bounds(confidence)?;
            out.extend(std::iter::repeat_n(interval, prior.size()));
        }
        Ok(out)
    }

    /// Density value at `theta`.
    ///
    /// # Errors
    /// Length mismatches, simulator errors, or target evaluation errors.
    pub fn value(&self, theta: &Theta) -> CalibResult<f64> {
        let params = self.parameters_from_theta(theta)?;
        match self.kind {
            DensityKind::LogLikelihood => self.loglikelihood.evaluate(&params),
            DensityKind::LogPrior => sum_log_prior(&self.priors, &params),
            DensityKind::LogPosterior => {
                let lp = sum_log_prior(&self.priors, &params)?;
                if lp == f64::NEG_INFINITY {
                    return Ok(lp);
                }
                Ok(lp + self.loglikelihood.evaluate(&params)?)
            }
        }
    }

    /// Finite-difference gradient at `theta`.
    ///
    /// The closure handed to `finitediff` must return `f64`, so the first
    /// evaluation error is parked in a slot and the closure returns `NaN`.
    ///
    /// # Errors
    /// - [`CalibrationError::ThetaLength`] on a length mismatch.
    /// - Any evaluation error raised by the forward stencil.
    /// - [`CalibrationError::NonFiniteGradient`] if the forward gradient is
    ///   still not finite.
    pub fn gradient(&self, theta: &Theta) -> CalibResult<Grad> {
        if theta.len() != self.dim() {
            return Err(CalibrationError::ThetaLength { expected: self.dim(), found: theta.len() });
        }
        let closure_err: RefCell<Option<CalibrationError>> = RefCell::new(None);
        let func = |x: &Theta| -> f64 {
            match self.value(x) {
                Ok(v) => v,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };

        let central = theta.central_diff(&func);
        if closure_err.borrow().is_none() && validate_grad(&central).is_ok() {
            return Ok(central);
        }

        closure_err.replace(None);
        let forward = theta.forward_diff(&func);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        validate_grad(&forward)?;
        Ok(forward)
    }
}

fn validate_grad(grad: &Grad) -> CalibResult<()> {
    match grad.iter().position(|g| !g.is_finite()) {
        Some(index) => Err(CalibrationError::NonFiniteGradient { index, value: grad[index] }),
        None => Ok(()),
    }
}
