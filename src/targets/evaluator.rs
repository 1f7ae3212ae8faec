//! Per-target log-likelihood evaluators.
//!
//! A [`TargetEvaluator`] is built once per target against the simulation
//! grid. It owns everything an evaluation needs (aligned observations,
//! output positions, normalized time weights, auxiliary arrays, and the
//! noise parameter resolved to a fixed value or a parameter name) so that
//! [`TargetEvaluator::evaluate`] is a pure function of the modelled series
//! and the parameter map.
//!
//! Reduction: with time weights the contribution is `Σ(ll·w)·weight`,
//! without them `mean(ll)·weight`.
use crate::{
    calibration::model::Parameters,
    numerics::special::{binom_ln_pmf, nbinom_ln_pmf, normal_ln_pdf, truncnorm_ln_pdf},
    targets::{
        errors::{TargetError, TargetResult},
        series::TimeIndex,
        target::{CustomEval, DistriParam, NoiseModel, Target},
    },
};
use ndarray::{Array1, Zip};
use std::fmt;
use tracing::warn;

/// Floor applied to the negative-binomial mean ratio `μ/(μ+n)` when it is exactly zero.
pub const NB_P_FLOOR: f64 = 1e-16;

/// A noise parameter resolved at build time.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedParam {
    Fixed(f64),
    Named(String),
}

impl ResolvedParam {
    fn from_distri(param: &DistriParam) -> Self {
        match param {
            DistriParam::Fixed(value) => ResolvedParam::Fixed(*value),
            DistriParam::Prior(prior) => ResolvedParam::Named(prior.name().to_string()),
        }
    }

    /// # Errors
    /// [`TargetError::MissingParameter`] when a named parameter is absent.
    pub fn resolve(&self, target: &str, params: &Parameters) -> TargetResult<f64> {
        match self {
            ResolvedParam::Fixed(value) => Ok(*value),
            ResolvedParam::Named(name) => {
                params.get(name).copied().ok_or_else(|| TargetError::MissingParameter {
                    target: target.to_string(),
                    param: name.clone(),
                })
            }
        }
    }
}

#[derive(Clone)]
enum Kernel {
    Normal { stdev: ResolvedParam },
    TruncatedNormal { lo: f64, hi: f64, stdev: ResolvedParam },
    NegativeBinomial { dispersion: ResolvedParam },
    Binomial { sample_sizes: Array1<f64> },
    Custom { eval: CustomEval },
}

/// Aligned, pre-resolved evaluator for one target.
#[derive(Clone)]
pub struct TargetEvaluator {
    name: String,
    observed: Array1<f64>,
    positions: Vec<usize>,
    time_weights: Option<Array1<f64>>,
    weight: f64,
    kernel: Kernel,
}

impl TargetEvaluator {
    /// Align `target` to `model_times`.
    ///
    /// # Errors
    /// [`TargetError::NoOverlap`] when no observation time is on the grid.
    pub fn new(target: &Target, model_times: &TimeIndex) -> TargetResult<Self> {
        let filtered = target.filtered(model_times);
        if filtered.data().is_empty() {
            return Err(TargetError::NoOverlap { target: target.name().to_string() });
        }
        let dropped = target.data().len() - filtered.data().len();
        if dropped > 0 {
            warn!(target = target.name(), dropped, "observations outside the simulation grid");
        }

        let positions = filtered
            .data()
            .index()
            .iter()
            .map(|t| model_times.get_loc(t))
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(|| TargetError::NoOverlap { target: target.name().to_string() })?;

        let kernel = match filtered.noise() {
            NoiseModel::Normal { stdev } => Kernel::Normal { stdev: ResolvedParam::from_distri(stdev) },
            NoiseModel::TruncatedNormal { trunc_range: (lo, hi), stdev } => {
                Kernel::TruncatedNormal { lo: *lo, hi: *hi, stdev: ResolvedParam::from_distri(stdev) }
            }
            NoiseModel::NegativeBinomial { dispersion } => {
                Kernel::NegativeBinomial { dispersion: ResolvedParam::from_distri(dispersion) }
            }
            NoiseModel::Binomial { sample_sizes } => {
                Kernel::Binomial { sample_sizes: sample_sizes.values().clone() }
            }
            NoiseModel::Custom { eval } => Kernel::Custom { eval: eval.clone() },
        };

        Ok(Self {
            name: target.name().to_string(),
            observed: filtered.data().values().clone(),
            positions,
            time_weights: filtered.time_weights().map(|tw| tw.values().clone()),
            weight: filtered.weight(),
            kernel,
        })
    }

    /// Target name, which is also the derived output this evaluator reads.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observations retained on the simulation grid, in data order.
    pub fn observed(&self) -> &Array1<f64> {
        &self.observed
    }

    /// Positions of the observations in the simulation grid.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Retained time weights, renormalized to sum to 1.
    pub fn time_weights(&self) -> Option<&Array1<f64>> {
        self.time_weights.as_ref()
    }

    /// Weighted log-likelihood contribution of one simulation.
    ///
    /// Parameters
    /// ----------
    /// - `modelled`: `&Array1<f64>`
    ///   The full simulation-grid series for this target's output.
    /// - `params`: [`Parameters`]
    ///   Full parameter map; calibrated noise parameters are read from it.
    ///
    /// Returns
    /// -------
    /// `TargetResult<f64>`
    ///   - `Σ(ll·w)·weight` with time weights, `mean(ll)·weight` without.
    ///   - `eval(..)·weight` for custom targets.
    ///   Non-finite values (a modelled value outside a truncation range, a
    ///   zero standard deviation) are returned, not raised.
    ///
    /// Errors
    /// ------
    /// - [`TargetError::ModelledTooShort`] if `modelled` misses grid positions.
    /// - [`TargetError::MissingParameter`] for an absent calibrated noise parameter.
    pub fn evaluate(&self, modelled: &Array1<f64>, params: &Parameters) -> TargetResult<f64> {
        let needed = self.positions.iter().max().map_or(0, |&p| p + 1);
        if modelled.len() < needed {
            return Err(TargetError::ModelledTooShort {
                target: self.name.clone(),
                needed,
                found: modelled.len(),
            });
        }
        let aligned: Array1<f64> = self.positions.iter().map(|&i| modelled[i]).collect();

        let ll: Array1<f64> = match &self.kernel {
            Kernel::Normal { stdev } => {
                let sd = stdev.resolve(&self.name, params)?;
                Zip::from(&aligned).and(&self.observed).map_collect(|&m, &o| normal_ln_pdf(m, o, sd))
            }
            Kernel::TruncatedNormal { lo, hi, stdev } => {
                let sd = stdev.resolve(&self.name, params)?;
                Zip::from(&aligned).and(&self.observed).map_collect(|&m, &o| {
                    truncnorm_ln_pdf(m, o, sd, (lo - o) / sd, (hi - o) / sd)
                })
            }
            Kernel::NegativeBinomial { dispersion } => {
                let n = dispersion.resolve(&self.name, params)?;
                Zip::from(&aligned).and(&self.observed).map_collect(|&mu, &o| {
                    let p = mu / (mu + n);
                    let p = if p == 0.0 { NB_P_FLOOR } else { p };
                    nbinom_ln_pmf(o, n, 1.0 - p)
                })
            }
            Kernel::Binomial { sample_sizes } => Zip::from(&aligned)
                .and(&self.observed)
                .and(sample_sizes)
                .map_collect(|&p, &o, &size| binom_ln_pmf(o * size, size, p)),
            Kernel::Custom { eval } => {
                let value = eval(
                    aligned.view(),
                    self.observed.view(),
                    params,
                    self.time_weights.as_ref().map(|w| w.view()),
                );
                return Ok(value * self.weight);
            }
        };

        let total = match &self.time_weights {
            Some(w) => (&ll * w).sum(),
            None => ll.mean().unwrap_or(f64::NAN),
        };
        Ok(total * self.weight)
    }
}

impl fmt::Debug for TargetEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetEvaluator")
            .field("name", &self.name)
            .field("points", &self.observed.len())
            .field("weighted", &self.time_weights.is_some())
            .field("weight", &self.weight)
            .finish()
    }
}
