//! Observed-data targets and their noise models.
//!
//! Purpose
//! -------
//! Describe what a calibration is fitted against: a named [`TimeSeries`] of
//! observations, the [`NoiseModel`] relating modelled values to them, a
//! scalar target weight, and optional per-time weights. A [`Target`] is pure
//! data; [`Target::get_evaluator`] compiles it against a simulation grid.
//!
//! Key behaviors
//! -------------
//! - One constructor per noise model (`normal`, `truncated_normal`,
//!   `negative_binomial`, `binomial`, `custom`), all routed through
//!   [`Target::new`] so validation happens in one place.
//! - Noise parameters are [`DistriParam`]s: a fixed value, or a prior whose
//!   name becomes a calibrated parameter ([`Target::get_priors`]).
//! - [`Target::filtered`] restricts data, auxiliary series, and time weights
//!   to a time index together, renormalizing the retained weights.
//!
//! Invariants & assumptions
//! ------------------------
//! - Names and data are non-empty; the target weight is finite and > 0.
//! - Fixed standard deviations and dispersions are finite and > 0.
//! - Time weights and auxiliary series share the data index exactly, and
//!   hold finite, non-negative values.
//! - Targets are immutable once built; `with_*` methods consume and return.
//!
//! Conventions
//! -----------
//! - Binomial observations are proportions; `sample_sizes` gives the trials.
//! - Negative-binomial observations are counts with mean equal to the
//!   modelled value.
//! - [`get_target_sd`] supplies a default Normal standard deviation from the
//!   data's scale.
use crate::{
    calibration::model::Parameters,
    priors::Prior,
    targets::{
        errors::{TargetError, TargetResult},
        evaluator::TargetEvaluator,
        series::{TimeIndex, TimeSeries},
    },
};
use ndarray::{Array1, ArrayView1};
use std::{fmt, sync::Arc};

/// User-supplied evaluation: `(modelled, observed, parameters, time_weights) -> ll`.
///
/// Receives the modelled values already aligned to the observations. The
/// result is multiplied by the target weight; time weights are only passed
/// through.
pub type CustomEval =
    Arc<dyn Fn(ArrayView1<f64>, ArrayView1<f64>, &Parameters, Option<ArrayView1<f64>>) -> f64 + Send + Sync>;

/// A noise-model parameter: a fixed value or a calibrated prior.
#[derive(Debug, Clone, PartialEq)]
pub enum DistriParam {
    Fixed(f64),
    Prior(Arc<Prior>),
}

impl DistriParam {
    /// The prior, when the parameter is calibrated.
    pub fn prior(&self) -> Option<&Arc<Prior>> {
        match self {
            DistriParam::Fixed(_) => None,
            DistriParam::Prior(prior) => Some(prior),
        }
    }
}

impl From<f64> for DistriParam {
    fn from(value: f64) -> Self {
        DistriParam::Fixed(value)
    }
}

impl From<Arc<Prior>> for DistriParam {
    fn from(prior: Arc<Prior>) -> Self {
        DistriParam::Prior(prior)
    }
}

/// Observation model linking modelled values to observed data.
#[derive(Clone)]
pub enum NoiseModel {
    /// Gaussian around the observation.
    Normal { stdev: DistriParam },
    /// Gaussian around the observation, truncated to `trunc_range`.
    TruncatedNormal { trunc_range: (f64, f64), stdev: DistriParam },
    /// Counts with mean equal to the modelled value and dispersion `n`.
    NegativeBinomial { dispersion: DistriParam },
    /// Observed proportions out of `sample_sizes` trials.
    Binomial { sample_sizes: TimeSeries },
    /// Arbitrary user evaluation.
    Custom { eval: CustomEval },
}

impl NoiseModel {
    /// Variant name, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            NoiseModel::Normal { .. } => "Normal",
            NoiseModel::TruncatedNormal { .. } => "TruncatedNormal",
            NoiseModel::NegativeBinomial { .. } => "NegativeBinomial",
            NoiseModel::Binomial { .. } => "Binomial",
            NoiseModel::Custom { .. } => "Custom",
        }
    }

    /// The distribution parameter of this model, if it has one.
    pub fn distri_param(&self) -> Option<&DistriParam> {
        match self {
            NoiseModel::Normal { stdev } | NoiseModel::TruncatedNormal { stdev, .. } => Some(stdev),
            NoiseModel::NegativeBinomial { dispersion } => Some(dispersion),
            NoiseModel::Binomial { .. } | NoiseModel::Custom { .. } => None,
        }
    }

    /// Auxiliary series that share the data index and are filtered with it.
    pub fn aux_series(&self) -> Vec<(&'static str, &TimeSeries)> {
        match self {
            NoiseModel::Binomial { sample_sizes } => vec![("sample_sizes", sample_sizes)],
            _ => Vec::new(),
        }
    }

    fn select(&self, keep: &[usize]) -> NoiseModel {
        match self {
            NoiseModel::Binomial { sample_sizes } => {
                NoiseModel::Binomial { sample_sizes: sample_sizes.select(keep) }
            }
            other => other.clone(),
        }
    }
}

impl fmt::Debug for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseModel::Normal { stdev } => f.debug_struct("Normal").field("stdev", stdev).finish(),
            NoiseModel::TruncatedNormal { trunc_range, stdev } => f
                .debug_struct("TruncatedNormal")
                .field("trunc_range", trunc_range)
                .field("stdev", stdev)
                .finish(),
            NoiseModel::NegativeBinomial { dispersion } => {
                f.debug_struct("NegativeBinomial").field("dispersion", dispersion).finish()
            }
            NoiseModel::Binomial { sample_sizes } => {
                f.debug_struct("Binomial").field("sample_sizes", sample_sizes).finish()
            }
            NoiseModel::Custom { .. } => f.write_str("Custom { .. }"),
        }
    }
}

/// A named observed series with a noise model and weights.
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    data: TimeSeries,
    weight: f64,
    time_weights: Option<TimeSeries>,
    noise: NoiseModel,
}

impl Target {
    /// Build a target with weight 1 and no time weights.
    ///
    /// Parameters
    /// ----------
    /// - `name`: `&str`
    ///   Target name; must match the simulator's derived-output name.
    /// - `data`: [`TimeSeries`]
    ///   Observations, non-empty.
    /// - `noise`: [`NoiseModel`]
    ///   Observation model and its parameters.
    ///
    /// Returns
    /// -------
    /// `TargetResult<Target>`
    ///   - `Ok(Target)` with weight 1 and no time weights.
    ///   - `Err(TargetError)` if validation fails.
    ///
    /// Errors
    /// ------
    /// - [`TargetError::EmptyName`], [`TargetError::EmptyData`].
    /// - [`TargetError::InvalidNoiseParam`] for non-positive fixed stdev or dispersion.
    /// - [`TargetError::InvalidTruncRange`] for an unordered truncation range.
    /// - [`TargetError::IndexMismatch`] / [`TargetError::InvalidSampleSize`]
    ///   for malformed auxiliary series.
    pub fn new(name: &str, data: TimeSeries, noise: NoiseModel) -> TargetResult<Self> {
        if name.is_empty() {
            return Err(TargetError::EmptyName);
        }
        if data.is_empty() {
            return Err(TargetError::EmptyData { target: name.to_string() });
        }
        validate_noise(name, &data, &noise)?;
        Ok(Self { name: name.to_string(), data, weight: 1.0, time_weights: None, noise })
    }

    /// Gaussian noise with standard deviation `stdev` (fixed or a prior).
    ///
    /// # Errors
    /// As [`Target::new`]; a fixed `stdev` must be finite and > 0.
    pub fn normal(name: &str, data: TimeSeries, stdev: impl Into<DistriParam>) -> TargetResult<Self> {
        Self::new(name, data, NoiseModel::Normal { stdev: stdev.into() })
    }

    /// Gaussian noise truncated to `trunc_range`.
    ///
    /// Modelled values outside the range have zero likelihood.
    ///
    /// # Errors
    /// As [`Target::new`]; also [`TargetError::InvalidTruncRange`] unless
    /// `trunc_range.0 < trunc_range.1`.
    pub fn truncated_normal(
        name: &str, data: TimeSeries, trunc_range: (f64, f64), stdev: impl Into<DistriParam>,
    ) -> TargetResult<Self> {
        Self::new(name, data, NoiseModel::TruncatedNormal { trunc_range, stdev: stdev.into() })
    }

    /// Count data with mean equal to the modelled value and dispersion `n`.
    ///
    /// Larger dispersion means less overdispersion; a prior here makes the
    /// dispersion a calibrated parameter named after the prior.
    ///
    /// # Errors
    /// As [`Target::new`]; a fixed dispersion must be finite and > 0.
    pub fn negative_binomial(
        name: &str, data: TimeSeries, dispersion: impl Into<DistriParam>,
    ) -> TargetResult<Self> {
        Self::new(name, data, NoiseModel::NegativeBinomial { dispersion: dispersion.into() })
    }

    /// Observed proportions out of `sample_sizes` trials per time.
    ///
    /// # Errors
    /// As [`Target::new`]; `sample_sizes` must share the data index and hold
    /// finite, non-negative counts.
    pub fn binomial(name: &str, data: TimeSeries, sample_sizes: TimeSeries) -> TargetResult<Self> {
        Self::new(name, data, NoiseModel::Binomial { sample_sizes })
    }

    /// User-evaluated target; see [`CustomEval`].
    ///
    /// # Errors
    /// As [`Target::new`].
    pub fn custom(name: &str, data: TimeSeries, eval: CustomEval) -> TargetResult<Self> {
        Self::new(name, data, NoiseModel::Custom { eval })
    }

    /// Scale this target's contribution by `weight`.
    ///
    /// # Errors
    /// [`TargetError::InvalidWeight`] unless `weight` is finite and > 0.
    pub fn with_weight(mut self, weight: f64) -> TargetResult<Self> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(TargetError::InvalidWeight { value: weight });
        }
        self.weight = weight;
        Ok(self)
    }

    /// Attach per-time weights sharing the data index.
    ///
    /// # Errors
    /// [`TargetError::IndexMismatch`] or [`TargetError::InvalidTimeWeight`].
    pub fn with_time_weights(mut self, time_weights: TimeSeries) -> TargetResult<Self> {
        if time_weights.index() != self.data.index() {
            return Err(TargetError::IndexMismatch {
                target: self.name.clone(),
                series: "time_weights",
            });
        }
        if let Some((time, value)) = time_weights.iter().find(|(_, w)| !(w.is_finite() && *w >= 0.0))
        {
            return Err(TargetError::InvalidTimeWeight { time, value });
        }
        self.time_weights = Some(time_weights);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &TimeSeries {
        &self.data
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Per-time weights, as supplied (normalized only by [`Target::filtered`]).
    pub fn time_weights(&self) -> Option<&TimeSeries> {
        self.time_weights.as_ref()
    }

    pub fn noise(&self) -> &NoiseModel {
        &self.noise
    }

    /// Priors referenced by the noise model.
    pub fn get_priors(&self) -> Vec<Arc<Prior>> {
        self.noise.distri_param().and_then(DistriParam::prior).cloned().into_iter().collect()
    }

    /// Restrict the target to times in `index`.
    ///
    /// Data, auxiliary series, and time weights keep their own order. Retained
    /// time weights are renormalized to sum to 1; if they sum to zero the
    /// retained points get uniform weights.
    pub fn filtered(&self, index: &TimeIndex) -> Target {
        let keep = self.data.retained_positions(index);
        let time_weights = self.time_weights.as_ref().map(|tw| {
            let kept = tw.select(&keep);
            let total = kept.sum();
            let values = if total > 0.0 {
                kept.values() / total
            } else {
                Array1::from_elem(kept.len(), 1.0 / kept.len().max(1) as f64)
            };
            kept.with_values(values)
        });
        Target {
            name: self.name.clone(),
            data: self.data.select(&keep),
            weight: self.weight,
            time_weights,
            noise: self.noise.select(&keep),
        }
    }

    /// Build the evaluator aligning this target to `model_times`.
    ///
    /// # Errors
    /// [`TargetError::NoOverlap`] if no observation falls on the grid.
    pub fn get_evaluator(&self, model_times: &TimeIndex) -> TargetResult<TargetEvaluator> {
        TargetEvaluator::new(self, model_times)
    }
}

/// Standard deviation whose 95% normal interval spans a quarter of the
/// largest observed value.
pub fn get_target_sd(data: &TimeSeries) -> f64 {
    0.25 / 4.0 * data.max()
}

fn validate_noise(name: &str, data: &TimeSeries, noise: &NoiseModel) -> TargetResult<()> {
    let invalid = |param: &'static str, value: f64| TargetError::InvalidNoiseParam {
        target: name.to_string(),
        param,
        value,
    };
    match noise {
        NoiseModel::Normal { stdev } | NoiseModel::TruncatedNormal { stdev, .. } => {
            if let DistriParam::Fixed(sd) = *stdev {
                if !(sd.is_finite() && sd > 0.0) {
                    return Err(invalid("stdev", sd));
                }
            }
        }
        NoiseModel::NegativeBinomial { dispersion } => {
            if let DistriParam::Fixed(n) = *dispersion {
                if !(n.is_finite() && n > 0.0) {
                    return Err(invalid("dispersion", n));
                }
            }
        }
        NoiseModel::Binomial { .. } | NoiseModel::Custom { .. } => {}
    }
    if let NoiseModel::TruncatedNormal { trunc_range: (lo, hi), .. } = *noise {
        if lo.is_nan() || hi.is_nan() || lo >= hi {
            return Err(TargetError::InvalidTruncRange { lo, hi });
        }
    }
    for (series_name, series) in noise.aux_series() {
        if series.index() != data.index() {
            return Err(TargetError::IndexMismatch { target: name.to_string(), series: series_name });
        }
    }
    if let NoiseModel::Binomial { sample_sizes } = noise {
        if let Some((time, value)) = sample_sizes.iter().find(|(_, n)| !(n.is_finite() && *n >= 0.0))
        {
            return Err(TargetError::InvalidSampleSize { time, value });
        }
    }
    Ok(())
}
