//! The composed log-likelihood built once per orchestrator.
use crate::{
    calibration::{
        errors::{CalibResult, CalibrationError},
        model::{ModelRunner, Parameters, base_name},
    },
    targets::evaluator::TargetEvaluator,
};
use std::{collections::BTreeSet, fmt, sync::Arc};

/// Optional extra log-likelihood term, called with the full parameter map.
pub type ExtraLogLikelihood = Arc<dyn Fn(&Parameters) -> f64 + Send + Sync>;

/// Immutable snapshot of everything one likelihood evaluation needs.
///
/// `evaluate` filters the supplied parameters to the simulator's inputs
/// (including `name[i]` components of vector inputs),
/// runs the restricted runner once, scores every target against its output
/// with the full parameter map, and adds the extra term.
#[derive(Clone)]
pub struct CompiledLogLikelihood {
    input_names: BTreeSet<String>,
    runner: Arc<dyn ModelRunner>,
    evaluators: Vec<TargetEvaluator>,
    extra: Option<ExtraLogLikelihood>,
}

impl CompiledLogLikelihood {
    pub(crate) fn new(
        input_names: BTreeSet<String>, runner: Arc<dyn ModelRunner>,
        evaluators: Vec<TargetEvaluator>, extra: Option<ExtraLogLikelihood>,
    ) -> Self {
        Self { input_names, runner, evaluators, extra }
    }

    pub fn evaluators(&self) -> &[TargetEvaluator] {
        &self.evaluators
    }

    /// Total log-likelihood at `params`.
    ///
    /// Non-finite totals are returned as values.
    ///
    /// # Errors
    /// - [`CalibrationError::Model`] from the runner.
    /// - [`CalibrationError::MissingOutput`] if a target output is absent.
    /// - Target evaluation errors (missing noise parameter, short series).
    pub fn evaluate(&self, params: &Parameters) -> CalibResult<f64> {
        let model_params: Parameters = params
            .iter()
            .filter(|(name, _)| self.input_names.contains(base_name(name)))
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        let results = self.runner.run(&model_params)?;

        let mut total = 0.0;
        for evaluator in &self.evaluators {
            let modelled = results.derived_outputs.get(evaluator.name()).ok_or_else(|| {
                CalibrationError::MissingOutput { output: evaluator.name().to_string() }
            })?;
            total += evaluator.evaluate(modelled, params)?;
        }
        if let Some(extra) = &self.extra {
            total += extra(params);
        }
        Ok(total)
    }
}

impl fmt::Debug for CompiledLogLikelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledLogLikelihood")
            .field("input_names", &self.input_names)
            .field("evaluators", &self.evaluators)
            .field("extra", &self.extra.is_some())
            .finish()
    }
}
