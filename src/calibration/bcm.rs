//! The calibration orchestrator.
//!
//! [`BayesianCompartmentalModel`] ties one simulator to its priors and
//! targets. Construction does all the work that does not depend on
//! parameter values: merging target-declared priors into the prior set,
//! choosing the calibrated parameters, building the restricted and full
//! runners, aligning every target to the simulation grid, and snapshotting
//! the result into one [`CompiledLogLikelihood`].
use crate::{
    calibration::{
        density::{DensityKind, LogDensity, sum_log_prior},
        errors::{CalibResult, CalibrationError},
        loglik::{CompiledLogLikelihood, ExtraLogLikelihood},
        model::{CompartmentalModel, ModelResults, ModelRunner, Parameters},
        results::ResultsData,
    },
    priors::Prior,
    targets::{Target, TimeIndex},
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

/// Bayesian calibration problem over a compartmental simulator.
pub struct BayesianCompartmentalModel<M: CompartmentalModel> {
    model: M,
    parameters: Parameters,
    targets: BTreeMap<String, Target>,
    priors: BTreeMap<String, Arc<Prior>>,
    calibrated: Vec<String>,
    reference_index: TimeIndex,
    full_runner: Arc<dyn ModelRunner>,
    loglikelihood: Arc<CompiledLogLikelihood>,
}

impl<M: CompartmentalModel> BayesianCompartmentalModel<M> {
    /// Build the calibration problem.
    ///
    /// Parameters
    /// ----------
    /// - `model`: the simulator; its output whitelist is reconfigured here.
    /// - `parameters`: baseline values for every simulator parameter.
    /// - `priors`: user priors; target-declared priors are added to them.
    /// - `targets`: observed data with unique names matching simulator outputs.
    /// - `extra_ll`: optional term added to every likelihood evaluation.
    ///
    /// Errors
    /// ------
    /// - [`CalibrationError::DuplicateTarget`] for repeated target names.
    /// - [`CalibrationError::DuplicatePrior`] when different priors share a
    ///   name (the same prior reached twice is accepted).
    /// - [`CalibrationError::Model`] if the simulator cannot build a runner.
    /// - [`CalibrationError::EmptyTarget`] for a target off the grid.
    pub fn new(
        mut model: M, parameters: Parameters, priors: Vec<Arc<Prior>>, targets: Vec<Target>,
        extra_ll: Option<ExtraLogLikelihood>,
    ) -> CalibResult<Self> {
        let mut target_map = BTreeMap::new();
        for target in targets {
            let name = target.name().to_string();
            if target_map.insert(name.clone(), target).is_some() {
                return Err(CalibrationError::DuplicateTarget { name });
            }
        }

        let declared = target_map.values().flat_map(Target::get_priors);
        let mut prior_map: BTreeMap<String, Arc<Prior>> = BTreeMap::new();
        for prior in priors.into_iter().chain(declared) {
            match prior_map.get(prior.name()) {
                Some(existing) if Arc::ptr_eq(existing, &prior) || **existing == *prior => {}
                Some(_) => {
                    return Err(CalibrationError::DuplicatePrior { name: prior.name().to_string() });
                }
                None => {
                    prior_map.insert(prior.name().to_string(), prior);
                }
            }
        }

        let input_names = model.input_parameters();
        let calibrated: Vec<String> =
            input_names.iter().filter(|name| prior_map.contains_key(*name)).cloned().collect();

        let target_names: Vec<String> = target_map.keys().cloned().collect();
        model.set_derived_outputs_whitelist(&target_names);
        let restricted_runner = model.get_runner(&parameters, &calibrated)?;
        model.set_derived_outputs_whitelist(&[]);
        let full_runner = model.get_runner(&parameters, &calibrated)?;

        let times = TimeIndex::new(model.times().to_vec())?;
        let evaluators = target_map
            .values()
            .map(|target| target.get_evaluator(&times))
            .collect::<Result<Vec<_>, _>>()?;
        let reference_index = TimeIndex::new(model.reference_index())?;

        debug!(
            calibrated = ?calibrated,
            priors = prior_map.len(),
            targets = target_map.len(),
            "built calibration model"
        );

        let loglikelihood = Arc::new(CompiledLogLikelihood::new(
            input_names,
            restricted_runner,
            evaluators,
            extra_ll,
        ));
        Ok(Self {
            model,
            parameters,
            targets: target_map,
            priors: prior_map,
            calibrated,
            reference_index,
            full_runner,
            loglikelihood,
        })
    }

    /// The simulator, with its output whitelist cleared.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Baseline parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Targets keyed by name, as supplied (not filtered to the grid).
    pub fn targets(&self) -> &BTreeMap<String, Target> {
        &self.targets
    }

    /// User and target-declared priors, keyed by name.
    pub fn priors(&self) -> &BTreeMap<String, Arc<Prior>> {
        &self.priors
    }

    /// Simulator inputs that have a prior, sorted.
    ///
    /// A vector prior appears under its base name; its components are the
    /// `name[i]` coordinates of [`Self::log_density`].
    pub fn calibrated_parameters(&self) -> &[String] {
        &self.calibrated
    }

    /// Shared handle to the compiled log-likelihood.
    pub fn compiled_loglikelihood(&self) -> Arc<CompiledLogLikelihood> {
        Arc::clone(&self.loglikelihood)
    }

    /// Log-likelihood at `params` (calibrated and noise-model values).
    ///
    /// # Errors
    /// See [`CompiledLogLikelihood::evaluate`].
    pub fn loglikelihood(&self, params: &Parameters) -> CalibResult<f64> {
        self.loglikelihood.evaluate(params)
    }

    /// Sum of every prior's log density at `params`.
    ///
    /// # Errors
    /// [`CalibrationError::MissingParameter`] for a prior without a value.
    pub fn logprior(&self, params: &Parameters) -> CalibResult<f64> {
        sum_log_prior(self.priors.values(), params)
    }

    /// `loglikelihood + logprior`.
    ///
    /// # Errors
    /// As [`Self::loglikelihood`] and [`Self::logprior`].
    pub fn logposterior(&self, params: &Parameters) -> CalibResult<f64> {
        Ok(self.loglikelihood(params)? + self.logprior(params)?)
    }

    /// Vector view of a density over every prior component.
    ///
    /// Coordinates follow sorted prior names, with vector priors expanded to
    /// `name[0]` .. `name[n-1]`. The view shares this model's compiled
    /// likelihood.
    pub fn log_density(&self, kind: DensityKind) -> LogDensity {
        LogDensity::new(kind, self.priors.values().cloned().collect(), self.compiled_loglikelihood())
    }

    /// Run the full runner and label outputs with the reference index.
    ///
    /// # Errors
    /// Simulator errors, or a length error if outputs do not match the index.
    pub fn run(&self, params: &Parameters) -> CalibResult<ResultsData> {
        let results = self.run_raw(params)?;
        ResultsData::new(self.reference_index.clone(), results.derived_outputs)
    }

    /// Run the full runner and return its raw results.
    ///
    /// # Errors
    /// Simulator errors.
    pub fn run_raw(&self, params: &Parameters) -> CalibResult<ModelResults> {
        Ok(self.full_runner.run(params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calibration::{
            errors::ModelError,
            model::{ModelResults, vector_parameter},
        },
        targets::TimeSeries,
    };
    use ndarray::{Array1, array};
    use std::collections::BTreeSet;

    /// Two outputs: "a" = alpha, "b" = 2·alpha, on a 3-point grid.
    struct Linear {
        times: Vec<f64>,
        whitelist: Vec<String>,
    }

    struct LinearRunner {
        baseline: Parameters,
        whitelist: Vec<String>,
    }

    impl ModelRunner for LinearRunner {
        fn run(&self, params: &Parameters) -> Result<ModelResults, ModelError> {
            let alpha = params
                .get("alpha")
                .or_else(|| self.baseline.get("alpha"))
                .copied()
                .ok_or_else(|| ModelError::MissingParameter { name: "alpha".into() })?;
            let mut out = ModelResults::default();
            for (name, scale) in [("a", 1.0), ("b", 2.0)] {
                if self.whitelist.is_empty() || self.whitelist.iter().any(|w| w == name) {
                    out.derived_outputs.insert(name.into(), Array1::from_elem(3, scale * alpha));
                }
            }
            Ok(out)
        }
    }

    impl CompartmentalModel for Linear {
        fn input_parameters(&self) -> BTreeSet<String> {
            BTreeSet::from(["alpha".to_string(), "beta".to_string()])
        }

        fn set_derived_outputs_whitelist(&mut self, outputs: &[String]) {
            self.whitelist = outputs.to_vec();
        }

        fn get_runner(
            &self, baseline: &Parameters, _calibrated: &[String],
        ) -> Result<Arc<dyn ModelRunner>, ModelError> {
            Ok(Arc::new(LinearRunner {
                baseline: baseline.clone(),
                whitelist: self.whitelist.clone(),
            }))
        }

        fn times(&self) -> &[f64] {
            &self.times
        }
    }

    /// One input `w`; output "y" is the sum of the calibrated components of
    /// `w`, or the scalar baseline when none are supplied.
    struct Pooled {
        times: Vec<f64>,
    }

    struct PooledRunner {
        baseline: Parameters,
    }

    impl ModelRunner for PooledRunner {
        fn run(&self, params: &Parameters) -> Result<ModelResults, ModelError> {
            let total = match vector_parameter(params, "w") {
                Some(w) => w.sum(),
                None => self.baseline["w"],
            };
            let mut out = ModelResults::default();
            out.derived_outputs.insert("y".into(), Array1::from_elem(2, total));
            Ok(out)
        }
    }

    impl CompartmentalModel for Pooled {
        fn input_parameters(&self) -> BTreeSet<String> {
            BTreeSet::from(["w".to_string()])
        }

        fn set_derived_outputs_whitelist(&mut self, _outputs: &[String]) {}

        fn get_runner(
            &self, baseline: &Parameters, _calibrated: &[String],
        ) -> Result<Arc<dyn ModelRunner>, ModelError> {
            Ok(Arc::new(PooledRunner { baseline: baseline.clone() }))
        }

        fn times(&self) -> &[f64] {
            &self.times
        }
    }

    fn linear() -> Linear {
        Linear { times: vec![0.0, 1.0, 2.0], whitelist: Vec::new() }
    }

    fn baseline() -> Parameters {
        Parameters::from([("alpha".into(), 1.0), ("beta".into(), 0.0)])
    }

    fn target(name: &str, value: f64) -> Target {
        Target::normal(name, TimeSeries::new(vec![1.0], array![value]).unwrap(), 1.0).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Calibrated names are simulator inputs with priors; noise priors are
    // merged in but not calibrated against the simulator.
    fn partitions_calibrated_and_fixed_parameters() {
        let disp = Arc::new(Prior::uniform("disp", (1.0, 50.0)).unwrap());
        let counts = Target::negative_binomial(
            "b",
            TimeSeries::new(vec![0.0], array![4.0]).unwrap(),
            disp.clone(),
        )
        .unwrap();
        let priors = vec![
            Arc::new(Prior::uniform("alpha", (0.0, 5.0)).unwrap()),
            Arc::new(Prior::uniform("gamma", (0.0, 1.0)).unwrap()),
            disp.clone(),
        ];

        let bcm =
            BayesianCompartmentalModel::new(linear(), baseline(), priors, vec![counts], None)
                .unwrap();

        assert_eq!(bcm.calibrated_parameters(), &["alpha"]);
        assert_eq!(bcm.priors().len(), 3);
        assert!(bcm.priors().contains_key("disp"));
    }

    #[test]
    // Purpose
    // -------
    // A vector prior on a simulator input drives the simulation through its
    // components.
    //
    // Given
    // -----
    // - Input `w` with baseline 0 and a Uniform(0, 10) prior of size 2.
    // - Normal target on "y" = w[0] + w[1], observed 10 with sd 1.
    //
    // Expect
    // ------
    // - `w` is calibrated and the density has coordinates `w[0]`, `w[1]`.
    // - The likelihood is maximal at a theta summing to 10 and lower elsewhere.
    fn vector_prior_components_reach_the_simulator() {
        let prior = Prior::uniform("w", (0.0, 10.0)).unwrap().with_size(2).unwrap();
        let data = TimeSeries::new(vec![1.0], array![10.0]).unwrap();
        let bcm = BayesianCompartmentalModel::new(
            Pooled { times: vec![0.0, 1.0] },
            Parameters::from([("w".into(), 0.0)]),
            vec![Arc::new(prior)],
            vec![Target::normal("y", data, 1.0).unwrap()],
            None,
        )
        .unwrap();
        let density = bcm.log_density(DensityKind::LogLikelihood);

        assert_eq!(bcm.calibrated_parameters(), &["w"]);
        assert_eq!(density.names(), &["w[0]", "w[1]"]);

        let at_fit = density.value(&array![4.0, 6.0]).unwrap();
        let off_fit = density.value(&array![1.0, 2.0]).unwrap();
        let expected = (1.0 / (2.0 * std::f64::consts::PI).sqrt()).ln();
        assert!((at_fit - expected).abs() < 1e-12);
        assert!((off_fit - (expected - 24.5)).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // The likelihood runner computes only target outputs; `run` computes all.
    fn restricted_and_full_runners_differ_in_outputs() {
        let bcm = BayesianCompartmentalModel::new(
            linear(),
            baseline(),
            vec![Arc::new(Prior::uniform("alpha", (0.0, 5.0)).unwrap())],
            vec![target("a", 2.0)],
            None,
        )
        .unwrap();
        let params = Parameters::from([("alpha".into(), 2.0)]);

        let full = bcm.run(&params).unwrap();
        assert_eq!(full.derived_outputs().len(), 2);
        assert_eq!(full.value_at("b", 2.0), Some(4.0));

        let ll = bcm.loglikelihood(&params).unwrap();
        let expected = (1.0 / (2.0 * std::f64::consts::PI).sqrt()).ln();
        assert!((ll - expected).abs() < 1e-12);
        assert!(bcm.model().whitelist.is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Name collisions fail at construction.
    fn rejects_duplicate_names() {
        let err = BayesianCompartmentalModel::new(
            linear(),
            baseline(),
            vec![],
            vec![target("a", 1.0), target("a", 2.0)],
            None,
        )
        .err();
        assert_eq!(err, Some(CalibrationError::DuplicateTarget { name: "a".into() }));

        let err = BayesianCompartmentalModel::new(
            linear(),
            baseline(),
            vec![
                Arc::new(Prior::uniform("alpha", (0.0, 5.0)).unwrap()),
                Arc::new(Prior::uniform("alpha", (0.0, 9.0)).unwrap()),
            ],
            vec![target("a", 1.0)],
            None,
        )
        .err();
        assert_eq!(err, Some(CalibrationError::DuplicatePrior { name: "alpha".into() }));
    }

    #[test]
    // Purpose
    // -------
    // A target entirely off the grid is a construction error.
    fn rejects_target_without_grid_overlap() {
        let off_grid =
            Target::normal("a", TimeSeries::new(vec![9.0], array![1.0]).unwrap(), 1.0).unwrap();

        let err = BayesianCompartmentalModel::new(linear(), baseline(), vec![], vec![off_grid], None)
            .err();

        assert_eq!(err, Some(CalibrationError::EmptyTarget { target: "a".into() }));
    }

    #[test]
    // Purpose
    // -------
    // The posterior adds the prior to the likelihood and a missing prior
    // value is reported.
    fn logposterior_adds_logprior() {
        let bcm = BayesianCompartmentalModel::new(
            linear(),
            baseline(),
            vec![Arc::new(Prior::normal("alpha", 1.0, 2.0).unwrap())],
            vec![target("a", 1.5)],
            None,
        )
        .unwrap();
        let params = Parameters::from([("alpha".into(), 1.2)]);

        let post = bcm.logposterior(&params).unwrap();
        let sum = bcm.loglikelihood(&params).unwrap() + bcm.logprior(&params).unwrap();
        assert!((post - sum).abs() < 1e-12);

        assert_eq!(
            bcm.logprior(&Parameters::new()).unwrap_err(),
            CalibrationError::MissingParameter { name: "alpha".into() }
        );
    }
}
