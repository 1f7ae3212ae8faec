//! Simulator-facing traits and carriers.
//!
//! The calibration layer never advances a model in time itself. It talks to
//! a simulator through [`CompartmentalModel`] (configuration and runner
//! construction) and to the resulting runners through [`ModelRunner`]
//! (one simulation per parameter map).
use crate::calibration::errors::ModelError;
use ndarray::Array1;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// Named scalar parameter values.
///
/// A vector-valued parameter `w` of length `n` is stored component-wise under
/// `w[0]` .. `w[n-1]`; [`vector_parameter`] reassembles it.
pub type Parameters = BTreeMap<String, f64>;

/// Name a parameter key refers to: `w[1]` → `w`, `alpha` → `alpha`.
pub fn base_name(key: &str) -> &str {
    if let Some(stripped) = key.strip_suffix(']') {
        if let Some((base, index)) = stripped.rsplit_once('[') {
            if !base.is_empty() && !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                return base;
            }
        }
    }
    key
}

/// Collect the components `name[0]`, `name[1]`, ... of a vector parameter.
///
/// Stops at the first missing index; `None` when `name[0]` is absent.
pub fn vector_parameter(params: &Parameters, name: &str) -> Option<Array1<f64>> {
    let values: Vec<f64> =
        (0..).map_while(|i| params.get(&format!("{name}[{i}]")).copied()).collect();
    if values.is_empty() { None } else { Some(Array1::from(values)) }
}

/// Raw output of one simulation: derived-output series on the simulation grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelResults {
    pub derived_outputs: BTreeMap<String, Array1<f64>>,
}

/// A configured, immutable simulation entry point.
pub trait ModelRunner: Send + Sync {
    /// Simulate with `params` overriding the runner's baseline.
    ///
    /// Calibrated vector inputs arrive as `name[i]` components; read them
    /// with [`vector_parameter`].
    ///
    /// # Errors
    /// Any simulator failure, as [`ModelError`].
    fn run(&self, params: &Parameters) -> Result<ModelResults, ModelError>;
}

/// The simulator collaborator.
pub trait CompartmentalModel {
    /// Names of every parameter the simulator consumes.
    fn input_parameters(&self) -> BTreeSet<String>;

    /// Restrict the derived outputs computed by runners built afterwards;
    /// an empty list means every output.
    fn set_derived_outputs_whitelist(&mut self, outputs: &[String]);

    /// Build a runner with `baseline` values and `calibrated` names that
    /// callers will vary.
    ///
    /// # Errors
    /// Simulator-specific configuration failures.
    fn get_runner(
        &self, baseline: &Parameters, calibrated: &[String],
    ) -> Result<Arc<dyn ModelRunner>, ModelError>;

    /// Canonical simulation time grid.
    fn times(&self) -> &[f64];

    /// Index labelling formatted outputs; defaults to the time grid.
    fn reference_index(&self) -> Vec<f64> {
        self.times().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Component keys resolve to their vector's name; other keys are unchanged.
    fn base_name_strips_component_index() {
        assert_eq!(base_name("w[0]"), "w");
        assert_eq!(base_name("contact[12]"), "contact");
        assert_eq!(base_name("alpha"), "alpha");
        assert_eq!(base_name("w[]"), "w[]");
        assert_eq!(base_name("w[x]"), "w[x]");
        assert_eq!(base_name("[3]"), "[3]");
    }

    #[test]
    // Purpose
    // -------
    // Components are reassembled in index order up to the first gap.
    fn vector_parameter_collects_components() {
        let params = Parameters::from([
            ("w[1]".to_string(), 2.0),
            ("w[0]".to_string(), 1.0),
            ("w[3]".to_string(), 9.0),
            ("alpha".to_string(), 0.5),
        ]);
        assert_eq!(vector_parameter(&params, "w"), Some(array![1.0, 2.0]));
        assert_eq!(vector_parameter(&params, "alpha"), None);
    }
}
