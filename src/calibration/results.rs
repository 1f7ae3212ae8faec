//! Formatted simulation output.
use crate::{
    calibration::errors::CalibResult,
    targets::series::{TimeIndex, TimeSeries},
};
use ndarray::Array1;
use std::collections::BTreeMap;

/// Derived outputs labelled by the simulator's reference index.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsData {
    index: TimeIndex,
    derived_outputs: BTreeMap<String, TimeSeries>,
}

impl ResultsData {
    /// # Errors
    /// A target-layer length error if any output length differs from the index.
    pub fn new(index: TimeIndex, outputs: BTreeMap<String, Array1<f64>>) -> CalibResult<Self> {
        let mut derived_outputs = BTreeMap::new();
        for (name, values) in outputs {
            let series = TimeSeries::from_index(index.clone(), values)?;
            derived_outputs.insert(name, series);
        }
        Ok(Self { index, derived_outputs })
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn derived_outputs(&self) -> &BTreeMap<String, TimeSeries> {
        &self.derived_outputs
    }

    pub fn output(&self, name: &str) -> Option<&TimeSeries> {
        self.derived_outputs.get(name)
    }

    /// Value of output `name` at reference time `time`.
    pub fn value_at(&self, name: &str, time: f64) -> Option<f64> {
        let series = self.derived_outputs.get(name)?;
        self.index.get_loc(time).map(|pos| series.values()[pos])
    }
}
