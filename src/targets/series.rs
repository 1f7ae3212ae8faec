//! Time-indexed carriers for observed data and simulation grids.
//!
//! [`TimeIndex`] is an ordered, duplicate-free list of `f64` time
//! coordinates with constant-time position lookup. [`TimeSeries`] pairs an
//! index with an equal-length value array. Filtering keeps the series' own
//! order and only the points whose time appears in the other index.
use crate::targets::errors::{TargetError, TargetResult};
use ndarray::Array1;
use std::collections::HashMap;

/// Hash key for a time coordinate; `-0.0` and `0.0` share a key.
fn time_key(t: f64) -> u64 {
    if t == 0.0 { 0.0_f64.to_bits() } else { t.to_bits() }
}

/// Ordered, duplicate-free time coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeIndex {
    times: Vec<f64>,
    positions: HashMap<u64, usize>,
}

impl TimeIndex {
    /// Build an index from time coordinates, keeping their order.
    ///
    /// # Errors
    /// - [`TargetError::NonFiniteTime`] for NaN or infinite entries.
    /// - [`TargetError::DuplicateTime`] when a time repeats.
    pub fn new(times: Vec<f64>) -> TargetResult<Self> {
        let mut positions = HashMap::with_capacity(times.len());
        for (pos, &time) in times.iter().enumerate() {
            if !time.is_finite() {
                return Err(TargetError::NonFiniteTime { time });
            }
            if positions.insert(time_key(time), pos).is_some() {
                return Err(TargetError::DuplicateTime { time });
            }
        }
        Ok(Self { times, positions })
    }

    /// Position of `time` in the index.
    pub fn get_loc(&self, time: f64) -> Option<usize> {
        self.positions.get(&time_key(time)).copied()
    }

    pub fn contains(&self, time: f64) -> bool {
        self.positions.contains_key(&time_key(time))
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.times.iter().copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    fn take(&self, keep: &[usize]) -> Self {
        let times: Vec<f64> = keep.iter().map(|&i| self.times[i]).collect();
        let positions = times.iter().enumerate().map(|(pos, &t)| (time_key(t), pos)).collect();
        Self { times, positions }
    }
}

/// Values observed (or modelled) at the times of a [`TimeIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    index: TimeIndex,
    values: Array1<f64>,
}

impl TimeSeries {
    /// # Errors
    /// Index errors, or [`TargetError::LengthMismatch`] if lengths differ.
    pub fn new(times: Vec<f64>, values: Array1<f64>) -> TargetResult<Self> {
        Self::from_index(TimeIndex::new(times)?, values)
    }

    /// # Errors
    /// [`TargetError::LengthMismatch`] if `values.len() != index.len()`.
    pub fn from_index(index: TimeIndex, values: Array1<f64>) -> TargetResult<Self> {
        if index.len() != values.len() {
            return Err(TargetError::LengthMismatch { expected: index.len(), found: values.len() });
        }
        Ok(Self { index, values })
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    /// Largest value, or `NaN` for an empty series.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NAN, f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.index.iter().zip(self.values.iter().copied())
    }

    /// Positions (in this series) of the points whose time is in `other`.
    pub fn retained_positions(&self, other: &TimeIndex) -> Vec<usize> {
        self.index.iter().enumerate().filter(|(_, t)| other.contains(*t)).map(|(i, _)| i).collect()
    }

    /// Points whose time is in `other`, in this series' order.
    pub fn filter(&self, other: &TimeIndex) -> TimeSeries {
        self.select(&self.retained_positions(other))
    }

    pub(crate) fn select(&self, keep: &[usize]) -> TimeSeries {
        TimeSeries {
            index: self.index.take(keep),
            values: keep.iter().map(|&i| self.values[i]).collect(),
        }
    }

    pub(crate) fn with_values(&self, values: Array1<f64>) -> TimeSeries {
        TimeSeries { index: self.index.clone(), values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Position lookup follows insertion order and treats ±0 as one time.
    fn get_loc_follows_insertion_order() {
        let index = TimeIndex::new(vec![3.0, -0.0, 7.5]).unwrap();
        assert_eq!(index.get_loc(7.5), Some(2));
        assert_eq!(index.get_loc(0.0), Some(1));
        assert_eq!(index.get_loc(1.0), None);
    }

    #[test]
    // Purpose
    // -------
    // Invalid coordinates are rejected at construction.
    fn rejects_duplicate_and_non_finite_times() {
        assert_eq!(
            TimeIndex::new(vec![1.0, 2.0, 1.0]).unwrap_err(),
            TargetError::DuplicateTime { time: 1.0 }
        );
        assert!(matches!(
            TimeIndex::new(vec![1.0, f64::NAN]).unwrap_err(),
            TargetError::NonFiniteTime { .. }
        ));
        assert_eq!(
            TimeSeries::new(vec![1.0, 2.0], array![1.0]).unwrap_err(),
            TargetError::LengthMismatch { expected: 2, found: 1 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Filtering keeps the series' order and drops times outside the index.
    //
    // Given
    // -----
    // - Series at times [5, 1, 3, 9]; grid [0, 1, 2, 3, 4, 5].
    //
    // Expect
    // ------
    // - Times [5, 1, 3] with their original values.
    fn filter_keeps_series_order() {
        let series = TimeSeries::new(vec![5.0, 1.0, 3.0, 9.0], array![50.0, 10.0, 30.0, 90.0])
            .unwrap();
        let grid = TimeIndex::new((0..6).map(f64::from).collect()).unwrap();

        let kept = series.filter(&grid);

        assert_eq!(kept.index().as_slice(), &[5.0, 1.0, 3.0]);
        assert_eq!(kept.values(), &array![50.0, 10.0, 30.0]);
        assert_eq!(kept.index().get_loc(3.0), Some(2));
    }
}
