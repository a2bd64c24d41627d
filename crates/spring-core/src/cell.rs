use std::fmt;
use std::sync::Arc;

use crate::constants::{
    EMPTY_PATH_MAX, EMPTY_PATH_MIN, UNREACHED_CYCLE, UNREACHED_DISTANCE, UNREACHED_TIMESTAMP,
};

/// One entry of the SPRING distance column.
///
/// Holds the accumulated warping distance of the best path reaching this
/// position, where that path started (cycle and timestamp), and running
/// statistics over the samples it covers. Cells are immutable: retiring a
/// path produces a new cell via [`Cell::retired`].
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    distance: f64,
    start_cycle: u64,
    start_time: Arc<str>,
    max_value: f64,
    min_value: f64,
    cumulative_sum: f64,
}

impl Cell {
    /// Path origin with an explicit distance and empty path statistics.
    pub fn seed(distance: f64, start_cycle: u64, start_time: Arc<str>) -> Self {
        Self {
            distance,
            start_cycle,
            start_time,
            max_value: EMPTY_PATH_MAX,
            min_value: EMPTY_PATH_MIN,
            cumulative_sum: 0.0,
        }
    }

    /// Placeholder for a position no path reaches.
    pub fn unreached() -> Self {
        Self::seed(
            UNREACHED_DISTANCE,
            UNREACHED_CYCLE,
            Arc::from(UNREACHED_TIMESTAMP),
        )
    }

    /// Extend `predecessor`'s path by one sample.
    ///
    /// Provenance is inherited unchanged; the distance and statistics absorb
    /// the new sample.
    pub fn extend(absolute_distance: f64, sample: f64, predecessor: &Cell) -> Self {
        Self {
            distance: absolute_distance + predecessor.distance,
            start_cycle: predecessor.start_cycle,
            start_time: Arc::clone(&predecessor.start_time),
            max_value: predecessor.max_value.max(sample),
            min_value: predecessor.min_value.min(sample),
            cumulative_sum: predecessor.cumulative_sum + sample,
        }
    }

    /// Same path with its distance reset to unreached.
    pub fn retired(&self) -> Self {
        Self {
            distance: UNREACHED_DISTANCE,
            ..self.clone()
        }
    }

    pub fn is_reached(&self) -> bool {
        self.distance < UNREACHED_DISTANCE
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn start_cycle(&self) -> u64 {
        self.start_cycle
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn cumulative_sum(&self) -> f64 {
        self.cumulative_sum
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell [startTime={}, startCycle={}, distance={:?}, maxValue={:?}, minValue={:?}, cumulativeSum={:?}]",
            self.start_time,
            self.start_cycle,
            self.distance,
            self.max_value,
            self.min_value,
            self.cumulative_sum
        )
    }
}
