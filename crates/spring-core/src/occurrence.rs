use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::{ConfigError, Result};

/// One reported match of the profile in the stream.
///
/// Positions are engine cycles. Duration and latency are derived on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "OccurrenceRecord", try_from = "OccurrenceRecord")]
pub struct DetectedOccurrence {
    start_time: String,
    start_cycle: u64,
    end_cycle: u64,
    report_cycle: u64,
    distance: f64,
    max_value: f64,
    min_value: f64,
    total_energy: f64,
}

impl DetectedOccurrence {
    /// Build an occurrence from trusted positions.
    ///
    /// Callers must uphold `start_cycle <= end_cycle <= report_cycle`; use
    /// [`try_new`](Self::try_new) for values read from outside the engine.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start_time: impl Into<String>,
        start_cycle: u64,
        end_cycle: u64,
        report_cycle: u64,
        distance: f64,
        max_value: f64,
        min_value: f64,
        total_energy: f64,
    ) -> Self {
        debug_assert!(start_cycle <= end_cycle && end_cycle <= report_cycle);
        Self {
            start_time: start_time.into(),
            start_cycle,
            end_cycle,
            report_cycle,
            distance,
            max_value,
            min_value,
            total_energy,
        }
    }

    /// Like [`new`](Self::new), rejecting inverted positions.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        start_time: impl Into<String>,
        start_cycle: u64,
        end_cycle: u64,
        report_cycle: u64,
        distance: f64,
        max_value: f64,
        min_value: f64,
        total_energy: f64,
    ) -> Result<Self> {
        if start_cycle > end_cycle || end_cycle > report_cycle {
            return Err(ConfigError::InvertedCycles {
                start: start_cycle,
                end: end_cycle,
                report: report_cycle,
            });
        }
        Ok(Self::new(
            start_time,
            start_cycle,
            end_cycle,
            report_cycle,
            distance,
            max_value,
            min_value,
            total_energy,
        ))
    }

    /// Summarize the best candidate path ending at `end_cycle`, reported at `report_cycle`.
    pub(crate) fn from_candidate(candidate: &Cell, end_cycle: u64, report_cycle: u64) -> Self {
        Self {
            start_time: candidate.start_time().to_string(),
            start_cycle: candidate.start_cycle(),
            end_cycle,
            report_cycle,
            distance: candidate.distance(),
            max_value: candidate.max_value(),
            min_value: candidate.min_value(),
            total_energy: candidate.cumulative_sum(),
        }
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn start_cycle(&self) -> u64 {
        self.start_cycle
    }

    pub fn end_cycle(&self) -> u64 {
        self.end_cycle
    }

    pub fn report_cycle(&self) -> u64 {
        self.report_cycle
    }

    /// Final DTW distance of the match.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Sum of the stream samples covered by the match.
    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    /// Number of cycles covered: `end - start + 1`.
    pub fn duration(&self) -> u64 {
        self.end_cycle - self.start_cycle + 1
    }

    /// Cycles between the end of the match and its report.
    pub fn reporting_latency(&self) -> u64 {
        self.report_cycle - self.end_cycle
    }
}

impl fmt::Display for DetectedOccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DetectedOccurrence [timeStart={}, startPosition={}, endPosition={}, durationInCycles={}, \
             reportingPosition={}, latencyInCycles={}, finalDtwDistance={:?}, powerMax={:?}, \
             powerMin={:?}, energy={:?}]",
            self.start_time,
            self.start_cycle,
            self.end_cycle,
            self.duration(),
            self.report_cycle,
            self.reporting_latency(),
            self.distance,
            self.max_value,
            self.min_value,
            self.total_energy
        )
    }
}

/// Wire shape: the CSV column names, derived values included on output.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OccurrenceRecord {
    time_start: String,
    start_position: u64,
    end_position: u64,
    #[serde(default)]
    duration_in_cycles: u64,
    reporting_position: u64,
    #[serde(default)]
    latency_in_cycles: u64,
    final_dtw_distance: f64,
    power_max: f64,
    power_min: f64,
    energy: f64,
}

impl From<DetectedOccurrence> for OccurrenceRecord {
    fn from(o: DetectedOccurrence) -> Self {
        Self {
            duration_in_cycles: o.duration(),
            latency_in_cycles: o.reporting_latency(),
            time_start: o.start_time,
            start_position: o.start_cycle,
            end_position: o.end_cycle,
            reporting_position: o.report_cycle,
            final_dtw_distance: o.distance,
            power_max: o.max_value,
            power_min: o.min_value,
            energy: o.total_energy,
        }
    }
}

// derived columns are recomputed, never trusted
impl TryFrom<OccurrenceRecord> for DetectedOccurrence {
    type Error = ConfigError;

    fn try_from(r: OccurrenceRecord) -> Result<Self> {
        Self::try_new(
            r.time_start,
            r.start_position,
            r.end_position,
            r.reporting_position,
            r.final_dtw_distance,
            r.power_max,
            r.power_min,
            r.energy,
        )
    }
}
