use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Detection parameters for one engine.
///
/// A best candidate is only reported once its length covers at least
/// `sequence_length_minimum × profile length` cycles and its cumulative sum
/// reaches `sequence_energy_minimum × profile total energy`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    /// Largest DTW distance accepted as a match.
    pub threshold: f64,
    #[serde(default)]
    pub sequence_length_minimum: f64,
    #[serde(default)]
    pub sequence_energy_minimum: f64,
}

impl SpringConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            sequence_length_minimum: 0.0,
            sequence_energy_minimum: 0.0,
        }
    }

    pub fn with_length_minimum(mut self, fraction: f64) -> Self {
        self.sequence_length_minimum = fraction;
        self
    }

    pub fn with_energy_minimum(mut self, fraction: f64) -> Self {
        self.sequence_energy_minimum = fraction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        check_minimum("sequence_length_minimum", self.sequence_length_minimum)?;
        check_minimum("sequence_energy_minimum", self.sequence_energy_minimum)
    }
}

fn check_minimum(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidMinimum { name, value });
    }
    Ok(())
}
