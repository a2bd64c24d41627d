use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::PROFILE_SENTINEL;
use crate::error::{ConfigError, Result};

/// Reference pattern searched for in the stream.
///
/// Samples are stored aligned with the DP column: index 0 holds a sentinel
/// that is never compared, reference samples live at `1..=len()`. The total
/// energy is computed once at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileSpec", into = "ProfileSpec")]
pub struct Profile {
    id: u32,
    values: Vec<f64>,
    total_energy: f64,
}

/// Serialized shape of a profile: the id and the reference samples only.
#[derive(Serialize, Deserialize)]
struct ProfileSpec {
    id: u32,
    samples: Vec<f64>,
}

impl Profile {
    /// Build a profile from reference samples (no sentinel).
    pub fn new(id: u32, samples: Vec<f64>) -> Result<Self> {
        let mut values = Vec::with_capacity(samples.len() + 1);
        values.push(PROFILE_SENTINEL);
        values.extend(samples);
        Self::from_aligned(id, values)
    }

    /// Build a profile from the sentinel-prefixed layout `[_, s1, s2, ...]`.
    ///
    /// Whatever sits at index 0 is replaced by the sentinel.
    pub fn from_aligned(id: u32, mut values: Vec<f64>) -> Result<Self> {
        if values.len() < 2 {
            return Err(ConfigError::EmptyProfile);
        }
        if let Some(index) = values.iter().skip(1).position(|v| !v.is_finite()) {
            return Err(ConfigError::NonFiniteProfileValue { index: index + 1 });
        }
        values[0] = PROFILE_SENTINEL;
        let total_energy = values[1..].iter().sum();
        Ok(Self {
            id,
            values,
            total_energy,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of reference samples (the sentinel is not counted).
    pub fn len(&self) -> usize {
        self.values.len() - 1
    }

    /// Always false: construction rejects empty profiles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all reference samples.
    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    /// Reference sample at a 1-based position.
    pub fn sample(&self, index: usize) -> Option<f64> {
        if index == 0 {
            return None;
        }
        self.values.get(index).copied()
    }

    /// Reference samples without the sentinel.
    pub fn samples(&self) -> &[f64] {
        &self.values[1..]
    }

    /// Aligned view including the sentinel at index 0.
    pub(crate) fn aligned(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<ProfileSpec> for Profile {
    type Error = ConfigError;

    fn try_from(spec: ProfileSpec) -> Result<Self> {
        Profile::new(spec.id, spec.samples)
    }
}

impl From<Profile> for ProfileSpec {
    fn from(profile: Profile) -> Self {
        let samples = profile.samples().to_vec();
        ProfileSpec {
            id: profile.id,
            samples,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Profile [id={}, length={}, totalEnergy={:?}]",
            self.id,
            self.len(),
            self.total_energy
        )
    }
}
