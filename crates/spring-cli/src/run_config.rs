use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use spring_core::SpringConfig;

/// Optional TOML file for `spring run`. Command-line flags win over it.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub threshold: Option<f64>,
    pub sequence_length_minimum: Option<f64>,
    pub sequence_energy_minimum: Option<f64>,
    pub identifier: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub threshold: Option<f64>,
    pub length_minimum: Option<f64>,
    pub energy_minimum: Option<f64>,
    pub identifier: Option<String>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Merge with command-line overrides and validate.
    pub fn resolve(self, overrides: Overrides) -> Result<(SpringConfig, String)> {
        let threshold = overrides
            .threshold
            .or(self.threshold)
            .ok_or_else(|| anyhow!("no threshold: pass --threshold or set it in --config"))?;

        let config = SpringConfig::new(threshold)
            .with_length_minimum(
                overrides
                    .length_minimum
                    .or(self.sequence_length_minimum)
                    .unwrap_or(0.0),
            )
            .with_energy_minimum(
                overrides
                    .energy_minimum
                    .or(self.sequence_energy_minimum)
                    .unwrap_or(0.0),
            );
        config.validate()?;

        let identifier = overrides.identifier.or(self.identifier).unwrap_or_default();
        Ok((config, identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let c: RunConfig = toml::from_str(
            "threshold = 10.0\nsequence_length_minimum = 0.5\nsequence_energy_minimum = 0.9\nidentifier = \"[fridge] \"\n",
        )
        .unwrap();
        assert_eq!(c.threshold, Some(10.0));
        assert_eq!(c.identifier.as_deref(), Some("[fridge] "));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<RunConfig>("treshold = 1.0").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let file = RunConfig {
            threshold: Some(10.0),
            sequence_length_minimum: Some(0.5),
            sequence_energy_minimum: None,
            identifier: Some("file".into()),
        };
        let (config, id) = file
            .resolve(Overrides {
                threshold: Some(3.0),
                energy_minimum: Some(0.2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            config,
            SpringConfig::new(3.0)
                .with_length_minimum(0.5)
                .with_energy_minimum(0.2)
        );
        assert_eq!(id, "file");
    }

    #[test]
    fn test_threshold_required() {
        let err = RunConfig::default()
            .resolve(Overrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = RunConfig::default()
            .resolve(Overrides {
                threshold: Some(-2.0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("threshold must be"), "{err}");
    }
}
