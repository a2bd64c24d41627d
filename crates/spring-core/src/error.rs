use std::fmt;

/// Rejected engine configuration, profile, or occurrence record.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyProfile,
    NonFiniteProfileValue { index: usize },
    InvalidThreshold(f64),
    InvalidMinimum { name: &'static str, value: f64 },
    /// Positions violate `start <= end <= report`.
    InvertedCycles { start: u64, end: u64, report: u64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyProfile => write!(f, "profile has no reference samples"),
            ConfigError::NonFiniteProfileValue { index } => {
                write!(f, "profile sample {index} is not a finite number")
            }
            ConfigError::InvalidThreshold(t) => {
                write!(f, "threshold must be finite and >= 0, got {t}")
            }
            ConfigError::InvalidMinimum { name, value } => {
                write!(f, "{name} must be finite and >= 0, got {value}")
            }
            ConfigError::InvertedCycles { start, end, report } => write!(
                f,
                "occurrence positions must satisfy start <= end <= report, got {start}, {end}, {report}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

pub type Result<T> = std::result::Result<T, ConfigError>;
