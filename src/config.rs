//! Configuration management for the throttle gate.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, ThrottleError};

/// Shortest period that survives the millisecond encoding of `period_ms`.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Gate configuration: how many events a period admits and how long a period lasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Threshold of events per period; the event that reaches it is `Closing`
    #[serde(default = "default_max_events")]
    pub max_events_in_period: u64,

    /// Length of a period, measured from the first event of a cycle
    #[serde(
        rename = "period_ms",
        default = "default_period",
        serialize_with = "serialize_millis",
        deserialize_with = "deserialize_millis"
    )]
    pub period: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_events_in_period: default_max_events(),
            period: default_period(),
        }
    }
}

fn default_max_events() -> u64 {
    100
}

fn default_period() -> Duration {
    Duration::from_millis(1000)
}

fn serialize_millis<S>(period: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(period.as_millis() as u64)
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

impl ThrottleConfig {
    /// Create a configuration from its two parameters.
    pub fn new(max_events_in_period: u64, period: Duration) -> Self {
        Self {
            max_events_in_period,
            period,
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading throttle configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ThrottleConfig = serde_yaml::from_str(yaml).map_err(|e| {
            ThrottleError::Config(format!("Failed to parse throttle config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the gate cannot run with.
    ///
    /// Periods are stored in whole milliseconds, so anything shorter than
    /// one millisecond is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.max_events_in_period == 0 {
            return Err(ThrottleError::Config(
                "max_events_in_period must be greater than 0".to_string(),
            ));
        }
        if self.period < MIN_PERIOD {
            return Err(ThrottleError::Config(format!(
                "period must be at least 1ms, got {:?}",
                self.period
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ThrottleConfig::default();
        assert_eq!(config.max_events_in_period, 100);
        assert_eq!(config.period, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
max_events_in_period: 3
period_ms: 250
"#;
        let config = ThrottleConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.max_events_in_period, 3);
        assert_eq!(config.period, Duration::from_millis(250));
    }

    #[test]
    fn test_parse_yaml_uses_defaults_for_missing_fields() {
        let config = ThrottleConfig::from_yaml("period_ms: 50").unwrap();
        assert_eq!(config.max_events_in_period, 100);
        assert_eq!(config.period, Duration::from_millis(50));
    }

    #[test]
    fn test_zero_max_events_rejected() {
        let err = ThrottleConfig::from_yaml("max_events_in_period: 0").unwrap_err();
        assert!(matches!(err, ThrottleError::Config(_)));
        assert!(err.to_string().contains("max_events_in_period"));
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = ThrottleConfig::new(5, Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("period"));
    }

    #[test]
    fn test_sub_millisecond_period_rejected() {
        let config = ThrottleConfig::new(3, Duration::from_micros(500));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ThrottleError::Config(_)));
        assert!(err.to_string().contains("at least 1ms"));

        // Exactly one millisecond is the smallest accepted period
        assert!(ThrottleConfig::new(3, Duration::from_millis(1)).validate().is_ok());
    }

    #[test]
    fn test_valid_config_survives_yaml_roundtrip() {
        let config = ThrottleConfig::new(3, Duration::from_millis(1));
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = ThrottleConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_negative_values_fail_to_parse() {
        let err = ThrottleConfig::from_yaml("max_events_in_period: -1").unwrap_err();
        assert!(matches!(err, ThrottleError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrips_period_in_millis() {
        let config = ThrottleConfig::new(7, Duration::from_millis(1500));
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("period_ms: 1500"));
    }

    #[test]
    fn test_missing_file() {
        let err = ThrottleConfig::from_file("/nonexistent/throttle.yaml").unwrap_err();
        assert!(matches!(err, ThrottleError::Io(_)));
    }
}
