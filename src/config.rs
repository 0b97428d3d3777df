//! Engine configuration
//!
//! One immutable value per invocation: the clutch criteria and the intensity
//! weights. Every field has a default, so a partial JSON document such as
//! `{"criteria": {"max_margin": 3}}` is a complete configuration.

use crate::error::ComputeError;
use crate::intensity::IntensityWeights;
use crate::types::Criteria;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub criteria: Criteria,
    #[serde(default)]
    pub intensity: IntensityWeights,
}

impl EngineConfig {
    pub fn new(criteria: Criteria, intensity: IntensityWeights) -> Self {
        Self {
            criteria,
            intensity,
        }
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| ComputeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.criteria.min_period == 0 {
            return Err(ComputeError::InvalidConfig(
                "criteria.min_period must be at least 1".to_string(),
            ));
        }

        let IntensityWeights {
            time_weight,
            margin_weight,
        } = self.intensity;
        for (name, weight) in [("time_weight", time_weight), ("margin_weight", margin_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ComputeError::InvalidConfig(format!(
                    "intensity.{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        if time_weight + margin_weight == 0.0 {
            return Err(ComputeError::InvalidConfig(
                "intensity weights cannot both be zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.criteria.min_period, 4);
        assert_eq!(config.criteria.max_window_seconds, 300);
        assert_eq!(config.criteria.max_margin, 5);
        assert_eq!(config.intensity.time_weight, 0.7);
        assert_eq!(config.intensity.margin_weight, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{"criteria": {"max_margin": 3}}"#).unwrap();
        assert_eq!(config.criteria.max_margin, 3);
        assert_eq!(config.criteria.min_period, 4);
        assert_eq!(config.intensity, IntensityWeights::default());

        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = EngineConfig::new(
            Criteria {
                min_period: 2,
                max_window_seconds: 120,
                max_margin: 3,
            },
            IntensityWeights {
                time_weight: 0.6,
                margin_weight: 0.4,
            },
        );
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs() {
        let bad = [
            r#"{"criteria": {"min_period": 0}}"#,
            r#"{"intensity": {"time_weight": -0.1}}"#,
            r#"{"intensity": {"time_weight": 0.0, "margin_weight": 0.0}}"#,
            r#"{"criteria": {"max_margin": -1}}"#,
            "not json",
        ];
        for json in bad {
            let err = EngineConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ComputeError::InvalidConfig(_)), "{json}");
        }
    }
}
