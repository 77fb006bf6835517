//! Separation rules and sampling configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DeconflictError, Result};
use crate::models::TimeSpan;

pub const DEFAULT_SAFETY_BUFFER: f64 = 5.0;
pub const DEFAULT_SAMPLE_STEP: f64 = 0.5;

/// Configuration for a deconfliction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconflictionConfig {
    /// Minimum allowed separation in distance units
    pub safety_buffer: f64,
    /// Sampling resolution in time units
    pub sample_step: f64,
    /// Restricts analysis to this window when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_window: Option<TimeSpan>,
}

impl Default for DeconflictionConfig {
    fn default() -> Self {
        Self {
            safety_buffer: DEFAULT_SAFETY_BUFFER,
            sample_step: DEFAULT_SAMPLE_STEP,
            analysis_window: None,
        }
    }
}

impl DeconflictionConfig {
    pub fn new(safety_buffer: f64, sample_step: f64) -> Self {
        Self {
            safety_buffer,
            sample_step,
            analysis_window: None,
        }
    }

    pub fn with_safety_buffer(mut self, safety_buffer: f64) -> Self {
        self.safety_buffer = safety_buffer;
        self
    }

    pub fn with_sample_step(mut self, sample_step: f64) -> Self {
        self.sample_step = sample_step;
        self
    }

    pub fn with_analysis_window(mut self, window: TimeSpan) -> Self {
        self.analysis_window = Some(window);
        self
    }

    /// Reject a negative or non-finite buffer, a non-positive or non-finite
    /// step and reversed windows.
    ///
    /// A zero safety buffer is accepted: with strict comparison it simply
    /// never reports a conflict.
    pub fn validate(&self) -> Result<()> {
        if !self.safety_buffer.is_finite() || self.safety_buffer < 0.0 {
            return Err(DeconflictError::configuration(format!(
                "safety_buffer must be a non-negative finite number, got {}",
                self.safety_buffer
            )));
        }
        if !self.sample_step.is_finite() || self.sample_step <= 0.0 {
            return Err(DeconflictError::configuration(format!(
                "sample_step must be a positive finite number, got {}",
                self.sample_step
            )));
        }
        if let Some(window) = &self.analysis_window {
            if !window.start.is_finite() || !window.end.is_finite() || window.start > window.end {
                return Err(DeconflictError::configuration(format!(
                    "analysis window [{}, {}] is not a valid interval",
                    window.start, window.end
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DeconflictionConfig::default();
        assert_eq!(config.safety_buffer, 5.0);
        assert_eq!(config.sample_step, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        for config in [
            DeconflictionConfig::new(-1.0, 0.5),
            DeconflictionConfig::new(f64::NAN, 0.5),
            DeconflictionConfig::new(5.0, 0.0),
            DeconflictionConfig::new(5.0, -0.1),
            DeconflictionConfig::new(5.0, f64::INFINITY),
            DeconflictionConfig::default().with_analysis_window(TimeSpan::new(10.0, 0.0)),
        ] {
            assert!(matches!(
                config.validate(),
                Err(DeconflictError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn test_zero_buffer_is_allowed() {
        assert!(DeconflictionConfig::new(0.0, 0.5).validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DeconflictionConfig =
            serde_json::from_str(r#"{"safety_buffer": 2.0}"#).unwrap();
        assert_eq!(config, DeconflictionConfig::new(2.0, 0.5));
    }
}
