//! CLI configuration from environment.

use std::env;
use std::time::Duration;

use deconflict_core::rules::{DEFAULT_SAFETY_BUFFER, DEFAULT_SAMPLE_STEP};
use deconflict_core::DeconflictionConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub safety_buffer: f64,
    pub sample_step: f64,
    pub timeout: Option<Duration>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            safety_buffer: DEFAULT_SAFETY_BUFFER,
            sample_step: DEFAULT_SAMPLE_STEP,
            timeout: None,
        }
    }
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparsable values fall back to
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            safety_buffer: lookup("DECONFLICT_SAFETY_BUFFER")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.safety_buffer),
            sample_step: lookup("DECONFLICT_SAMPLE_STEP")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sample_step),
            timeout: lookup("DECONFLICT_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis),
        }
    }

    pub fn engine_config(&self) -> DeconflictionConfig {
        DeconflictionConfig::new(self.safety_buffer, self.sample_step)
    }
}
