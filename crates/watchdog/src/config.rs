//! Watchdog configuration

use anyhow::Result;
use serde::Deserialize;
use watchdog_lib::{Condition, MetricNames, ScanConfig, ThresholdPolicy};

/// Watchdog configuration
///
/// Loaded from an optional `watchdog` config file with `WATCHDOG_`-prefixed
/// environment overrides on top.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogConfig {
    /// Metric namespace the monitored jobs report under
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Lookback window in hours for the low-usage scan
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,

    /// Sampling period of the metric series in seconds
    #[serde(default = "default_period_secs")]
    pub period_secs: u32,

    /// Maximum acceptable above-threshold sample fraction
    #[serde(default = "default_ratio_threshold")]
    pub ratio_threshold: f64,

    /// Bound on concurrently evaluated jobs
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Job identifiers exempt from scanning
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Base conditions for accelerator-bound jobs
    #[serde(default = "default_accelerator_conditions")]
    pub accelerator_conditions: Vec<Condition>,

    /// Base conditions for processing-bound jobs
    #[serde(default = "default_processing_conditions")]
    pub processing_conditions: Vec<Condition>,

    /// Fixed processing threshold for smallest-tier instances
    #[serde(default = "default_processing_override")]
    pub small_tier_processing_override: f64,

    /// Fixed memory threshold for smallest-tier instances
    #[serde(default = "default_memory_override")]
    pub small_tier_memory_override: f64,

    /// Age in hours past which an in-progress job counts as long-running
    #[serde(default = "default_long_running_hours")]
    pub long_running_hours: i64,

    /// Path to the replay fixture driving this process
    #[serde(default = "default_fixture_path")]
    pub fixture_path: String,
}

fn default_namespace() -> String {
    "/jobs/training".to_string()
}

fn default_lookback_hours() -> u64 {
    2
}

fn default_period_secs() -> u32 {
    60
}

fn default_ratio_threshold() -> f64 {
    0.05
}

fn default_max_in_flight() -> usize {
    20
}

fn default_accelerator_conditions() -> Vec<Condition> {
    vec![Condition::new(30.0, 30.0), Condition::new(5.0, 90.0)]
}

fn default_processing_conditions() -> Vec<Condition> {
    vec![Condition::new(20.0, 20.0)]
}

fn default_processing_override() -> f64 {
    1.0
}

fn default_memory_override() -> f64 {
    5.0
}

fn default_long_running_hours() -> i64 {
    12
}

fn default_fixture_path() -> String {
    "fixtures/jobs.json".to_string()
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            lookback_hours: default_lookback_hours(),
            period_secs: default_period_secs(),
            ratio_threshold: default_ratio_threshold(),
            max_in_flight: default_max_in_flight(),
            exclude: Vec::new(),
            accelerator_conditions: default_accelerator_conditions(),
            processing_conditions: default_processing_conditions(),
            small_tier_processing_override: default_processing_override(),
            small_tier_memory_override: default_memory_override(),
            long_running_hours: default_long_running_hours(),
            fixture_path: default_fixture_path(),
        }
    }
}

impl WatchdogConfig {
    /// Load configuration from the optional config file and environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("watchdog").required(false))
            .add_source(config::Environment::with_prefix("WATCHDOG"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Assemble the scan configuration for one cycle
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            namespace: self.namespace.clone(),
            dimension_key: "Host".to_string(),
            unit: "Percent".to_string(),
            accelerator_metrics: MetricNames::new("GPUUtilization", "GPUMemoryUtilization"),
            processing_metrics: MetricNames::new("CPUUtilization", "MemoryUtilization"),
            lookback_secs: self.lookback_hours * 60 * 60,
            period_secs: self.period_secs,
            ratio_threshold: self.ratio_threshold,
            policy: ThresholdPolicy {
                accelerator_conditions: self.accelerator_conditions.clone(),
                processing_conditions: self.processing_conditions.clone(),
                small_tier_processing_override: self.small_tier_processing_override,
                small_tier_memory_override: self.small_tier_memory_override,
            },
            exclude: self.exclude.clone(),
            max_in_flight: self.max_in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_a_standard_scan_cycle() {
        let config = WatchdogConfig::default();

        assert_eq!(config.lookback_hours, 2);
        assert_eq!(config.period_secs, 60);
        assert_eq!(config.ratio_threshold, 0.05);
        assert_eq!(config.max_in_flight, 20);
        assert_eq!(config.long_running_hours, 12);
    }

    #[test]
    fn scan_config_carries_policy_and_window() {
        let scan = WatchdogConfig::default().scan_config();

        assert_eq!(scan.lookback_secs, 7200);
        assert_eq!(scan.minimum_samples(), 108);
        assert_eq!(scan.policy.processing_conditions.len(), 1);
        assert_eq!(scan.policy.accelerator_conditions.len(), 2);
        assert!(scan.validate().is_ok());
    }
}
