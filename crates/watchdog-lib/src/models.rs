//! Core data models for the usage watchdog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation from a utilization time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Effective capacity derived from a job's resource-class descriptor
///
/// `processing_units` is at least 1 so downstream per-unit division is
/// always defined. `generation` is set only for accelerator classes;
/// `base_tier` marks descriptors that carried no size multiplier at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityProfile {
    pub accelerator_units: u32,
    pub processing_units: u32,
    pub is_accelerator_bound: bool,
    pub generation: Option<u32>,
    pub base_tier: bool,
}

impl CapacityProfile {
    /// Number of units the job's primary constrained resource provides
    pub fn unit_count(&self) -> u32 {
        if self.is_accelerator_bound {
            self.accelerator_units
        } else {
            self.processing_units
        }
    }
}

/// One severity level of the low-usage check: a processing-utilization
/// threshold paired with a memory-utilization threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub threshold: f64,
    pub mem_threshold: f64,
}

impl Condition {
    pub fn new(threshold: f64, mem_threshold: f64) -> Self {
        Self {
            threshold,
            mem_threshold,
        }
    }
}

/// Statistical summary of one metric series against a threshold list
///
/// `above_ratios[i]` is the fraction of samples strictly greater than the
/// i-th threshold supplied to the analyzer. An empty series yields zero
/// ratios, zero count, and a 0.0 average rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub above_ratios: Vec<f64>,
    pub sample_count: usize,
    pub average: f64,
}

/// A job as returned by the orchestration directory, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub name: String,
    pub resource_class: String,
    pub started_at: Option<DateTime<Utc>>,
}

/// A job under evaluation in one scan cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCandidate {
    pub name: String,
    pub resource_class: String,
    pub profile: CapacityProfile,
}

/// A job classified as under-utilizing its allocated capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowUsageFinding {
    pub job: JobCandidate,
    /// Mean processing utilization over the lookback window (raw percent)
    pub processing_utilization: f64,
    /// Mean memory utilization over the lookback window (raw percent)
    pub memory_utilization: f64,
}

impl LowUsageFinding {
    /// Mean processing utilization per allocated unit
    pub fn processing_percent(&self) -> f64 {
        self.processing_utilization / f64::from(self.job.profile.unit_count())
    }

    /// Mean memory utilization per allocated unit
    pub fn memory_percent(&self) -> f64 {
        self.memory_utilization / f64::from(self.job.profile.unit_count())
    }
}

/// A job that has been running longer than the configured maximum age
#[derive(Debug, Clone, PartialEq)]
pub struct LongRunningFinding {
    pub job: JobRecord,
    pub running_for: chrono::Duration,
}
