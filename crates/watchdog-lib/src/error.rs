//! Error taxonomy for the usage watchdog
//!
//! `MetricError` is recoverable at the per-job boundary inside the scanner;
//! `CapacityError` indicates an upstream data-contract violation; `ScanError`
//! covers structural misconfiguration and directory failures, both of which
//! abort a whole scan. Insufficient sample data is not an error anywhere in
//! this crate: it is the defined "clear" outcome of the decision rule.

use thiserror::Error;

/// A time-series backend call failed or was rejected
#[derive(Debug, Clone, Error)]
pub enum MetricError {
    #[error("metric query failed for {namespace}/{metric_name} ({dimension_value}): {message}")]
    Backend {
        namespace: String,
        metric_name: String,
        dimension_value: String,
        message: String,
    },
}

impl MetricError {
    /// Build a backend error carrying the failed query's identity
    pub fn backend(
        namespace: impl Into<String>,
        metric_name: impl Into<String>,
        dimension_value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Backend {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimension_value: dimension_value.into(),
            message: message.into(),
        }
    }
}

/// A resource-class descriptor could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("unrecognized resource class descriptor {0:?}")]
    InvalidDescriptor(String),
}

/// A whole scan failed before or outside per-job evaluation
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid scan configuration: {0}")]
    InvalidConfig(String),

    #[error("job directory query failed: {0}")]
    Directory(String),
}
