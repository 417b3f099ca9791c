//! Watchdog library for compute-job usage monitoring
//!
//! This crate provides the core functionality for:
//! - Paginated time-series metric retrieval as lazy streams
//! - Capacity classification from resource-class descriptors
//! - Windowed statistical analysis against threshold lists
//! - Threshold policy selection per capacity class
//! - Concurrent low-usage scanning with per-job failure isolation
//! - Active-interval reconstruction from sparse samples

pub mod analyze;
pub mod capacity;
pub mod error;
pub mod intervals;
pub mod metrics;
pub mod models;
pub mod policy;
pub mod scanner;

pub use analyze::{analyze, try_analyze};
pub use capacity::classify;
pub use error::{CapacityError, MetricError, ScanError};
pub use intervals::{running_time, total_active_duration};
pub use metrics::{fetch_series, fetch_values, MetricPage, MetricQuery, MetricsBackend};
pub use models::*;
pub use policy::ThresholdPolicy;
pub use scanner::{
    find_long_running, JobDirectory, MetricNames, ScanConfig, Scanner,
};
