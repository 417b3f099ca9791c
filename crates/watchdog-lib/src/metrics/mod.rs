//! Time-series metric retrieval
//!
//! The backend seam is an injected trait object so the core stays testable
//! with a substitute implementation and carries no process-wide client
//! state. Retrieval is a streaming contract: consumers may begin analyzing
//! before pagination completes.

mod fetch;

pub use fetch::{fetch_series, fetch_values};

use crate::error::MetricError;
use crate::models::MetricSample;
use chrono::{DateTime, Utc};

pub use async_trait::async_trait;

/// Identity of one metric series query over a time range
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimension_key: String,
    pub dimension_value: String,
    pub period_secs: u32,
    pub unit: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One page of a paginated metric response
///
/// `next_token` is an opaque continuation token; `None` means the series is
/// exhausted. A range with no data points is an empty page, not an error.
#[derive(Debug, Clone, Default)]
pub struct MetricPage {
    pub samples: Vec<MetricSample>,
    pub next_token: Option<String>,
}

/// Trait for time-series backend implementations
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Fetch one page of the series identified by `query`, continuing from
    /// `page_token` when present
    async fn get_metric_page(
        &self,
        query: &MetricQuery,
        page_token: Option<&str>,
    ) -> Result<MetricPage, MetricError>;
}
