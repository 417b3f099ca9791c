//! Replay backend over a captured metrics fixture
//!
//! Serves a JSON fixture of jobs and their recorded metric series through
//! the same trait seams a live backend would implement, so a full scan can
//! run against captured data. Pages are capped at the upstream backend's
//! datapoint limit to keep the pagination path exercised.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use watchdog_lib::{
    JobDirectory, JobRecord, MetricError, MetricPage, MetricQuery, MetricSample, MetricsBackend,
    ScanError,
};

/// Maximum samples returned per page
const PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayJob {
    pub name: String,
    pub resource_class: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Vec<MetricSample>>,
}

#[derive(Debug, Clone, Deserialize)]
struct Fixture {
    jobs: Vec<ReplayJob>,
}

/// Fixture-backed metrics backend and job directory
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    jobs: Vec<ReplayJob>,
}

impl ReplayBackend {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let fixture: Fixture = serde_json::from_str(&raw)?;
        Ok(Self { jobs: fixture.jobs })
    }

    pub fn from_jobs(jobs: Vec<ReplayJob>) -> Self {
        Self { jobs }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Latest sample timestamp in the fixture; replay scans anchor their
    /// lookback window here instead of at wall-clock now
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.jobs
            .iter()
            .flat_map(|job| job.metrics.values())
            .flatten()
            .map(|sample| sample.timestamp)
            .max()
    }
}

#[async_trait]
impl MetricsBackend for ReplayBackend {
    async fn get_metric_page(
        &self,
        query: &MetricQuery,
        page_token: Option<&str>,
    ) -> Result<MetricPage, MetricError> {
        let offset = match page_token {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| {
                MetricError::backend(
                    &query.namespace,
                    &query.metric_name,
                    &query.dimension_value,
                    format!("bad page token {token:?}"),
                )
            })?,
        };

        // A job or metric absent from the fixture is an empty series, not
        // an error, matching the live backend's empty-range behavior
        let in_range: Vec<MetricSample> = self
            .jobs
            .iter()
            .find(|job| job.name == query.dimension_value)
            .and_then(|job| job.metrics.get(&query.metric_name))
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.timestamp >= query.start && s.timestamp <= query.end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        let page: Vec<MetricSample> =
            in_range.iter().skip(offset).take(PAGE_SIZE).copied().collect();
        let next_offset = offset + page.len();
        let next_token =
            (next_offset < in_range.len()).then(|| next_offset.to_string());

        Ok(MetricPage {
            samples: page,
            next_token,
        })
    }
}

#[async_trait]
impl JobDirectory for ReplayBackend {
    async fn list_in_progress(&self, exclude: &[String]) -> Result<Vec<JobRecord>, ScanError> {
        Ok(self
            .jobs
            .iter()
            .filter(|job| job.status == "InProgress" && !exclude.contains(&job.name))
            .map(|job| JobRecord {
                name: job.name.clone(),
                resource_class: job.resource_class.clone(),
                started_at: job.started_at,
            })
            .collect())
    }

    async fn list_started_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<JobRecord>, ScanError> {
        Ok(self
            .jobs
            .iter()
            .filter(|job| {
                job.status == "InProgress"
                    && job.started_at.is_some_and(|started| started <= cutoff)
            })
            .map(|job| JobRecord {
                name: job.name.clone(),
                resource_class: job.resource_class.clone(),
                started_at: job.started_at,
            })
            .collect())
    }
}
