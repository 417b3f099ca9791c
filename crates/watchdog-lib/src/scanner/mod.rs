//! Concurrent low-usage scanning
//!
//! The scanner enumerates in-progress jobs, classifies each one, and fans
//! out per-job evaluation under a fixed worker bound. Each evaluation
//! fetches the job's processing and memory series, reduces both against the
//! policy's thresholds, and applies the flag decision. A job whose metric
//! retrieval fails is logged and omitted; it never aborts sibling
//! evaluations.

mod long_running;

pub use long_running::find_long_running;

use crate::analyze::try_analyze;
use crate::capacity::classify;
use crate::error::{MetricError, ScanError};
use crate::metrics::{fetch_values, MetricQuery, MetricsBackend};
use crate::models::{JobCandidate, JobRecord, LowUsageFinding};
use crate::policy::ThresholdPolicy;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

pub use async_trait::async_trait;

/// Trait for job-orchestration directory implementations
#[async_trait]
pub trait JobDirectory: Send + Sync {
    /// List in-progress jobs, minus the excluded identifiers
    async fn list_in_progress(&self, exclude: &[String]) -> Result<Vec<JobRecord>, ScanError>;

    /// List in-progress jobs whose start time predates `cutoff`
    async fn list_started_before(&self, cutoff: DateTime<Utc>)
        -> Result<Vec<JobRecord>, ScanError>;
}

/// Processing and memory metric names for one capacity class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNames {
    pub processing: String,
    pub memory: String,
}

impl MetricNames {
    pub fn new(processing: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            processing: processing.into(),
            memory: memory.into(),
        }
    }
}

/// Configuration bundle for one scan cycle
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Metric namespace the jobs report under
    pub namespace: String,
    /// Dimension key identifying a job within the namespace
    pub dimension_key: String,
    /// Metric unit requested from the backend
    pub unit: String,
    /// Metric names for accelerator-bound jobs
    pub accelerator_metrics: MetricNames,
    /// Metric names for processing-bound jobs
    pub processing_metrics: MetricNames,
    /// Lookback window the series are analyzed over
    pub lookback_secs: u64,
    /// Sampling period of the series
    pub period_secs: u32,
    /// Maximum acceptable above-threshold fraction before a job counts as busy
    pub ratio_threshold: f64,
    /// Threshold policy per capacity class
    pub policy: ThresholdPolicy,
    /// Job identifiers excluded from scanning
    pub exclude: Vec<String>,
    /// Fixed bound on concurrently evaluated jobs
    pub max_in_flight: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            namespace: "/jobs/training".to_string(),
            dimension_key: "Host".to_string(),
            unit: "Percent".to_string(),
            accelerator_metrics: MetricNames::new("GPUUtilization", "GPUMemoryUtilization"),
            processing_metrics: MetricNames::new("CPUUtilization", "MemoryUtilization"),
            lookback_secs: 2 * 60 * 60,
            period_secs: 60,
            ratio_threshold: 0.05,
            policy: ThresholdPolicy::default(),
            exclude: Vec::new(),
            max_in_flight: 20,
        }
    }
}

impl ScanConfig {
    /// Reject structural misconfiguration before any job is touched
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.period_secs == 0 {
            return Err(ScanError::InvalidConfig("period_secs is zero".to_string()));
        }
        if self.lookback_secs == 0 {
            return Err(ScanError::InvalidConfig("lookback_secs is zero".to_string()));
        }
        if self.max_in_flight == 0 {
            return Err(ScanError::InvalidConfig(
                "max_in_flight is zero".to_string(),
            ));
        }
        self.policy.validate()
    }

    /// Data-completeness floor: 90% of the expected sample count
    pub fn minimum_samples(&self) -> usize {
        (self.lookback_secs as f64 / f64::from(self.period_secs) * 0.9) as usize
    }

    fn query(&self, metric_name: &str, job_name: &str, end: DateTime<Utc>) -> MetricQuery {
        MetricQuery {
            namespace: self.namespace.clone(),
            metric_name: metric_name.to_string(),
            dimension_key: self.dimension_key.clone(),
            dimension_value: job_name.to_string(),
            period_secs: self.period_secs,
            unit: self.unit.clone(),
            start: end - Duration::seconds(self.lookback_secs as i64),
            end,
        }
    }
}

/// Terminal state of one job evaluation
enum JobOutcome {
    Flagged(LowUsageFinding),
    Clear,
    Failed(MetricError),
}

/// Low-usage scanner over injected backend and directory handles
pub struct Scanner {
    backend: Arc<dyn MetricsBackend>,
    directory: Arc<dyn JobDirectory>,
}

impl Scanner {
    pub fn new(backend: Arc<dyn MetricsBackend>, directory: Arc<dyn JobDirectory>) -> Self {
        Self { backend, directory }
    }

    /// Scan the fleet over the lookback window ending now
    pub async fn scan(&self, config: &ScanConfig) -> Result<Vec<LowUsageFinding>, ScanError> {
        self.scan_at(config, Utc::now()).await
    }

    /// Scan the fleet over the lookback window ending at `end`
    pub async fn scan_at(
        &self,
        config: &ScanConfig,
        end: DateTime<Utc>,
    ) -> Result<Vec<LowUsageFinding>, ScanError> {
        config.validate()?;

        let records = self.directory.list_in_progress(&config.exclude).await?;
        let candidates: Vec<JobCandidate> = records
            .into_iter()
            .filter_map(|record| match classify(&record.resource_class) {
                Ok(profile) => Some(JobCandidate {
                    name: record.name,
                    resource_class: record.resource_class,
                    profile,
                }),
                Err(error) => {
                    // Data-contract violation upstream; skip the job, keep the scan
                    warn!(job = %record.name, %error, "skipping unclassifiable job");
                    None
                }
            })
            .collect();

        debug!(candidates = candidates.len(), "starting low-usage scan");

        let semaphore = Arc::new(Semaphore::new(config.max_in_flight));
        let (outcome_tx, mut outcome_rx) = mpsc::channel(candidates.len().max(1));

        for (index, job) in candidates.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let backend = Arc::clone(&self.backend);
            let config = config.clone();
            let outcome_tx = outcome_tx.clone();
            tokio::spawn(async move {
                let outcome = evaluate_job(backend.as_ref(), &config, &job, end).await;
                drop(permit);
                let _ = outcome_tx.send((index, job, outcome)).await;
            });
        }
        drop(outcome_tx);

        let mut flagged: Vec<(usize, LowUsageFinding)> = Vec::new();
        while let Some((index, job, outcome)) = outcome_rx.recv().await {
            match outcome {
                JobOutcome::Flagged(finding) => flagged.push((index, finding)),
                JobOutcome::Clear => {}
                JobOutcome::Failed(error) => {
                    warn!(job = %job.name, %error, "job evaluation failed");
                }
            }
        }

        // Discovery order keeps the result deterministic for a fixed input
        flagged.sort_by_key(|(index, _)| *index);
        Ok(flagged.into_iter().map(|(_, finding)| finding).collect())
    }
}

async fn evaluate_job(
    backend: &dyn MetricsBackend,
    config: &ScanConfig,
    job: &JobCandidate,
    end: DateTime<Utc>,
) -> JobOutcome {
    let names = if job.profile.is_accelerator_bound {
        &config.accelerator_metrics
    } else {
        &config.processing_metrics
    };

    let processing_thresholds = config.policy.processing_thresholds(&job.profile);
    let processing_query = config.query(&names.processing, &job.name, end);
    let processing = match try_analyze(
        fetch_values(backend, &processing_query),
        &processing_thresholds,
    )
    .await
    {
        Ok(result) => result,
        Err(error) => return JobOutcome::Failed(error),
    };

    let memory_thresholds = config.policy.memory_thresholds(&job.profile);
    let memory_query = config.query(&names.memory, &job.name, end);
    let memory = match try_analyze(fetch_values(backend, &memory_query), &memory_thresholds).await
    {
        Ok(result) => result,
        Err(error) => return JobOutcome::Failed(error),
    };

    debug!(
        job = %job.name,
        processing_samples = processing.sample_count,
        memory_samples = memory.sample_count,
        "job analyzed"
    );

    // Never flag on sparse data
    if memory.sample_count < config.minimum_samples() {
        return JobOutcome::Clear;
    }

    // Flag at the first severity level where both metrics sit under the
    // ratio threshold simultaneously
    let under_both = processing
        .above_ratios
        .iter()
        .zip(&memory.above_ratios)
        .any(|(processing_ratio, memory_ratio)| {
            *processing_ratio < config.ratio_threshold && *memory_ratio < config.ratio_threshold
        });

    if under_both {
        JobOutcome::Flagged(LowUsageFinding {
            job: job.clone(),
            processing_utilization: processing.average,
            memory_utilization: memory.average,
        })
    } else {
        JobOutcome::Clear
    }
}
