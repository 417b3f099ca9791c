//! Long-running job detection
//!
//! Flags in-progress jobs whose start time predates a cutoff. Pure listing
//! plus age arithmetic; no metric retrieval is involved.

use super::JobDirectory;
use crate::error::ScanError;
use crate::models::LongRunningFinding;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Find in-progress jobs that have been running longer than `max_age`
///
/// The directory pre-filters by the cutoff; records are re-checked here so a
/// sloppy implementation cannot produce negative running times. Records
/// without a start time cannot be aged and are dropped.
pub async fn find_long_running(
    directory: &dyn JobDirectory,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<LongRunningFinding>, ScanError> {
    let cutoff = now - max_age;
    let records = directory.list_started_before(cutoff).await?;

    Ok(records
        .into_iter()
        .filter_map(|record| match record.started_at {
            Some(started_at) if started_at <= cutoff => Some(LongRunningFinding {
                running_for: now - started_at,
                job: record,
            }),
            Some(_) => None,
            None => {
                debug!(job = %record.name, "dropping record without a start time");
                None
            }
        })
        .collect())
}
