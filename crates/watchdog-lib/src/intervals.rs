//! Active-interval reconstruction from sparse samples
//!
//! A resource that reports a metric every few minutes was exercised
//! continuously between consecutive samples; sampling silence longer than
//! the gap slack is read as the resource having stopped. Total running time
//! is the sum of the reconstructed intervals' spans.

use crate::error::MetricError;
use crate::metrics::{fetch_series, MetricQuery, MetricsBackend};
use chrono::{DateTime, Duration, Utc};
use futures::stream::Stream;
use futures::{StreamExt, TryStreamExt};

/// Total duration covered by gap-tolerant active intervals
///
/// Timestamps are assumed chronologically ordered. A gap wider than
/// `gap_slack` closes the open interval and starts a new one; the interval
/// still open at exhaustion contributes its span as-is. Empty input and a
/// single sample both yield zero, since an interval needs a second sample
/// to acquire a positive span.
pub async fn total_active_duration<S>(timestamps: S, gap_slack: Duration) -> Duration
where
    S: Stream<Item = DateTime<Utc>>,
{
    let mut total = Duration::zero();
    let mut interval_start: Option<DateTime<Utc>> = None;
    let mut previous: Option<DateTime<Utc>> = None;

    futures::pin_mut!(timestamps);
    while let Some(current) = timestamps.next().await {
        match (interval_start, previous) {
            (Some(start), Some(past)) if current - past > gap_slack => {
                total = total + (past - start);
                interval_start = Some(current);
            }
            (None, _) => interval_start = Some(current),
            _ => {}
        }
        previous = Some(current);
    }

    if let (Some(start), Some(past)) = (interval_start, previous) {
        total = total + (past - start);
    }
    total
}

/// Total running time of a resource over a query window
///
/// Composes interval reconstruction with the lazy series fetch: any sample
/// at all counts as activity, so only timestamps are consumed. Backends may
/// return pages in arbitrary order (some serve newest-first), so the
/// timestamps are sorted before reconstruction.
pub async fn running_time(
    backend: &dyn MetricsBackend,
    query: &MetricQuery,
    gap_slack: Duration,
) -> Result<Duration, MetricError> {
    let mut timestamps: Vec<DateTime<Utc>> = fetch_series(backend, query)
        .map_ok(|sample| sample.timestamp)
        .try_collect()
        .await?;
    timestamps.sort_unstable();
    Ok(total_active_duration(futures::stream::iter(timestamps), gap_slack).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use futures::stream;

    fn at(offset_secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::seconds(offset_secs)
    }

    async fn duration_of(offsets: Vec<i64>, slack_secs: i64) -> Duration {
        let timestamps: Vec<DateTime<Utc>> = offsets.into_iter().map(at).collect();
        total_active_duration(stream::iter(timestamps), Duration::seconds(slack_secs)).await
    }

    #[tokio::test]
    async fn wide_gap_splits_the_interval() {
        // 540s gap between the 2nd and 3rd sample exceeds the 480s slack,
        // leaving two closed intervals of 60s each
        let total = duration_of(vec![0, 60, 600, 660], 480).await;

        assert_eq!(total, Duration::seconds(120));
    }

    #[tokio::test]
    async fn contiguous_samples_form_one_interval() {
        let total = duration_of(vec![0, 300, 600, 900], 480).await;

        assert_eq!(total, Duration::seconds(900));
    }

    #[tokio::test]
    async fn empty_input_yields_zero() {
        let total = duration_of(vec![], 480).await;

        assert_eq!(total, Duration::zero());
    }

    #[tokio::test]
    async fn single_sample_yields_zero() {
        // An interval with no subsequent sample never closes with a span
        let total = duration_of(vec![3600], 480).await;

        assert_eq!(total, Duration::zero());
    }

    #[tokio::test]
    async fn gap_equal_to_slack_does_not_split() {
        let total = duration_of(vec![0, 480, 960], 480).await;

        assert_eq!(total, Duration::seconds(960));
    }

    #[tokio::test]
    async fn trailing_lone_sample_after_gap_adds_nothing() {
        let total = duration_of(vec![0, 60, 6000], 480).await;

        assert_eq!(total, Duration::seconds(60));
    }

    mod running_time {
        use super::*;
        use crate::metrics::{async_trait, MetricPage, MetricsBackend};
        use crate::models::MetricSample;
        use crate::MetricError;

        /// Backend serving one page of samples in the order given
        struct OrderedBackend {
            offsets: Vec<i64>,
        }

        #[async_trait]
        impl MetricsBackend for OrderedBackend {
            async fn get_metric_page(
                &self,
                _query: &MetricQuery,
                _page_token: Option<&str>,
            ) -> Result<MetricPage, MetricError> {
                Ok(MetricPage {
                    samples: self
                        .offsets
                        .iter()
                        .map(|offset| MetricSample {
                            timestamp: at(*offset),
                            value: 1.0,
                        })
                        .collect(),
                    next_token: None,
                })
            }
        }

        fn query() -> MetricQuery {
            MetricQuery {
                namespace: "/compute/instances".to_string(),
                metric_name: "CPUUtilization".to_string(),
                dimension_key: "InstanceId".to_string(),
                dimension_value: "i-0001".to_string(),
                period_secs: 300,
                unit: "Percent".to_string(),
                start: at(0),
                end: at(3600),
            }
        }

        #[tokio::test]
        async fn newest_first_pages_still_reconstruct_intervals() {
            // Some backends serve samples newest-first; the split-interval
            // series must still total 120s, not a negative span
            let backend = OrderedBackend {
                offsets: vec![660, 600, 60, 0],
            };

            let total = running_time(&backend, &query(), Duration::seconds(480))
                .await
                .unwrap();

            assert_eq!(total, Duration::seconds(120));
        }

        #[tokio::test]
        async fn ascending_pages_match_direct_reconstruction() {
            let backend = OrderedBackend {
                offsets: vec![0, 300, 600, 900],
            };

            let total = running_time(&backend, &query(), Duration::seconds(480))
                .await
                .unwrap();

            assert_eq!(total, Duration::seconds(900));
        }
    }
}
