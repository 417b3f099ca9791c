//! Lazy, paginated series retrieval

use super::{MetricQuery, MetricsBackend};
use crate::error::MetricError;
use crate::models::MetricSample;
use futures::stream::Stream;
use futures::TryStreamExt;
use tracing::debug;

/// Fetch a metric series as a lazy, forward-only stream
///
/// Pages are followed transparently until the backend stops returning a
/// continuation token; samples are yielded in page order before the next
/// page is requested. Every call re-queries from scratch. Backend failures
/// surface as `MetricError` on the stream; no retries are attempted here,
/// since retry policy belongs to the caller.
pub fn fetch_series<'a>(
    backend: &'a dyn MetricsBackend,
    query: &MetricQuery,
) -> impl Stream<Item = Result<MetricSample, MetricError>> + 'a {
    let query = query.clone();
    async_stream::try_stream! {
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = backend.get_metric_page(&query, page_token.as_deref()).await?;
            pages += 1;
            for sample in page.samples {
                yield sample;
            }
            match page.next_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(
            metric = %query.metric_name,
            dimension = %query.dimension_value,
            pages,
            "metric series exhausted"
        );
    }
}

/// Fetch a metric series as a stream of plain values, timestamps dropped
pub fn fetch_values<'a>(
    backend: &'a dyn MetricsBackend,
    query: &MetricQuery,
) -> impl Stream<Item = Result<f64, MetricError>> + 'a {
    fetch_series(backend, query).map_ok(|sample| sample.value)
}
