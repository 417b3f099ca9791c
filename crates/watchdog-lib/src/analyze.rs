//! Windowed statistical analysis of utilization series
//!
//! A single pass over the value stream accumulates the sample count, the
//! running sum, and one above-threshold counter per supplied threshold. The
//! stream is consumed exactly once; the threshold count is small (two in
//! practice) so the pass is effectively linear.

use crate::error::MetricError;
use crate::models::AnalysisResult;
use futures::stream::Stream;
use futures::StreamExt;

struct Accumulator {
    above_counts: Vec<u64>,
    count: u64,
    sum: f64,
}

impl Accumulator {
    fn new(threshold_count: usize) -> Self {
        Self {
            above_counts: vec![0; threshold_count],
            count: 0,
            sum: 0.0,
        }
    }

    fn push(&mut self, value: f64, thresholds: &[f64]) {
        self.count += 1;
        self.sum += value;
        for (above, threshold) in self.above_counts.iter_mut().zip(thresholds) {
            if value > *threshold {
                *above += 1;
            }
        }
    }

    fn finish(self) -> AnalysisResult {
        if self.count == 0 {
            // Defined degenerate case: no data is not an error
            return AnalysisResult {
                above_ratios: vec![0.0; self.above_counts.len()],
                sample_count: 0,
                average: 0.0,
            };
        }
        let total = self.count as f64;
        AnalysisResult {
            above_ratios: self
                .above_counts
                .into_iter()
                .map(|above| above as f64 / total)
                .collect(),
            sample_count: self.count as usize,
            average: self.sum / total,
        }
    }
}

/// Reduce a value stream against a threshold list
pub async fn analyze<S>(values: S, thresholds: &[f64]) -> AnalysisResult
where
    S: Stream<Item = f64>,
{
    let mut acc = Accumulator::new(thresholds.len());
    futures::pin_mut!(values);
    while let Some(value) = values.next().await {
        acc.push(value, thresholds);
    }
    acc.finish()
}

/// Reduce a fallible value stream, stopping at the first retrieval error
pub async fn try_analyze<S>(values: S, thresholds: &[f64]) -> Result<AnalysisResult, MetricError>
where
    S: Stream<Item = Result<f64, MetricError>>,
{
    let mut acc = Accumulator::new(thresholds.len());
    futures::pin_mut!(values);
    while let Some(value) = values.next().await {
        acc.push(value?, thresholds);
    }
    Ok(acc.finish())
}
