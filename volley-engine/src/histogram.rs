//! HdrHistogram-backed distributions exported as [`HistogramData`]

use hdrhistogram::Histogram;
use volley_core::{Bucket, EngineError, HistogramData, Percentile};

/// Exact summary statistics kept next to the histogram.
///
/// The histogram buckets values with 3 significant figures; count, min, max,
/// sum and standard deviation are reported from these exact accumulators.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    count: u64,
    min: u64,
    max: u64,
    sum: f64,
    sum_squares: f64,
}

impl Moments {
    fn record(&mut self, value: u64) {
        if self.count == 0 || value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.count += 1;
        let v = value as f64;
        self.sum += v;
        self.sum_squares += v * v;
    }
}

/// Distribution of integer samples in a fixed unit (microseconds, bytes)
pub struct Recorder {
    histogram: Histogram<u64>,
    moments: Moments,
}

impl Recorder {
    /// Create an auto-resizing recorder with 3 significant figures
    pub fn new() -> Result<Self, EngineError> {
        let mut histogram = Histogram::<u64>::new(3)
            .map_err(|e| EngineError::Run(format!("histogram creation failed: {}", e)))?;
        histogram.auto(true);
        Ok(Self {
            histogram,
            moments: Moments::default(),
        })
    }

    pub fn record(&mut self, value: u64) {
        // Auto-resize means recording can only fail on values beyond u64 range
        if self.histogram.record(value).is_ok() {
            self.moments.record(value);
        }
    }

    pub fn count(&self) -> u64 {
        self.moments.count
    }

    /// Export the distribution, dividing every value by `scale`.
    ///
    /// Buckets grow by powers of two starting at `first_bucket` units; empty
    /// buckets are omitted.
    pub fn export(&self, scale: f64, first_bucket: u64, percentiles: &[f64]) -> HistogramData {
        let m = &self.moments;
        if m.count == 0 {
            return HistogramData::default();
        }

        let n = m.count as f64;
        let avg = m.sum / n;
        let variance = (m.sum_squares / n - avg * avg).max(0.0);

        let mut data = Vec::new();
        let mut start = m.min;
        for step in self.histogram.iter_log(first_bucket.max(1), 2.0) {
            let count = step.count_since_last_iteration();
            let end = step.value_iterated_to().min(m.max).max(start);
            if count > 0 {
                data.push(Bucket {
                    start: start as f64 / scale,
                    end: end as f64 / scale,
                    percent: step.percentile(),
                    count,
                });
                start = end;
            }
        }

        let percentiles = percentiles
            .iter()
            .map(|p| Percentile {
                percentile: *p,
                value: self.histogram.value_at_quantile(p / 100.0).min(m.max) as f64 / scale,
            })
            .collect();

        HistogramData {
            count: m.count,
            min: m.min as f64 / scale,
            max: m.max as f64 / scale,
            sum: m.sum / scale,
            avg: avg / scale,
            std_dev: variance.sqrt() / scale,
            data,
            percentiles,
        }
    }
}
