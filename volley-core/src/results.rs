//! Engine result model, serialized as the run API success reply

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pseudo status code under which transport failures are counted
pub const TRANSPORT_ERROR_CODE: i32 = -1;

/// One histogram bucket covering `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bucket {
    pub start: f64,
    pub end: f64,
    /// Cumulative percentage of samples up to and including this bucket
    pub percent: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Percentile {
    pub percentile: f64,
    pub value: f64,
}

/// Summary of a recorded distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistogramData {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub avg: f64,
    pub std_dev: f64,
    pub data: Vec<Bucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub percentiles: Vec<Percentile>,
}

/// Outcome of one load generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunResults {
    pub run_type: String,
    pub labels: String,
    pub start_time: DateTime<Utc>,
    /// Requested rate, `max` when running unthrottled
    #[serde(rename = "RequestedQPS")]
    pub requested_qps: String,
    pub requested_duration: String,
    #[serde(rename = "ActualQPS")]
    pub actual_qps: f64,
    /// Wall clock run time in nanoseconds
    pub actual_duration: u64,
    pub num_threads: u32,
    pub version: String,
    /// Request latency distribution, in seconds
    pub duration_histogram: HistogramData,
    /// Exact number of calls the run was bound to, 0 when it had no fixed count
    pub exactly: u64,
    pub ret_codes: BTreeMap<i32, u64>,
    /// Response body size distribution, in bytes
    pub sizes: HistogramData,
    #[serde(rename = "URL")]
    pub url: String,
    pub socket_count: u64,
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The run was stopped before reaching its bound
    #[serde(skip)]
    pub stopped_early: bool,
}

impl RunResults {
    /// Number of calls that returned `code`
    pub fn ret_code_count(&self, code: i32) -> u64 {
        self.ret_codes.get(&code).copied().unwrap_or(0)
    }

    /// Sum over every status code, transport errors included
    pub fn total_calls(&self) -> u64 {
        self.ret_codes.values().sum()
    }

    pub fn error_count(&self) -> u64 {
        self.ret_codes
            .iter()
            .filter(|(code, _)| !(200..300).contains(*code))
            .map(|(_, count)| count)
            .sum()
    }
}
