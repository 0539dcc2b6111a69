//! Reply bodies of the run endpoints

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use volley_execution::JobRecord;

/// Acknowledgement of an accepted async run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncReply {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "RunID")]
    pub run_id: u64,
}

impl AsyncReply {
    pub fn started(run_id: u64) -> Self {
        Self {
            message: "started".to_string(),
            run_id,
        }
    }
}

/// Every job record keyed by run id
#[derive(Debug, Clone, Serialize)]
pub struct StatusReply {
    #[serde(rename = "Statuses")]
    pub statuses: BTreeMap<u64, JobRecord>,
}

impl FromIterator<JobRecord> for StatusReply {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(records: I) -> Self {
        Self {
            statuses: records.into_iter().map(|r| (r.run_id, r)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopReply {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "StoppedCount")]
    pub stopped_count: usize,
}

impl StopReply {
    pub fn stopped(stopped_count: usize) -> Self {
        Self {
            message: "stopped".to_string(),
            stopped_count,
        }
    }
}
