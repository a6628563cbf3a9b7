//! Data models for runs on an MLflow-compatible tracking server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a run as the server reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Running,
    Scheduled,
    Finished,
    Failed,
    Killed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Scheduled => "SCHEDULED",
            RunStatus::Finished => "FINISHED",
            RunStatus::Failed => "FAILED",
            RunStatus::Killed => "KILLED",
        };
        f.write_str(s)
    }
}

/// Server-side identity of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub experiment_id: String,
    /// Where the server expects this run's artifacts, e.g. `mlflow-artifacts:/0/<id>/artifacts`
    pub artifact_uri: String,
    #[serde(default)]
    pub status: RunStatus,
}

/// A single data point in a metric time series
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub step: i64,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricPoint {
    /// A point stamped with the current time
    pub fn now(value: f64, step: i64) -> Self {
        MetricPoint {
            step,
            value,
            timestamp: Utc::now(),
        }
    }
}

// Wire bodies for the REST API.

#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub experiment_id: &'a str,
    pub start_time: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRunResponse {
    pub run: RunEnvelope,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunEnvelope {
    pub info: RunInfo,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogParamRequest<'a> {
    pub run_id: &'a str,
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogMetricRequest<'a> {
    pub run_id: &'a str,
    pub key: &'a str,
    pub value: f64,
    pub timestamp: i64,
    pub step: i64,
}

impl<'a> LogMetricRequest<'a> {
    pub fn new(run_id: &'a str, key: &'a str, point: &MetricPoint) -> Self {
        LogMetricRequest {
            run_id,
            key,
            value: point.value,
            timestamp: point.timestamp.timestamp_millis(),
            step: point.step,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRunRequest<'a> {
    pub run_id: &'a str,
    pub status: RunStatus,
    pub end_time: i64,
}

/// Error body returned by the server on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error_code: Option<String>,
    pub message: Option<String>,
}
