//! In-memory tracking backend for tests.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::client::TrackingBackend;
use super::error::{Result, TrackingError};
use super::models::{MetricPoint, RunInfo, RunStatus};

/// Everything recorded against one run
#[derive(Debug, Clone, Default)]
pub struct StoredRun {
    pub experiment_id: String,
    pub status: RunStatus,
    pub params: HashMap<String, String>,
    pub metrics: HashMap<String, Vec<MetricPoint>>,
    pub artifacts: HashMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    runs: RefCell<HashMap<String, StoredRun>>,
    next_id: RefCell<u64>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_count(&self) -> usize {
        self.runs.borrow().len()
    }

    pub fn run(&self, run_id: &str) -> Option<StoredRun> {
        self.runs.borrow().get(run_id).cloned()
    }

    fn with_run<T>(&self, run_id: &str, f: impl FnOnce(&mut StoredRun) -> T) -> Result<T> {
        let mut runs = self.runs.borrow_mut();
        let run = runs.get_mut(run_id).ok_or(TrackingError::MissingRun)?;
        Ok(f(run))
    }
}

impl TrackingBackend for InMemoryBackend {
    fn create_run(&self, experiment_id: &str, _start_time: DateTime<Utc>) -> Result<RunInfo> {
        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            *next
        };
        let run_id = format!("run-{id:04}");

        self.runs.borrow_mut().insert(
            run_id.clone(),
            StoredRun {
                experiment_id: experiment_id.to_string(),
                ..StoredRun::default()
            },
        );
        Ok(RunInfo {
            artifact_uri: format!("mlflow-artifacts:/{experiment_id}/{run_id}/artifacts"),
            run_id,
            experiment_id: experiment_id.to_string(),
            status: RunStatus::Running,
        })
    }

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        self.with_run(run_id, |run| {
            run.params.insert(key.to_string(), value.to_string());
        })
    }

    fn log_metric(&self, run_id: &str, key: &str, point: &MetricPoint) -> Result<()> {
        self.with_run(run_id, |run| {
            run.metrics
                .entry(key.to_string())
                .or_default()
                .push(point.clone());
        })
    }

    fn upload_artifact(
        &self,
        run: &RunInfo,
        relative_path: &str,
        contents: Vec<u8>,
    ) -> Result<()> {
        self.with_run(&run.run_id, |stored| {
            stored.artifacts.insert(relative_path.to_string(), contents);
        })
    }

    fn update_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        _end_time: DateTime<Utc>,
    ) -> Result<()> {
        self.with_run(run_id, |run| run.status = status)
    }
}
