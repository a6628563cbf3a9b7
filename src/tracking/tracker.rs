//! Active-run bookkeeping on top of a [`TrackingBackend`].

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use super::client::TrackingBackend;
use super::error::{Result, TrackingError};
use super::models::{MetricPoint, RunInfo, RunStatus};

/// Step recorded when the caller doesn't supply one
const DEFAULT_STEP: i64 = 0;

/// Holds the implicit active run for one experiment.
///
/// The run is created on the first logging call and reused by every call after it.
pub struct Tracker<B> {
    backend: B,
    experiment_id: String,
    active: Option<RunInfo>,
}

impl<B: TrackingBackend> Tracker<B> {
    pub fn new(backend: B, experiment_id: impl Into<String>) -> Self {
        Tracker {
            backend,
            experiment_id: experiment_id.into(),
            active: None,
        }
    }

    /// The active run, if a logging call has created one
    pub fn active_run(&self) -> Option<&RunInfo> {
        self.active.as_ref()
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ensure_run(&mut self) -> Result<&RunInfo> {
        if self.active.is_none() {
            let info = self.backend.create_run(&self.experiment_id, Utc::now())?;
            tracing::info!(
                run_id = %info.run_id,
                experiment_id = %info.experiment_id,
                "started run"
            );
            self.active = Some(info);
        }
        self.active.as_ref().ok_or(TrackingError::MissingRun)
    }

    /// Record a parameter on the active run; values are stored as strings
    pub fn log_param(&mut self, key: &str, value: impl Display) -> Result<()> {
        let value = value.to_string();
        let run_id = self.ensure_run()?.run_id.clone();
        self.backend.log_param(&run_id, key, &value)?;
        tracing::debug!(%run_id, key, %value, "logged param");
        Ok(())
    }

    /// Append a value to a metric's timeline, stamped now at step 0
    pub fn log_metric(&mut self, key: &str, value: f64) -> Result<MetricPoint> {
        self.log_metric_at(key, value, DEFAULT_STEP)
    }

    pub fn log_metric_at(&mut self, key: &str, value: f64, step: i64) -> Result<MetricPoint> {
        let run_id = self.ensure_run()?.run_id.clone();
        let point = MetricPoint::now(value, step);
        self.backend.log_metric(&run_id, key, &point)?;
        tracing::debug!(%run_id, key, value, step, "logged metric");
        Ok(point)
    }

    /// Upload every file under `dir` to the active run, keeping relative paths.
    ///
    /// Returns the uploaded paths in upload order.
    pub fn log_artifacts(&mut self, dir: &Path) -> Result<Vec<String>> {
        let files = collect_files(dir)?;
        let run = self.ensure_run()?.clone();

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            let relative = relative_artifact_path(dir, &file);
            let contents = std::fs::read(&file)?;
            self.backend.upload_artifact(&run, &relative, contents)?;
            uploaded.push(relative);
        }

        tracing::info!(
            run_id = %run.run_id,
            dir = %dir.display(),
            files = uploaded.len(),
            "uploaded artifacts"
        );
        Ok(uploaded)
    }

    /// Mark the active run terminated with `status`. Does nothing when no run was started.
    pub fn end_run(&mut self, status: RunStatus) -> Result<Option<RunInfo>> {
        let Some(mut info) = self.active.take() else {
            return Ok(None);
        };
        self.backend.update_run_status(&info.run_id, status, Utc::now())?;
        info.status = status;
        tracing::info!(run_id = %info.run_id, %status, "ended run");
        Ok(Some(info))
    }
}

/// Every file below `dir`, sorted for a stable upload order.
///
/// Symlinked directories are not descended into; symlinks to files are uploaded.
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        let file_type = entry.file_type();
        if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// `file` relative to `root`, joined with `/` regardless of platform
fn relative_artifact_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
