//! The demo logging sequence: one param, one metric three times, one artifact directory.

use std::path::PathBuf;

use rand::Rng;

use super::client::TrackingBackend;
use super::error::{Result, TrackingError};
use super::models::RunStatus;
use super::tracker::Tracker;
use crate::cli::TrackingConfig;

pub const PARAM_NAME: &str = "param1";
pub const METRIC_NAME: &str = "foo";

/// What a demo invocation recorded
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub run_id: String,
    pub param_value: i64,
    pub metric_values: [f64; 3],
    pub artifact_path: PathBuf,
    pub uploaded: Vec<String>,
}

/// Run the full logging sequence against `tracker`, finishing its run at the end.
///
/// If a step fails after the run was created, the run is marked `FAILED` before the
/// error is returned.
pub fn run_demo<B, R>(
    tracker: &mut Tracker<B>,
    config: &TrackingConfig,
    rng: &mut R,
) -> Result<DemoReport>
where
    B: TrackingBackend,
    R: Rng,
{
    match log_sequence(tracker, config, rng) {
        Ok(report) => {
            tracker.end_run(RunStatus::Finished)?;
            Ok(report)
        }
        Err(e) => {
            if let Err(end_err) = tracker.end_run(RunStatus::Failed) {
                tracing::warn!(error = %end_err, "could not mark run failed");
            }
            Err(e)
        }
    }
}

fn log_sequence<B, R>(
    tracker: &mut Tracker<B>,
    config: &TrackingConfig,
    rng: &mut R,
) -> Result<DemoReport>
where
    B: TrackingBackend,
    R: Rng,
{
    let param_value: i64 = rng.gen_range(0..=100);
    tracker.log_param(PARAM_NAME, param_value)?;

    let base: f64 = rng.gen();
    let metric_values = [base, base + 1.0, base + 2.0];
    for value in metric_values {
        tracker.log_metric(METRIC_NAME, value)?;
    }

    std::fs::create_dir_all(&config.output_dir)?;
    let artifact_path = config.output_dir.join(&config.artifact_file);
    std::fs::write(&artifact_path, &config.artifact_contents)?;
    tracing::debug!(path = %artifact_path.display(), "wrote artifact file");

    let uploaded = tracker.log_artifacts(&config.output_dir)?;

    let run_id = tracker
        .active_run()
        .map(|run| run.run_id.clone())
        .ok_or(TrackingError::MissingRun)?;

    Ok(DemoReport {
        run_id,
        param_value,
        metric_values,
        artifact_path,
        uploaded,
    })
}
