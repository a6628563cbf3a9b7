//! Tracking backends.
//!
//! `TrackingBackend` is the seam between the run bookkeeping in [`super::Tracker`] and
//! the server. `MlflowClient` speaks the MLflow REST API:
//! - `POST api/2.0/mlflow/runs/{create,log-parameter,log-metric,update}`
//! - `PUT api/2.0/mlflow-artifacts/artifacts/<artifact path>/<file>` for proxied artifacts
//!
//! `s3://` artifact roots bypass the server and go through [`S3Uploader`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::artifacts::{s3_key, ArtifactTarget, S3Uploader};
use super::error::{Result, TrackingError};
use super::models::{
    ApiError, CreateRunRequest, CreateRunResponse, LogMetricRequest, LogParamRequest,
    MetricPoint, RunInfo, RunStatus, UpdateRunRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Persistence for runs, params, metrics and artifacts
pub trait TrackingBackend {
    fn create_run(&self, experiment_id: &str, start_time: DateTime<Utc>) -> Result<RunInfo>;

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()>;

    fn log_metric(&self, run_id: &str, key: &str, point: &MetricPoint) -> Result<()>;

    /// Store one file under the run's artifact root at `relative_path` (`/`-separated)
    fn upload_artifact(&self, run: &RunInfo, relative_path: &str, contents: Vec<u8>)
        -> Result<()>;

    fn update_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        end_time: DateTime<Utc>,
    ) -> Result<()>;
}

impl<T: TrackingBackend + ?Sized> TrackingBackend for &T {
    fn create_run(&self, experiment_id: &str, start_time: DateTime<Utc>) -> Result<RunInfo> {
        (**self).create_run(experiment_id, start_time)
    }

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        (**self).log_param(run_id, key, value)
    }

    fn log_metric(&self, run_id: &str, key: &str, point: &MetricPoint) -> Result<()> {
        (**self).log_metric(run_id, key, point)
    }

    fn upload_artifact(
        &self,
        run: &RunInfo,
        relative_path: &str,
        contents: Vec<u8>,
    ) -> Result<()> {
        (**self).upload_artifact(run, relative_path, contents)
    }

    fn update_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        end_time: DateTime<Utc>,
    ) -> Result<()> {
        (**self).update_run_status(run_id, status, end_time)
    }
}

/// Blocking client for an MLflow tracking server
pub struct MlflowClient {
    base: Url,
    http: Client,
    s3: S3Uploader,
}

impl MlflowClient {
    /// Create a client for the server at `tracking_uri`
    pub fn new(tracking_uri: &str) -> Result<Self> {
        let base = Url::parse(tracking_uri).map_err(|e| TrackingError::InvalidUri {
            uri: tracking_uri.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(TrackingError::InvalidUri {
                uri: tracking_uri.to_string(),
                reason: "expected an http(s) URL".to_string(),
            });
        }
        let http = Client::builder()
            .user_agent(concat!("runkit/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let s3 = S3Uploader::new()?;
        Ok(MlflowClient { base, http, s3 })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn post<T, R>(&self, method: &str, body: &T) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = endpoint_url(&self.base, &["api", "2.0", "mlflow", "runs", method]);
        tracing::debug!(%url, "tracking request");
        let resp = self.http.post(url.clone()).json(body).send()?;
        let resp = check_status(url.as_str(), resp)?;
        Ok(resp.json::<R>()?)
    }
}

impl TrackingBackend for MlflowClient {
    fn create_run(&self, experiment_id: &str, start_time: DateTime<Utc>) -> Result<RunInfo> {
        let resp: CreateRunResponse = self.post(
            "create",
            &CreateRunRequest {
                experiment_id,
                start_time: start_time.timestamp_millis(),
            },
        )?;
        Ok(resp.run.info)
    }

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        let _: serde_json::Value =
            self.post("log-parameter", &LogParamRequest { run_id, key, value })?;
        Ok(())
    }

    fn log_metric(&self, run_id: &str, key: &str, point: &MetricPoint) -> Result<()> {
        let _: serde_json::Value =
            self.post("log-metric", &LogMetricRequest::new(run_id, key, point))?;
        Ok(())
    }

    fn upload_artifact(
        &self,
        run: &RunInfo,
        relative_path: &str,
        contents: Vec<u8>,
    ) -> Result<()> {
        let root = match ArtifactTarget::parse(&run.artifact_uri)? {
            ArtifactTarget::Proxied { path } => path,
            ArtifactTarget::S3 { bucket, prefix } => {
                return self.s3.put(&bucket, &s3_key(&prefix, relative_path), contents);
            }
        };

        let mut segments = vec!["api", "2.0", "mlflow-artifacts", "artifacts"];
        segments.extend(root.split('/').filter(|s| !s.is_empty()));
        segments.extend(relative_path.split('/').filter(|s| !s.is_empty()));
        let url = endpoint_url(&self.base, &segments);

        tracing::debug!(%url, bytes = contents.len(), "uploading artifact");
        let resp = self.http.put(url.clone()).body(contents).send()?;
        check_status(url.as_str(), resp)?;
        Ok(())
    }

    fn update_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        end_time: DateTime<Utc>,
    ) -> Result<()> {
        let _: serde_json::Value = self.post(
            "update",
            &UpdateRunRequest {
                run_id,
                status,
                end_time: end_time.timestamp_millis(),
            },
        )?;
        Ok(())
    }
}

/// Append path segments to the tracking base URL, percent-encoding each one
fn endpoint_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Turn a non-2xx response into `TrackingError::Status`
fn check_status(
    endpoint: &str,
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().unwrap_or_default();
    // Prefer the server's structured message when it sends one
    let body = match serde_json::from_str::<ApiError>(&text) {
        Ok(ApiError {
            error_code: Some(code),
            message: Some(message),
        }) => format!("{code}: {message}"),
        _ => text,
    };
    Err(TrackingError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}
