//! Artifact destinations.
//!
//! A run's `artifact_uri` decides where files go: `mlflow-artifacts:` roots are
//! uploaded through the tracking server, `s3://` roots are written straight to the
//! bucket with credentials from the standard `AWS_*` environment variables.

use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tokio::runtime::Runtime;

use super::error::{Result, TrackingError};

const PROXY_SCHEME: &str = "mlflow-artifacts:";
const S3_SCHEME: &str = "s3://";

/// Where a run's artifact root lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactTarget {
    /// Server-relative path under `api/2.0/mlflow-artifacts/artifacts`
    Proxied { path: String },
    /// Bucket plus key prefix (possibly empty)
    S3 { bucket: String, prefix: String },
}

impl ArtifactTarget {
    /// Classify an artifact URI.
    ///
    /// Both `mlflow-artifacts:/0/<run>/artifacts` and the host-qualified
    /// `mlflow-artifacts://host:port/0/<run>/artifacts` forms are accepted.
    pub fn parse(artifact_uri: &str) -> Result<Self> {
        if let Some(rest) = artifact_uri.strip_prefix(PROXY_SCHEME) {
            let path = match rest.strip_prefix("//") {
                Some(authority_and_path) => authority_and_path
                    .find('/')
                    .map(|idx| &authority_and_path[idx..])
                    .unwrap_or(""),
                None => rest,
            };
            return Ok(ArtifactTarget::Proxied {
                path: path.trim_matches('/').to_string(),
            });
        }

        if let Some(rest) = artifact_uri.strip_prefix(S3_SCHEME) {
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(TrackingError::UnsupportedArtifactUri(artifact_uri.to_string()));
            }
            return Ok(ArtifactTarget::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.trim_matches('/').to_string(),
            });
        }

        Err(TrackingError::UnsupportedArtifactUri(artifact_uri.to_string()))
    }
}

/// Object key for `relative_path` under an S3 prefix
pub fn s3_key(prefix: &str, relative_path: &str) -> String {
    let relative = relative_path.trim_start_matches('/');
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{prefix}/{relative}")
    }
}

/// Blocking writer for S3 artifact roots
pub struct S3Uploader {
    runtime: Runtime,
}

impl S3Uploader {
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(S3Uploader { runtime })
    }

    pub fn put(&self, bucket: &str, key: &str, contents: Vec<u8>) -> Result<()> {
        let store = AmazonS3Builder::from_env().with_bucket_name(bucket).build()?;
        let location = ObjectPath::from(key);

        tracing::debug!(bucket, key, bytes = contents.len(), "uploading artifact to s3");
        self.runtime.block_on(store.put(&location, PutPayload::from(contents)))?;
        Ok(())
    }
}
