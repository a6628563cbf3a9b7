//! Errors from talking to the tracking server.

/// Errors from tracking operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("invalid tracking URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("unsupported artifact URI {0:?}: expected mlflow-artifacts: or s3://")]
    UnsupportedArtifactUri(String),

    #[error("no active run")]
    MissingRun,
}

/// Result alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;
