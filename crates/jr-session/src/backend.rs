use crate::submission::Submission;
use async_trait::async_trait;
use jr_core::api::{AnnotationStats, ExportFormat, FileDimensions, SubmitReceipt, UploadResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    /// Non-2xx response; `detail` is the backend's `{"detail": ..}` text.
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },
    /// 2xx response with `success = false`.
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The review backend's REST contract as seen by a session.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, BackendError>;
    async fn submit(&self, project_id: &str, submission: &Submission) -> Result<SubmitReceipt, BackendError>;
    async fn dimensions(&self, file_hash: &str) -> Result<FileDimensions, BackendError>;
    async fn stats(&self, file_hash: &str, dimension: Option<&str>) -> Result<AnnotationStats, BackendError>;
    async fn export(
        &self,
        file_hash: &str,
        dimension: Option<&str>,
        format: ExportFormat,
    ) -> Result<Vec<u8>, BackendError>;
}
