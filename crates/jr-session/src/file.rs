//! Per-upload file identifier.

use crate::backend::ReviewBackend;
use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jr_core::config::UploadConfig;
use serde::{Deserialize, Serialize};

const FALLBACK_HASH_LEN: usize = 64;

/// Identifier threaded through submissions, analytics and exports.
///
/// `authoritative` is false when the backend did not issue one and the
/// hash was derived from the file name instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIdentity {
    pub file_hash: String,
    pub authoritative: bool,
}

impl FileIdentity {
    pub fn issued(file_hash: impl Into<String>) -> Self {
        Self { file_hash: file_hash.into(), authoritative: true }
    }

    pub fn fallback(filename: &str) -> Self {
        let file_hash = fallback_file_hash(filename);
        tracing::warn!(filename, file_hash = %file_hash, "using derived file id, results are not authoritative");
        Self { file_hash, authoritative: false }
    }

    /// The backend id when present and non-empty, the derived one otherwise.
    pub fn from_upload(file_id: Option<&str>, filename: &str) -> Self {
        match file_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::issued(id),
            None => Self::fallback(filename),
        }
    }
}

/// Base64 of the file name, alphanumerics only, at most 64 chars.
pub fn fallback_file_hash(filename: &str) -> String {
    STANDARD
        .encode(filename.as_bytes())
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(FALLBACK_HASH_LEN)
        .collect()
}

/// Validate and upload a file, returning the identifier for the session.
///
/// Local validation errors are returned. Backend failures degrade to a
/// derived identifier.
pub async fn register_upload(
    backend: &dyn ReviewBackend,
    upload: &UploadConfig,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<FileIdentity> {
    upload.check(filename, bytes.len() as u64)?;
    match backend.upload(filename, bytes).await {
        Ok(response) => {
            tracing::info!(
                filename,
                total_rows = response.total_rows,
                columns = response.columns.len(),
                "upload accepted"
            );
            Ok(FileIdentity::from_upload(response.file_id.as_deref(), filename))
        }
        Err(e) => {
            tracing::warn!(filename, error = %e, "upload failed");
            Ok(FileIdentity::fallback(filename))
        }
    }
}
