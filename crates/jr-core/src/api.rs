//! Wire types of the review backend's REST contract.

use serde::{Deserialize, Serialize};

/// Envelope wrapped around most backend responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Best human-readable reason for a rejected call.
    pub fn failure_reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request rejected by backend".to_string())
    }
}

/// `POST /upload` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub total_rows: usize,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub preview_data: Vec<serde_json::Value>,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `POST /projects/{id}/annotations` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub annotated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSummary {
    pub name: String,
    pub annotation_count: u64,
    #[serde(default)]
    pub first_annotation: Option<String>,
    #[serde(default)]
    pub last_annotation: Option<String>,
}

/// `GET /analytics/dimensions` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDimensions {
    pub file_hash: String,
    pub dimensions: Vec<DimensionSummary>,
    pub total_dimensions: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotatorStats {
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    pub name: String,
    pub agree: u64,
    pub disagree: u64,
    pub skip: u64,
    pub total: u64,
}

/// `GET /analytics/stats` payload (not enveloped).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStats {
    #[serde(default)]
    pub total: u64,
    pub completed: u64,
    pub agreed: u64,
    pub disagreed: u64,
    pub skipped: u64,
    #[serde(default)]
    pub agreement_rate: f64,
    #[serde(default)]
    pub by_annotator: Vec<AnnotatorStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
        }
    }
}

/// Suggested download name: `annotations_<hash8>_<dimension|all>.<format>`.
pub fn export_filename(file_hash: &str, dimension: Option<&str>, format: ExportFormat) -> String {
    let short: String = file_hash.chars().take(8).collect();
    format!(
        "annotations_{}_{}.{}",
        short,
        dimension.unwrap_or("all"),
        format.as_str()
    )
}
