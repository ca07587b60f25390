use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_API_URL: &str = "JUDGE_REVIEW_API_URL";
pub const ENV_IDENTITY_PATH: &str = "JUDGE_REVIEW_IDENTITY_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub fingerprint_header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub store_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".into(),
            fingerprint_header: "X-Browser-Fingerprint".into(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            allowed_extensions: vec![".xlsx".into(), ".xls".into(), ".csv".into()],
        }
    }
}

impl UploadConfig {
    /// Reject a file before it is sent anywhere.
    pub fn check(&self, filename: &str, size: u64) -> Result<()> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        if !self.allowed_extensions.iter().any(|a| a.to_lowercase() == ext) {
            return Err(CoreError::FileTypeNotAllowed {
                filename: filename.to_string(),
                allowed: self.allowed_extensions.join(", "),
            });
        }
        if size > self.max_file_size {
            return Err(CoreError::FileTooLarge { size, max: self.max_file_size });
        }
        Ok(())
    }
}

impl ReviewConfig {
    /// Defaults overlaid with `JUDGE_REVIEW_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                config.api.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(path) = std::env::var(ENV_IDENTITY_PATH) {
            if !path.trim().is_empty() {
                config.identity.store_path = Some(PathBuf::from(path.trim()));
            }
        }
        config
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
