use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Dataset is empty: {filename}")]
    EmptyDataset { filename: String },
    #[error("File type not allowed: {filename} (allowed: {allowed})")]
    FileTypeNotAllowed { filename: String, allowed: String },
    #[error("File too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
    #[error("Account name must not be empty")]
    EmptyAccountName,
    #[error("Identity store error: {0}")]
    Identity(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
