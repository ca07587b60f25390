use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error("No dimension has both a name and a judgement column")]
    NoDimensions,
    #[error("Column not found in dataset: {column}")]
    UnknownColumn { column: String },
    #[error("Duplicate dimension name: {0}")]
    DuplicateDimension(String),
    #[error("Dimension entry not found: {0}")]
    UnknownDraft(u64),
}

pub type Result<T> = std::result::Result<T, InferenceError>;
