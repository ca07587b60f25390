use crate::backend::BackendError;
use jr_core::CoreError;
use jr_inference::InferenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("请输入 1 到 {total} 之间的数字")]
    InvalidJumpTarget { input: String, total: usize },
    #[error("Human judgement must not be empty")]
    EmptyOverrideJudgement,
    #[error("Override form is not open")]
    OverrideFormClosed,
    #[error("No dimensions configured")]
    NoDimensions,
    #[error("Dimension {dimension} references unknown column: {column}")]
    UnknownColumn { dimension: String, column: String },
    #[error("Submission failed: {0}")]
    Submission(#[from] BackendError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
