//! Column inference: evaluation type, required columns and dimension
//! discovery for an uploaded table, plus the editable dimension
//! configuration that precedes annotation.

pub mod configurator;
pub mod detect;
pub mod dimensions;
pub mod error;

pub use configurator::{DimensionConfigurator, DimensionDraft, DraftField, ResolvedConfig};
pub use detect::{detect_evaluation_type, missing_required_columns, required_columns, validate_required_columns};
pub use dimensions::auto_detect_dimensions;
pub use error::{InferenceError, Result};
