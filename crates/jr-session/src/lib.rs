//! Annotation session: cursor, override form, key bindings, submission
//! assembly and the backend seam the session talks through.

pub mod backend;
pub mod error;
pub mod file;
pub mod keymap;
pub mod session;
pub mod submission;
pub mod view;

pub use backend::{BackendError, ReviewBackend};
pub use error::{Result, SessionError};
pub use file::{fallback_file_hash, register_upload, FileIdentity};
pub use keymap::{intent_for_key, AnnotationIntent, KEY_BINDINGS};
pub use session::{AnnotationSession, Cursor, OverrideForm, PendingSubmission, Transition};
pub use submission::{extract_labels, item_id, project_id, CompleteDataRow, SessionContext, Submission, SubmissionMetadata};
pub use view::{DimensionView, ItemView};

#[cfg(test)]
mod tests;
