//! Turns one data row into the conversation(s) shown to the annotator.

pub mod materialize;
pub mod message;

pub use materialize::{convert_to_dialog, parse_messages};
pub use message::{Dialog, DialogMessage, DialogView, Role};
