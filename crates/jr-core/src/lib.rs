//! Core data model for the judge review workspace: cell values, rows,
//! datasets, column aliases, annotation modes and dimensions.

pub mod api;
pub mod columns;
pub mod config;
pub mod error;
pub mod identity;
pub mod types;
pub mod value;

pub use columns::{resolve_column, resolve_columns, Field};
pub use config::ReviewConfig;
pub use error::{CoreError, Result};
pub use identity::{IdentityStore, SessionIdentity};
pub use types::*;
pub use value::{display_judgement, CellValue, Dataset, Row};
