//! REST client for the review backend.

pub mod http;

pub use http::{error_detail, HttpBackend};
