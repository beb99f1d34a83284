//! HTTP access to the production backend.

pub mod client;
pub mod error;
pub mod upload;

pub use client::ApiClient;
pub use error::{ApiError, Result, GENERIC_FAILURE};
pub use upload::UploadTarget;
