//! Dataset preparation for API-aware code models.
//!
//! Two independent pipelines live here: Postman collections are normalized
//! into tagged API collections and rendered as compact text, and raw source
//! dumps are filtered and split into per-method snippets.

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod render;
pub mod snippet;

pub use config::DatasetConfig;
pub use error::{PrepError, Result};
