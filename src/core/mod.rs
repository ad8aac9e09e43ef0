//! Core types shared across the crate.
//!
//! This module holds the error taxonomy and the explicit configuration handed to
//! the extraction client. Everything else in the crate builds on these.

pub mod config;
pub mod errors;

pub use config::{ApiKey, ExtractionConfig};
pub use errors::{ConfigError, ExtractionError, FindocError, FindocResult};
