//! Error types for document analysis.

mod types;

pub use types::*;
