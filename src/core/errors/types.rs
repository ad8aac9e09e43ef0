//! Core error types for document analysis.
//!
//! Each concern has its own enum: configuration, document loading (defined in
//! [`crate::document`]) and the extraction service call. [`FindocError`] ties
//! them together for callers that drive the whole pipeline.

use crate::document::{DocumentError, PdfError};
use thiserror::Error;

/// Errors raised while resolving configuration.
///
/// These are always surfaced before any network traffic happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No credential was passed and the environment fallback is unset.
    #[error("missing API key: provide one explicitly or set {env_var}")]
    MissingApiKey {
        /// The environment variable that was consulted.
        env_var: &'static str,
    },

    /// A configuration field holds a value that cannot be used.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors from the extraction service call.
///
/// None of these are retried; the caller gets one descriptive error.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The document could not be staged in a temporary file.
    #[error("failed to stage document for upload: {0}")]
    Staging(#[source] std::io::Error),

    /// The HTTP client could not be built or the request did not complete.
    #[error("extraction request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("extraction service returned HTTP {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body, or the canonical reason when the body is empty.
        message: String,
    },

    /// The response body is not a parse response.
    #[error("could not decode extraction response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Top-level error for the analysis pipeline and its surfaces.
#[derive(Debug, Error)]
pub enum FindocError {
    /// Configuration problem (missing credential, bad endpoint).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The uploaded document could not be turned into page images.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The extraction service call failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The caller handed the pipeline something it cannot work with.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// An annotated page could not be encoded.
    #[error("image encoding failed: {0}")]
    ImageEncode(#[source] image::ImageError),

    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl FindocError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Returns true when the error was caused by the caller rather than by a
    /// downstream service or the local environment.
    ///
    /// A missing PDFium library or a page that fails to render is a local
    /// fault, not a bad upload.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Config(_) | Self::InvalidInput { .. } => true,
            Self::Document(DocumentError::Pdf(PdfError::InitError(_) | PdfError::RenderError { .. })) => false,
            Self::Document(_) => true,
            Self::Extraction(_) | Self::ImageEncode(_) | Self::Io(_) => false,
        }
    }
}

/// Result alias used throughout the crate.
pub type FindocResult<T> = Result<T, FindocError>;
