//! Extraction service client.
//!
//! [`ExtractionService`] is the seam between the analysis pipeline and the
//! vendor API; [`AdeClient`] implements it against the Landing AI ADE parse
//! endpoint.

mod ade;
mod scoped;

pub use ade::AdeClient;
pub use scoped::ScopedDocument;

use crate::core::errors::ExtractionError;
use crate::domain::ParseResponse;
use std::future::Future;

/// A document extraction service.
pub trait ExtractionService {
    /// Parses a document. `filename` is the original upload name; its
    /// extension informs format detection on the service side.
    ///
    /// Failures are reported once and never retried.
    fn parse(
        &self,
        document: &[u8],
        filename: &str,
    ) -> impl Future<Output = Result<ParseResponse, ExtractionError>> + Send;
}
