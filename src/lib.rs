//! # findoc
//!
//! Financial document extraction demo built around the Landing AI ADE parse API.
//!
//! A document (PNG, JPEG or PDF) is rasterized into page images, sent to the
//! extraction service, and the chunks it returns are turned into page-tagged
//! pixel-space rectangles that are drawn back onto the pages together with
//! their labels. Markdown returned for each chunk is aggregated per page.
//!
//! # Main APIs
//!
//! - [`processors::BoxExtractor`] - vendor response to drawable rectangles
//! - [`utils::visualization::BoxRenderer`] - rectangle overlay drawing
//! - [`document::load_pages`] - uploaded bytes to RGB page images
//! - [`client::AdeClient`] - the extraction service client
//! - [`analyzer::DocumentAnalyzer`] - the per-page analysis pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use findoc::prelude::*;
//!
//! # async fn run() -> Result<(), FindocError> {
//! let bytes = std::fs::read("statement.pdf")?;
//! let pages = load_pages(&bytes, "statement.pdf", &LazyPdfRasterizer::default())?;
//!
//! let client = AdeClient::new(ExtractionConfig::resolve(None)?)?;
//! let analyzer = DocumentAnalyzer::new(client);
//! let analysis = analyzer.analyze(pages, &bytes, "statement.pdf").await?;
//!
//! for page in &analysis.pages {
//!     println!("page {}: {} boxes", page.page_index + 1, page.rectangles.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod client;
pub mod core;
pub mod document;
pub mod domain;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use findoc::prelude::*;
/// ```
pub mod prelude {
    pub use crate::analyzer::{DocumentAnalysis, DocumentAnalyzer, PageAnalysis};
    pub use crate::client::{AdeClient, ExtractionService, ScopedDocument};
    pub use crate::core::config::ExtractionConfig;
    pub use crate::core::errors::{ConfigError, ExtractionError, FindocError, FindocResult};
    pub use crate::document::{
        DocumentError, DocumentKind, LazyPdfRasterizer, PdfError, PdfProcessor, Rasterizer,
        load_pages,
    };
    pub use crate::domain::{Chunk, Grounding, NormalizedBox, ParseResponse, Rectangle};
    pub use crate::processors::{
        BoxExtractor, PageMarkdown, ScalingReference, aggregate_page_markdown,
        extract_rectangles,
    };
    pub use crate::utils::font::LabelFont;
    pub use crate::utils::visualization::BoxRenderer;
}
