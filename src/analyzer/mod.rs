//! Document analysis pipeline.
//!
//! Sends a document to an [`ExtractionService`], turns the returned chunks
//! into rectangles, draws them onto the page images and gathers the markdown
//! of every page.

mod result;

pub use result::{DocumentAnalysis, PageAnalysis};

use crate::client::ExtractionService;
use crate::core::errors::{FindocError, FindocResult};
use crate::domain::{ParseResponse, Rectangle};
use crate::processors::{BoxExtractor, ScalingReference, aggregate_page_markdown};
use crate::utils::visualization::BoxRenderer;
use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs extraction and overlay rendering for whole documents.
pub struct DocumentAnalyzer<S> {
    service: S,
    renderer: Arc<BoxRenderer>,
    extractor: BoxExtractor,
}

impl<S: ExtractionService> DocumentAnalyzer<S> {
    /// Creates an analyzer with the default renderer and per-page scaling.
    pub fn new(service: S) -> Self {
        Self::with_shared_renderer(service, Arc::new(BoxRenderer::default()))
    }

    /// Creates an analyzer drawing with a renderer shared across analyzers.
    pub fn with_shared_renderer(service: S, renderer: Arc<BoxRenderer>) -> Self {
        Self {
            service,
            renderer,
            extractor: BoxExtractor::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: BoxRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingReference) -> Self {
        self.extractor = BoxExtractor::new(scaling);
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn renderer(&self) -> &BoxRenderer {
        &self.renderer
    }

    /// Analyzes a document whose pages are already rendered.
    ///
    /// `document` and `filename` go to the extraction service as uploaded;
    /// `pages` are the rendered page images the boxes are drawn on.
    pub async fn analyze(
        &self,
        pages: Vec<RgbImage>,
        document: &[u8],
        filename: &str,
    ) -> FindocResult<DocumentAnalysis> {
        if pages.is_empty() {
            return Err(FindocError::invalid_input(format!(
                "document '{filename}' has no pages to analyze"
            )));
        }

        let response = self.service.parse(document, filename).await?;
        Ok(self.assemble(pages, &response))
    }

    /// Builds the per-page analysis from a parse response.
    ///
    /// CPU-bound; async callers may want to run it on a blocking thread.
    pub fn assemble(&self, pages: Vec<RgbImage>, response: &ParseResponse) -> DocumentAnalysis {
        let start = Instant::now();
        let page_sizes: Vec<(u32, u32)> = pages.iter().map(RgbImage::dimensions).collect();

        let rectangles = self.extractor.extract(response, &page_sizes);
        let rectangle_count = rectangles.len();
        let mut markdown = aggregate_page_markdown(response);

        let mut remaining = rectangles;
        let by_page: Vec<Vec<Rectangle>> = (0..pages.len())
            .map(|page_index| {
                let (on_page, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut remaining)
                    .into_iter()
                    .partition(|rect| rect.is_on_page(page_index));
                remaining = rest;
                on_page
            })
            .collect();

        // whatever is left points past the last rendered page
        if !remaining.is_empty() {
            warn!(
                orphaned = remaining.len(),
                pages = pages.len(),
                "boxes reference pages beyond the rendered document"
            );
        }

        let pages: Vec<PageAnalysis> = pages
            .into_iter()
            .zip(by_page)
            .enumerate()
            .map(|(page_index, (image, rectangles))| {
                let annotated = (!rectangles.is_empty())
                    .then(|| self.renderer.render(&image, &rectangles));
                PageAnalysis {
                    page_index,
                    image,
                    annotated,
                    rectangles,
                    markdown: markdown.take(page_index),
                }
            })
            .collect();

        info!(
            pages = pages.len(),
            rectangles = rectangle_count,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document analysis assembled"
        );

        DocumentAnalysis {
            pages,
            markdown: response.markdown.clone(),
            rectangle_count,
            scaling: self.extractor.scaling(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ExtractionError;
    use crate::utils::font::LabelFont;
    use crate::utils::visualization::OTHER_BOX_COLOR;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubService {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl StubService {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ExtractionService for StubService {
        async fn parse(&self, _document: &[u8], _filename: &str) -> Result<ParseResponse, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ParseResponse::from_slice(self.body.as_bytes()).map_err(ExtractionError::Decode)
        }
    }

    struct FailingService;

    impl ExtractionService for FailingService {
        async fn parse(&self, _document: &[u8], _filename: &str) -> Result<ParseResponse, ExtractionError> {
            Err(ExtractionError::Service {
                status: 401,
                message: "invalid api key".to_string(),
            })
        }
    }

    fn analyzer<S: ExtractionService>(service: S) -> DocumentAnalyzer<S> {
        DocumentAnalyzer::with_shared_renderer(service, Arc::new(BoxRenderer::new(LabelFont::builtin())))
    }

    fn blank(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    const TWO_PAGE_BODY: &str = r#"{
        "markdown": "Statement\n\nBalance\n\nFooter",
        "chunks": [
            {"type": "table", "markdown": "Statement",
             "grounding": {"page": 0, "box": {"left": 0.1, "top": 0.5, "right": 0.9, "bottom": 0.9}}},
            {"type": "text", "markdown": "Balance",
             "grounding": {"page": 1, "box": {"left": 0.0, "top": 0.0, "right": 0.5, "bottom": 0.5}}},
            {"type": "text", "markdown": "Footer"}
        ]
    }"#;

    #[tokio::test]
    async fn test_analyze_splits_boxes_and_markdown_by_page() {
        let analyzer = analyzer(StubService::new(TWO_PAGE_BODY));
        let pages = vec![blank(100, 200), blank(300, 400)];

        let analysis = analyzer.analyze(pages, b"%PDF", "statement.pdf").await.unwrap();

        assert_eq!(analysis.page_count(), 2);
        assert_eq!(analysis.rectangle_count, 2);
        assert_eq!(analysis.markdown.as_deref(), Some("Statement\n\nBalance\n\nFooter"));

        let first = &analysis.pages[0];
        assert_eq!(first.rectangles.len(), 1);
        assert_eq!(first.rectangles[0].label, "table");
        assert_eq!(first.markdown.as_deref(), Some("Statement"));
        assert_eq!(first.annotated.as_ref().unwrap().get_pixel(50, 180), &OTHER_BOX_COLOR);

        // per-page scaling: the second page's box uses the second page's size
        let second = &analysis.pages[1];
        assert_eq!(second.rectangles[0].x2, 150.0);
        assert_eq!(second.rectangles[0].y2, 200.0);
        assert_eq!(second.markdown.as_deref(), Some("Balance\n\nFooter"));
        assert_eq!(analysis.rectangles().count(), 2);
    }

    #[tokio::test]
    async fn test_first_page_scaling() {
        let analyzer = analyzer(StubService::new(TWO_PAGE_BODY)).with_scaling(ScalingReference::FirstPage);
        let pages = vec![blank(100, 200), blank(300, 400)];

        let analysis = analyzer.analyze(pages, b"%PDF", "statement.pdf").await.unwrap();

        let rect = &analysis.pages[1].rectangles[0];
        assert_eq!((rect.x2, rect.y2), (50.0, 100.0));
        assert_eq!(analysis.scaling, ScalingReference::FirstPage);
    }

    #[tokio::test]
    async fn test_page_without_boxes_keeps_original_only() {
        let analyzer = analyzer(StubService::new(
            r#"{"chunks": [{"type": "text", "markdown": "Loose text"}]}"#,
        ));
        let page = blank(50, 50);

        let analysis = analyzer.analyze(vec![page.clone()], b"png", "receipt.png").await.unwrap();

        let only = &analysis.pages[0];
        assert!(only.annotated.is_none());
        assert!(!only.has_boxes());
        assert_eq!(only.display_image(), &page);
        assert_eq!(only.markdown.as_deref(), Some("Loose text"));
    }

    #[tokio::test]
    async fn test_boxes_past_last_page_are_counted_but_not_drawn() {
        let analyzer = analyzer(StubService::new(
            r#"{"chunks": [{"type": "figure",
                "grounding": {"page": 3, "box": {"left": 0.1, "top": 0.1, "right": 0.2, "bottom": 0.2}}}]}"#,
        ));

        let analysis = analyzer.analyze(vec![blank(40, 40)], b"png", "receipt.png").await.unwrap();

        assert_eq!(analysis.rectangle_count, 1);
        assert!(analysis.pages[0].rectangles.is_empty());
        assert!(analysis.pages[0].annotated.is_none());
    }

    #[tokio::test]
    async fn test_empty_page_list_never_reaches_service() {
        let analyzer = analyzer(StubService::new(TWO_PAGE_BODY));

        let err = analyzer.analyze(Vec::new(), b"%PDF", "empty.pdf").await.unwrap_err();

        assert!(matches!(err, FindocError::InvalidInput { .. }));
        assert_eq!(analyzer.service().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_service_errors_propagate() {
        let analyzer = analyzer(FailingService);

        let err = analyzer.analyze(vec![blank(10, 10)], b"png", "receipt.png").await.unwrap_err();

        assert!(matches!(
            err,
            FindocError::Extraction(ExtractionError::Service { status: 401, .. })
        ));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_display_summary() {
        let analyzer = analyzer(StubService::new(""));
        let response = ParseResponse::from_slice(TWO_PAGE_BODY.as_bytes()).unwrap();

        let analysis = analyzer.assemble(vec![blank(100, 200), blank(300, 400)], &response);
        let summary = analysis.to_string();

        assert!(summary.starts_with("Pages: 2, boxes: 2"));
        assert!(summary.contains("Page 2 (300x400): 1 boxes"));
        assert!(summary.contains("[text] (0, 0) - (150, 200)"));
    }
}
