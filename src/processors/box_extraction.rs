//! Box extraction: parse response chunks to drawable rectangles.

use crate::domain::{ParseResponse, Rectangle};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which page size scales a chunk's normalized box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingReference {
    /// Every chunk is scaled by the first page's size, whatever page it is on.
    /// Documents with heterogeneous page sizes get misplaced boxes on later pages.
    FirstPage,
    /// Every chunk is scaled by the size of its own page. Chunks pointing past the
    /// rendered pages fall back to the first page's size.
    #[default]
    PerPage,
}

/// Converts the grounded chunks of a parse response into [`Rectangle`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxExtractor {
    scaling: ScalingReference,
}

impl BoxExtractor {
    pub fn new(scaling: ScalingReference) -> Self {
        Self { scaling }
    }

    pub fn scaling(&self) -> ScalingReference {
        self.scaling
    }

    /// Extracts one rectangle per grounded chunk, in chunk order.
    ///
    /// `page_sizes` holds `(width, height)` of each rendered page image.
    /// Chunks without a box are skipped; they are valid text-only chunks.
    /// An empty `page_sizes` leaves nothing to scale against and yields no
    /// rectangles.
    pub fn extract(&self, response: &ParseResponse, page_sizes: &[(u32, u32)]) -> Vec<Rectangle> {
        let Some(&first_page) = page_sizes.first() else {
            warn!(
                chunks = response.chunks.len(),
                "no page images to scale against, skipping box extraction"
            );
            return Vec::new();
        };

        let mut rectangles = Vec::with_capacity(response.chunks.len());
        let mut skipped = 0usize;

        for chunk in &response.chunks {
            let Some((page_index, region)) = chunk.located_region() else {
                skipped += 1;
                continue;
            };

            let reference = match self.scaling {
                ScalingReference::FirstPage => first_page,
                ScalingReference::PerPage => {
                    page_sizes.get(page_index).copied().unwrap_or(first_page)
                }
            };

            rectangles.push(Rectangle::from_normalized(
                page_index,
                region,
                reference,
                chunk.label(),
                chunk.content(),
            ));
        }

        debug!(
            rectangles = rectangles.len(),
            skipped, "extracted rectangles from parse response"
        );

        rectangles
    }
}

/// Extracts rectangles scaling every chunk by one reference image size.
pub fn extract_rectangles(response: &ParseResponse, reference: (u32, u32)) -> Vec<Rectangle> {
    BoxExtractor::new(ScalingReference::FirstPage).extract(response, &[reference])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> ParseResponse {
        ParseResponse::from_slice(json.as_bytes()).unwrap()
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_single_chunk_scenario() {
        let response = response(
            r#"{"chunks": [{
                "type": "text",
                "markdown": "Account summary",
                "grounding": {"page": 0, "box": {"left": 0.1, "top": 0.2, "right": 0.5, "bottom": 0.6}}
            }]}"#,
        );

        let rects = extract_rectangles(&response, (1000, 2000));
        assert_eq!(rects.len(), 1);
        let rect = &rects[0];
        assert_eq!(rect.page_index, 0);
        assert_close(rect.x1, 100.0);
        assert_close(rect.y1, 400.0);
        assert_close(rect.x2, 500.0);
        assert_close(rect.y2, 1200.0);
        assert_eq!(rect.label, "text");
        assert_eq!(rect.text, "Account summary");
    }

    #[test]
    fn test_scaling_matches_normalized_box() {
        let boxes = [
            (0.0, 0.0, 1.0, 1.0),
            (0.33, 0.125, 0.66, 0.875),
            (0.05, 0.9, 0.95, 0.99),
        ];
        let sizes = [(612u32, 792u32), (1700, 2200), (1, 1)];

        for &(left, top, right, bottom) in &boxes {
            for &(width, height) in &sizes {
                let response = response(&format!(
                    r#"{{"chunks": [{{"grounding": {{"page": 0, "box":
                        {{"left": {left}, "top": {top}, "right": {right}, "bottom": {bottom}}}}}}}]}}"#
                ));
                let rects = extract_rectangles(&response, (width, height));
                assert_eq!(rects.len(), 1);
                let (w, h) = (width as f32, height as f32);
                assert_close(rects[0].x1, left * w);
                assert_close(rects[0].x2, right * w);
                assert_close(rects[0].y1, top * h);
                assert_close(rects[0].y2, bottom * h);
            }
        }
    }

    #[test]
    fn test_chunks_without_grounding_are_skipped() {
        let response = response(
            r#"{"chunks": [
                {"type": "text", "markdown": "first", "grounding": {"page": 0, "box": {"left": 0, "top": 0, "right": 0.5, "bottom": 0.5}}},
                {"type": "text", "markdown": "no grounding at all"},
                {"type": "marginalia", "markdown": "grounding without box", "grounding": {"page": 0}}
            ]}"#,
        );

        let rects = extract_rectangles(&response, (100, 100));
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].text, "first");
    }

    #[test]
    fn test_label_and_text_defaults() {
        let response = response(
            r#"{"chunks": [
                {"text": "plain only", "grounding": {"page": 1, "box": {"left": 0, "top": 0, "right": 1, "bottom": 1}}},
                {"type": "figure", "grounding": {"page": 1, "box": {"left": 0, "top": 0, "right": 1, "bottom": 1}}}
            ]}"#,
        );

        let rects = extract_rectangles(&response, (10, 10));
        assert_eq!(rects[0].label, "chunk");
        assert_eq!(rects[0].text, "plain only");
        assert_eq!(rects[0].page_index, 1);
        assert_eq!(rects[1].label, "figure");
        assert_eq!(rects[1].text, "");
    }

    #[test]
    fn test_per_page_scaling_uses_each_page_size() {
        let response = response(
            r#"{"chunks": [
                {"grounding": {"page": 0, "box": {"left": 0.5, "top": 0.5, "right": 1, "bottom": 1}}},
                {"grounding": {"page": 1, "box": {"left": 0.5, "top": 0.5, "right": 1, "bottom": 1}}},
                {"grounding": {"page": 7, "box": {"left": 0.5, "top": 0.5, "right": 1, "bottom": 1}}}
            ]}"#,
        );
        let sizes = [(100, 200), (400, 300)];

        let per_page = BoxExtractor::new(ScalingReference::PerPage).extract(&response, &sizes);
        assert_close(per_page[0].x2, 100.0);
        assert_close(per_page[1].x2, 400.0);
        assert_close(per_page[1].y2, 300.0);
        // out-of-range page falls back to the first page
        assert_close(per_page[2].x2, 100.0);
        assert_eq!(per_page[2].page_index, 7);

        let first_page = BoxExtractor::new(ScalingReference::FirstPage).extract(&response, &sizes);
        assert_close(first_page[1].x2, 100.0);
        assert_close(first_page[1].y2, 200.0);
    }

    #[test]
    fn test_no_page_sizes_yields_nothing() {
        let response = response(
            r#"{"chunks": [{"grounding": {"page": 0, "box": {"left": 0, "top": 0, "right": 1, "bottom": 1}}}]}"#,
        );
        assert!(BoxExtractor::default().extract(&response, &[]).is_empty());
    }

    #[test]
    fn test_preserves_chunk_order() {
        let response = response(
            r#"{"chunks": [
                {"type": "b", "grounding": {"page": 1, "box": {"left": 0, "top": 0, "right": 1, "bottom": 1}}},
                {"type": "a", "grounding": {"page": 0, "box": {"left": 0, "top": 0, "right": 1, "bottom": 1}}}
            ]}"#,
        );
        let labels: Vec<_> = BoxExtractor::default()
            .extract(&response, &[(10, 10), (10, 10)])
            .into_iter()
            .map(|rect| rect.label)
            .collect();
        assert_eq!(labels, vec!["b", "a"]);
    }
}
