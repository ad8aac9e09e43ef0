//! Typed parse response of the extraction service.
//!
//! Deserialization is deliberately tolerant: every field the analysis can live
//! without is optional, unknown fields are ignored, and the page index accepts
//! integers, floats and numeric strings. A chunk without grounding is a valid
//! text-only chunk, not a malformed one.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Label used for chunks that carry no type.
pub const DEFAULT_CHUNK_LABEL: &str = "chunk";

/// Bounding region as fractions of the page width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl NormalizedBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Scales the box to pixel space: `(x1, y1, x2, y2)`.
    pub fn to_pixels(&self, width: u32, height: u32) -> (f32, f32, f32, f32) {
        let (w, h) = (width as f32, height as f32);
        (
            self.left * w,
            self.top * h,
            self.right * w,
            self.bottom * h,
        )
    }
}

/// Spatial location of a chunk: zero-based page index and optional box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grounding {
    /// Zero-based page index. Missing values read as page 0.
    #[serde(default, deserialize_with = "deserialize_page_index")]
    pub page: usize,
    /// Normalized region on the page.
    #[serde(default, rename = "box")]
    pub region: Option<NormalizedBox>,
}

/// One structured content unit returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default)]
    pub id: Option<String>,
    /// Content category such as `text`, `table` or `figure`.
    #[serde(default, rename = "type")]
    pub chunk_type: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub grounding: Option<Grounding>,
}

impl Chunk {
    /// Category label, `"chunk"` when the service sent none.
    pub fn label(&self) -> &str {
        self.chunk_type.as_deref().unwrap_or(DEFAULT_CHUNK_LABEL)
    }

    /// Markdown content, falling back to plain text, then to the empty string.
    pub fn content(&self) -> &str {
        self.markdown
            .as_deref()
            .filter(|markdown| !markdown.is_empty())
            .or(self.text.as_deref())
            .unwrap_or("")
    }

    /// Page index from the grounding, if grounded.
    pub fn page_index(&self) -> Option<usize> {
        self.grounding.as_ref().map(|grounding| grounding.page)
    }

    /// Grounding page and box, only when both are present.
    pub fn located_region(&self) -> Option<(usize, &NormalizedBox)> {
        let grounding = self.grounding.as_ref()?;
        grounding.region.as_ref().map(|region| (grounding.page, region))
    }
}

/// Processing metadata attached to a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseMetadata {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub credit_usage: Option<f64>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Parse response: whole-document markdown plus ordered chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default, deserialize_with = "deserialize_chunks")]
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub metadata: Option<ParseMetadata>,
}

impl ParseResponse {
    /// Decodes a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Number of chunks carrying a box.
    pub fn grounded_chunk_count(&self) -> usize {
        self.chunks
            .iter()
            .filter(|chunk| chunk.located_region().is_some())
            .count()
    }
}

fn deserialize_chunks<'de, D>(deserializer: D) -> Result<Vec<Chunk>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Chunk>>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_page_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<Value>::deserialize(deserializer)?;
    let page = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match page {
        Some(page) if page.is_finite() && page >= 0.0 => Ok(page as usize),
        _ => Err(D::Error::custom(
            "page index must be a non-negative number",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_response() {
        let body = br#"{
            "markdown": "<a id='c1'></a>\n\nACME Bank",
            "chunks": [
                {
                    "id": "c1",
                    "type": "text",
                    "markdown": "ACME Bank",
                    "grounding": {
                        "page": 0,
                        "box": {"left": 0.1, "top": 0.2, "right": 0.5, "bottom": 0.6}
                    }
                }
            ],
            "splits": [],
            "metadata": {"filename": "statement.pdf", "page_count": 1, "duration_ms": 812}
        }"#;

        let response = ParseResponse::from_slice(body).unwrap();
        assert_eq!(response.chunks.len(), 1);
        let chunk = &response.chunks[0];
        assert_eq!(chunk.label(), "text");
        assert_eq!(chunk.content(), "ACME Bank");
        let (page, region) = chunk.located_region().unwrap();
        assert_eq!(page, 0);
        assert_eq!(*region, NormalizedBox::new(0.1, 0.2, 0.5, 0.6));
        assert_eq!(response.metadata.unwrap().page_count, Some(1));
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let response = ParseResponse::from_slice(br#"{"chunks": [{}]}"#).unwrap();
        let chunk = &response.chunks[0];
        assert_eq!(chunk.label(), DEFAULT_CHUNK_LABEL);
        assert_eq!(chunk.content(), "");
        assert!(chunk.grounding.is_none());
        assert!(chunk.located_region().is_none());

        let response = ParseResponse::from_slice(br#"{"chunks": null}"#).unwrap();
        assert!(response.chunks.is_empty());

        let response = ParseResponse::from_slice(b"{}").unwrap();
        assert!(response.chunks.is_empty());
        assert!(response.markdown.is_none());
    }

    #[test]
    fn test_content_falls_back_to_text() {
        let chunk: Chunk =
            serde_json::from_str(r#"{"type": "table", "text": "plain", "markdown": ""}"#).unwrap();
        assert_eq!(chunk.content(), "plain");

        let chunk: Chunk = serde_json::from_str(r#"{"text": "plain", "markdown": "**md**"}"#)
            .unwrap();
        assert_eq!(chunk.content(), "**md**");
    }

    #[test]
    fn test_grounding_without_box() {
        let chunk: Chunk = serde_json::from_str(r#"{"grounding": {"page": 2}}"#).unwrap();
        assert_eq!(chunk.page_index(), Some(2));
        assert!(chunk.located_region().is_none());
    }

    #[test]
    fn test_lenient_page_index() {
        let grounding: Grounding = serde_json::from_str(r#"{"page": 3.0}"#).unwrap();
        assert_eq!(grounding.page, 3);

        let grounding: Grounding = serde_json::from_str(r#"{"page": "1"}"#).unwrap();
        assert_eq!(grounding.page, 1);

        let grounding: Grounding = serde_json::from_str(r#"{"page": null}"#).unwrap();
        assert_eq!(grounding.page, 0);

        let grounding: Grounding = serde_json::from_str("{}").unwrap();
        assert_eq!(grounding.page, 0);

        assert!(serde_json::from_str::<Grounding>(r#"{"page": -1}"#).is_err());
        assert!(serde_json::from_str::<Grounding>(r#"{"page": "first"}"#).is_err());
    }

    #[test]
    fn test_grounded_chunk_count() {
        let response = ParseResponse::from_slice(
            br#"{"chunks": [
                {"grounding": {"page": 0, "box": {"left": 0, "top": 0, "right": 1, "bottom": 1}}},
                {"grounding": {"page": 0}},
                {"markdown": "text only"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response.grounded_chunk_count(), 1);
    }

    #[test]
    fn test_normalized_box_to_pixels() {
        let region = NormalizedBox::new(0.25, 0.5, 0.75, 1.0);
        assert_eq!(region.to_pixels(400, 200), (100.0, 100.0, 300.0, 200.0));
    }
}
