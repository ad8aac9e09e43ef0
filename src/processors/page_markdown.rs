//! Per-page markdown aggregation.

use crate::domain::ParseResponse;
use serde::Serialize;
use std::collections::BTreeMap;

/// Separator between chunks that share a page.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Markdown of every page that received at least one chunk, keyed by page index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageMarkdown {
    pages: BTreeMap<usize, String>,
}

impl PageMarkdown {
    /// Markdown for one page.
    pub fn get(&self, page_index: usize) -> Option<&str> {
        self.pages.get(&page_index).map(String::as_str)
    }

    /// Pages in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages.iter().map(|(page, markdown)| (*page, markdown.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Takes the markdown of one page out of the aggregate.
    pub fn take(&mut self, page_index: usize) -> Option<String> {
        self.pages.remove(&page_index)
    }

    fn push(&mut self, page_index: usize, markdown: &str) {
        self.pages
            .entry(page_index)
            .and_modify(|existing| {
                existing.push_str(CHUNK_SEPARATOR);
                existing.push_str(markdown);
            })
            .or_insert_with(|| markdown.to_string());
    }
}

/// Accumulates every chunk's markdown in chunk order, per page.
///
/// Chunks carrying no grounding belong to the page of the closest preceding
/// grounded chunk, or to page 0 when they come first.
pub fn aggregate_page_markdown(response: &ParseResponse) -> PageMarkdown {
    let mut aggregate = PageMarkdown::default();
    let mut current_page = 0;

    for chunk in &response.chunks {
        if let Some(page) = chunk.page_index() {
            current_page = page;
        }
        aggregate.push(current_page, chunk.content());
    }

    aggregate
}
