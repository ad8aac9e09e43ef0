//! Response post-processing.
//!
//! This module turns a typed parse response into what the display layer needs.
//!
//! # Modules
//!
//! * `box_extraction` - Chunks with grounding to page-tagged pixel-space rectangles
//! * `page_markdown` - Chunk markdown aggregated per page

mod box_extraction;
mod page_markdown;

pub use box_extraction::*;
pub use page_markdown::*;
