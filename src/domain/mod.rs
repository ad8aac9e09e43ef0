//! Domain types: the typed extraction response and the rectangles derived from it.

pub mod rectangle;
pub mod response;

pub use rectangle::{Rectangle, TEXT_LABEL};
pub use response::{Chunk, DEFAULT_CHUNK_LABEL, Grounding, NormalizedBox, ParseMetadata, ParseResponse};
