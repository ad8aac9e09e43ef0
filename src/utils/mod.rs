//! Utility functions for document analysis.
//!
//! This module provides the overlay rendering, label font handling and logging
//! setup used by the pipeline and the binary.

pub mod encoding;
pub mod font;
pub mod visualization;

pub use encoding::encode_png;
pub use font::{BitmapFont, FontError, LabelFont};
pub use visualization::BoxRenderer;

/// Initializes the tracing subscriber.
///
/// The filter comes from `RUST_LOG` (e.g. `RUST_LOG=findoc=debug`).
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
