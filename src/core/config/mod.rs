//! Configuration for the extraction service client.

mod extraction;

pub use extraction::*;
