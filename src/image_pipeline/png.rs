//! PNG writing module
//!
//! This module provides PNG encoding capabilities with various compression
//! options.

mod standard_png_writer;
pub mod types;
mod writer;

pub use standard_png_writer::StandardPngWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, PngCompression};
pub use writer::PngWriter;
