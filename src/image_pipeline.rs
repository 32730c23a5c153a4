//! Image processing pipeline module
//!
//! This module provides a structured approach to HDR image conversion, with
//! separate modules for EXR reading, tone mapping, PNG writing, and
//! conversion orchestration.

pub mod common;
pub mod conversions;
pub mod exr;
pub mod png;
pub mod tonemap;

#[cfg(test)]
pub mod test_support;

pub use self::common::{ConversionError, Result};

pub use self::exr::{ExrReader, ExrsReader, LinearImageData};

pub use self::tonemap::{DisplayImageData, ReinhardToneMapper, ToneMapParameters, TransferEncoding};

pub use self::png::{
    ConversionConfig, ConversionConfigBuilder, PngCompression, PngWriter, StandardPngWriter,
};

pub use self::conversions::{ConversionSummary, ExrToPngPipeline};
