//! Pipeline conversions module
//!
//! This module contains orchestration logic for the EXR to PNG conversion.

mod exr_to_png;


pub use exr_to_png::{ConversionSummary, ExrToPngPipeline};
