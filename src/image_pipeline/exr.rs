//! EXR image reading module
//!
//! This module provides format-agnostic HDR image reading capabilities.

mod exrs_reader;
mod reader;
pub mod types;

pub use exrs_reader::ExrsReader;
pub use reader::ExrReader;
pub use types::LinearImageData;
