//! Tone mapping module for compressing HDR radiance to display range
//!
//! This module implements the Reinhard global operator with log-average key
//! normalization, followed by transfer-function encoding and 8-bit
//! quantization.

mod reinhard;
pub mod transfer;
pub mod types;

pub use reinhard::ReinhardToneMapper;
pub use transfer::TransferEncoding;
pub use types::{DisplayImageData, ToneMapParameters};
