//! Tone mapping parameter and output types

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::tonemap::transfer::TransferEncoding;

/// Per-request tone mapping parameters
#[derive(Debug, Clone, Copy)]
pub struct ToneMapParameters {
    /// Exposure compensation in photographic stops; linear values are
    /// multiplied by 2^exposure_ev before tone mapping
    pub exposure_ev: f32,
    /// Reinhard key value, the target mid-gray luminance
    pub key: f32,
    /// Transfer function applied after luminance compression
    pub transfer: TransferEncoding,
}

impl Default for ToneMapParameters {
    fn default() -> Self {
        Self {
            exposure_ev: 0.0,
            key: 0.18,
            transfer: TransferEncoding::Srgb,
        }
    }
}

impl ToneMapParameters {
    /// Checks that the parameters are inside the operator's domain.
    pub fn validate(&self) -> Result<()> {
        if !self.key.is_finite() || self.key <= 0.0 {
            return Err(ConversionError::InvalidParameter(format!(
                "key must be finite and positive, got {}",
                self.key
            )));
        }
        if !self.exposure_ev.is_finite() {
            return Err(ConversionError::InvalidParameter(format!(
                "exposure_ev must be finite, got {}",
                self.exposure_ev
            )));
        }
        Ok(())
    }
}

/// 8-bit display-referred image data after tone mapping
#[derive(Debug, Clone)]
pub struct DisplayImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]; alpha is dropped
    pub data: Vec<u8>,
}

impl DisplayImageData {
    /// Expected byte count for the dimensions (three channels per pixel).
    pub fn expected_len(&self) -> usize {
        self.width * self.height * 3
    }
}
