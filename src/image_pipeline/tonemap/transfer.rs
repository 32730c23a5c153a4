//! Opto-electronic transfer functions (scene linear → display encoded)
//!
//! Reference: sRGB per IEC 61966-2-1.

use serde::{Deserialize, Serialize};

/// sRGB OETF: Linear `[0,1]` → sRGB encoded `[0,1]`
#[inline]
pub fn srgb_oetf(linear: f32) -> f32 {
    if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// Transfer function selection for the quantization stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferEncoding {
    /// Piecewise sRGB OETF (the display default)
    #[default]
    Srgb,
    /// Plain power-curve gamma 1/2.2
    Gamma22,
    /// Identity, leaves values linear
    Linear,
}

impl TransferEncoding {
    /// Encodes a linear `[0,1]` value into the selected display encoding.
    #[inline]
    pub fn encode(self, linear: f32) -> f32 {
        match self {
            TransferEncoding::Srgb => srgb_oetf(linear),
            TransferEncoding::Gamma22 => linear.powf(1.0 / 2.2),
            TransferEncoding::Linear => linear,
        }
    }
}
