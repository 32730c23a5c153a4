//! Decoded HDR image data types

/// Represents decoded linear-light HDR image data
#[derive(Debug, Clone)]
pub struct LinearImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Number of interleaved channels per pixel (3 for RGB, 4 for RGBA)
    pub channels: usize,
    /// Linear float samples in row-major, channel-interleaved order
    pub samples: Vec<f32>,
}

impl LinearImageData {
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Expected sample count for the declared dimensions and channel layout.
    pub fn expected_len(&self) -> usize {
        self.width * self.height * self.channels
    }
}
