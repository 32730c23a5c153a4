//! PNG conversion configuration types

use crate::image_pipeline::tonemap::types::ToneMapParameters;

/// PNG compression levels
#[derive(Debug, Clone, Copy)]
pub enum PngCompression {
    /// Fastest encoding, largest file
    Fast,
    /// Library default (good speed/size balance)
    Default,
    /// Best compression (slower)
    Best,
}

/// Configuration for EXR to PNG conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Compression level to use
    pub compression: PngCompression,
    /// Whether to validate image dimensions before conversion
    pub validate_dimensions: bool,
    /// Upper bound on either image dimension, checked after decoding
    pub max_dimension: Option<usize>,
    /// Tone mapping parameters applied to the decoded image
    pub tonemap: ToneMapParameters,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: PngCompression::Default,
            validate_dimensions: true,
            max_dimension: Some(65_535),
            tonemap: ToneMapParameters::default(),
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    compression: Option<PngCompression>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
    tonemap: Option<ToneMapParameters>,
}

impl ConversionConfigBuilder {
    pub fn compression(mut self, compression: PngCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max_dimension: Option<usize>) -> Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    pub fn tonemap(mut self, tonemap: ToneMapParameters) -> Self {
        self.tonemap = Some(tonemap);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            compression: self.compression.unwrap_or(default.compression),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
            tonemap: self.tonemap.unwrap_or(default.tonemap),
        }
    }
}
