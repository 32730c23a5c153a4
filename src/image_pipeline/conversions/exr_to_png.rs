use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    exr::{ExrReader, ExrsReader},
    png::{ConversionConfig, PngWriter, StandardPngWriter},
    tonemap::ReinhardToneMapper,
};

/// Dimensions of a completed conversion, reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub width: usize,
    pub height: usize,
}

pub struct ExrToPngPipeline<R: ExrReader, W: PngWriter> {
    reader: R,
    tonemapper: ReinhardToneMapper,
    writer: W,
    config: ConversionConfig,
}

impl ExrToPngPipeline<ExrsReader, StandardPngWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: ExrsReader,
            tonemapper: ReinhardToneMapper,
            writer: StandardPngWriter,
            config,
        }
    }
}

impl<R: ExrReader, W: PngWriter> ExrToPngPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Self {
        Self {
            reader,
            tonemapper: ReinhardToneMapper,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                return Err(ConversionError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<ConversionSummary> {
        info!("Starting EXR to PNG conversion");

        let linear_image = {
            let _span = tracing::info_span!("decode_exr").entered();
            self.reader.read_exr(input_data)?
        };

        {
            let _span = tracing::info_span!(
                "validate_dimensions",
                width = linear_image.width,
                height = linear_image.height
            )
            .entered();
            self.validate_dimensions(linear_image.width, linear_image.height)?;
        }

        let display_image = {
            let _span = tracing::info_span!("tone_map").entered();
            self.tonemapper.tone_map(&linear_image, &self.config.tonemap)?
        };

        {
            let _span = tracing::info_span!("encode_png").entered();
            self.writer.write_png(&display_image, output, &self.config)?;
        }

        info!(
            width = display_image.width,
            height = display_image.height,
            "Conversion complete"
        );
        Ok(ConversionSummary {
            width: display_image.width,
            height: display_image.height,
        })
    }

    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<ConversionSummary> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        self.convert(&input_data, &mut output_file)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}
