use std::io::Write;

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::png::types::{ConversionConfig, PngCompression};
use crate::image_pipeline::png::writer::PngWriter;
use crate::image_pipeline::tonemap::types::DisplayImageData;

pub struct StandardPngWriter;

impl PngWriter for StandardPngWriter {
    fn write_png(
        &self,
        image: &DisplayImageData,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()> {
        debug!("Encoding PNG image: {}x{}", image.width, image.height);

        // The tone mapper upholds this; a mismatch here is a bug upstream.
        if image.data.len() != image.expected_len() {
            return Err(ConversionError::BufferSizeMismatch {
                expected: image.expected_len(),
                actual: image.data.len(),
            });
        }

        let compression = match config.compression {
            PngCompression::Fast => png::Compression::Fast,
            PngCompression::Default => png::Compression::Default,
            PngCompression::Best => png::Compression::Best,
        };

        let mut buffer = Vec::new();
        {
            let mut encoder = png::Encoder::new(
                std::io::Cursor::new(&mut buffer),
                image.width as u32,
                image.height as u32,
            );
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(compression);

            let mut writer = encoder
                .write_header()
                .map_err(|e| ConversionError::EncodeError(e.to_string()))?;
            writer
                .write_image_data(&image.data)
                .map_err(|e| ConversionError::EncodeError(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| ConversionError::EncodeError(e.to_string()))?;
        }

        output.write_all(&buffer)?;

        debug!("PNG encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // http://www.w3.org/TR/PNG-Structure.html
    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn encode(image: &DisplayImageData) -> Vec<u8> {
        let mut output = Cursor::new(Vec::new());
        StandardPngWriter
            .write_png(image, &mut output, &ConversionConfig::default())
            .unwrap();
        output.into_inner()
    }

    #[test]
    fn test_output_is_decodable_png() {
        let image = DisplayImageData {
            width: 2,
            height: 2,
            data: vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120],
        };
        let bytes = encode(&image);
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);

        let decoder = png::Decoder::new(Cursor::new(&bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut pixels = vec![0_u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels).unwrap();

        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        assert_eq!(info.bit_depth, png::BitDepth::Eight);
        pixels.truncate(info.buffer_size());
        assert_eq!(pixels, image.data);
    }

    #[test]
    fn test_compression_levels_stay_decodable() {
        let image = DisplayImageData {
            width: 4,
            height: 4,
            data: (0..4 * 4 * 3).map(|v| (v * 5 % 256) as u8).collect(),
        };
        for compression in [
            PngCompression::Fast,
            PngCompression::Default,
            PngCompression::Best,
        ] {
            let config = ConversionConfig::builder().compression(compression).build();
            let mut output = Cursor::new(Vec::new());
            StandardPngWriter
                .write_png(&image, &mut output, &config)
                .unwrap();

            let decoder = png::Decoder::new(Cursor::new(output.into_inner()));
            let mut reader = decoder.read_info().unwrap();
            let mut pixels = vec![0_u8; reader.output_buffer_size()];
            let info = reader.next_frame(&mut pixels).unwrap();
            assert_eq!((info.width, info.height), (4, 4));
        }
    }

    #[test]
    fn test_buffer_size_mismatch_is_encode_failure() {
        let image = DisplayImageData {
            width: 2,
            height: 2,
            data: vec![0; 5],
        };
        let mut output = Cursor::new(Vec::new());
        let result = StandardPngWriter.write_png(&image, &mut output, &ConversionConfig::default());
        assert!(matches!(
            result,
            Err(ConversionError::BufferSizeMismatch {
                expected: 12,
                actual: 5
            })
        ));
        assert!(output.into_inner().is_empty());
    }
}
