//! EXR image reader implementation using the exr library.
//!
//! This module provides support for reading OpenEXR images using the exr
//! library. It handles scanline and tiled images, converts half-precision and
//! full-precision float channels to a common f32 representation, and
//! sanitizes samples so that downstream stages only ever see non-negative,
//! finite values.

use std::io::Cursor;

use exr::prelude::*;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::exr::reader::ExrReader;
use crate::image_pipeline::exr::types::LinearImageData;

/// EXR image reader that uses the exr library for decoding.
///
/// Images are always read through the library's rgba view: files without an
/// alpha channel get alpha defaulted to 1.0, so the produced buffer is
/// 4-channel either way. Luminance-only or otherwise non-RGB layers are
/// rejected as unsupported.
pub struct ExrsReader;

/// First four bytes of every OpenEXR file.
const EXR_MAGIC: [u8; 4] = [0x76, 0x2F, 0x31, 0x01];

/// Hard upper bound on either image dimension, checked against the header
/// before any pixel storage is allocated. Forged headers declaring huge
/// images must not be able to trigger a giant allocation.
const MAX_DIMENSION: usize = 65_535;

/// Channels in the decoded buffer (rgba view).
const DECODED_CHANNELS: usize = 4;

impl ExrReader for ExrsReader {
    /// Reads and decodes EXR image data from a byte buffer.
    ///
    /// This method:
    /// 1. Checks the OpenEXR magic number before parsing anything else
    /// 2. Reads the file meta data and validates the declared dimensions
    /// 3. Decodes the first non-deep RGB layer into an interleaved f32 buffer
    /// 4. Replaces NaN, infinite, and negative samples with 0.0
    ///
    /// # Arguments
    ///
    /// * `data` - Raw bytes of the EXR file
    ///
    /// # Returns
    ///
    /// * `Ok(LinearImageData)` - Successfully decoded 4-channel image
    /// * `Err(ConversionError::DecodeError)` - Malformed or unsupported input
    fn read_exr(&self, data: &[u8]) -> Result<LinearImageData> {
        debug!("Decoding EXR image, {} bytes", data.len());

        if data.is_empty() {
            return Err(ConversionError::DecodeError(
                "empty input buffer".to_string(),
            ));
        }

        if data.len() < EXR_MAGIC.len() || data[..EXR_MAGIC.len()] != EXR_MAGIC {
            return Err(ConversionError::DecodeError(format!(
                "missing OpenEXR magic number in {} byte buffer",
                data.len()
            )));
        }

        // Validate header dimensions before the pixel read allocates storage.
        let meta = exr::meta::MetaData::read_from_buffered(Cursor::new(data), false)
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        for header in &meta.headers {
            let size = header.layer_size;
            validate_declared_size(size.width(), size.height())?;
        }

        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .rgba_channels(
                |resolution: Vec2<usize>, _channels: &RgbaChannels| {
                    (
                        resolution,
                        vec![0.0_f32; resolution.area() * DECODED_CHANNELS],
                    )
                },
                |(resolution, samples), position, (r, g, b, a): (f32, f32, f32, f32)| {
                    let base = position.flat_index_for_size(*resolution) * DECODED_CHANNELS;
                    samples[base..base + DECODED_CHANNELS].copy_from_slice(&[r, g, b, a]);
                },
            )
            .first_valid_layer()
            .all_attributes()
            .from_buffered(Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        let (resolution, mut samples) = image.layer_data.channel_data.pixels;
        let width = resolution.width();
        let height = resolution.height();

        debug!("Decoded image: {}x{}", width, height);

        // Malformed files can carry NaN, infinite, or negative radiance.
        // The tone mapper's invariants require non-negative finite samples.
        let mut sanitized = 0_usize;
        for sample in &mut samples {
            if !sample.is_finite() || *sample < 0.0 {
                *sample = 0.0;
                sanitized += 1;
            }
        }
        if sanitized > 0 {
            debug!("Sanitized {} non-finite or negative samples", sanitized);
        }

        Ok(LinearImageData {
            width,
            height,
            channels: DECODED_CHANNELS,
            samples,
        })
    }
}

fn validate_declared_size(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ConversionError::DecodeError(format!(
            "zero-area image: declared dimensions {}x{}",
            width, height
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ConversionError::DecodeError(format!(
            "declared dimensions {}x{} exceed the {} pixel limit",
            width, height, MAX_DIMENSION
        )));
    }
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(DECODED_CHANNELS))
        .ok_or_else(|| {
            ConversionError::DecodeError(format!(
                "declared dimensions {}x{} overflow the sample buffer size",
                width, height
            ))
        })?;
    Ok(())
}
