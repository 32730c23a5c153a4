use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::exr::types::LinearImageData;
use crate::image_pipeline::tonemap::types::{DisplayImageData, ToneMapParameters};

/// Reinhard global tone mapping operator.
///
/// Luminance is compressed with `L / (1 + L)` after scaling by
/// `key / log_average`, so the image's log-average luminance lands at the
/// key value. All three color channels share one scale factor per pixel,
/// which preserves hue and saturation under compression. Alpha, when
/// present in the input, is dropped.
pub struct ReinhardToneMapper;

/// BT.709 luminance weights for R, G, B.
const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Guard value for log(0) and division by zero; a pixel with zero luminance
/// gets a zero channel scale, so black stays black.
const EPSILON: f32 = 1e-6;

/// Ceiling applied to exposure-scaled radiance. Bounds fireflies so the
/// log-average stays finite.
const RADIANCE_CEILING: f32 = 1e6;

/// Channels in the display output (alpha is never carried through).
const DISPLAY_CHANNELS: usize = 3;

#[inline]
fn scaled_rgb(pixel: &[f32], gain: f32) -> (f32, f32, f32) {
    (
        (pixel[0] * gain).clamp(0.0, RADIANCE_CEILING),
        (pixel[1] * gain).clamp(0.0, RADIANCE_CEILING),
        (pixel[2] * gain).clamp(0.0, RADIANCE_CEILING),
    )
}

#[inline]
fn luminance(r: f32, g: f32, b: f32) -> f32 {
    (LUMA_WEIGHTS[0] * r + LUMA_WEIGHTS[1] * g + LUMA_WEIGHTS[2] * b).clamp(0.0, RADIANCE_CEILING)
}

impl ReinhardToneMapper {
    /// Compresses a linear-light image into 8-bit display range.
    ///
    /// Two passes over the buffer: the first accumulates the log-average
    /// luminance of the exposure-scaled image, the second maps and
    /// quantizes each pixel. Pixels carry no data dependency on each other
    /// inside either pass.
    pub fn tone_map(
        &self,
        image: &LinearImageData,
        params: &ToneMapParameters,
    ) -> Result<DisplayImageData> {
        params.validate()?;

        if image.channels != 3 && image.channels != 4 {
            return Err(ConversionError::UnsupportedFormat(format!(
                "expected 3 or 4 interleaved channels, found {}",
                image.channels
            )));
        }
        if image.width == 0 || image.height == 0 {
            return Err(ConversionError::InvalidDimensions(image.width, image.height));
        }
        if image.samples.len() != image.expected_len() {
            return Err(ConversionError::BufferSizeMismatch {
                expected: image.expected_len(),
                actual: image.samples.len(),
            });
        }

        let gain = params.exposure_ev.exp2();
        let stride = image.channels;
        let pixel_count = image.pixel_count();

        let mut log_sum = 0.0_f64;
        for pixel in image.samples.chunks_exact(stride) {
            let (r, g, b) = scaled_rgb(pixel, gain);
            log_sum += f64::from((EPSILON + luminance(r, g, b)).ln());
        }
        let log_average = (log_sum / pixel_count as f64).exp() as f32;
        let key_scale = params.key / (log_average + EPSILON);

        debug!(
            "Tone mapping {}x{} image: log-average luminance {:.6}, key {}",
            image.width, image.height, log_average, params.key
        );

        let mut data = Vec::with_capacity(pixel_count * DISPLAY_CHANNELS);
        for pixel in image.samples.chunks_exact(stride) {
            let (r, g, b) = scaled_rgb(pixel, gain);
            let l = luminance(r, g, b);
            let l_scaled = key_scale * l;
            let l_mapped = l_scaled / (1.0 + l_scaled);
            let scale = l_mapped / (l + EPSILON);

            for channel in [r, g, b] {
                let display = (channel * scale).clamp(0.0, 1.0);
                let encoded = params.transfer.encode(display);
                data.push((encoded * 255.0).round().clamp(0.0, 255.0) as u8);
            }
        }

        Ok(DisplayImageData {
            width: image.width,
            height: image.height,
            data,
        })
    }
}
