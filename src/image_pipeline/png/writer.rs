use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::png::types::ConversionConfig;
use crate::image_pipeline::tonemap::types::DisplayImageData;

pub trait PngWriter {
    fn write_png(
        &self,
        image: &DisplayImageData,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()>;
}
