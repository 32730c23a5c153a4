use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::exr::types::LinearImageData;

pub trait ExrReader {
    fn read_exr(&self, data: &[u8]) -> Result<LinearImageData>;
}
