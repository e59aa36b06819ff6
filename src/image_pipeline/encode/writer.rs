use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::config::DenoiseConfig;
use crate::image_pipeline::decode::RgbImageData;

pub trait ImageWriter {
    fn write_image(&self, image: &RgbImageData, output: &mut dyn Write, config: &DenoiseConfig) -> Result<()>;
}
