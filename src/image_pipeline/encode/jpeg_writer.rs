use std::io::Write;

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::DenoiseConfig;
use crate::image_pipeline::decode::RgbImageData;
use crate::image_pipeline::encode::writer::ImageWriter;

pub struct JpegImageWriter;

impl ImageWriter for JpegImageWriter {
    fn write_image(&self, image: &RgbImageData, output: &mut dyn Write, config: &DenoiseConfig) -> Result<()> {
        debug!(
            "Encoding JPEG image: {}x{} at quality {}",
            image.width, image.height, config.jpeg_quality
        );

        let width = u32::try_from(image.width)
            .map_err(|_| ConversionError::InvalidDimensions(image.width, image.height))?;
        let height = u32::try_from(image.height)
            .map_err(|_| ConversionError::InvalidDimensions(image.width, image.height))?;

        if image.data.len() != image.sample_count() {
            return Err(ConversionError::EncodeError(format!(
                "expected {} samples for {}x{} RGB, got {}",
                image.sample_count(),
                image.width,
                image.height,
                image.data.len()
            )));
        }

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
        encoder
            .encode(&image.data, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("JPEG encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> RgbImageData {
        let data = (0..width * height)
            .flat_map(|i| {
                let v = (i * 255 / (width * height)) as u8;
                [v, 255 - v, 128]
            })
            .collect();
        RgbImageData { width, height, data }
    }

    #[test]
    fn writes_a_decodable_jpeg() {
        let mut output = Vec::new();
        JpegImageWriter
            .write_image(&gradient(17, 9), &mut output, &DenoiseConfig::default())
            .unwrap();

        assert_eq!(&output[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (17, 9));
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let image = RgbImageData {
            width: 4,
            height: 4,
            data: vec![0; 5],
        };
        let mut output = Vec::new();
        let err = JpegImageWriter
            .write_image(&image, &mut output, &DenoiseConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConversionError::EncodeError(_)));
        assert!(output.is_empty());
    }
}
