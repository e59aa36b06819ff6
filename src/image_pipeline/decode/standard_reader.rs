//! JPEG/PNG reader backed by the `image` crate.

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::decode::reader::ImageReader;
use crate::image_pipeline::decode::types::{RGB_CHANNELS, RgbImageData};

/// Decodes JPEG and PNG images into 8-bit RGB.
///
/// Only images with exactly three channels are accepted. Grayscale and
/// images carrying alpha are rejected with
/// [`ConversionError::UnsupportedChannelCount`] instead of being converted,
/// so the caller never denoises data it did not ask for. Higher bit depths
/// are narrowed to 8 bits.
pub struct StandardImageReader;

impl ImageReader for StandardImageReader {
    fn read_image(&self, data: &[u8]) -> Result<RgbImageData> {
        debug!("Decoding image, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        let channels = decoded.color().channel_count();
        if usize::from(channels) != RGB_CHANNELS {
            return Err(ConversionError::UnsupportedChannelCount(channels));
        }

        let rgb = decoded.into_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        debug!("Decoded image: {}x{}", width, height);

        Ok(RgbImageData {
            width,
            height,
            data: rgb.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn reads_rgb_png() {
        let source = image::RgbImage::from_fn(5, 3, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let bytes = encode_png(DynamicImage::ImageRgb8(source.clone()));

        let decoded = StandardImageReader.read_image(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (5, 3));
        assert_eq!(decoded.data, source.into_raw());
    }

    #[test]
    fn rejects_grayscale() {
        let bytes = encode_png(DynamicImage::ImageLuma8(image::GrayImage::new(4, 4)));
        let err = StandardImageReader.read_image(&bytes).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedChannelCount(1)));
    }

    #[test]
    fn rejects_rgba() {
        let bytes = encode_png(DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4)));
        let err = StandardImageReader.read_image(&bytes).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedChannelCount(4)));
    }

    #[test]
    fn rejects_garbage() {
        let err = StandardImageReader.read_image(b"not an image").unwrap_err();
        assert!(matches!(err, ConversionError::DecodeError(_)));
    }
}
