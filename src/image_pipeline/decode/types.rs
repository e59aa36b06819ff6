//! Decoded image data types

/// Number of interleaved channels every pipeline image carries.
pub const RGB_CHANNELS: usize = 3;

/// 8-bit RGB image data
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
}

impl RgbImageData {
    pub fn sample_count(&self) -> usize {
        self.width * self.height * RGB_CHANNELS
    }
}
