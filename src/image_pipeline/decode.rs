//! Image decoding module
//!
//! This module turns encoded JPEG/PNG bytes into 8-bit RGB pixel data.

mod reader;
mod standard_reader;
pub mod types;

pub use reader::ImageReader;
pub use standard_reader::StandardImageReader;
pub use types::{RGB_CHANNELS, RgbImageData};
