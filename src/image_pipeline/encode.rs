//! Image encoding module
//!
//! Denoised images are always written as JPEG.

mod jpeg_writer;
mod writer;

pub use jpeg_writer::JpegImageWriter;
pub use writer::ImageWriter;
