use thiserror::Error;

use crate::denoise::DeviceError;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode JPEG image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Wrong number of image channels: expected 3, found {0}")]
    UnsupportedChannelCount(u8),

    #[error("Invalid auxiliary image: {0}")]
    AuxiliaryMismatch(String),

    #[error("Denoising device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Denoising filter reported an error: {0}")]
    FilterFailed(DeviceError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
