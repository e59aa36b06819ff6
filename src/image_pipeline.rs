//! Image denoising pipeline module
//!
//! This module provides a structured approach to denoising 8-bit images,
//! with separate modules for decoding, filtering, JPEG encoding and
//! conversion orchestration.

pub mod common;
pub mod config;
pub mod conversions;
pub mod convert;
pub mod decode;
pub mod encode;
pub mod filtering;
pub mod timing;

pub use common::{
    ConversionError,
    Result,
};

pub use config::{
    DEFAULT_JPEG_QUALITY,
    DenoiseConfig,
    DenoiseConfigBuilder,
};

pub use decode::{
    ImageReader,
    RgbImageData,
    StandardImageReader,
};

pub use encode::{
    ImageWriter,
    JpegImageWriter,
};

pub use filtering::{
    AuxiliaryImages,
    DenoiseOutcome,
    Denoiser,
    DeviceDenoiser,
    FloatImageData,
};

pub use conversions::{
    AuxiliaryData,
    AuxiliaryPaths,
    DenoisePipeline,
    DenoiseReport,
    ProcessedImage,
};

pub use timing::PipelineTimings;
