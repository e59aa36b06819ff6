//! Pipeline conversions module
//!
//! Orchestrates decode, denoise and JPEG encode for a single image.

mod denoise_jpeg;

pub use denoise_jpeg::{AuxiliaryData, AuxiliaryPaths, DenoisePipeline, DenoiseReport, ProcessedImage};
