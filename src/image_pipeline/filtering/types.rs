//! Types exchanged with a denoiser

use crate::denoise::DeviceError;

/// Normalized float RGB image data
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB samples interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<f32>,
}

/// Optional feature images that guide the filter
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryImages {
    /// Surface albedo, values in [0, 1]
    pub albedo: Option<FloatImageData>,
    /// Shading normals, values in [-1, 1]; only used together with albedo
    pub normal: Option<FloatImageData>,
}

/// Result of one denoising run
#[derive(Debug)]
pub struct DenoiseOutcome {
    pub image: FloatImageData,
    /// Error polled from the device after the filter ran, if any
    pub device_error: Option<DeviceError>,
}
