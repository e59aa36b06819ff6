//! Filtering stage
//!
//! Hands normalized images to a denoiser and collects what the device
//! reported while filtering.

mod denoiser;
mod device_denoiser;
pub mod types;

pub use denoiser::Denoiser;
pub use device_denoiser::DeviceDenoiser;
pub use types::{AuxiliaryImages, DenoiseOutcome, FloatImageData};
