use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::filtering::types::{AuxiliaryImages, DenoiseOutcome, FloatImageData};

pub trait Denoiser {
    /// Denoises `color`. Errors the device reports while filtering are
    /// returned in the outcome; `Err` is reserved for failures that leave no
    /// output at all.
    fn denoise(&self, color: &FloatImageData, aux: &AuxiliaryImages) -> Result<DenoiseOutcome>;
}
