//! Denoising conversion configuration types

use crate::denoise::{DeviceType, Quality};

/// JPEG quality the output is written with unless configured otherwise.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Configuration for image denoising
#[derive(Debug, Clone)]
pub struct DenoiseConfig {
    /// Device the filter runs on
    pub device: DeviceType,
    /// Worker threads for the device, `None` for automatic
    pub num_threads: Option<usize>,
    /// Filter quality
    pub quality: Quality,
    /// Whether the input is sRGB encoded (8-bit images usually are)
    pub srgb: bool,
    /// Whether the input is HDR; mutually exclusive with `srgb`
    pub hdr: bool,
    /// Scale applied to input values before filtering, `None` for automatic
    pub input_scale: Option<f32>,
    /// Whether the auxiliary images are noise free
    pub clean_aux: bool,
    /// JPEG quality of the output (1-100)
    pub jpeg_quality: u8,
    /// Whether to validate image dimensions before denoising
    pub validate_dimensions: bool,
    /// Whether an error polled from the device after filtering aborts the
    /// conversion. When false the error is only reported.
    pub fail_on_filter_error: bool,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            device: DeviceType::Default,
            num_threads: None,
            quality: Quality::Default,
            srgb: true,
            hdr: false,
            input_scale: None,
            clean_aux: false,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            validate_dimensions: true,
            fail_on_filter_error: false,
        }
    }
}

impl DenoiseConfig {
    pub fn builder() -> DenoiseConfigBuilder {
        DenoiseConfigBuilder::default()
    }
}

/// Builder for DenoiseConfig
#[derive(Default)]
pub struct DenoiseConfigBuilder {
    device: Option<DeviceType>,
    num_threads: Option<Option<usize>>,
    quality: Option<Quality>,
    srgb: Option<bool>,
    hdr: Option<bool>,
    input_scale: Option<Option<f32>>,
    clean_aux: Option<bool>,
    jpeg_quality: Option<u8>,
    validate_dimensions: Option<bool>,
    fail_on_filter_error: Option<bool>,
}

impl DenoiseConfigBuilder {
    pub fn device(mut self, device: DeviceType) -> Self {
        self.device = Some(device);
        self
    }

    pub fn num_threads(mut self, threads: Option<usize>) -> Self {
        self.num_threads = Some(threads);
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn srgb(mut self, srgb: bool) -> Self {
        self.srgb = Some(srgb);
        self
    }

    /// HDR input is never sRGB encoded, so enabling it also clears `srgb`.
    pub fn hdr(mut self, hdr: bool) -> Self {
        self.hdr = Some(hdr);
        if hdr {
            self.srgb = Some(false);
        }
        self
    }

    pub fn input_scale(mut self, scale: Option<f32>) -> Self {
        self.input_scale = Some(scale);
        self
    }

    pub fn clean_aux(mut self, clean_aux: bool) -> Self {
        self.clean_aux = Some(clean_aux);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality.clamp(1, 100));
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn fail_on_filter_error(mut self, fail: bool) -> Self {
        self.fail_on_filter_error = Some(fail);
        self
    }

    pub fn build(self) -> DenoiseConfig {
        let default = DenoiseConfig::default();
        DenoiseConfig {
            device: self.device.unwrap_or(default.device),
            num_threads: self.num_threads.unwrap_or(default.num_threads),
            quality: self.quality.unwrap_or(default.quality),
            srgb: self.srgb.unwrap_or(default.srgb),
            hdr: self.hdr.unwrap_or(default.hdr),
            input_scale: self.input_scale.unwrap_or(default.input_scale),
            clean_aux: self.clean_aux.unwrap_or(default.clean_aux),
            jpeg_quality: self.jpeg_quality.unwrap_or(default.jpeg_quality),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            fail_on_filter_error: self.fail_on_filter_error.unwrap_or(default.fail_on_filter_error),
        }
    }
}
