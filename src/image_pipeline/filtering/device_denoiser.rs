use tracing::{info, instrument, warn};

use crate::denoise::{Device, Quality, RayTracing};
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::config::DenoiseConfig;
use crate::image_pipeline::filtering::denoiser::Denoiser;
use crate::image_pipeline::filtering::types::{AuxiliaryImages, DenoiseOutcome, FloatImageData};

/// Runs the `"RT"` filter on a committed denoising device.
pub struct DeviceDenoiser {
    device: Device,
    quality: Quality,
    srgb: bool,
    hdr: bool,
    input_scale: Option<f32>,
    clean_aux: bool,
}

impl DeviceDenoiser {
    /// Opens and commits the device named by the configuration.
    pub fn new(config: &DenoiseConfig) -> Result<Self> {
        let device = Device::new(config.device)?;
        Self::with_device(device, config)
    }

    /// Uses an existing device, committing it first if needed.
    pub fn with_device(mut device: Device, config: &DenoiseConfig) -> Result<Self> {
        if !device.is_committed() {
            if let Some(threads) = config.num_threads {
                device.set_num_threads(threads)?;
            }
            device.commit()?;
        }
        info!(
            device_type = ?device.device_type(),
            native = device.is_native(),
            "Denoising device ready"
        );

        Ok(Self {
            device,
            quality: config.quality,
            srgb: config.srgb,
            hdr: config.hdr,
            input_scale: config.input_scale,
            clean_aux: config.clean_aux,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl Denoiser for DeviceDenoiser {
    #[instrument(skip_all, fields(width = color.width, height = color.height))]
    fn denoise(&self, color: &FloatImageData, aux: &AuxiliaryImages) -> Result<DenoiseOutcome> {
        let mut output = vec![0.0f32; color.data.len()];

        let mut filter = RayTracing::new(&self.device);
        filter
            .hdr(self.hdr)
            .srgb(self.srgb)
            .clean_aux(self.clean_aux)
            .filter_quality(self.quality)
            .input_scale(self.input_scale.unwrap_or(f32::NAN))
            .image_dimensions(color.width, color.height);

        let run = match (&aux.albedo, &aux.normal) {
            (Some(albedo), Some(normal)) => filter.albedo_normal(&albedo.data, &normal.data).map(|_| ()),
            (Some(albedo), None) => filter.albedo(&albedo.data).map(|_| ()),
            _ => Ok(()),
        }
        .and_then(|()| filter.filter(&color.data, &mut output));

        // The device error slot is the authoritative report; the returned
        // error only covers the case where nothing was recorded.
        let device_error = self.device.get_error().err().or(run.err());
        if let Some(err) = &device_error {
            warn!(code = ?err.code, message = %err.message, "Device reported an error while filtering");
        }

        Ok(DenoiseOutcome {
            image: FloatImageData {
                width: color.width,
                height: color.height,
                data: output,
            },
            device_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::denoise::ErrorCode;

    fn flat(width: usize, height: usize, value: f32) -> FloatImageData {
        FloatImageData {
            width,
            height,
            data: vec![value; width * height * 3],
        }
    }

    #[test]
    fn denoises_on_the_builtin_device() {
        let denoiser = DeviceDenoiser::with_device(Device::builtin_cpu(), &DenoiseConfig::default()).unwrap();
        assert!(denoiser.device().is_committed());

        let outcome = denoiser
            .denoise(&flat(6, 4, 0.4), &AuxiliaryImages::default())
            .unwrap();
        assert!(outcome.device_error.is_none());
        assert_eq!(outcome.image.data.len(), 6 * 4 * 3);
        assert!(outcome.image.data.iter().all(|v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn uses_albedo_and_normal() {
        let denoiser = DeviceDenoiser::with_device(Device::builtin_cpu(), &DenoiseConfig::default()).unwrap();
        let aux = AuxiliaryImages {
            albedo: Some(flat(3, 3, 0.5)),
            normal: Some(flat(3, 3, 0.0)),
        };
        let outcome = denoiser.denoise(&flat(3, 3, 0.7), &aux).unwrap();
        assert!(outcome.device_error.is_none());
    }

    #[test]
    fn device_errors_are_reported_not_raised() {
        let mut config = DenoiseConfig::default();
        // hdr together with srgb is rejected when the filter is committed
        config.hdr = true;
        config.srgb = true;
        let denoiser = DeviceDenoiser::with_device(Device::builtin_cpu(), &config).unwrap();

        let outcome = denoiser
            .denoise(&flat(2, 2, 0.5), &AuxiliaryImages::default())
            .unwrap();
        let err = outcome.device_error.unwrap();
        assert_eq!(err.code, ErrorCode::InvalidOperation);
        assert!(outcome.image.data.iter().all(|&v| v == 0.0));
        assert!(denoiser.device().get_error().is_ok());
    }

    #[test]
    fn thread_count_is_applied_before_commit() {
        let config = DenoiseConfig::builder().num_threads(Some(1)).build();
        let denoiser = DeviceDenoiser::with_device(Device::builtin_cpu(), &config).unwrap();
        let outcome = denoiser
            .denoise(&flat(4, 4, 0.1), &AuxiliaryImages::default())
            .unwrap();
        assert!(outcome.device_error.is_none());
    }
}
