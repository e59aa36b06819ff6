use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, info_span, instrument, warn};

use crate::denoise::DeviceError;
use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    config::DenoiseConfig,
    convert::{normalize_u8, normals_from_u8, quantize_to_u8},
    decode::{ImageReader, RgbImageData, StandardImageReader},
    encode::{ImageWriter, JpegImageWriter},
    filtering::{AuxiliaryImages, Denoiser, DeviceDenoiser, FloatImageData},
    timing::PipelineTimings,
};

/// Encoded auxiliary feature images held in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuxiliaryData<'a> {
    pub albedo: Option<&'a [u8]>,
    pub normal: Option<&'a [u8]>,
}

/// Paths of auxiliary feature image files.
#[derive(Debug, Default, Clone)]
pub struct AuxiliaryPaths {
    pub albedo: Option<PathBuf>,
    pub normal: Option<PathBuf>,
}

/// A denoised image ready to be encoded.
#[derive(Debug)]
pub struct ProcessedImage {
    pub image: RgbImageData,
    /// Error the device reported while filtering, when it was not fatal
    pub filter_error: Option<DeviceError>,
    pub timings: PipelineTimings,
}

/// Summary of a finished conversion.
#[derive(Debug)]
pub struct DenoiseReport {
    pub width: usize,
    pub height: usize,
    pub filter_error: Option<DeviceError>,
    pub timings: PipelineTimings,
}

pub struct DenoisePipeline<R: ImageReader, D: Denoiser, W: ImageWriter> {
    reader: R,
    denoiser: D,
    writer: W,
    config: DenoiseConfig,
}

impl DenoisePipeline<StandardImageReader, DeviceDenoiser, JpegImageWriter> {
    /// Opens the configured denoising device.
    pub fn new(config: DenoiseConfig) -> Result<Self> {
        let denoiser = DeviceDenoiser::new(&config)?;
        Ok(Self {
            reader: StandardImageReader,
            denoiser,
            writer: JpegImageWriter,
            config,
        })
    }
}

impl<R: ImageReader, D: Denoiser, W: ImageWriter> DenoisePipeline<R, D, W> {
    pub fn with_custom(reader: R, denoiser: D, writer: W, config: DenoiseConfig) -> Self {
        Self {
            reader,
            denoiser,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    fn decode_auxiliary(&self, color: &RgbImageData, aux: AuxiliaryData<'_>) -> Result<AuxiliaryImages> {
        if aux.normal.is_some() && aux.albedo.is_none() {
            return Err(ConversionError::AuxiliaryMismatch(
                "a normal image requires an albedo image".to_string(),
            ));
        }

        let decode = |name: &str, data: &[u8], to_float: fn(&[u8]) -> Vec<f32>| -> Result<FloatImageData> {
            let image = self.reader.read_image(data).map_err(|e| match e {
                ConversionError::UnsupportedChannelCount(found) => ConversionError::AuxiliaryMismatch(
                    format!("{name} image has {found} channels, expected 3"),
                ),
                other => other,
            })?;
            if image.width != color.width || image.height != color.height {
                return Err(ConversionError::AuxiliaryMismatch(format!(
                    "{name} image is {}x{} but the color image is {}x{}",
                    image.width, image.height, color.width, color.height
                )));
            }
            Ok(FloatImageData {
                width: image.width,
                height: image.height,
                data: to_float(&image.data),
            })
        };

        Ok(AuxiliaryImages {
            albedo: aux.albedo.map(|data| decode("albedo", data, normalize_u8)).transpose()?,
            normal: aux.normal.map(|data| decode("normal", data, normals_from_u8)).transpose()?,
        })
    }

    /// Decodes, denoises and quantizes an image without encoding it.
    #[instrument(skip_all, fields(input_size = input_data.len()))]
    pub fn process(&self, input_data: &[u8], aux: AuxiliaryData<'_>) -> Result<ProcessedImage> {
        let mut timings = PipelineTimings::new();

        let color = {
            let _span = info_span!("decode_image").entered();
            timings.measure("decode_image", || self.reader.read_image(input_data))?
        };

        {
            let _span = info_span!("validate_dimensions",
                width = color.width,
                height = color.height
            ).entered();
            self.validate_dimensions(color.width, color.height)?;
        }

        let aux_images = {
            let _span = info_span!("decode_auxiliary").entered();
            timings.measure("decode_auxiliary", || self.decode_auxiliary(&color, aux))?
        };

        let input = timings.measure("normalize", || FloatImageData {
            width: color.width,
            height: color.height,
            data: normalize_u8(&color.data),
        });

        let outcome = {
            let _span = info_span!("denoise").entered();
            timings.measure("denoise", || self.denoiser.denoise(&input, &aux_images))?
        };

        if let Some(err) = &outcome.device_error {
            if self.config.fail_on_filter_error {
                return Err(ConversionError::FilterFailed(err.clone()));
            }
            warn!(error = %err, "Denoising filter reported an error, writing output anyway");
        }

        let data = timings.measure("quantize", || quantize_to_u8(&outcome.image.data));

        Ok(ProcessedImage {
            image: RgbImageData {
                width: outcome.image.width,
                height: outcome.image.height,
                data,
            },
            filter_error: outcome.device_error,
            timings,
        })
    }

    fn encode(&self, processed: &mut ProcessedImage) -> Result<Vec<u8>> {
        let _span = info_span!("encode_jpeg").entered();
        let mut encoded = Vec::new();
        let writer = &self.writer;
        let config = &self.config;
        let image = &processed.image;
        processed
            .timings
            .measure("encode_jpeg", || writer.write_image(image, &mut encoded, config))?;
        Ok(encoded)
    }

    fn report(processed: ProcessedImage) -> DenoiseReport {
        info!(
            width = processed.image.width,
            height = processed.image.height,
            elapsed_ms = processed.timings.total_duration().as_secs_f64() * 1000.0,
            "Denoising complete"
        );
        DenoiseReport {
            width: processed.image.width,
            height: processed.image.height,
            filter_error: processed.filter_error,
            timings: processed.timings,
        }
    }

    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<DenoiseReport> {
        self.convert_with_aux(input_data, AuxiliaryData::default(), output)
    }

    /// Denoises an encoded image and writes the JPEG result to `output`.
    /// Nothing is written unless every step succeeded.
    pub fn convert_with_aux(
        &self,
        input_data: &[u8],
        aux: AuxiliaryData<'_>,
        output: &mut dyn Write,
    ) -> Result<DenoiseReport> {
        info!("Starting denoise conversion");
        let mut processed = self.process(input_data, aux)?;
        let encoded = self.encode(&mut processed)?;
        output.write_all(&encoded)?;
        Ok(Self::report(processed))
    }

    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<DenoiseReport> {
        self.convert_file_with_aux(input_path, output_path, &AuxiliaryPaths::default())
    }

    /// File based conversion. The output file is only created once the
    /// image has been decoded, denoised and encoded.
    #[instrument(skip_all)]
    pub fn convert_file_with_aux<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        aux_paths: &AuxiliaryPaths,
    ) -> Result<DenoiseReport> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Denoising file"
        );

        let mut read_timings = PipelineTimings::new();
        let (input_data, albedo, normal) = {
            let _span = info_span!("read_input_files").entered();
            read_timings.measure("read_input_files", || -> Result<_> {
                let input = read_file(input_path)?;
                let albedo = aux_paths.albedo.as_deref().map(read_file).transpose()?;
                let normal = aux_paths.normal.as_deref().map(read_file).transpose()?;
                Ok((input, albedo, normal))
            })?
        };

        let aux = AuxiliaryData {
            albedo: albedo.as_deref(),
            normal: normal.as_deref(),
        };
        let mut processed = self.process(&input_data, aux)?;
        let encoded = self.encode(&mut processed)?;

        {
            let _span = info_span!("write_output_file").entered();
            processed.timings.measure("write_output_file", || {
                std::fs::write(output_path, &encoded).map_err(|e| {
                    ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
                })
            })?;
        }

        for step in read_timings.steps() {
            processed.timings.add_step(step.name.clone(), step.duration);
        }
        Ok(Self::report(processed))
    }

    pub fn config(&self) -> &DenoiseConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DenoiseConfig) {
        self.config = config;
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| ConversionError::InputReadError(format!("{}: {}", path.display(), e)))
}
