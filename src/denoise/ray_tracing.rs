use crate::denoise::buffer::Buffer;
use crate::denoise::device::Device;
use crate::denoise::error::Result;
use crate::denoise::filter::Filter;
use crate::denoise::types::{ErrorCode, Format, ImageDesc, Quality};

/// Convenience wrapper around the `"RT"` filter for tightly packed RGB
/// float images.
///
/// Auxiliary images are copied into device buffers so they can be reused
/// across several color images of the same size.
pub struct RayTracing<'d> {
    device: &'d Device,
    albedo: Option<Buffer>,
    normal: Option<Buffer>,
    hdr: bool,
    srgb: bool,
    clean_aux: bool,
    input_scale: f32,
    quality: Quality,
    dims: (usize, usize),
}

impl<'d> RayTracing<'d> {
    pub fn new(device: &'d Device) -> Self {
        Self {
            device,
            albedo: None,
            normal: None,
            hdr: false,
            srgb: false,
            clean_aux: false,
            input_scale: f32::NAN,
            quality: Quality::Default,
            dims: (0, 0),
        }
    }

    /// Sets whether the color is HDR.
    pub fn hdr(&mut self, hdr: bool) -> &mut Self {
        self.hdr = hdr;
        self
    }

    /// Sets whether the color is sRGB encoded (LDR only) rather than linear.
    /// The output uses the same encoding.
    pub fn srgb(&mut self, srgb: bool) -> &mut Self {
        self.srgb = srgb;
        self
    }

    /// Sets whether the auxiliary images are noise free.
    pub fn clean_aux(&mut self, clean_aux: bool) -> &mut Self {
        self.clean_aux = clean_aux;
        self
    }

    /// Scale applied to input values before filtering; the output is not
    /// scaled. NaN picks the scale automatically.
    pub fn input_scale(&mut self, input_scale: f32) -> &mut Self {
        self.input_scale = input_scale;
        self
    }

    pub fn filter_quality(&mut self, quality: Quality) -> &mut Self {
        self.quality = quality;
        self
    }

    /// Sets the image size. Auxiliary images of another size are dropped.
    pub fn image_dimensions(&mut self, width: usize, height: usize) -> &mut Self {
        let len = 3 * width * height;
        if self.albedo.as_ref().is_some_and(|b| b.len() != len) {
            self.albedo = None;
        }
        if self.normal.as_ref().is_some_and(|b| b.len() != len) {
            self.normal = None;
        }
        self.dims = (width, height);
        self
    }

    /// Sets the albedo image (three channels, values in `[0, 1]`).
    pub fn albedo(&mut self, albedo: &[f32]) -> Result<&mut Self> {
        store(self.device, &mut self.albedo, albedo)?;
        Ok(self)
    }

    /// Sets the albedo and the shading normals (three channels, `[-1, 1]`).
    pub fn albedo_normal(&mut self, albedo: &[f32], normal: &[f32]) -> Result<&mut Self> {
        store(self.device, &mut self.albedo, albedo)?;
        store(self.device, &mut self.normal, normal)?;
        Ok(self)
    }

    /// Uses an existing device buffer as the albedo image.
    pub fn albedo_buffer(&mut self, albedo: Buffer) -> Result<&mut Self> {
        self.check_owner(&albedo)?;
        self.albedo = Some(albedo);
        Ok(self)
    }

    /// Uses existing device buffers as the albedo and normal images.
    pub fn albedo_normal_buffer(&mut self, albedo: Buffer, normal: Buffer) -> Result<&mut Self> {
        self.check_owner(&albedo)?;
        self.check_owner(&normal)?;
        self.albedo = Some(albedo);
        self.normal = Some(normal);
        Ok(self)
    }

    pub fn filter(&self, color: &[f32], output: &mut [f32]) -> Result<()> {
        self.execute(color.len(), output.len(), move |filter, desc| {
            filter.set_image("color", color, desc)?;
            filter.set_output_image(output, desc)
        })
    }

    /// Filters between two buffers owned by this builder's device.
    pub fn filter_buffer(&self, color: &Buffer, output: &mut Buffer) -> Result<()> {
        self.execute(color.len(), output.len(), move |filter, desc| {
            filter.set_image_buffer("color", color, desc)?;
            filter.set_output_buffer(output, desc)
        })
    }

    pub fn filter_in_place(&self, color: &mut [f32]) -> Result<()> {
        let staged = self.device.create_buffer(color)?;
        self.filter(staged.as_slice(), color)
    }

    pub fn filter_in_place_buffer(&self, color: &mut Buffer) -> Result<()> {
        self.check_owner(color)?;
        let staged = self.device.create_buffer(color.as_slice())?;
        self.filter_buffer(&staged, color)
    }

    fn check_owner(&self, buffer: &Buffer) -> Result<()> {
        if buffer.device_id() != self.device.id() {
            return Err(self.device.raise(
                ErrorCode::InvalidArgument,
                "buffer was created by a different device",
            ));
        }
        Ok(())
    }

    /// Runs the `"RT"` filter once `bind` has attached the color and output.
    fn execute<'a>(
        &'a self,
        color_len: usize,
        output_len: usize,
        bind: impl FnOnce(&mut Filter<'d, 'a>, ImageDesc) -> Result<()>,
    ) -> Result<()> {
        let (width, height) = self.dims;
        let expected = 3 * width * height;
        if color_len != expected || output_len != expected {
            return Err(self.device.raise(
                ErrorCode::InvalidArgument,
                format!(
                    "invalid image dimensions: {width}x{height} needs {expected} floats, got color {color_len} and output {output_len}"
                ),
            ));
        }

        let desc = ImageDesc::packed(Format::Float3, width, height);
        let mut filter = self.device.new_filter("RT")?;
        bind(&mut filter, desc)?;
        if let Some(albedo) = &self.albedo {
            filter.set_image_buffer("albedo", albedo, desc)?;
            // Normals are only useful together with albedo.
            if let Some(normal) = &self.normal {
                filter.set_image_buffer("normal", normal, desc)?;
            }
        }

        filter
            .set_bool("hdr", self.hdr)
            .set_bool("srgb", self.srgb)
            .set_bool("cleanAux", self.clean_aux)
            .set_float("inputScale", self.input_scale);
        filter.set_int("quality", self.quality.as_raw())?;

        filter.commit()?;
        filter.execute()
    }
}

fn store(device: &Device, slot: &mut Option<Buffer>, contents: &[f32]) -> Result<()> {
    match slot {
        Some(buffer) if buffer.len() == contents.len() => buffer.write(contents),
        _ => {
            *slot = Some(device.create_buffer(contents)?);
            Ok(())
        }
    }
}
