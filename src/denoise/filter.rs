//! Named filters created on a [`Device`].
//!
//! A filter borrows the caller's images for as long as it lives; nothing is
//! copied until the backend runs. Images and parameters are set first, then
//! the filter is committed (which validates the whole configuration) and
//! finally executed synchronously. Changing anything after a commit requires
//! committing again.

use tracing::{debug, instrument, trace, warn};

use crate::denoise::backend::{FilterJob, ImageView, ImageViewMut};
use crate::denoise::buffer::Buffer;
use crate::denoise::device::Device;
use crate::denoise::error::{DeviceError, Result};
use crate::denoise::types::{ErrorCode, Format, ImageDesc, Quality};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Filter types understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Generic ray tracing denoiser
    Rt,
    /// HDR lightmap denoiser
    RtLightmap,
}

impl FilterKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RT" => Some(FilterKind::Rt),
            "RTLightmap" => Some(FilterKind::RtLightmap),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Rt => "RT",
            FilterKind::RtLightmap => "RTLightmap",
        }
    }

    #[cfg(oidn_native)]
    pub(crate) fn c_name(self) -> &'static std::ffi::CStr {
        match self {
            FilterKind::Rt => c"RT",
            FilterKind::RtLightmap => c"RTLightmap",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterParams {
    pub hdr: bool,
    pub srgb: bool,
    pub clean_aux: bool,
    pub directional: bool,
    /// NaN selects the automatic scale
    pub input_scale: f32,
    pub quality: Quality,
    /// Negative means unlimited
    pub max_memory_mb: i32,
}

impl FilterParams {
    pub fn for_kind(kind: FilterKind) -> Self {
        Self {
            hdr: kind == FilterKind::RtLightmap,
            srgb: false,
            clean_aux: false,
            directional: false,
            input_scale: f32::NAN,
            quality: Quality::Default,
            max_memory_mb: -1,
        }
    }
}

pub struct Filter<'d, 'a> {
    device: &'d Device,
    kind: FilterKind,
    color: Option<ImageView<'a>>,
    albedo: Option<ImageView<'a>>,
    normal: Option<ImageView<'a>>,
    output: Option<ImageViewMut<'a>>,
    params: FilterParams,
    committed: bool,
}

impl Device {
    /// Creates a filter by name (`"RT"` or `"RTLightmap"`).
    pub fn new_filter<'a>(&self, name: &str) -> Result<Filter<'_, 'a>> {
        self.ensure_committed()?;
        let kind = FilterKind::from_name(name).ok_or_else(|| {
            self.raise(
                ErrorCode::InvalidArgument,
                format!("unknown filter type '{name}'"),
            )
        })?;
        debug!(filter = kind.name(), "Created filter");
        Ok(Filter {
            device: self,
            kind,
            color: None,
            albedo: None,
            normal: None,
            output: None,
            params: FilterParams::for_kind(kind),
            committed: false,
        })
    }
}

impl<'d, 'a> Filter<'d, 'a> {
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Binds an input image (`color`, `albedo` or `normal`).
    pub fn set_image(&mut self, name: &str, data: &'a [f32], desc: ImageDesc) -> Result<()> {
        desc.validate(data.len()).map_err(|e| self.device.record(e))?;
        let view = Some(ImageView { data, desc });
        match name {
            "color" => self.color = view,
            "albedo" => self.albedo = view,
            "normal" => self.normal = view,
            "output" => {
                return Err(self.device.raise(
                    ErrorCode::InvalidArgument,
                    "the output image must be bound with set_output_image",
                ));
            }
            other => {
                warn!(image = other, filter = self.kind.name(), "Ignoring unknown filter image");
                return Ok(());
            }
        }
        self.committed = false;
        Ok(())
    }

    /// Binds the image the filter writes its result to.
    pub fn set_output_image(&mut self, data: &'a mut [f32], desc: ImageDesc) -> Result<()> {
        desc.validate(data.len()).map_err(|e| self.device.record(e))?;
        self.output = Some(ImageViewMut { data, desc });
        self.committed = false;
        Ok(())
    }

    /// Binds an input image stored in a buffer of this filter's device.
    pub fn set_image_buffer(&mut self, name: &str, buffer: &'a Buffer, desc: ImageDesc) -> Result<()> {
        self.check_owner(buffer)?;
        self.set_image(name, buffer.as_slice(), desc)
    }

    pub fn set_output_buffer(&mut self, buffer: &'a mut Buffer, desc: ImageDesc) -> Result<()> {
        self.check_owner(buffer)?;
        self.set_output_image(buffer.as_mut_slice(), desc)
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

    pub fn unset_image(&mut self, name: &str) {
        match name {
            "color" => self.color = None,
            "albedo" => self.albedo = None,
            "normal" => self.normal = None,
            "output" => self.output = None,
            other => {
                warn!(image = other, "Ignoring unknown filter image");
                return;
            }
        }
        self.committed = false;
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> &mut Self {
        match (self.kind, name) {
            (FilterKind::Rt, "hdr") => self.params.hdr = value,
            (FilterKind::Rt, "srgb") => self.params.srgb = value,
            (FilterKind::Rt, "cleanAux") => self.params.clean_aux = value,
            (FilterKind::RtLightmap, "directional") => self.params.directional = value,
            (kind, other) => {
                warn!(param = other, filter = kind.name(), "Ignoring unknown filter parameter");
                return self;
            }
        }
        self.committed = false;
        self
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<&mut Self> {
        match name {
            "quality" => {
                self.params.quality = Quality::try_from(value).map_err(|e| self.device.record(e))?;
            }
            "maxMemoryMB" => self.params.max_memory_mb = value,
            other => {
                warn!(param = other, filter = self.kind.name(), "Ignoring unknown filter parameter");
                return Ok(self);
            }
        }
        self.committed = false;
        Ok(self)
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> &mut Self {
        match name {
            "inputScale" | "hdrScale" => self.params.input_scale = value,
            other => {
                warn!(param = other, filter = self.kind.name(), "Ignoring unknown filter parameter");
                return self;
            }
        }
        self.committed = false;
        self
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match name {
            "hdr" => Some(self.params.hdr),
            "srgb" => Some(self.params.srgb),
            "cleanAux" => Some(self.params.clean_aux),
            "directional" => Some(self.params.directional),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        match name {
            "quality" => Some(self.params.quality.as_raw()),
            "maxMemoryMB" => Some(self.params.max_memory_mb),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        match name {
            "inputScale" | "hdrScale" => Some(self.params.input_scale),
            _ => None,
        }
    }

    /// Validates the bound images and parameters.
    pub fn commit(&mut self) -> Result<()> {
        match self.validate() {
            Ok(()) => {
                self.committed = true;
                trace!(filter = self.kind.name(), "Filter committed");
                Ok(())
            }
            Err(err) => {
                self.committed = false;
                Err(self.device.record(err))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid_op = |message: &str| DeviceError::new(ErrorCode::InvalidOperation, message);
        let invalid_arg = |message: String| DeviceError::new(ErrorCode::InvalidArgument, message);

        let color = self.color.as_ref().ok_or_else(|| invalid_op("color image not specified"))?;
        let output = self.output.as_ref().ok_or_else(|| invalid_op("output image not specified"))?;

        if output.desc.width == 0 || output.desc.height == 0 {
            return Err(invalid_arg(format!(
                "invalid image dimensions {}x{}",
                output.desc.width, output.desc.height
            )));
        }

        let bound = [
            ("color", Some(color.desc)),
            ("albedo", self.albedo.map(|v| v.desc)),
            ("normal", self.normal.map(|v| v.desc)),
            ("output", Some(output.desc)),
        ];
        for (name, desc) in bound {
            let Some(desc) = desc else { continue };
            if desc.format != Format::Float3 {
                return Err(invalid_arg(format!(
                    "unsupported {name} image format {:?}",
                    desc.format
                )));
            }
            if !desc.same_dimensions(&output.desc) {
                return Err(invalid_arg(format!(
                    "{name} image is {}x{} but output is {}x{}",
                    desc.width, desc.height, output.desc.width, output.desc.height
                )));
            }
        }

        if self.normal.is_some() && self.albedo.is_none() {
            return Err(invalid_op("normal image requires an albedo image"));
        }

        match self.kind {
            FilterKind::Rt => {
                if self.params.hdr && self.params.srgb {
                    return Err(invalid_op("srgb mode is not supported for HDR images"));
                }
            }
            FilterKind::RtLightmap => {
                if self.params.srgb {
                    return Err(invalid_op("RTLightmap does not support srgb input"));
                }
                if self.albedo.is_some() || self.normal.is_some() {
                    return Err(invalid_op("RTLightmap does not support auxiliary images"));
                }
            }
        }

        if self.params.max_memory_mb >= 0 {
            let images = bound.iter().filter(|(_, d)| d.is_some()).count();
            // Bound images plus the filtered copy and the range guide.
            let needed = output.desc.width * output.desc.height * Format::Float3.byte_size() * (images + 2);
            let limit = self.params.max_memory_mb as usize * BYTES_PER_MB;
            if needed > limit {
                return Err(DeviceError::new(
                    ErrorCode::OutOfMemory,
                    format!(
                        "filter needs {} MB but maxMemoryMB is {}",
                        needed.div_ceil(BYTES_PER_MB),
                        self.params.max_memory_mb
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Runs the committed filter synchronously.
    #[instrument(skip(self), fields(filter = self.kind.name()))]
    pub fn execute(&mut self) -> Result<()> {
        if !self.committed {
            return Err(self.device.raise(
                ErrorCode::InvalidOperation,
                "filter must be committed before execution",
            ));
        }
        let device = self.device;
        let (Some(color), Some(output)) = (self.color, self.output.as_mut()) else {
            return Err(device.raise(ErrorCode::InvalidOperation, "filter images were unset"));
        };

        let mut job = FilterJob {
            kind: self.kind,
            color,
            albedo: self.albedo,
            normal: self.normal,
            output: ImageViewMut {
                data: &mut *output.data,
                desc: output.desc,
            },
            params: &self.params,
        };
        device.run_filter(&mut job)
    }
}

impl Drop for Filter<'_, '_> {
    fn drop(&mut self) {
        trace!(filter = self.kind.name(), "Releasing filter");
    }
}
