//! Device, image and parameter types shared by every denoising backend.

use std::fmt;

use crate::denoise::error::DeviceError;

/// Kind of device requested when opening a denoiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceType {
    /// Fastest device available
    #[default]
    Default,
    Cpu,
    Sycl,
    Cuda,
    Hip,
    Metal,
}

impl DeviceType {
    pub fn is_gpu(self) -> bool {
        !matches!(self, DeviceType::Default | DeviceType::Cpu)
    }
}

/// Pixel format of a bound image. Values match the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Undefined,
    Float,
    Float2,
    Float3,
    Float4,
}

impl Format {
    pub fn channels(self) -> usize {
        match self {
            Format::Undefined => 0,
            Format::Float => 1,
            Format::Float2 => 2,
            Format::Float3 => 3,
            Format::Float4 => 4,
        }
    }

    pub fn byte_size(self) -> usize {
        self.channels() * std::mem::size_of::<f32>()
    }
}

/// Filter quality. Higher quality trades speed for a wider filter footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Default,
    Fast,
    Balanced,
    High,
}

impl Quality {
    pub fn as_raw(self) -> i32 {
        match self {
            Quality::Default => 0,
            Quality::Fast => 4,
            Quality::Balanced => 5,
            Quality::High => 6,
        }
    }
}

impl TryFrom<i32> for Quality {
    type Error = DeviceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Quality::Default),
            4 => Ok(Quality::Fast),
            5 => Ok(Quality::Balanced),
            6 => Ok(Quality::High),
            other => Err(DeviceError::new(
                ErrorCode::InvalidArgument,
                format!("invalid filter quality {other}"),
            )),
        }
    }
}

/// Error codes reported by a device. Values match the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    None = 0,
    Unknown = 1,
    InvalidArgument = 2,
    InvalidOperation = 3,
    OutOfMemory = 4,
    UnsupportedHardware = 5,
    Cancelled = 6,
}

impl From<u32> for ErrorCode {
    fn from(value: u32) -> Self {
        match value {
            0 => ErrorCode::None,
            2 => ErrorCode::InvalidArgument,
            3 => ErrorCode::InvalidOperation,
            4 => ErrorCode::OutOfMemory,
            5 => ErrorCode::UnsupportedHardware,
            6 => ErrorCode::Cancelled,
            _ => ErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::None => "no error",
            ErrorCode::Unknown => "unknown error",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::InvalidOperation => "invalid operation",
            ErrorCode::OutOfMemory => "out of memory",
            ErrorCode::UnsupportedHardware => "unsupported hardware",
            ErrorCode::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Memory layout of an image bound to a filter.
///
/// Offsets and strides are in bytes, like the native API. A stride of zero
/// means the image is tightly packed along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub format: Format,
    pub width: usize,
    pub height: usize,
    pub byte_offset: usize,
    pub byte_pixel_stride: usize,
    pub byte_row_stride: usize,
}

const FLOAT_BYTES: usize = std::mem::size_of::<f32>();

impl ImageDesc {
    /// Tightly packed image starting at the beginning of its slice.
    pub fn packed(format: Format, width: usize, height: usize) -> Self {
        Self {
            format,
            width,
            height,
            byte_offset: 0,
            byte_pixel_stride: 0,
            byte_row_stride: 0,
        }
    }

    pub fn with_layout(mut self, byte_offset: usize, pixel_stride: usize, row_stride: usize) -> Self {
        self.byte_offset = byte_offset;
        self.byte_pixel_stride = pixel_stride;
        self.byte_row_stride = row_stride;
        self
    }

    pub fn pixel_stride(&self) -> usize {
        if self.byte_pixel_stride == 0 {
            self.format.byte_size()
        } else {
            self.byte_pixel_stride
        }
    }

    pub fn row_stride(&self) -> usize {
        if self.byte_row_stride == 0 {
            self.width * self.pixel_stride()
        } else {
            self.byte_row_stride
        }
    }

    pub fn same_dimensions(&self, other: &ImageDesc) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Number of floats a slice needs to back this image.
    pub fn required_len(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return self.byte_offset / FLOAT_BYTES;
        }
        let last_pixel = self.byte_offset
            + (self.height - 1) * self.row_stride()
            + (self.width - 1) * self.pixel_stride();
        (last_pixel + self.format.byte_size()).div_ceil(FLOAT_BYTES)
    }

    /// Index of the first channel of pixel `(x, y)` in the backing slice.
    pub fn index_of(&self, x: usize, y: usize) -> usize {
        (self.byte_offset + y * self.row_stride() + x * self.pixel_stride()) / FLOAT_BYTES
    }

    /// Byte offset one past the last pixel, or `None` when the layout
    /// does not fit in the address space.
    fn checked_end(&self) -> Option<usize> {
        let packed_row = self.width.checked_mul(self.pixel_stride())?;
        let row_stride = if self.byte_row_stride == 0 { packed_row } else { self.byte_row_stride };
        if self.width == 0 || self.height == 0 {
            return Some(self.byte_offset);
        }
        (self.height - 1)
            .checked_mul(row_stride)?
            .checked_add((self.width - 1).checked_mul(self.pixel_stride())?)?
            .checked_add(self.byte_offset)?
            .checked_add(self.format.byte_size())
    }

    /// Checks that the layout is float aligned and fits in `len` floats.
    pub fn validate(&self, len: usize) -> Result<(), DeviceError> {
        let invalid = |message: String| Err(DeviceError::new(ErrorCode::InvalidArgument, message));

        if self.format == Format::Undefined {
            return invalid("image format is undefined".to_string());
        }
        if self.checked_end().is_none() {
            return invalid(format!(
                "image layout of {}x{} overflows the address space",
                self.width, self.height
            ));
        }
        if self.byte_offset % FLOAT_BYTES != 0
            || self.pixel_stride() % FLOAT_BYTES != 0
            || self.row_stride() % FLOAT_BYTES != 0
        {
            return invalid("image offset and strides must be multiples of 4 bytes".to_string());
        }
        if self.pixel_stride() < self.format.byte_size() {
            return invalid(format!(
                "pixel stride {} is smaller than the pixel size {}",
                self.pixel_stride(),
                self.format.byte_size()
            ));
        }
        if self.height > 1 && self.row_stride() < self.width * self.pixel_stride() {
            return invalid(format!("row stride {} overlaps adjacent rows", self.row_stride()));
        }
        if self.required_len() > len {
            return invalid(format!(
                "image of {}x{} needs {} floats but the buffer holds {}",
                self.width,
                self.height,
                self.required_len(),
                len
            ));
        }
        Ok(())
    }
}
