//! Denoising backends: the built-in CPU filter and, when linked, the native
//! OpenImageDenoise library.

pub(crate) mod cpu_bilateral;
#[cfg(oidn_native)]
pub(crate) mod native_oidn;

use crate::denoise::filter::{FilterKind, FilterParams};
use crate::denoise::types::ImageDesc;

/// A read-only image shared with a filter.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageView<'a> {
    pub data: &'a [f32],
    pub desc: ImageDesc,
}

/// The writable image a filter produces.
#[derive(Debug)]
pub(crate) struct ImageViewMut<'a> {
    pub data: &'a mut [f32],
    pub desc: ImageDesc,
}

/// Everything a backend needs to run one committed filter.
pub(crate) struct FilterJob<'j> {
    pub kind: FilterKind,
    pub color: ImageView<'j>,
    pub albedo: Option<ImageView<'j>>,
    pub normal: Option<ImageView<'j>>,
    pub output: ImageViewMut<'j>,
    pub params: &'j FilterParams,
}

pub(crate) use cpu_bilateral::CpuBackend;

#[cfg(oidn_native)]
pub(crate) use native_oidn::NativeDevice;

// Without the native library no native device can ever be opened.
#[cfg(not(oidn_native))]
pub(crate) enum NativeDevice {}

#[cfg(not(oidn_native))]
impl NativeDevice {
    pub fn open(_device_type: crate::denoise::types::DeviceType) -> Option<Self> {
        None
    }

    pub fn set_int(&self, _name: &std::ffi::CStr, _value: i32) {
        match *self {}
    }

    pub fn commit(&self) -> crate::denoise::error::Result<()> {
        match *self {}
    }

    pub fn run_filter(&self, _job: &mut FilterJob<'_>) -> crate::denoise::error::Result<()> {
        match *self {}
    }
}
