//! OpenImageDenoise backend, compiled when build.rs finds the library.

use std::ffi::{CStr, c_char, c_void};
use std::ptr;

use tracing::debug;

use crate::denoise::backend::{FilterJob, ImageView, ImageViewMut};
use crate::denoise::error::{DeviceError, Result};
use crate::denoise::filter::FilterKind;
use crate::denoise::types::{DeviceType, ErrorCode, Format};

#[allow(non_upper_case_globals)]
#[allow(non_camel_case_types)]
#[allow(non_snake_case)]
#[allow(dead_code)]
mod sys {
    include!(concat!(env!("OUT_DIR"), "/oidn_bindings.rs"));
}

pub(crate) struct NativeDevice {
    handle: sys::OIDNDevice,
}

// All calls on a native device are thread-safe.
unsafe impl Send for NativeDevice {}

impl NativeDevice {
    pub fn open(device_type: DeviceType) -> Option<Self> {
        let raw_type = match device_type {
            DeviceType::Default => sys::OIDNDeviceType_OIDN_DEVICE_TYPE_DEFAULT,
            DeviceType::Cpu => sys::OIDNDeviceType_OIDN_DEVICE_TYPE_CPU,
            DeviceType::Sycl => sys::OIDNDeviceType_OIDN_DEVICE_TYPE_SYCL,
            DeviceType::Cuda => sys::OIDNDeviceType_OIDN_DEVICE_TYPE_CUDA,
            DeviceType::Hip => sys::OIDNDeviceType_OIDN_DEVICE_TYPE_HIP,
            DeviceType::Metal => sys::OIDNDeviceType_OIDN_DEVICE_TYPE_METAL,
        };
        let handle = unsafe { sys::oidnNewDevice(raw_type) };
        if handle.is_null() {
            debug!(?device_type, "OpenImageDenoise could not create device");
            None
        } else {
            Some(Self { handle })
        }
    }

    pub fn set_int(&self, name: &CStr, value: i32) {
        unsafe { sys::oidnSetDeviceInt(self.handle, name.as_ptr(), value) }
    }

    pub fn commit(&self) -> Result<()> {
        unsafe { sys::oidnCommitDevice(self.handle) };
        self.take_error()
    }

    /// Returns the first error raised since the last query and clears it.
    fn take_error(&self) -> Result<()> {
        let mut message: *const c_char = ptr::null();
        let code = unsafe { sys::oidnGetDeviceError(self.handle, &mut message) };
        if code == sys::OIDNError_OIDN_ERROR_NONE {
            return Ok(());
        }
        let message = if message.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(message) }
                .to_string_lossy()
                .into_owned()
        };
        Err(DeviceError::new(ErrorCode::from(code as u32), message))
    }

    pub fn run_filter(&self, job: &mut FilterJob<'_>) -> Result<()> {
        let filter = NativeFilter::new(self, job.kind)?;
        let params = job.params;

        filter.set_input(c"color", &job.color);
        if let Some(albedo) = &job.albedo {
            filter.set_input(c"albedo", albedo);
        }
        if let Some(normal) = &job.normal {
            filter.set_input(c"normal", normal);
        }
        filter.set_output(c"output", &mut job.output);

        unsafe {
            match job.kind {
                FilterKind::Rt => {
                    sys::oidnSetFilterBool(filter.handle, c"hdr".as_ptr(), params.hdr);
                    sys::oidnSetFilterBool(filter.handle, c"srgb".as_ptr(), params.srgb);
                    sys::oidnSetFilterBool(filter.handle, c"cleanAux".as_ptr(), params.clean_aux);
                }
                FilterKind::RtLightmap => {
                    sys::oidnSetFilterBool(
                        filter.handle,
                        c"directional".as_ptr(),
                        params.directional,
                    );
                }
            }
            sys::oidnSetFilterFloat(filter.handle, c"inputScale".as_ptr(), params.input_scale);
            sys::oidnSetFilterInt(filter.handle, c"quality".as_ptr(), params.quality.as_raw());
            if params.max_memory_mb >= 0 {
                sys::oidnSetFilterInt(
                    filter.handle,
                    c"maxMemoryMB".as_ptr(),
                    params.max_memory_mb,
                );
            }

            sys::oidnCommitFilter(filter.handle);
            sys::oidnExecuteFilter(filter.handle);
        }

        self.take_error()
    }
}

impl Drop for NativeDevice {
    fn drop(&mut self) {
        unsafe { sys::oidnReleaseDevice(self.handle) }
    }
}

struct NativeFilter {
    handle: sys::OIDNFilter,
}

impl NativeFilter {
    fn new(device: &NativeDevice, kind: FilterKind) -> Result<Self> {
        let handle = unsafe { sys::oidnNewFilter(device.handle, kind.c_name().as_ptr()) };
        if handle.is_null() {
            device.take_error()?;
            return Err(DeviceError::new(
                ErrorCode::Unknown,
                format!("could not create {} filter", kind.name()),
            ));
        }
        Ok(Self { handle })
    }

    fn set_input(&self, name: &CStr, image: &ImageView<'_>) {
        // The library only reads from input images.
        self.set_shared(name, image.data.as_ptr() as *mut c_void, image.desc);
    }

    fn set_output(&self, name: &CStr, image: &mut ImageViewMut<'_>) {
        self.set_shared(name, image.data.as_mut_ptr() as *mut c_void, image.desc);
    }

    fn set_shared(&self, name: &CStr, data: *mut c_void, desc: crate::denoise::types::ImageDesc) {
        unsafe {
            sys::oidnSetSharedFilterImage(
                self.handle,
                name.as_ptr(),
                data,
                raw_format(desc.format),
                desc.width,
                desc.height,
                desc.byte_offset,
                desc.byte_pixel_stride,
                desc.byte_row_stride,
            );
        }
    }
}

impl Drop for NativeFilter {
    fn drop(&mut self) {
        unsafe { sys::oidnReleaseFilter(self.handle) }
    }
}

fn raw_format(format: Format) -> sys::OIDNFormat {
    match format {
        Format::Undefined => sys::OIDNFormat_OIDN_FORMAT_UNDEFINED,
        Format::Float => sys::OIDNFormat_OIDN_FORMAT_FLOAT,
        Format::Float2 => sys::OIDNFormat_OIDN_FORMAT_FLOAT2,
        Format::Float3 => sys::OIDNFormat_OIDN_FORMAT_FLOAT3,
        Format::Float4 => sys::OIDNFormat_OIDN_FORMAT_FLOAT4,
    }
}
