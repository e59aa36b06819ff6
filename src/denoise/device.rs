use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::denoise::backend::{CpuBackend, FilterJob, NativeDevice};
use crate::denoise::error::{DeviceError, Result};
use crate::denoise::types::{DeviceType, ErrorCode};

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

enum Backend {
    Builtin(CpuBackend),
    Native(NativeDevice),
}

/// A denoising device.
///
/// Devices isolate independent users of the denoiser from each other. A
/// device must be committed before filters or buffers can be created on it.
/// Errors raised by any object created from the device are also stored on
/// the device; [`Device::get_error`] returns the first one and clears it.
pub struct Device {
    id: u64,
    device_type: DeviceType,
    backend: Backend,
    num_threads: Option<usize>,
    verbose: i32,
    committed: bool,
    error: Mutex<Option<DeviceError>>,
}

impl Device {
    /// Opens a device of the given type.
    ///
    /// The native library is used when it was linked at build time. Without
    /// it, `Default` and `Cpu` fall back to the built-in CPU denoiser and GPU
    /// types fail with [`ErrorCode::UnsupportedHardware`].
    pub fn new(device_type: DeviceType) -> Result<Self> {
        if let Some(native) = NativeDevice::open(device_type) {
            info!(?device_type, "Opened OpenImageDenoise device");
            return Ok(Self::with_backend(device_type, Backend::Native(native)));
        }
        if device_type.is_gpu() {
            return Err(DeviceError::new(
                ErrorCode::UnsupportedHardware,
                format!("no {device_type:?} device is available"),
            ));
        }
        debug!(?device_type, "Using built-in CPU denoiser");
        Ok(Self::with_backend(device_type, Backend::Builtin(CpuBackend::new())))
    }

    /// Like [`Device::new`] but returns `None` when the device is unavailable.
    pub fn try_new(device_type: DeviceType) -> Option<Self> {
        Self::new(device_type).ok()
    }

    pub fn default_device() -> Result<Self> {
        Self::new(DeviceType::Default)
    }

    pub fn cpu() -> Result<Self> {
        Self::new(DeviceType::Cpu)
    }

    /// The built-in CPU denoiser, regardless of what was linked.
    pub fn builtin_cpu() -> Self {
        Self::with_backend(DeviceType::Cpu, Backend::Builtin(CpuBackend::new()))
    }

    fn with_backend(device_type: DeviceType, backend: Backend) -> Self {
        Self {
            id: NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed),
            device_type,
            backend,
            num_threads: None,
            verbose: 0,
            committed: false,
            error: Mutex::new(None),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn is_native(&self) -> bool {
        matches!(self.backend, Backend::Native(_))
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Worker thread count, zero for automatic. Must be set before commit.
    pub fn set_num_threads(&mut self, threads: usize) -> Result<()> {
        self.ensure_uncommitted("numThreads")?;
        self.num_threads = (threads > 0).then_some(threads);
        Ok(())
    }

    pub fn set_verbose(&mut self, level: i32) -> Result<()> {
        self.ensure_uncommitted("verbose")?;
        self.verbose = level;
        Ok(())
    }

    fn ensure_uncommitted(&self, param: &str) -> Result<()> {
        if self.committed {
            return Err(self.raise(
                ErrorCode::InvalidOperation,
                format!("device parameter '{param}' cannot be changed after commit"),
            ));
        }
        Ok(())
    }

    /// Applies the device parameters and makes the device usable.
    pub fn commit(&mut self) -> Result<()> {
        let result = match &mut self.backend {
            Backend::Builtin(cpu) => cpu.configure(self.num_threads),
            Backend::Native(native) => {
                native.set_int(c"numThreads", self.num_threads.unwrap_or(0) as i32);
                native.set_int(c"verbose", self.verbose);
                native.commit()
            }
        };
        match result {
            Ok(()) => {
                self.committed = true;
                debug!(device_type = ?self.device_type, native = self.is_native(), "Device committed");
                Ok(())
            }
            Err(err) => Err(self.record(err)),
        }
    }

    /// Returns the first error raised since the last call and clears it.
    pub fn get_error(&self) -> Result<()> {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Stores `err` unless an earlier error is still pending, and returns it.
    pub(crate) fn record(&self, err: DeviceError) -> DeviceError {
        warn!(code = ?err.code, message = %err.message, "Denoising device error");
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err.clone());
        }
        err
    }

    pub(crate) fn raise(&self, code: ErrorCode, message: impl Into<String>) -> DeviceError {
        self.record(DeviceError::new(code, message))
    }

    pub(crate) fn ensure_committed(&self) -> Result<()> {
        if !self.committed {
            return Err(self.raise(ErrorCode::InvalidOperation, "device is not committed"));
        }
        Ok(())
    }

    pub(crate) fn run_filter(&self, job: &mut FilterJob<'_>) -> Result<()> {
        let result = match &self.backend {
            Backend::Builtin(cpu) => cpu.run_filter(job),
            Backend::Native(native) => native.run_filter(job),
        };
        result.map_err(|err| self.record(err))
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        debug!(device_type = ?self.device_type, "Releasing denoising device");
    }
}
