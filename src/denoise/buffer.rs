use crate::denoise::device::Device;
use crate::denoise::error::{DeviceError, Result};
use crate::denoise::types::ErrorCode;

/// Float storage owned by a device.
///
/// Buffers can only be bound to filters of the device that created them.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<f32>,
    device_id: u64,
}

impl Device {
    /// Allocates a zeroed buffer of `len` floats.
    pub fn new_buffer(&self, len: usize) -> Result<Buffer> {
        self.ensure_committed()?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            self.raise(
                ErrorCode::OutOfMemory,
                format!("cannot allocate buffer of {len} floats: {e}"),
            )
        })?;
        data.resize(len, 0.0);
        Ok(Buffer {
            data,
            device_id: self.id(),
        })
    }

    /// Allocates a buffer holding a copy of `contents`.
    pub fn create_buffer(&self, contents: &[f32]) -> Result<Buffer> {
        let mut buffer = self.new_buffer(contents.len())?;
        buffer.data.copy_from_slice(contents);
        Ok(buffer)
    }
}

impl Buffer {
    /// Overwrites the buffer; the lengths must match.
    pub fn write(&mut self, contents: &[f32]) -> Result<()> {
        self.check_len(contents.len())?;
        self.data.copy_from_slice(contents);
        Ok(())
    }

    pub fn read_to_slice(&self, contents: &mut [f32]) -> Result<()> {
        self.check_len(contents.len())?;
        contents.copy_from_slice(&self.data);
        Ok(())
    }

    pub fn read(&self) -> Vec<f32> {
        self.data.clone()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub(crate) fn device_id(&self) -> u64 {
        self.device_id
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.data.len() {
            return Err(DeviceError::new(
                ErrorCode::InvalidArgument,
                format!("buffer holds {} floats, got {}", self.data.len(), len),
            ));
        }
        Ok(())
    }
}
