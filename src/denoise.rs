//! Denoising device API
//!
//! Mirrors the shape of the Open Image Denoise API: open a [`Device`],
//! commit it, create a named [`Filter`], bind shared images described by an
//! [`ImageDesc`], set parameters, commit, execute and poll the device error.
//! When the native library is not linked a built-in CPU filter is used.

mod backend;
pub mod buffer;
pub mod device;
pub mod error;
pub mod filter;
pub mod ray_tracing;
pub mod types;


pub use buffer::Buffer;
pub use device::Device;
pub use error::{DeviceError, Result};
pub use filter::{Filter, FilterKind};
pub use ray_tracing::RayTracing;
pub use types::{DeviceType, ErrorCode, Format, ImageDesc, Quality};
