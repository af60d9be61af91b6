//! Engine error type.
//!
//! Initialization-time failures (GPU acquisition, asset decoding, resource
//! exhaustion) are reported through [`EngineError`] and bubble up to
//! [`App::run`](crate::app::App::run), which logs them and exits. The frame
//! loop itself has no recoverable errors; programming errors (invalid
//! handles, bad node ids) panic instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The texture registry's fixed-size table is full.
    #[error("texture registry is full ({capacity} textures)")]
    RegistryFull { capacity: usize },

    /// Compressed image bytes could not be decoded.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// A font could not be parsed by the rasterizer.
    #[cfg(feature = "text")]
    #[error("font load failed: {0}")]
    Font(&'static str),

    /// No GPU adapter compatible with the window surface was found.
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// The adapter refused the device request (most likely a missing
    /// feature: this renderer needs texture binding arrays).
    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The window surface could not be created.
    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
}
