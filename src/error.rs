//! Error types for initialisation and resource allocation.

use thiserror::Error;

/// Fatal startup failure. The renderer cannot be used.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("could not create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("could not create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("could not create graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("window surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("could not allocate the {width}x{height} presentation target: {source}")]
    PresentationTarget {
        width: u32,
        height: u32,
        source: DeviceError,
    },
}

/// Resource allocation failure. Callers treat the operation as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("texture size {width}x{height} is empty")]
    EmptyTexture { width: u32, height: u32 },
    #[error("texture size {width}x{height} exceeds the device limit of {limit}")]
    TextureTooLarge { width: u32, height: u32, limit: u32 },
    #[error("initial pixel data holds {actual} bytes, expected {expected}")]
    PixelDataSize { expected: usize, actual: usize },
    #[error("device refused the allocation")]
    OutOfMemory,
}
