//! GPU layer: vertex streaming, batch state, the device interface and its
//! wgpu and headless implementations.

pub mod device;
pub mod headless;
pub mod pipeline;
pub mod state;
pub mod stream;
pub mod vertex;
mod wgpu_device;

pub use device::{
    BindState, Program, RenderDevice, RenderTarget, TextureDesc, TextureFormat, TextureId,
};
pub use headless::{Command, HeadlessDevice};
pub use state::{BatchKey, RenderMode, StateTracker};
pub use stream::{RingUpload, VertexRing, VertexStream};
pub use vertex::{QUAD_BYTES, QUAD_VERTICES, Quad, Vertex, ndc_rect, quad, solid_quad};
pub use wgpu_device::WgpuDevice;
