//! Backend-agnostic device interface.
//!
//! Keeps the batching logic in [`crate::renderer`] independent of wgpu. The
//! renderer decides *when* state changes and draws happen; a device only
//! carries them out. [`super::WgpuDevice`] drives real hardware and
//! [`super::HeadlessDevice`] records commands for tests.

use crate::error::DeviceError;

/// Identity of a device texture. Allocated by the renderer, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Texel layout of a device texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA, premultiplied alpha. Drawable surfaces.
    Rgba8,
    /// Single 8-bit channel. Glyph atlases.
    R8,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8 => 4,
            Self::R8 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Whether the texture can be bound as a render target.
    pub renderable: bool,
}

/// Where a batch is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Texture(TextureId),
    /// The window's presentable surface.
    Window,
}

/// Which of the fixed programs a batch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Flat colour from the tint uniform. Position attribute only.
    ColourFill,
    /// Textured copy of the bound source.
    Texture,
    /// Tint multiplied by the red channel of the bound atlas.
    Glyph,
}

/// Full pipeline state for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindState {
    pub target: RenderTarget,
    /// Viewport size in pixels; always the full target.
    pub viewport: (u32, u32),
    pub program: Program,
    /// Premultiplied-alpha blending (`One, OneMinusSrcAlpha`) when set.
    pub blend: bool,
    pub source: Option<TextureId>,
    /// Normalized RGBA for programs that read the tint uniform.
    pub tint: [f32; 4],
    /// Sample the source with linear filtering instead of nearest.
    pub linear_filter: bool,
}

/// The operations the renderer needs from a graphics API.
pub trait RenderDevice {
    /// Allocate a texture under `id`, optionally filled with `pixels`
    /// (tightly packed rows).
    fn create_texture(
        &mut self,
        id: TextureId,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Result<(), DeviceError>;

    fn destroy_texture(&mut self, id: TextureId);

    /// Overwrite the top-left `width × height` region of a texture.
    /// `bytes_per_row` may exceed the region's row size.
    fn write_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        bytes_per_row: u32,
        pixels: &[u8],
    );

    /// Make `state` current for subsequent draws.
    fn bind(&mut self, state: &BindState);

    /// Upload vertex bytes into ring slot `slot`, first reallocating the
    /// slot's buffer to `reallocate` bytes when requested.
    fn upload_vertices(&mut self, slot: usize, reallocate: Option<u64>, bytes: &[u8]);

    /// Draw `vertex_count` vertices from ring slot `slot` with the bound state.
    fn draw(&mut self, slot: usize, vertex_count: u32);

    /// Size of the window's drawable area in physical pixels.
    fn window_size(&self) -> (u32, u32);

    /// Show the window surface and start the next frame cleared to black.
    fn present(&mut self);
}
