//! Immediate-mode 2D renderer.
//!
//! [`Renderer`] owns every GPU resource and turns blit, fill and glyph calls
//! into as few device draws as possible. Quads accumulate in a host vertex
//! stream while the batch state (mode, source, target, tint) stays the same;
//! any change flushes the stream in one draw first, so output order always
//! matches call order.

mod draw;
mod present;
mod surface;
mod text;

use std::collections::HashMap;

use crate::config::GraphicsConfig;
use crate::error::InitError;
use crate::glyph::{Glyph, GlyphBatcher, GlyphHandle};
use crate::gpu::{
    BatchKey, BindState, Quad, QUAD_VERTICES, RenderDevice, StateTracker, TextureId, VertexRing,
    VertexStream,
};

pub use present::letterbox;
pub use surface::{SurfaceHandle, premultiply};

/// Draw counters for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub quads: u32,
}

/// Batching state shared by every draw path: the device, the host vertex
/// stream, the buffer ring and the open batch.
struct Batch<D> {
    device: D,
    stream: VertexStream,
    ring: VertexRing,
    tracker: StateTracker,
    stats: FrameStats,
    next_texture: u32,
}

impl<D: RenderDevice> Batch<D> {
    fn new(device: D, slots: usize) -> Self {
        Self {
            device,
            stream: VertexStream::new(),
            ring: VertexRing::new(slots),
            tracker: StateTracker::default(),
            stats: FrameStats::default(),
            next_texture: 0,
        }
    }

    /// Upload queued quads into the next ring slot and draw them in one call.
    fn flush(&mut self) {
        if self.stream.is_empty() {
            return;
        }
        let upload = self.ring.select(self.stream.capacity());
        let quads = self.stream.pending();
        self.device.upload_vertices(
            upload.slot,
            upload.reallocate,
            bytemuck::cast_slice(quads),
        );
        self.device
            .draw(upload.slot, quads.len() as u32 * QUAD_VERTICES);
        self.stats.draw_calls += 1;
        self.stats.quads += quads.len() as u32;
        self.stream.clear();
    }

    /// Make `key` the open batch, flushing and rebinding if it differs.
    fn switch(&mut self, key: BatchKey, bind: impl FnOnce() -> BindState) {
        if self.tracker.needs_switch(&key) {
            self.flush();
            self.device.bind(&bind());
            self.tracker.set(key);
        }
    }

    fn push(&mut self, quad: Quad) {
        self.stream.push(quad);
    }

    fn alloc_texture_id(&mut self) -> TextureId {
        self.next_texture += 1;
        TextureId(self.next_texture)
    }

    /// Release a texture, flushing first if the open batch uses it.
    fn destroy_texture(&mut self, texture: TextureId) {
        if self.tracker.references(texture) {
            self.flush();
            self.tracker.reset();
        }
        self.device.destroy_texture(texture);
    }

    /// Flush if the open batch reads or writes `texture`.
    fn flush_if_active(&mut self, texture: TextureId) {
        if self.tracker.references(texture) {
            self.flush();
        }
    }
}

struct SurfaceEntry {
    width: u32,
    height: u32,
    lock: Option<LockBuffer>,
}

/// Host pixels handed out by `lock_surface`.
struct LockBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

/// The rendering context. All state lives here; there are no globals.
pub struct Renderer<D: RenderDevice> {
    batch: Batch<D>,
    surfaces: HashMap<SurfaceHandle, SurfaceEntry>,
    framebuffer: SurfaceHandle,
    glyphs: HashMap<GlyphHandle, Glyph>,
    next_glyph: u64,
    batcher: GlyphBatcher,
    glyph_target: Option<SurfaceHandle>,
    glyph_colour: [u8; 3],
    last_stats: FrameStats,
}

impl<D: RenderDevice> Renderer<D> {
    /// Build a renderer on `device` with a `width × height` presentation
    /// target.
    pub fn new(
        device: D,
        graphics: &GraphicsConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, InitError> {
        let mut renderer = Self {
            batch: Batch::new(device, graphics.effective_vertex_buffer_slots()),
            surfaces: HashMap::new(),
            framebuffer: SurfaceHandle(TextureId(0)),
            glyphs: HashMap::new(),
            next_glyph: 0,
            batcher: GlyphBatcher::new(graphics.batcher_config()),
            glyph_target: None,
            glyph_colour: [0; 3],
            last_stats: FrameStats::default(),
        };

        renderer.framebuffer = renderer
            .allocate_surface(width, height)
            .map_err(|source| InitError::PresentationTarget {
                width,
                height,
                source,
            })?;
        log::info!(
            "renderer ready: {width}x{height} target, {} vertex buffer slots",
            renderer.batch.ring.slots()
        );
        Ok(renderer)
    }

    /// Release every resource and hand back the device.
    pub fn deinit(mut self) -> D {
        self.batch.flush();
        let Self {
            mut batch,
            surfaces,
            glyphs,
            mut batcher,
            ..
        } = self;

        let mut hooks = text::Hooks {
            batch: &mut batch,
            glyphs: &glyphs,
            surfaces: &surfaces,
            target: None,
            colour: [0; 3],
        };
        batcher.clear(&mut hooks);

        for handle in surfaces.keys() {
            batch.device.destroy_texture(handle.0);
        }
        log::info!("renderer shut down");
        batch.device
    }

    /// The presentation target all gameplay draws into.
    pub fn framebuffer(&self) -> SurfaceHandle {
        self.framebuffer
    }

    /// Counters from the last completed frame.
    pub fn stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn device(&self) -> &D {
        &self.batch.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.batch.device
    }

    /// Window resizes are picked up when the next frame is acquired.
    pub fn handle_window_resize(&mut self) {}

    /// Surface contents live in device textures that survive target loss.
    pub fn handle_render_target_loss(&mut self) {}
}
