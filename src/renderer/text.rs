//! Glyph loading and batched glyph drawing.

use std::collections::HashMap;

use crate::geometry::Edges;
use crate::glyph::{AtlasHooks, AtlasSprite, Glyph, GlyphHandle, SpriteRequest};
use crate::gpu::{
    BatchKey, BindState, Program, RenderDevice, RenderMode, RenderTarget, TextureDesc,
    TextureFormat, TextureId, ndc_rect, quad,
};

use super::{Batch, Renderer, SurfaceEntry, SurfaceHandle};

/// The renderer's side of the atlas batcher. Borrows only the fields the
/// batcher needs so the batcher itself can stay mutably borrowed.
pub(super) struct Hooks<'a, D> {
    pub(super) batch: &'a mut Batch<D>,
    pub(super) glyphs: &'a HashMap<GlyphHandle, Glyph>,
    pub(super) surfaces: &'a HashMap<SurfaceHandle, SurfaceEntry>,
    pub(super) target: Option<SurfaceHandle>,
    pub(super) colour: [u8; 3],
}

impl<D: RenderDevice> AtlasHooks for Hooks<'_, D> {
    fn fetch_pixels(&mut self, glyph: GlyphHandle, buffer: &mut [u8]) -> bool {
        match self.glyphs.get(&glyph) {
            Some(g) if g.pixels().len() == buffer.len() => {
                buffer.copy_from_slice(g.pixels());
                true
            }
            _ => false,
        }
    }

    fn create_atlas(&mut self, pixels: &[u8], width: u32, height: u32) -> Option<TextureId> {
        let id = self.batch.alloc_texture_id();
        let desc = TextureDesc {
            width,
            height,
            format: TextureFormat::R8,
            renderable: false,
        };
        match self.batch.device.create_texture(id, &desc, Some(pixels)) {
            Ok(()) => Some(id),
            Err(e) => {
                log::warn!("glyph atlas allocation failed: {e}");
                None
            }
        }
    }

    fn destroy_atlas(&mut self, texture: TextureId) {
        self.batch.destroy_texture(texture);
    }

    fn on_batch_ready(
        &mut self,
        sprites: &[AtlasSprite],
        atlas: TextureId,
        atlas_width: u32,
        atlas_height: u32,
    ) {
        let Some(target) = self.target else {
            return;
        };
        let Some(dst) = self.surfaces.get(&target) else {
            return;
        };
        let (dst_w, dst_h) = (dst.width, dst.height);
        let [r, g, b] = self.colour;

        let key = BatchKey {
            mode: RenderMode::Glyph,
            source: Some(atlas),
            target: RenderTarget::Texture(target.0),
            tint: [r, g, b, 255],
        };
        self.batch.switch(key, || BindState {
            target: RenderTarget::Texture(target.0),
            viewport: (dst_w, dst_h),
            program: Program::Glyph,
            blend: true,
            source: Some(atlas),
            tint: [
                f32::from(r) / 255.0,
                f32::from(g) / 255.0,
                f32::from(b) / 255.0,
                1.0,
            ],
            linear_filter: false,
        });

        let (aw, ah) = (atlas_width as f32, atlas_height as f32);
        let glyphs = self.glyphs;
        let resolved: Vec<_> = sprites
            .iter()
            .filter_map(|s| glyphs.get(&s.glyph).map(|g| (s, g)))
            .collect();
        let slots = self.batch.stream.request_slots(resolved.len());
        for (slot, (sprite, glyph)) in slots.iter_mut().zip(resolved) {
            let (w, h) = (glyph.width() as f32, glyph.height() as f32);
            // Slots are pitch wide; sample only the true width.
            let uv = Edges::new(
                sprite.atlas_x as f32 / aw,
                sprite.atlas_y as f32 / ah,
                (sprite.atlas_x as f32 + w) / aw,
                (sprite.atlas_y as f32 + h) / ah,
            );
            let pos = ndc_rect(sprite.x as f32, sprite.y as f32, w, h, dst_w, dst_h);
            *slot = quad(pos, uv);
        }
    }
}

impl<D: RenderDevice> Renderer<D> {
    /// Copy a coverage bitmap (`pitch` bytes per source row) into a new
    /// glyph.
    pub fn load_glyph(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        pitch: usize,
    ) -> Option<GlyphHandle> {
        let glyph = Glyph::load(pixels, width, height, pitch)?;
        self.next_glyph += 1;
        let handle = GlyphHandle(self.next_glyph);
        self.glyphs.insert(handle, glyph);
        Some(handle)
    }

    /// Free a glyph, its atlas slot and any of its draws still queued.
    pub fn unload_glyph(&mut self, glyph: GlyphHandle) {
        if self.glyphs.remove(&glyph).is_some() {
            self.batcher.evict(glyph);
        }
    }

    /// Set the surface and RGB colour for subsequent glyph draws.
    pub fn prepare_to_draw_glyphs(&mut self, target: SurfaceHandle, colour: [u8; 3]) {
        self.glyph_target = Some(target);
        self.glyph_colour = colour;
    }

    /// Queue a glyph at `(x, y)`. Drawn at the next `flush_glyphs`.
    pub fn draw_glyph(&mut self, glyph: GlyphHandle, x: i32, y: i32) {
        let Some(g) = self.glyphs.get(&glyph) else {
            return;
        };
        if g.width() == 0 || g.height() == 0 {
            return;
        }
        self.batcher.push(SpriteRequest {
            glyph,
            width: g.pitch(),
            height: g.height(),
            x,
            y,
        });
    }

    /// Resolve queued glyphs into atlas batches and draw them.
    pub fn flush_glyphs(&mut self) {
        let mut hooks = Hooks {
            batch: &mut self.batch,
            glyphs: &self.glyphs,
            surfaces: &self.surfaces,
            target: self.glyph_target,
            colour: self.glyph_colour,
        };
        self.batcher.defrag(&mut hooks);
        self.batcher.flush(&mut hooks);
    }
}
