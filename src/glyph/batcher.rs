//! Glyph atlas batcher.
//!
//! Glyph draws are queued and only resolved at [`GlyphBatcher::flush`]: each
//! request is located in (or packed into) a single-channel atlas page, dirty
//! pages are re-created on the device, and consecutive requests sharing a
//! page are handed to [`AtlasHooks::on_batch_ready`] as one run. Submission
//! order is preserved across runs.
//!
//! The batcher owns no device resources directly. Everything that touches
//! glyph storage or the GPU goes through [`AtlasHooks`], which the renderer
//! implements.

use std::collections::HashMap;

use crate::gpu::TextureId;

use super::GlyphHandle;
use super::packer::RectPacker;

/// Callbacks into the owner of glyph bitmaps and device textures.
pub trait AtlasHooks {
    /// Fill `buffer` with the glyph's padded bitmap (`pitch × height` bytes).
    /// Returns `false` if the glyph no longer exists.
    fn fetch_pixels(&mut self, glyph: GlyphHandle, buffer: &mut [u8]) -> bool;

    /// Upload a full single-channel atlas page.
    fn create_atlas(&mut self, pixels: &[u8], width: u32, height: u32) -> Option<TextureId>;

    /// Release an atlas page. Must flush any pending draw that uses it.
    fn destroy_atlas(&mut self, texture: TextureId);

    /// Draw `sprites`, all resident in `atlas`, in order.
    fn on_batch_ready(
        &mut self,
        sprites: &[AtlasSprite],
        atlas: TextureId,
        atlas_width: u32,
        atlas_height: u32,
    );
}

/// A queued glyph draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRequest {
    pub glyph: GlyphHandle,
    /// Padded width (pitch) of the bitmap: the size of the atlas slot.
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

/// A resolved glyph draw: destination position plus where the bitmap lives
/// in its atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasSprite {
    pub glyph: GlyphHandle,
    pub x: i32,
    pub y: i32,
    pub atlas_x: u32,
    pub atlas_y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatcherConfig {
    /// Width and height of a shared atlas page.
    pub atlas_size: u32,
    /// Ticks a glyph may go undrawn before its slot is evicted. 0 disables
    /// decay.
    pub decay_ticks: u64,
    /// Occupancy below which a page becomes a repacking candidate.
    pub defrag_threshold: f32,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            atlas_size: 256,
            decay_ticks: 1800,
            defrag_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    last_used: u64,
}

struct Atlas {
    texture: Option<TextureId>,
    packer: RectPacker,
    pixels: Vec<u8>,
    slots: HashMap<GlyphHandle, Slot>,
    /// Host pixels changed since the texture was created.
    dirty: bool,
    /// Holds a single glyph too large for a shared page.
    dedicated: bool,
}

impl Atlas {
    fn new(width: u32, height: u32, dedicated: bool) -> Self {
        Self {
            texture: None,
            packer: RectPacker::new(width, height),
            pixels: vec![0; width as usize * height as usize],
            slots: HashMap::new(),
            dirty: true,
            dedicated,
        }
    }

    fn width(&self) -> u32 {
        self.packer.width()
    }

    fn height(&self) -> u32 {
        self.packer.height()
    }

    fn occupancy(&self) -> f32 {
        let used: u64 = self.slots.values().map(|s| u64::from(s.w * s.h)).sum();
        used as f32 / (u64::from(self.width()) * u64::from(self.height())) as f32
    }

    /// Copy a tightly packed `w × h` bitmap into the page at `(x, y)`.
    fn blit(&mut self, x: u32, y: u32, w: u32, h: u32, src: &[u8]) {
        let stride = self.width() as usize;
        for (row, line) in src.chunks_exact(w as usize).take(h as usize).enumerate() {
            let start = (y as usize + row) * stride + x as usize;
            self.pixels[start..start + w as usize].copy_from_slice(line);
        }
        self.dirty = true;
    }

    /// Copy a slot's bitmap back out of the page.
    fn extract(&self, slot: &Slot) -> Vec<u8> {
        let stride = self.width() as usize;
        let mut out = Vec::with_capacity(slot.w as usize * slot.h as usize);
        for row in 0..slot.h as usize {
            let start = (slot.y as usize + row) * stride + slot.x as usize;
            out.extend_from_slice(&self.pixels[start..start + slot.w as usize]);
        }
        out
    }
}

pub struct GlyphBatcher {
    config: BatcherConfig,
    queue: Vec<SpriteRequest>,
    atlases: Vec<Atlas>,
    tick: u64,
}

impl GlyphBatcher {
    pub fn new(config: BatcherConfig) -> Self {
        Self {
            config,
            queue: Vec::new(),
            atlases: Vec::new(),
            tick: 0,
        }
    }

    /// Queue a glyph draw. Nothing is resolved until [`Self::flush`].
    pub fn push(&mut self, request: SpriteRequest) {
        self.queue.push(request);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    /// Whether `glyph` currently occupies an atlas slot.
    pub fn is_resident(&self, glyph: GlyphHandle) -> bool {
        self.locate(glyph).is_some()
    }

    /// Advance the decay clock by one frame.
    pub fn tick(&mut self) {
        self.tick += 1;
    }

    /// Forget a glyph: drop its queued draws and free its slot. The page's
    /// pixels are reclaimed on the next repack.
    pub fn evict(&mut self, glyph: GlyphHandle) {
        self.queue.retain(|r| r.glyph != glyph);
        for atlas in &mut self.atlases {
            atlas.slots.remove(&glyph);
        }
    }

    /// Evict decayed slots, destroy empty pages, and repack sparse pages
    /// together when at least two fall below the occupancy threshold.
    pub fn defrag(&mut self, hooks: &mut impl AtlasHooks) {
        let (tick, decay) = (self.tick, self.config.decay_ticks);
        if decay > 0 {
            for atlas in &mut self.atlases {
                atlas
                    .slots
                    .retain(|_, s| tick.saturating_sub(s.last_used) < decay);
            }
        }

        self.atlases.retain_mut(|atlas| {
            if !atlas.slots.is_empty() {
                return true;
            }
            if let Some(texture) = atlas.texture.take() {
                log::debug!("glyph atlas {texture:?} empty, destroying");
                hooks.destroy_atlas(texture);
            }
            false
        });

        let threshold = self.config.defrag_threshold;
        let sparse_pages = self
            .atlases
            .iter()
            .filter(|a| !a.dedicated && a.occupancy() < threshold)
            .count();
        if sparse_pages < 2 {
            return;
        }
        if self.repack_page_count(threshold) >= sparse_pages {
            return;
        }

        let (keep, sparse): (Vec<Atlas>, Vec<Atlas>) = std::mem::take(&mut self.atlases)
            .into_iter()
            .partition(|a| a.dedicated || a.occupancy() >= threshold);
        self.atlases = keep;

        let mut live: Vec<(GlyphHandle, Slot, Vec<u8>)> = Vec::new();
        for mut atlas in sparse {
            if let Some(texture) = atlas.texture.take() {
                hooks.destroy_atlas(texture);
            }
            let mut slots: Vec<_> = atlas.slots.iter().map(|(g, s)| (*g, *s)).collect();
            slots.sort_unstable_by_key(|(g, _)| *g);
            live.extend(
                slots
                    .into_iter()
                    .map(|(glyph, slot)| (glyph, slot, atlas.extract(&slot))),
            );
        }
        // Tallest first packs tighter.
        live.sort_by(|a, b| b.1.h.cmp(&a.1.h).then(a.0.cmp(&b.0)));

        let before = self.atlases.len();
        let count = live.len();
        for (glyph, slot, pixels) in live {
            self.place(glyph, slot.w, slot.h, &pixels, slot.last_used);
        }
        log::debug!(
            "glyph atlas defrag: repacked {count} glyphs from {sparse_pages} pages into {}",
            self.atlases.len() - before
        );
    }

    /// Resolve every queued request and hand the draws to `hooks`.
    pub fn flush(&mut self, hooks: &mut impl AtlasHooks) {
        let queue = std::mem::take(&mut self.queue);

        let mut resolved: Vec<(usize, AtlasSprite)> = Vec::with_capacity(queue.len());
        for req in &queue {
            let idx = match self.locate(req.glyph) {
                Some(idx) => idx,
                None => match self.insert(req, hooks) {
                    Some(idx) => idx,
                    None => continue,
                },
            };
            let Some(slot) = self.atlases[idx].slots.get_mut(&req.glyph) else {
                continue;
            };
            slot.last_used = self.tick;
            resolved.push((
                idx,
                AtlasSprite {
                    glyph: req.glyph,
                    x: req.x,
                    y: req.y,
                    atlas_x: slot.x,
                    atlas_y: slot.y,
                },
            ));
        }

        for atlas in self.atlases.iter_mut().filter(|a| a.dirty) {
            if let Some(old) = atlas.texture.take() {
                hooks.destroy_atlas(old);
            }
            atlas.texture = hooks.create_atlas(&atlas.pixels, atlas.width(), atlas.height());
            match atlas.texture {
                Some(texture) => {
                    log::debug!(
                        "glyph atlas {texture:?} uploaded ({}x{}, {} glyphs)",
                        atlas.width(),
                        atlas.height(),
                        atlas.slots.len()
                    );
                    atlas.dirty = false;
                }
                None => log::warn!("glyph atlas upload failed, its glyphs are skipped"),
            }
        }

        let mut run: Vec<AtlasSprite> = Vec::new();
        let mut run_atlas = None;
        for (idx, sprite) in resolved {
            if run_atlas != Some(idx) {
                if let Some(prev) = run_atlas {
                    self.emit(prev, &run, hooks);
                }
                run.clear();
                run_atlas = Some(idx);
            }
            run.push(sprite);
        }
        if let Some(prev) = run_atlas {
            self.emit(prev, &run, hooks);
        }
    }

    /// Destroy every atlas page and drop queued draws.
    pub fn clear(&mut self, hooks: &mut impl AtlasHooks) {
        self.queue.clear();
        for atlas in self.atlases.drain(..) {
            if let Some(texture) = atlas.texture {
                hooks.destroy_atlas(texture);
            }
        }
    }

    /// Pages a repack of the sparse pages would open, dry-run on copies of
    /// the packers so nothing is destroyed when merging cannot help.
    fn repack_page_count(&self, threshold: f32) -> usize {
        let is_sparse = |a: &Atlas| !a.dedicated && a.occupancy() < threshold;
        let mut sizes: Vec<(GlyphHandle, u32, u32)> = self
            .atlases
            .iter()
            .filter(|a| is_sparse(a))
            .flat_map(|a| a.slots.iter().map(|(g, s)| (*g, s.w, s.h)))
            .collect();
        // Same order the repack places them in.
        sizes.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

        let mut kept: Vec<RectPacker> = self
            .atlases
            .iter()
            .filter(|a| !a.dedicated && !is_sparse(a))
            .map(|a| a.packer.clone())
            .collect();
        let size = self.config.atlas_size;
        let mut opened: Vec<RectPacker> = Vec::new();
        for (_, w, h) in sizes {
            let fits = kept
                .iter_mut()
                .chain(opened.iter_mut())
                .any(|p| p.pack(w, h).is_some());
            if !fits {
                let mut page = RectPacker::new(size, size);
                page.pack(w, h);
                opened.push(page);
            }
        }
        opened.len()
    }

    fn emit(&self, idx: usize, sprites: &[AtlasSprite], hooks: &mut impl AtlasHooks) {
        let atlas = &self.atlases[idx];
        if let Some(texture) = atlas.texture {
            hooks.on_batch_ready(sprites, texture, atlas.width(), atlas.height());
        }
    }

    fn locate(&self, glyph: GlyphHandle) -> Option<usize> {
        self.atlases
            .iter()
            .position(|a| a.slots.contains_key(&glyph))
    }

    /// Pull a glyph's pixels and pack it. Returns the atlas index.
    fn insert(&mut self, req: &SpriteRequest, hooks: &mut impl AtlasHooks) -> Option<usize> {
        if req.width == 0 || req.height == 0 {
            return None;
        }
        let mut pixels = vec![0; req.width as usize * req.height as usize];
        if !hooks.fetch_pixels(req.glyph, &mut pixels) {
            return None;
        }
        Some(self.place(req.glyph, req.width, req.height, &pixels, self.tick))
    }

    /// Pack a bitmap into the first shared page with room, opening a new page
    /// (or a dedicated one for oversize bitmaps) when none has.
    fn place(&mut self, glyph: GlyphHandle, w: u32, h: u32, pixels: &[u8], last_used: u64) -> usize {
        let size = self.config.atlas_size;
        let found = self
            .atlases
            .iter_mut()
            .enumerate()
            .filter(|(_, a)| !a.dedicated)
            .find_map(|(i, a)| a.packer.pack(w, h).map(|pos| (i, pos)));

        let (idx, (x, y)) = match found {
            Some(hit) => hit,
            None => {
                let dedicated = w > size || h > size;
                let mut atlas = if dedicated {
                    Atlas::new(w, h, true)
                } else {
                    Atlas::new(size, size, false)
                };
                let pos = atlas.packer.pack(w, h).unwrap_or((0, 0));
                log::debug!(
                    "glyph atlas page opened ({}x{}, dedicated={dedicated})",
                    atlas.width(),
                    atlas.height()
                );
                self.atlases.push(atlas);
                (self.atlases.len() - 1, pos)
            }
        };

        let atlas = &mut self.atlases[idx];
        atlas.blit(x, y, w, h, pixels);
        atlas.slots.insert(
            glyph,
            Slot {
                x,
                y,
                w,
                h,
                last_used,
            },
        );
        idx
    }
}

#[cfg(test)]
mod tests;
