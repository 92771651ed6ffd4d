use std::collections::HashMap;

use super::*;

/// Hooks backed by plain maps, recording every call.
#[derive(Default)]
struct RecordingHooks {
    bitmaps: HashMap<GlyphHandle, Vec<u8>>,
    next_texture: u32,
    live: HashMap<TextureId, (Vec<u8>, u32, u32)>,
    destroyed: Vec<TextureId>,
    fetches: Vec<GlyphHandle>,
    batches: Vec<(TextureId, Vec<AtlasSprite>)>,
    fail_create: bool,
}

impl RecordingHooks {
    fn add(&mut self, id: u64, w: u32, h: u32, fill: u8) -> SpriteRequest {
        self.bitmaps
            .insert(GlyphHandle(id), vec![fill; (w * h) as usize]);
        SpriteRequest {
            glyph: GlyphHandle(id),
            width: w,
            height: h,
            x: 0,
            y: 0,
        }
    }

    fn order(&self) -> Vec<u64> {
        self.batches
            .iter()
            .flat_map(|(_, s)| s.iter().map(|s| s.glyph.0))
            .collect()
    }
}

impl AtlasHooks for RecordingHooks {
    fn fetch_pixels(&mut self, glyph: GlyphHandle, buffer: &mut [u8]) -> bool {
        self.fetches.push(glyph);
        match self.bitmaps.get(&glyph) {
            Some(px) => {
                buffer.copy_from_slice(px);
                true
            }
            None => false,
        }
    }

    fn create_atlas(&mut self, pixels: &[u8], width: u32, height: u32) -> Option<TextureId> {
        if self.fail_create {
            return None;
        }
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.live.insert(id, (pixels.to_vec(), width, height));
        Some(id)
    }

    fn destroy_atlas(&mut self, texture: TextureId) {
        self.live.remove(&texture);
        self.destroyed.push(texture);
    }

    fn on_batch_ready(&mut self, sprites: &[AtlasSprite], atlas: TextureId, _: u32, _: u32) {
        self.batches.push((atlas, sprites.to_vec()));
    }
}

fn batcher(atlas_size: u32) -> GlyphBatcher {
    GlyphBatcher::new(BatcherConfig {
        atlas_size,
        ..BatcherConfig::default()
    })
}

#[test]
fn empty_flush_does_nothing() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(64);
    b.flush(&mut hooks);
    assert!(hooks.batches.is_empty());
    assert!(hooks.live.is_empty());
}

#[test]
fn glyphs_sharing_an_atlas_form_one_run() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(64);
    for id in 1..=5 {
        let mut req = hooks.add(id, 8, 8, id as u8);
        req.x = id as i32 * 10;
        b.push(req);
    }
    b.flush(&mut hooks);

    assert_eq!(hooks.batches.len(), 1);
    assert_eq!(hooks.order(), vec![1, 2, 3, 4, 5]);
    assert_eq!(hooks.batches[0].1[2].x, 30);
    assert_eq!(b.pending(), 0);
}

#[test]
fn atlas_holds_glyph_bytes_at_its_slot() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(16);
    let req = hooks.add(1, 4, 2, 0);
    hooks
        .bitmaps
        .insert(GlyphHandle(1), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    b.push(req);
    b.flush(&mut hooks);

    let (atlas, sprites) = &hooks.batches[0];
    let (pixels, w, _) = &hooks.live[atlas];
    let s = sprites[0];
    let row0 = (s.atlas_y * w + s.atlas_x) as usize;
    let row1 = row0 + *w as usize;
    assert_eq!(&pixels[row0..row0 + 4], &[1, 2, 3, 4]);
    assert_eq!(&pixels[row1..row1 + 4], &[5, 6, 7, 8]);
}

#[test]
fn resident_glyph_is_not_fetched_again() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(64);
    let req = hooks.add(7, 4, 4, 1);
    b.push(req);
    b.push(req);
    b.flush(&mut hooks);
    b.push(req);
    b.flush(&mut hooks);

    assert_eq!(hooks.fetches, vec![GlyphHandle(7)]);
    assert_eq!(hooks.order(), vec![7, 7, 7]);
    // Second flush reused the uploaded texture.
    assert_eq!(hooks.live.len(), 1);
    assert!(hooks.destroyed.is_empty());
}

#[test]
fn new_glyph_replaces_atlas_texture() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(64);
    let a = hooks.add(1, 4, 4, 1);
    let c = hooks.add(2, 4, 4, 2);
    b.push(a);
    b.flush(&mut hooks);
    let first = hooks.batches[0].0;

    b.push(c);
    b.flush(&mut hooks);
    assert_eq!(hooks.destroyed, vec![first]);
    assert_ne!(hooks.batches[1].0, first);
}

#[test]
fn order_is_kept_across_atlases() {
    let mut hooks = RecordingHooks::default();
    // Each 16×16 page fits exactly one 16×16 glyph.
    let mut b = batcher(16);
    let a = hooks.add(1, 16, 16, 1);
    let c = hooks.add(2, 16, 16, 2);
    b.push(a);
    b.push(c);
    b.push(a);
    b.flush(&mut hooks);

    assert_eq!(b.atlas_count(), 2);
    assert_eq!(hooks.batches.len(), 3);
    assert_eq!(hooks.order(), vec![1, 2, 1]);
    assert_eq!(hooks.batches[0].0, hooks.batches[2].0);
}

#[test]
fn oversize_glyph_gets_dedicated_atlas() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(16);
    let big = hooks.add(1, 32, 20, 9);
    b.push(big);
    b.flush(&mut hooks);

    let atlas = hooks.batches[0].0;
    let (_, w, h) = &hooks.live[&atlas];
    assert_eq!((*w, *h), (32, 20));
}

#[test]
fn evicted_glyph_requests_are_dropped() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(64);
    let a = hooks.add(1, 4, 4, 1);
    let c = hooks.add(2, 4, 4, 2);
    b.push(a);
    b.push(c);
    b.evict(GlyphHandle(1));
    b.flush(&mut hooks);
    assert_eq!(hooks.order(), vec![2]);
    assert!(!b.is_resident(GlyphHandle(1)));
}

#[test]
fn missing_bitmap_is_skipped() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(64);
    b.push(SpriteRequest {
        glyph: GlyphHandle(99),
        width: 4,
        height: 4,
        x: 0,
        y: 0,
    });
    b.flush(&mut hooks);
    assert!(hooks.batches.is_empty());
    assert_eq!(b.atlas_count(), 0);
}

#[test]
fn failed_upload_skips_sprites_and_retries() {
    let mut hooks = RecordingHooks {
        fail_create: true,
        ..Default::default()
    };
    let mut b = batcher(64);
    let a = hooks.add(1, 4, 4, 1);
    b.push(a);
    b.flush(&mut hooks);
    assert!(hooks.batches.is_empty());

    hooks.fail_create = false;
    b.push(a);
    b.flush(&mut hooks);
    assert_eq!(hooks.order(), vec![1]);
}

#[test]
fn decayed_glyphs_are_evicted_and_empty_atlas_destroyed() {
    let mut hooks = RecordingHooks::default();
    let mut b = GlyphBatcher::new(BatcherConfig {
        atlas_size: 64,
        decay_ticks: 3,
        defrag_threshold: 0.5,
    });
    let a = hooks.add(1, 4, 4, 1);
    b.push(a);
    b.flush(&mut hooks);
    let atlas = hooks.batches[0].0;

    for _ in 0..2 {
        b.tick();
        b.defrag(&mut hooks);
    }
    assert!(b.is_resident(GlyphHandle(1)));

    b.tick();
    b.defrag(&mut hooks);
    assert!(!b.is_resident(GlyphHandle(1)));
    assert_eq!(b.atlas_count(), 0);
    assert_eq!(hooks.destroyed, vec![atlas]);
}

#[test]
fn sparse_atlases_are_merged() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(16);
    // Each page takes one 16×12 and one 16×4 glyph. With the tall ones
    // gone both pages sit at a quarter occupancy.
    let big1 = hooks.add(1, 16, 12, 1);
    let big2 = hooks.add(2, 16, 12, 2);
    let small1 = hooks.add(3, 16, 4, 3);
    let small2 = hooks.add(4, 16, 4, 4);
    for req in [big1, small1, big2, small2] {
        b.push(req);
    }
    b.flush(&mut hooks);
    assert_eq!(b.atlas_count(), 2);

    b.evict(GlyphHandle(1));
    b.evict(GlyphHandle(2));
    b.defrag(&mut hooks);
    assert_eq!(b.atlas_count(), 1);
    assert!(b.is_resident(GlyphHandle(3)));
    assert!(b.is_resident(GlyphHandle(4)));

    // Repacked pixels survive without a refetch.
    let fetched = hooks.fetches.len();
    b.push(small1);
    b.push(small2);
    b.flush(&mut hooks);
    assert_eq!(hooks.fetches.len(), fetched);
    let (atlas, sprites) = hooks.batches.last().unwrap();
    let (pixels, w, _) = &hooks.live[atlas];
    for s in sprites {
        let at = (s.atlas_y * w + s.atlas_x) as usize;
        assert_eq!(pixels[at], s.glyph.0 as u8);
    }
}

#[test]
fn clear_destroys_every_atlas() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(16);
    let a = hooks.add(1, 16, 16, 1);
    let c = hooks.add(2, 16, 16, 2);
    b.push(a);
    b.push(c);
    b.flush(&mut hooks);
    b.clear(&mut hooks);
    assert_eq!(b.atlas_count(), 0);
    assert!(hooks.live.is_empty());
}

#[test]
fn sparse_pages_that_cannot_merge_are_kept() {
    let mut hooks = RecordingHooks::default();
    let mut b = batcher(256);
    // Wider than half a page: each needs its own page however they pack.
    let a = hooks.add(1, 132, 129, 1);
    let c = hooks.add(2, 132, 129, 2);

    let mut created = Vec::new();
    for _ in 0..4 {
        let before = hooks.next_texture;
        b.push(a);
        b.push(c);
        b.defrag(&mut hooks);
        b.flush(&mut hooks);
        created.push(hooks.next_texture - before);
    }
    assert_eq!(created, [2, 0, 0, 0]);
    assert_eq!(b.atlas_count(), 2);
    assert!(hooks.destroyed.is_empty());
}
