//! Glyph bitmaps and the atlas batcher that draws them.

pub mod batcher;
pub mod packer;

pub use batcher::{AtlasHooks, AtlasSprite, BatcherConfig, GlyphBatcher, SpriteRequest};

/// Identity of a loaded glyph. Never reused within a renderer's lifetime, so
/// an atlas slot can never be mistaken for a later glyph's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphHandle(pub(crate) u64);

/// An 8-bit coverage bitmap with rows padded to a multiple of four bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    pitch: u32,
}

impl Glyph {
    /// Copy a `width × height` bitmap whose rows are `pitch` bytes apart.
    /// Returns `None` if `pixels` is too short to hold it.
    pub fn load(pixels: &[u8], width: u32, height: u32, pitch: usize) -> Option<Self> {
        let row = width as usize;
        if height > 0 && (pitch < row || pixels.len() < pitch * (height as usize - 1) + row) {
            return None;
        }

        let padded = (width + 3) & !3;
        let mut data = vec![0; padded as usize * height as usize];
        if row > 0 && height > 0 {
            for (dst, src) in data
                .chunks_exact_mut(padded as usize)
                .zip(pixels.chunks(pitch))
            {
                dst[..row].copy_from_slice(&src[..row]);
            }
        }

        Some(Self {
            pixels: data,
            width,
            height,
            pitch: padded,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes: `width` rounded up to a multiple of four.
    pub fn pitch(&self) -> u32 {
        self.pitch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_four() {
        // 3×2 glyph in a source with 5-byte rows.
        let src = [1, 2, 3, 0xAA, 0xAA, 4, 5, 6];
        let g = Glyph::load(&src, 3, 2, 5).unwrap();
        assert_eq!(g.pitch(), 4);
        assert_eq!(g.pixels(), &[1, 2, 3, 0, 4, 5, 6, 0]);
    }

    #[test]
    fn pitch_rounding() {
        for (w, pitch) in [(1, 4), (4, 4), (5, 8), (8, 8), (13, 16)] {
            let src = vec![0xFF; w as usize];
            assert_eq!(Glyph::load(&src, w, 1, w as usize).unwrap().pitch(), pitch);
        }
    }

    #[test]
    fn short_source_is_rejected() {
        assert!(Glyph::load(&[0; 7], 4, 2, 4).is_none());
        assert!(Glyph::load(&[0; 8], 4, 2, 2).is_none());
    }

    #[test]
    fn empty_glyph_loads() {
        let g = Glyph::load(&[], 0, 0, 0).unwrap();
        assert!(g.pixels().is_empty());
    }
}
