//! Built-in 5×7 bitmap font for the demo scene.
//!
//! Covers `A`–`Z`, `0`–`9` and a little punctuation; lowercase letters use
//! the uppercase shapes. Each row is five bits, most significant on the left.

use std::collections::HashMap;

use crate::glyph::GlyphHandle;
use crate::gpu::RenderDevice;
use crate::renderer::Renderer;

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance including one pixel of spacing.
pub const ADVANCE: i32 = 6;

/// Row bits for `c`, or `None` for characters without a shape (including
/// space).
fn glyph_rows(c: char) -> Option<[u8; 7]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => return None,
    };
    Some(rows)
}

/// Expand row bits into a tightly packed 8-bit coverage bitmap.
fn rasterize(rows: [u8; 7]) -> Vec<u8> {
    rows.iter()
        .flat_map(|row| (0..GLYPH_WIDTH).rev().map(move |bit| (row >> bit) & 1))
        .map(|on| if on == 1 { 0xFF } else { 0 })
        .collect()
}

/// The font's glyphs, loaded into a renderer.
pub struct BitmapFont {
    glyphs: HashMap<char, GlyphHandle>,
}

impl BitmapFont {
    const CHARSET: &'static str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789:.-";

    pub fn load<D: RenderDevice>(renderer: &mut Renderer<D>) -> Self {
        let glyphs = Self::CHARSET
            .chars()
            .filter_map(|c| {
                let bitmap = rasterize(glyph_rows(c)?);
                let handle = renderer.load_glyph(
                    &bitmap,
                    GLYPH_WIDTH,
                    GLYPH_HEIGHT,
                    GLYPH_WIDTH as usize,
                )?;
                Some((c, handle))
            })
            .collect();
        Self { glyphs }
    }

    /// Queue `text` at `(x, y)`. Call `prepare_to_draw_glyphs` first and
    /// `flush_glyphs` after.
    pub fn draw_text<D: RenderDevice>(&self, renderer: &mut Renderer<D>, text: &str, x: i32, y: i32) {
        let mut pen = x;
        for c in text.chars() {
            if let Some(&glyph) = self.glyphs.get(&c.to_ascii_uppercase()) {
                renderer.draw_glyph(glyph, pen, y);
            }
            pen += ADVANCE;
        }
    }

    pub fn unload<D: RenderDevice>(self, renderer: &mut Renderer<D>) {
        for glyph in self.glyphs.into_values() {
            renderer.unload_glyph(glyph);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_i_rasterizes() {
        let bitmap = rasterize(glyph_rows('I').unwrap());
        assert_eq!(bitmap.len(), 35);
        assert_eq!(&bitmap[..5], &[0, 0xFF, 0xFF, 0xFF, 0]);
        assert_eq!(&bitmap[5..10], &[0, 0, 0xFF, 0, 0]);
    }

    #[test]
    fn lowercase_uses_uppercase_shape() {
        assert_eq!(glyph_rows('q'), glyph_rows('Q'));
    }

    #[test]
    fn unsupported_characters_have_no_shape() {
        assert!(glyph_rows(' ').is_none());
        assert!(glyph_rows('~').is_none());
    }

    #[test]
    fn every_charset_entry_has_a_shape() {
        for c in BitmapFont::CHARSET.chars() {
            assert!(glyph_rows(c).is_some(), "{c}");
        }
    }
}
