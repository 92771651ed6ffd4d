//! Demo scene drawn through the public renderer API.

use crate::geometry::Rect;
use crate::gpu::RenderDevice;
use crate::renderer::{Renderer, SurfaceHandle};

use super::font::BitmapFont;

const SPRITE: i32 = 16;
const SPRITE_COUNT: i32 = 48;

pub struct Scene {
    sheet: SurfaceHandle,
    font: BitmapFont,
    frame: u64,
}

/// RGBA for pixel `(x, y)` of the two-sprite sheet: a soft-edged ball on the
/// left, an opaque crate on the right.
fn sheet_pixel(x: i32, y: i32) -> [u8; 4] {
    if x < SPRITE {
        let (dx, dy) = (x as f32 - 7.5, y as f32 - 7.5);
        let d = (dx * dx + dy * dy).sqrt();
        let a = ((8.0 - d).clamp(0.0, 1.0) * 255.0) as u8;
        [255, 200 - (y * 6) as u8, 40, a]
    } else {
        let (cx, cy) = (x - SPRITE, y);
        let edge = cx == 0 || cy == 0 || cx == SPRITE - 1 || cy == SPRITE - 1;
        let brace = cx == cy || cx == SPRITE - 1 - cy;
        if edge || brace {
            [90, 50, 20, 255]
        } else {
            [170, 110, 50, 255]
        }
    }
}

impl Scene {
    /// Build the sprite sheet and load the font. `None` if the sheet cannot
    /// be allocated.
    pub fn new<D: RenderDevice>(renderer: &mut Renderer<D>) -> Option<Self> {
        let (w, h) = (SPRITE as u32 * 2, SPRITE as u32);
        let sheet = renderer.create_surface(w, h)?;
        if let Some((pixels, pitch)) = renderer.lock_surface(sheet, w, h) {
            for (y, row) in pixels.chunks_exact_mut(pitch).enumerate() {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    px.copy_from_slice(&sheet_pixel(x as i32, y as i32));
                }
            }
        }
        renderer.unlock_surface(sheet, w, h);

        Some(Self {
            sheet,
            font: BitmapFont::load(renderer),
            frame: 0,
        })
    }

    pub fn draw<D: RenderDevice>(&mut self, renderer: &mut Renderer<D>) {
        let fb = renderer.framebuffer();
        let Some((w, h)) = renderer.surface_size(fb) else {
            return;
        };
        let (w, h) = (w as i32, h as i32);
        let ground = h - 32;

        renderer.colour_fill(fb, Rect::new(0, 0, w, ground), 92, 148, 252, 255);
        renderer.colour_fill(fb, Rect::new(0, ground, w, h), 60, 120, 40, 255);

        let crate_rect = Rect::from_size(SPRITE, 0, SPRITE, SPRITE);
        for i in 0..w / SPRITE {
            renderer.blit(self.sheet, crate_rect, fb, i * SPRITE, ground, false);
        }

        let ball_rect = Rect::from_size(0, 0, SPRITE, SPRITE);
        let t = self.frame as f32 / 60.0;
        for i in 0..SPRITE_COUNT {
            let phase = t + i as f32 * 0.37;
            let x = ((i * 37) % (w - SPRITE).max(1)) as f32 + phase.cos() * 6.0;
            let bounce = (phase * 2.0).sin().abs();
            let y = (ground - SPRITE) as f32 - bounce * (40 + (i % 5) * 12) as f32;
            renderer.blit(self.sheet, ball_rect, fb, x as i32, y as i32, true);
        }

        renderer.prepare_to_draw_glyphs(fb, [255, 255, 255]);
        self.font.draw_text(renderer, "blitcore", 4, 4);
        let stats = renderer.stats();
        let line = format!("frame {}  draws {}  quads {}", self.frame, stats.draw_calls, stats.quads);
        self.font.draw_text(renderer, &line, 4, 14);
        renderer.flush_glyphs();

        self.frame += 1;
    }

    pub fn release<D: RenderDevice>(self, renderer: &mut Renderer<D>) {
        self.font.unload(renderer);
        renderer.free_surface(self.sheet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphicsConfig;
    use crate::gpu::HeadlessDevice;

    fn renderer() -> Renderer<HeadlessDevice> {
        Renderer::new(HeadlessDevice::new(640, 480), &GraphicsConfig::default(), 320, 240)
            .expect("renderer")
    }

    #[test]
    fn sheet_is_premultiplied_on_upload() {
        let mut r = renderer();
        let scene = Scene::new(&mut r).unwrap();
        let pixels = r.device().texture_pixels(scene.sheet.0).unwrap();
        // Ball corner is fully transparent.
        assert_eq!(&pixels[..4], &[0, 0, 0, 0]);
        // Crate border is opaque.
        let crate_corner = SPRITE as usize * 4;
        assert_eq!(&pixels[crate_corner..crate_corner + 4], &[90, 50, 20, 255]);
    }

    #[test]
    fn a_frame_batches_into_few_draws() {
        let mut r = renderer();
        let mut scene = Scene::new(&mut r).unwrap();
        scene.draw(&mut r);
        r.draw_frame();
        // Two fills, crates, balls, text, composite.
        assert_eq!(r.stats().draw_calls, 6);
    }

    #[test]
    fn release_frees_sheet() {
        let mut r = renderer();
        let scene = Scene::new(&mut r).unwrap();
        let sheet = scene.sheet;
        scene.release(&mut r);
        assert!(r.surface_size(sheet).is_none());
    }
}
