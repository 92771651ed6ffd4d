//! Compositing the presentation target onto the window.

use crate::geometry::Edges;
use crate::gpu::{BatchKey, BindState, Program, RenderDevice, RenderMode, RenderTarget, quad};

use super::Renderer;

/// Half-extents in NDC of the largest rectangle with the target's aspect
/// ratio that fits the window. One axis is always `1.0`.
pub fn letterbox(target: (u32, u32), window: (u32, u32)) -> (f32, f32) {
    let (tw, th) = (target.0 as f32, target.1 as f32);
    let (ww, wh) = (window.0 as f32, window.1 as f32);
    if tw / th > ww / wh {
        (1.0, (th / tw) / (wh / ww))
    } else {
        ((tw / th) / (ww / wh), 1.0)
    }
}

impl<D: RenderDevice> Renderer<D> {
    /// Finish the frame: flush queued glyphs and vertices, scale the presentation target
    /// onto the window with letterboxing, and present.
    pub fn draw_frame(&mut self) {
        self.batcher.tick();
        self.flush_glyphs();
        self.batch.flush();
        self.batch.tracker.reset();

        let window = self.batch.device.window_size();
        let target = self.framebuffer;
        let drawable = window.0 > 0 && window.1 > 0;
        if let Some((tw, th)) = self.surface_size(target).filter(|_| drawable) {
            let (fit_w, fit_h) = letterbox((tw, th), window);
            let key = BatchKey {
                mode: RenderMode::Present,
                source: Some(target.0),
                target: RenderTarget::Window,
                tint: [0; 4],
            };
            self.batch.switch(key, || BindState {
                target: RenderTarget::Window,
                viewport: window,
                program: Program::Texture,
                blend: false,
                source: Some(target.0),
                tint: [0.0; 4],
                linear_filter: true,
            });
            self.batch.push(quad(
                Edges::new(-fit_w, fit_h, fit_w, -fit_h),
                Edges::new(0.0, 0.0, 1.0, 1.0),
            ));
            self.batch.flush();
        }

        self.batch.device.present();
        self.batch.tracker.reset();
        self.last_stats = std::mem::take(&mut self.batch.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_aspect_fills_window() {
        assert_eq!(letterbox((320, 240), (640, 480)), (1.0, 1.0));
    }

    #[test]
    fn wide_window_pillarboxes() {
        let (w, h) = letterbox((320, 240), (1000, 600));
        assert!((w - 0.8).abs() < 1e-5);
        assert_eq!(h, 1.0);
    }

    #[test]
    fn tall_window_letterboxes() {
        let (w, h) = letterbox((320, 240), (640, 960));
        assert_eq!(w, 1.0);
        assert!((h - 0.5).abs() < 1e-5);
    }
}
