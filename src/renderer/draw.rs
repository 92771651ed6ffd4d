//! Textured blits and flat-colour fills.

use crate::geometry::{Edges, Rect};
use crate::gpu::{
    BatchKey, BindState, Program, RenderDevice, RenderMode, RenderTarget, ndc_rect, quad,
    solid_quad,
};

use super::{Renderer, SurfaceHandle};

impl<D: RenderDevice> Renderer<D> {
    /// Copy `rect` of `src` to `(x, y)` on `dst`. With `alpha_blend` the
    /// source is composited over the destination (premultiplied); without it
    /// the destination pixels are replaced.
    ///
    /// Unknown surfaces and inverted rects are ignored.
    pub fn blit(
        &mut self,
        src: SurfaceHandle,
        rect: Rect,
        dst: SurfaceHandle,
        x: i32,
        y: i32,
        alpha_blend: bool,
    ) {
        let (Some(s), Some(d)) = (self.surfaces.get(&src), self.surfaces.get(&dst)) else {
            return;
        };
        if rect.is_inverted() {
            return;
        }
        let (src_w, src_h) = (s.width, s.height);
        let (dst_w, dst_h) = (d.width, d.height);

        let key = BatchKey {
            mode: if alpha_blend {
                RenderMode::BlitTransparent
            } else {
                RenderMode::Blit
            },
            source: Some(src.0),
            target: RenderTarget::Texture(dst.0),
            tint: [0; 4],
        };
        self.batch.switch(key, || BindState {
            target: RenderTarget::Texture(dst.0),
            viewport: (dst_w, dst_h),
            program: Program::Texture,
            blend: alpha_blend,
            source: Some(src.0),
            tint: [0.0; 4],
            linear_filter: false,
        });

        let uv = Edges::new(
            rect.left as f32 / src_w as f32,
            rect.top as f32 / src_h as f32,
            rect.right as f32 / src_w as f32,
            rect.bottom as f32 / src_h as f32,
        );
        let pos = ndc_rect(
            x as f32,
            y as f32,
            rect.width() as f32,
            rect.height() as f32,
            dst_w,
            dst_h,
        );
        self.batch.push(quad(pos, uv));
    }

    /// Fill `rect` of `surface` with an RGBA colour. Pixels are replaced, not
    /// blended.
    ///
    /// Unknown surfaces and inverted rects are ignored.
    pub fn colour_fill(
        &mut self,
        surface: SurfaceHandle,
        rect: Rect,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) {
        let Some(d) = self.surfaces.get(&surface) else {
            return;
        };
        if rect.is_inverted() {
            return;
        }
        let (dst_w, dst_h) = (d.width, d.height);

        let tint = [r, g, b, a];
        let key = BatchKey {
            mode: RenderMode::ColourFill,
            source: None,
            target: RenderTarget::Texture(surface.0),
            tint,
        };
        self.batch.switch(key, || BindState {
            target: RenderTarget::Texture(surface.0),
            viewport: (dst_w, dst_h),
            program: Program::ColourFill,
            blend: false,
            source: None,
            tint: tint.map(|c| f32::from(c) / 255.0),
            linear_filter: false,
        });

        let pos = ndc_rect(
            rect.left as f32,
            rect.top as f32,
            rect.width() as f32,
            rect.height() as f32,
            dst_w,
            dst_h,
        );
        self.batch.push(solid_quad(pos));
    }
}
