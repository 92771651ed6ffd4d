//! Vertex layout and quad construction.
//!
//! Coordinate convention: pixel `(0, 0)` is the top-left of every surface.
//! Positions map pixel space to NDC with y pointing up (`ndc_y = 1 - 2y/h`),
//! and texture coordinates map pixel rows directly (`v = y / h`), so texel
//! row 0 is always the first row written. Nothing is flipped at any stage,
//! including presentation.

use crate::geometry::Edges;

/// One vertex: NDC position plus normalized texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

/// Two triangles forming one rectangle.
///
/// Winding: `(TL, TR, BR)` then `(TL, BR, BL)`.
pub type Quad = [Vertex; 6];

/// Vertices per quad.
pub const QUAD_VERTICES: u32 = 6;

/// Bytes per quad in the vertex stream.
pub const QUAD_BYTES: u64 = std::mem::size_of::<Quad>() as u64;

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
    const POSITION_ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    /// Layout for pipelines that sample a texture.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Layout for the flat-colour pipeline: same stride, texture coordinates
    /// are left out of the attribute list.
    pub fn position_only_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::POSITION_ATTRIBS,
        }
    }
}

/// Map a horizontal pixel coordinate to NDC for a surface `width` wide.
pub fn ndc_x(x: f32, width: u32) -> f32 {
    x * 2.0 / width as f32 - 1.0
}

/// Map a vertical pixel coordinate to NDC for a surface `height` tall.
pub fn ndc_y(y: f32, height: u32) -> f32 {
    1.0 - y * 2.0 / height as f32
}

/// Pixel rectangle `(x, y, w, h)` on a `dst_w × dst_h` target, in NDC.
pub fn ndc_rect(x: f32, y: f32, w: f32, h: f32, dst_w: u32, dst_h: u32) -> Edges {
    Edges::new(
        ndc_x(x, dst_w),
        ndc_y(y, dst_h),
        ndc_x(x + w, dst_w),
        ndc_y(y + h, dst_h),
    )
}

/// Build a textured quad from position and texture-coordinate edges.
pub fn quad(pos: Edges, uv: Edges) -> Quad {
    let tl = Vertex {
        position: [pos.left, pos.top],
        tex_coord: [uv.left, uv.top],
    };
    let tr = Vertex {
        position: [pos.right, pos.top],
        tex_coord: [uv.right, uv.top],
    };
    let br = Vertex {
        position: [pos.right, pos.bottom],
        tex_coord: [uv.right, uv.bottom],
    };
    let bl = Vertex {
        position: [pos.left, pos.bottom],
        tex_coord: [uv.left, uv.bottom],
    };
    [tl, tr, br, tl, br, bl]
}

/// Build an untextured quad. Texture coordinates are zeroed and never read.
pub fn solid_quad(pos: Edges) -> Quad {
    quad(pos, Edges::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_surface_maps_to_unit_square() {
        let e = ndc_rect(0.0, 0.0, 320.0, 240.0, 320, 240);
        assert_eq!(e, Edges::new(-1.0, 1.0, 1.0, -1.0));
    }

    #[test]
    fn top_left_pixel_is_top_left_in_ndc() {
        assert!(ndc_y(0.0, 100) > ndc_y(50.0, 100));
        assert!(ndc_x(0.0, 100) < ndc_x(50.0, 100));
    }

    #[test]
    fn quad_winding() {
        let q = quad(Edges::new(-1.0, 1.0, 1.0, -1.0), Edges::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(q[0].position, [-1.0, 1.0]);
        assert_eq!(q[1].position, [1.0, 1.0]);
        assert_eq!(q[2].position, [1.0, -1.0]);
        assert_eq!(q[3], q[0]);
        assert_eq!(q[4], q[2]);
        assert_eq!(q[5].position, [-1.0, -1.0]);
        // Top edge samples v = 0.
        assert_eq!(q[0].tex_coord, [0.0, 0.0]);
        assert_eq!(q[5].tex_coord, [0.0, 1.0]);
    }

    #[test]
    fn quad_is_96_bytes() {
        assert_eq!(QUAD_BYTES, 96);
    }
}
