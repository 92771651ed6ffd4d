//! The fixed program set: flat-colour fill, textured blit, tinted glyph.
//!
//! Shaders are compiled once per target format at device creation. Blending
//! is baked into wgpu pipelines, so the textured program exists in an opaque
//! and a blended variant.

use super::device::Program;
use super::vertex::Vertex;

// --- WGSL Shaders ---

const FILL_SHADER_SRC: &str = "
@group(0) @binding(0) var<uniform> colour: vec4<f32>;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return colour;
}
";

const TEXTURE_SHADER_SRC: &str = "
@group(0) @binding(0) var source_texture: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) tex_coord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.tex_coord = input.tex_coord;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(source_texture, source_sampler, input.tex_coord);
}
";

const GLYPH_SHADER_SRC: &str = "
@group(0) @binding(0) var<uniform> colour: vec4<f32>;
@group(1) @binding(0) var atlas_texture: texture_2d<f32>;
@group(1) @binding(1) var atlas_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) tex_coord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.tex_coord = input.tex_coord;
    return out;
}

// Coverage lives in the red channel. Output stays premultiplied.
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return colour * textureSample(atlas_texture, atlas_sampler, input.tex_coord).r;
}
";

/// Size of the tint uniform: one `vec4<f32>`.
pub const TINT_UNIFORM_SIZE: u64 = 16;

// --- Bind group layouts ---

/// group(0) binding(0) = RGBA tint.
pub fn create_tint_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("tint_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(TINT_UNIFORM_SIZE),
            },
            count: None,
        }],
    })
}

/// binding(0) = texture, binding(1) = sampler.
pub fn create_texture_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("texture_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Premultiplied alpha: shaders output `(rgb * a, a)`.
const PREMULTIPLIED: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Every program variant for one render-target format.
pub struct PipelineSet {
    fill: wgpu::RenderPipeline,
    texture_opaque: wgpu::RenderPipeline,
    texture_blended: wgpu::RenderPipeline,
    glyph: wgpu::RenderPipeline,
}

impl PipelineSet {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        tint_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let fill_shader = create_shader(device, "fill_shader", FILL_SHADER_SRC);
        let texture_shader = create_shader(device, "texture_shader", TEXTURE_SHADER_SRC);
        let glyph_shader = create_shader(device, "glyph_shader", GLYPH_SHADER_SRC);

        let fill_layout = create_layout(device, "fill_pipeline_layout", &[tint_layout]);
        let texture_pipeline_layout =
            create_layout(device, "texture_pipeline_layout", &[texture_layout]);
        let glyph_layout =
            create_layout(device, "glyph_pipeline_layout", &[tint_layout, texture_layout]);

        Self {
            fill: create_pipeline(
                device,
                "fill_pipeline",
                &fill_layout,
                &fill_shader,
                Vertex::position_only_layout(),
                format,
                None,
            ),
            texture_opaque: create_pipeline(
                device,
                "texture_opaque_pipeline",
                &texture_pipeline_layout,
                &texture_shader,
                Vertex::layout(),
                format,
                None,
            ),
            texture_blended: create_pipeline(
                device,
                "texture_blended_pipeline",
                &texture_pipeline_layout,
                &texture_shader,
                Vertex::layout(),
                format,
                Some(PREMULTIPLIED),
            ),
            glyph: create_pipeline(
                device,
                "glyph_pipeline",
                &glyph_layout,
                &glyph_shader,
                Vertex::layout(),
                format,
                Some(PREMULTIPLIED),
            ),
        }
    }

    /// Pipeline for a program. Fill is never blended and glyphs always are,
    /// matching how the renderer binds them.
    pub fn get(&self, program: Program, blend: bool) -> &wgpu::RenderPipeline {
        match program {
            Program::ColourFill => &self.fill,
            Program::Texture if blend => &self.texture_blended,
            Program::Texture => &self.texture_opaque,
            Program::Glyph => &self.glyph,
        }
    }
}

fn create_shader(device: &wgpu::Device, label: &str, src: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(src.into()),
    })
}

fn create_layout(
    device: &wgpu::Device,
    label: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        immediate_size: 0,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[vertex_layout],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
