//! wgpu implementation of [`RenderDevice`].
//!
//! Every flush becomes one command buffer holding one render pass with one
//! draw, submitted immediately. Queue writes (vertex ring, tint uniform,
//! texture uploads) are ordered before the next submit, which is what makes
//! the renderer's flush-before-change discipline sufficient for correctness.

use std::collections::HashMap;
use std::sync::Arc;

use winit::window::Window;

use crate::config::GraphicsTier;
use crate::error::{DeviceError, InitError};

use super::device::{
    BindState, Program, RenderDevice, RenderTarget, TextureDesc, TextureFormat, TextureId,
};
use super::pipeline::{self, PipelineSet, TINT_UNIFORM_SIZE};
use super::vertex::Vertex;

/// Format of every drawable surface texture.
const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: TextureDesc,
}

/// The window texture being drawn this frame.
struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    /// Set once the first pass has cleared it.
    cleared: bool,
}

/// Scratch copy used when a surface is blitted onto itself.
struct FeedbackCopy {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Source binding resolved at bind time.
struct SourceBinding {
    bind_group: wgpu::BindGroup,
    /// Copy the target into the scratch texture before drawing.
    feedback: bool,
}

impl GraphicsTier {
    fn backends(self) -> wgpu::Backends {
        match self {
            Self::Standard => wgpu::Backends::PRIMARY,
            Self::Compat => wgpu::Backends::GL,
        }
    }

    fn limits(self) -> wgpu::Limits {
        match self {
            Self::Standard => wgpu::Limits::default(),
            Self::Compat => wgpu::Limits::downlevel_webgl2_defaults(),
        }
    }
}

pub struct WgpuDevice {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    max_texture_size: u32,
    texture_layout: wgpu::BindGroupLayout,
    /// Pipelines targeting [`SURFACE_FORMAT`].
    surface_pipelines: PipelineSet,
    /// Pipelines targeting the window's swapchain format.
    window_pipelines: PipelineSet,
    nearest_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,
    tint_buffer: wgpu::Buffer,
    tint_bind_group: wgpu::BindGroup,
    textures: HashMap<TextureId, GpuTexture>,
    vertex_buffers: Vec<Option<wgpu::Buffer>>,
    bound: Option<BindState>,
    source: Option<SourceBinding>,
    feedback: Option<FeedbackCopy>,
    frame: Option<Frame>,
}

impl WgpuDevice {
    /// Create instance, surface, adapter, device and the program set for
    /// `window`.
    pub fn new(window: Arc<Window>, tier: GraphicsTier, vsync: bool) -> Result<Self, InitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: tier.backends(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("blitcore"),
            required_features: wgpu::Features::empty(),
            required_limits: tier.limits().using_resolution(adapter.limits()),
            ..Default::default()
        }))?;

        let caps = surface.get_capabilities(&adapter);
        // Non-sRGB so colour bytes pass through without a second gamma curve.
        let surface_format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(InitError::NoSurfaceFormat)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let info = adapter.get_info();
        log::info!(
            "GPU init: adapter={}, backend={:?}, format={surface_format:?}, tier={tier:?}, vsync={vsync}",
            info.name,
            info.backend,
        );

        let tint_layout = pipeline::create_tint_bind_group_layout(&device);
        let texture_layout = pipeline::create_texture_bind_group_layout(&device);
        let surface_pipelines =
            PipelineSet::new(&device, SURFACE_FORMAT, &tint_layout, &texture_layout);
        let window_pipelines =
            PipelineSet::new(&device, surface_format, &tint_layout, &texture_layout);

        let nearest_sampler = create_sampler(&device, "nearest_sampler", wgpu::FilterMode::Nearest);
        let linear_sampler = create_sampler(&device, "linear_sampler", wgpu::FilterMode::Linear);

        let tint_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tint_uniform"),
            size: TINT_UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let tint_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tint_bind_group"),
            layout: &tint_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: tint_buffer.as_entire_binding(),
            }],
        });

        let max_texture_size = device.limits().max_texture_dimension_2d;

        Ok(Self {
            window,
            surface,
            surface_config,
            device,
            queue,
            max_texture_size,
            texture_layout,
            surface_pipelines,
            window_pipelines,
            nearest_sampler,
            linear_sampler,
            tint_buffer,
            tint_bind_group,
            textures: HashMap::new(),
            vertex_buffers: Vec::new(),
            bound: None,
            source: None,
            feedback: None,
            frame: None,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Acquire the window texture for this frame, reconfiguring the swapchain
    /// first if the window was resized. Returns `false` when there is nothing
    /// to draw into (minimised window, lost surface).
    fn acquire_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }

        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return false;
        }
        if size.width != self.surface_config.width || size.height != self.surface_config.height {
            self.surface_config.width = size.width;
            self.surface_config.height = size.height;
            self.surface.configure(&self.device, &self.surface_config);
        }

        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frame = Some(Frame {
                    texture,
                    view,
                    cleared: false,
                });
                true
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                false
            }
            Err(e) => {
                log::warn!("surface error: {e}");
                false
            }
        }
    }

    /// Build the source bind group for `state`, preparing the scratch copy
    /// when the source is also the target.
    fn bind_source(&mut self, state: &BindState) -> Option<SourceBinding> {
        let source = state.source?;
        let src = self.textures.get(&source)?;
        let feedback = state.target == RenderTarget::Texture(source);

        let view = if feedback {
            let (width, height) = (src.desc.width, src.desc.height);
            let stale = self
                .feedback
                .as_ref()
                .is_none_or(|f| f.width != width || f.height != height);
            if stale {
                let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("feedback_copy"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: SURFACE_FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                self.feedback = Some(FeedbackCopy {
                    texture,
                    view,
                    width,
                    height,
                });
            }
            &self.feedback.as_ref()?.view
        } else {
            &src.view
        };

        let sampler = if state.linear_filter {
            &self.linear_sampler
        } else {
            &self.nearest_sampler
        };

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("source_bind_group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Some(SourceBinding {
            bind_group,
            feedback,
        })
    }

    fn clear_frame(&self, frame: &Frame) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear_encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl RenderDevice for WgpuDevice {
    fn create_texture(
        &mut self,
        id: TextureId,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Result<(), DeviceError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(DeviceError::EmptyTexture {
                width: desc.width,
                height: desc.height,
            });
        }
        if desc.width > self.max_texture_size || desc.height > self.max_texture_size {
            return Err(DeviceError::TextureTooLarge {
                width: desc.width,
                height: desc.height,
                limit: self.max_texture_size,
            });
        }
        let row_bytes = desc.width * desc.format.bytes_per_pixel();
        if let Some(data) = pixels {
            let expected = (row_bytes * desc.height) as usize;
            if data.len() != expected {
                return Err(DeviceError::PixelDataSize {
                    expected,
                    actual: data.len(),
                });
            }
        }

        let (format, label) = match desc.format {
            TextureFormat::Rgba8 => (SURFACE_FORMAT, "surface_texture"),
            TextureFormat::R8 => (wgpu::TextureFormat::R8Unorm, "atlas_texture"),
        };
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if desc.renderable {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC;
        }

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        if let Some(data) = pixels {
            self.queue.write_texture(
                texture.as_image_copy(),
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(row_bytes),
                    rows_per_image: Some(desc.height),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                view,
                desc: *desc,
            },
        );
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(tex) = self.textures.remove(&id) {
            tex.texture.destroy();
        }
        if self
            .bound
            .is_some_and(|b| b.source == Some(id) || b.target == RenderTarget::Texture(id))
        {
            self.bound = None;
            self.source = None;
        }
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        bytes_per_row: u32,
        pixels: &[u8],
    ) {
        let Some(tex) = self.textures.get(&id) else {
            return;
        };
        let width = width.min(tex.desc.width);
        let height = height.min(tex.desc.height);
        if width == 0 || height == 0 {
            return;
        }
        let row_bytes = width * tex.desc.format.bytes_per_pixel();
        let required = (bytes_per_row * (height - 1) + row_bytes) as usize;
        if bytes_per_row < row_bytes || pixels.len() < required {
            log::warn!(
                "write_texture: {} bytes too short for {width}x{height} (pitch {bytes_per_row})",
                pixels.len()
            );
            return;
        }

        self.queue.write_texture(
            tex.texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn bind(&mut self, state: &BindState) {
        if state.target == RenderTarget::Window {
            self.acquire_frame();
        }
        if matches!(state.program, Program::ColourFill | Program::Glyph) {
            self.queue
                .write_buffer(&self.tint_buffer, 0, bytemuck::cast_slice(&state.tint));
        }
        self.source = self.bind_source(state);
        self.bound = Some(*state);
    }

    fn upload_vertices(&mut self, slot: usize, reallocate: Option<u64>, bytes: &[u8]) {
        if slot >= self.vertex_buffers.len() {
            self.vertex_buffers.resize_with(slot + 1, || None);
        }
        let needed = bytes.len() as u64;
        let buffer = &mut self.vertex_buffers[slot];
        let too_small = buffer.as_ref().is_none_or(|b| b.size() < needed);
        if reallocate.is_some() || too_small {
            let size = reallocate.unwrap_or(needed).max(needed);
            *buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("vertex_ring_slot"),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        if let Some(buf) = buffer.as_ref() {
            if !bytes.is_empty() {
                self.queue.write_buffer(buf, 0, bytes);
            }
        }
    }

    fn draw(&mut self, slot: usize, vertex_count: u32) {
        let Some(state) = self.bound else {
            return;
        };

        let load = match state.target {
            RenderTarget::Window => {
                let Some(frame) = self.frame.as_mut() else {
                    return;
                };
                let first = !frame.cleared;
                frame.cleared = true;
                if first {
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK)
                } else {
                    wgpu::LoadOp::Load
                }
            }
            RenderTarget::Texture(_) => wgpu::LoadOp::Load,
        };

        let (view, pipelines) = match state.target {
            RenderTarget::Window => match &self.frame {
                Some(frame) => (&frame.view, &self.window_pipelines),
                None => return,
            },
            RenderTarget::Texture(id) => match self.textures.get(&id) {
                Some(tex) => (&tex.view, &self.surface_pipelines),
                None => return,
            },
        };
        let Some(Some(buffer)) = self.vertex_buffers.get(slot) else {
            return;
        };
        let needs_source = matches!(state.program, Program::Texture | Program::Glyph);
        if needs_source && self.source.is_none() {
            return;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("batch_encoder"),
            });

        if let (Some(src), Some(copy), RenderTarget::Texture(id)) =
            (&self.source, &self.feedback, state.target)
        {
            if src.feedback {
                if let Some(tex) = self.textures.get(&id) {
                    encoder.copy_texture_to_texture(
                        tex.texture.as_image_copy(),
                        copy.texture.as_image_copy(),
                        wgpu::Extent3d {
                            width: copy.width,
                            height: copy.height,
                            depth_or_array_layers: 1,
                        },
                    );
                }
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("batch_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_viewport(
                0.0,
                0.0,
                state.viewport.0 as f32,
                state.viewport.1 as f32,
                0.0,
                1.0,
            );
            pass.set_pipeline(pipelines.get(state.program, state.blend));
            match state.program {
                Program::ColourFill => {
                    pass.set_bind_group(0, &self.tint_bind_group, &[]);
                }
                Program::Texture => {
                    if let Some(src) = &self.source {
                        pass.set_bind_group(0, &src.bind_group, &[]);
                    }
                }
                Program::Glyph => {
                    pass.set_bind_group(0, &self.tint_bind_group, &[]);
                    if let Some(src) = &self.source {
                        pass.set_bind_group(1, &src.bind_group, &[]);
                    }
                }
            }
            let byte_len = u64::from(vertex_count) * std::mem::size_of::<Vertex>() as u64;
            pass.set_vertex_buffer(0, buffer.slice(..byte_len));
            pass.draw(0..vertex_count, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn window_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn present(&mut self) {
        self.bound = None;
        self.source = None;

        if self.frame.is_none() && !self.acquire_frame() {
            return;
        }
        let Some(frame) = self.frame.take() else {
            return;
        };
        if !frame.cleared {
            self.clear_frame(&frame);
        }
        self.window.pre_present_notify();
        frame.texture.present();
    }
}

fn create_sampler(device: &wgpu::Device, label: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    })
}
