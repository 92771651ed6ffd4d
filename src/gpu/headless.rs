//! Recording device with no GPU behind it.
//!
//! Every call is appended to a command log and texture contents are kept in
//! host memory, so tests can assert on batching, upload contents and
//! resource lifetimes. Nothing is rasterised.

use std::collections::HashMap;

use crate::error::DeviceError;

use super::device::{BindState, RenderDevice, TextureDesc, TextureId};
use super::vertex::Vertex;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTexture {
        id: TextureId,
        desc: TextureDesc,
    },
    DestroyTexture(TextureId),
    WriteTexture {
        id: TextureId,
        width: u32,
        height: u32,
    },
    Bind(BindState),
    Upload {
        slot: usize,
        reallocate: Option<u64>,
        bytes: usize,
    },
    /// A draw with the state bound at the time and the vertices it consumed.
    Draw {
        slot: usize,
        state: BindState,
        vertices: Vec<Vertex>,
    },
    Present,
}

struct HostTexture {
    desc: TextureDesc,
    pixels: Vec<u8>,
}

pub struct HeadlessDevice {
    commands: Vec<Command>,
    textures: HashMap<TextureId, HostTexture>,
    slots: Vec<Vec<u8>>,
    bound: Option<BindState>,
    window_size: (u32, u32),
    max_texture_size: u32,
    fail_allocations: bool,
}

impl HeadlessDevice {
    pub fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            commands: Vec::new(),
            textures: HashMap::new(),
            slots: Vec::new(),
            bound: None,
            window_size: (window_width, window_height),
            max_texture_size: 8192,
            fail_allocations: false,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drain the command log.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded draws as (state, vertices) pairs, in submission order.
    pub fn draws(&self) -> Vec<(BindState, &[Vertex])> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw {
                    state, vertices, ..
                } => Some((*state, vertices.as_slice())),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
            .count()
    }

    /// Host copy of a live texture's contents, tightly packed.
    pub fn texture_pixels(&self, id: TextureId) -> Option<&[u8]> {
        self.textures.get(&id).map(|t| t.pixels.as_slice())
    }

    pub fn texture_desc(&self, id: TextureId) -> Option<TextureDesc> {
        self.textures.get(&id).map(|t| t.desc)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    pub fn set_max_texture_size(&mut self, limit: u32) {
        self.max_texture_size = limit;
    }

    /// Make every subsequent `create_texture` fail as if out of memory.
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }
}

impl RenderDevice for HeadlessDevice {
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
        if self.fail_allocations {
            return Err(DeviceError::OutOfMemory);
        }

        let size = (desc.width * desc.height * desc.format.bytes_per_pixel()) as usize;
        let pixels = match pixels {
            Some(data) if data.len() != size => {
                return Err(DeviceError::PixelDataSize {
                    expected: size,
                    actual: data.len(),
                });
            }
            Some(data) => data.to_vec(),
            None => vec![0; size],
        };

        self.textures.insert(
            id,
            HostTexture {
                desc: *desc,
                pixels,
            },
        );
        self.commands.push(Command::CreateTexture { id, desc: *desc });
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
        self.commands.push(Command::DestroyTexture(id));
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        bytes_per_row: u32,
        pixels: &[u8],
    ) {
        self.commands.push(Command::WriteTexture { id, width, height });
        let Some(tex) = self.textures.get_mut(&id) else {
            return;
        };
        let bpp = tex.desc.format.bytes_per_pixel() as usize;
        let dst_pitch = tex.desc.width as usize * bpp;
        let row_bytes = width.min(tex.desc.width) as usize * bpp;
        let rows = height.min(tex.desc.height) as usize;
        for row in 0..rows {
            let src_start = row * bytes_per_row as usize;
            let Some(src) = pixels.get(src_start..src_start + row_bytes) else {
                break;
            };
            let dst_start = row * dst_pitch;
            tex.pixels[dst_start..dst_start + row_bytes].copy_from_slice(src);
        }
    }

    fn bind(&mut self, state: &BindState) {
        self.bound = Some(*state);
        self.commands.push(Command::Bind(*state));
    }

    fn upload_vertices(&mut self, slot: usize, reallocate: Option<u64>, bytes: &[u8]) {
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, Vec::new);
        }
        self.slots[slot].clear();
        self.slots[slot].extend_from_slice(bytes);
        self.commands.push(Command::Upload {
            slot,
            reallocate,
            bytes: bytes.len(),
        });
    }

    fn draw(&mut self, slot: usize, vertex_count: u32) {
        let Some(state) = self.bound else {
            return;
        };
        let byte_len = vertex_count as usize * std::mem::size_of::<Vertex>();
        let vertices = self
            .slots
            .get(slot)
            .and_then(|bytes| bytes.get(..byte_len))
            .map(bytemuck::pod_collect_to_vec::<u8, Vertex>)
            .unwrap_or_default();
        self.commands.push(Command::Draw {
            slot,
            state,
            vertices,
        });
    }

    fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    fn present(&mut self) {
        self.bound = None;
        self.commands.push(Command::Present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::device::TextureFormat;

    fn desc(width: u32, height: u32) -> TextureDesc {
        TextureDesc {
            width,
            height,
            format: TextureFormat::R8,
            renderable: false,
        }
    }

    #[test]
    fn rejects_empty_and_oversized() {
        let mut dev = HeadlessDevice::new(10, 10);
        dev.set_max_texture_size(64);
        assert!(matches!(
            dev.create_texture(TextureId(1), &desc(0, 4), None),
            Err(DeviceError::EmptyTexture { .. })
        ));
        assert!(matches!(
            dev.create_texture(TextureId(1), &desc(65, 4), None),
            Err(DeviceError::TextureTooLarge { limit: 64, .. })
        ));
        assert_eq!(dev.live_textures(), 0);
    }

    #[test]
    fn write_texture_honours_source_pitch() {
        let mut dev = HeadlessDevice::new(10, 10);
        dev.create_texture(TextureId(1), &desc(3, 2), None).unwrap();
        // 3 wide, pitch 4: the padding byte must not land in the texture.
        dev.write_texture(TextureId(1), 3, 2, 4, &[1, 2, 3, 99, 4, 5, 6, 99]);
        assert_eq!(dev.texture_pixels(TextureId(1)), Some(&[1, 2, 3, 4, 5, 6][..]));
    }

    #[test]
    fn draw_without_bind_is_ignored() {
        let mut dev = HeadlessDevice::new(10, 10);
        dev.upload_vertices(0, None, &[0; 96]);
        dev.draw(0, 6);
        assert_eq!(dev.draw_count(), 0);
    }
}
