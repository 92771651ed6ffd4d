//! Surface creation, destruction and CPU access.

use crate::error::DeviceError;
use crate::gpu::{RenderDevice, TextureDesc, TextureFormat, TextureId};

use super::{LockBuffer, Renderer, SurfaceEntry};

/// An off-screen RGBA render target. Cheap to copy; identity is the device
/// texture it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub(crate) TextureId);

/// Scale colour channels by alpha in place: `c = c * a / 255`, truncating.
pub fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = (u16::from(*c) * a / 255) as u8;
        }
    }
}

impl<D: RenderDevice> Renderer<D> {
    pub(super) fn allocate_surface(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<SurfaceHandle, DeviceError> {
        let id = self.batch.alloc_texture_id();
        let desc = TextureDesc {
            width,
            height,
            format: TextureFormat::Rgba8,
            renderable: true,
        };
        self.batch.device.create_texture(id, &desc, None)?;

        let handle = SurfaceHandle(id);
        self.surfaces.insert(
            handle,
            SurfaceEntry {
                width,
                height,
                lock: None,
            },
        );
        Ok(handle)
    }

    /// Allocate a `width × height` surface, cleared to transparent black.
    pub fn create_surface(&mut self, width: u32, height: u32) -> Option<SurfaceHandle> {
        match self.allocate_surface(width, height) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("create_surface {width}x{height} failed: {e}");
                None
            }
        }
    }

    /// Release a surface. Pending draws that use it are flushed first. The
    /// presentation target cannot be freed this way.
    pub fn free_surface(&mut self, surface: SurfaceHandle) {
        if surface == self.framebuffer {
            log::warn!("free_surface: ignoring attempt to free the presentation target");
            return;
        }
        if self.surfaces.remove(&surface).is_none() {
            return;
        }
        if self.glyph_target == Some(surface) {
            self.glyph_target = None;
        }
        self.batch.destroy_texture(surface.0);
    }

    /// Size of a live surface.
    pub fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        self.surfaces.get(&surface).map(|s| (s.width, s.height))
    }

    /// Hand out a zeroed `width × height` RGBA host buffer for `surface`, and
    /// its pitch in bytes (`width * 4`). Locking again discards the previous
    /// buffer.
    pub fn lock_surface(
        &mut self,
        surface: SurfaceHandle,
        width: u32,
        height: u32,
    ) -> Option<(&mut [u8], usize)> {
        let entry = self.surfaces.get_mut(&surface)?;
        let pitch = width as usize * 4;
        let lock = entry.lock.insert(LockBuffer {
            pixels: vec![0; pitch * height as usize],
            width,
            height,
        });
        Some((lock.pixels.as_mut_slice(), pitch))
    }

    /// Premultiply the locked buffer and upload its top-left
    /// `width × height` region (clipped to the surface and the buffer).
    /// Does nothing if the surface is not locked.
    pub fn unlock_surface(&mut self, surface: SurfaceHandle, width: u32, height: u32) {
        let Some(entry) = self.surfaces.get_mut(&surface) else {
            return;
        };
        let Some(mut lock) = entry.lock.take() else {
            return;
        };
        let (surface_w, surface_h) = (entry.width, entry.height);

        self.batch.flush_if_active(surface.0);

        premultiply(&mut lock.pixels);
        let w = width.min(lock.width).min(surface_w);
        let h = height.min(lock.height).min(surface_h);
        if w == 0 || h == 0 {
            return;
        }
        self.batch
            .device
            .write_texture(surface.0, w, h, lock.width * 4, &lock.pixels);
    }

    /// Surface contents are never lost.
    pub fn is_surface_lost(&self, _surface: SurfaceHandle) -> bool {
        false
    }

    pub fn restore_surface(&mut self, _surface: SurfaceHandle) {}
}
