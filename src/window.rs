//! Window creation and wgpu-backed renderer start-up.

use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window, WindowAttributes};

use crate::config::{Config, WindowConfig};
use crate::error::InitError;
use crate::gpu::WgpuDevice;
use crate::renderer::Renderer;

/// Window attributes for `config`: initial size is the presentation target
/// scaled by `scale`, and the window never shrinks below one target.
pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    let scale = config.effective_scale();
    let attrs = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(
            config.width.saturating_mul(scale),
            config.height.saturating_mul(scale),
        ))
        .with_min_inner_size(PhysicalSize::new(config.width, config.height));
    if config.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

impl Renderer<WgpuDevice> {
    /// Open the window, bring up the GPU and allocate the presentation
    /// target. Any failure is fatal and logged.
    pub fn init(event_loop: &ActiveEventLoop, config: &Config) -> Result<Self, InitError> {
        let result = Self::try_init(event_loop, config);
        if let Err(e) = &result {
            log::error!("renderer init failed: {e}");
        }
        result
    }

    fn try_init(event_loop: &ActiveEventLoop, config: &Config) -> Result<Self, InitError> {
        let window = Arc::new(event_loop.create_window(window_attributes(&config.window))?);
        let device = WgpuDevice::new(window, config.graphics.tier, config.window.vsync)?;
        Self::new(
            device,
            &config.graphics,
            config.window.width,
            config.window.height,
        )
    }

    pub fn window(&self) -> &Arc<Window> {
        self.device().window()
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::Size;

    use super::*;

    #[test]
    fn initial_size_is_scaled_target() {
        let attrs = window_attributes(&WindowConfig::default());
        assert_eq!(attrs.title, "blitcore");
        assert_eq!(
            attrs.inner_size,
            Some(Size::Physical(PhysicalSize::new(640, 480)))
        );
        assert_eq!(
            attrs.min_inner_size,
            Some(Size::Physical(PhysicalSize::new(320, 240)))
        );
        assert!(attrs.fullscreen.is_none());
    }

    #[test]
    fn fullscreen_is_borderless() {
        let config = WindowConfig {
            fullscreen: true,
            ..WindowConfig::default()
        };
        let attrs = window_attributes(&config);
        assert_eq!(attrs.fullscreen, Some(Fullscreen::Borderless(None)));
    }
}
