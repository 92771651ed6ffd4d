//! Demo application: one window, one renderer, one scene.

mod event_loop;
mod font;
mod scene;

use winit::event_loop::{ActiveEventLoop, EventLoop};

use crate::config::Config;
use crate::error::InitError;
use crate::gpu::WgpuDevice;
use crate::renderer::Renderer;

use self::scene::Scene;

pub struct App {
    config: Config,
    renderer: Option<Renderer<WgpuDevice>>,
    scene: Option<Scene>,
    error: Option<InitError>,
}

impl App {
    /// Run the demo until the window closes. Returns the start-up error if
    /// the renderer could not be brought up.
    pub fn run(config: Config) -> Result<(), InitError> {
        let event_loop = EventLoop::new()?;
        let mut app = Self {
            config,
            renderer: None,
            scene: None,
            error: None,
        };
        if let Err(e) = event_loop.run_app(&mut app) {
            log::error!("event loop: {e}");
        }
        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Release the scene and the renderer, then leave the event loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut renderer) = self.renderer.take() {
            if let Some(scene) = self.scene.take() {
                scene.release(&mut renderer);
            }
            drop(renderer.deinit());
        }
        event_loop.exit();
    }
}
