//! winit event loop: `ApplicationHandler` impl.

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use crate::renderer::Renderer;

use super::App;
use super::scene::Scene;

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() || self.error.is_some() {
            return;
        }
        match Renderer::init(event_loop, &self.config) {
            Ok(mut renderer) => {
                self.scene = Scene::new(&mut renderer);
                if self.scene.is_none() {
                    log::warn!("demo scene could not allocate its sprite sheet");
                }
                renderer.window().request_redraw();
                self.renderer = Some(renderer);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    self.shutdown(event_loop);
                }
            }

            WindowEvent::Resized(_) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.handle_window_resize();
                    renderer.window().request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                let Some(renderer) = &mut self.renderer else {
                    return;
                };
                if let Some(scene) = &mut self.scene {
                    scene.draw(renderer);
                }
                renderer.draw_frame();
                renderer.window().request_redraw();
            }

            _ => {}
        }
    }
}
