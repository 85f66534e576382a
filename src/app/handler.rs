use std::sync::Arc;

use tokio::runtime::Runtime;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::app::app::App;
use crate::bundle::DroppedFile;

pub struct AppHandler {
    pub app: Option<App>,
    /// Files named on the command line, opened as one drop once the window exists.
    pub initial_files: Vec<DroppedFile>,
    pub runtime: Runtime,
}

impl AppHandler {
    pub fn new(runtime: Runtime, initial_files: Vec<DroppedFile>) -> Self {
        Self {
            app: None,
            initial_files,
            runtime,
        }
    }
}

impl ApplicationHandler for AppHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Spine Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(1200.0, 800.0));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let runtime_handle = self.runtime.handle().clone();
        match self.runtime.block_on(App::new(window, runtime_handle)) {
            Ok(mut app) => {
                app.open(std::mem::take(&mut self.initial_files));
                self.app = Some(app);
            }
            Err(e) => {
                log::error!("Failed to start viewer: {}", e.message());
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
        if let Some(app) = &mut self.app {
            let response = app.handle_event(&event);
            if response.repaint {
                app.window.request_redraw();
            }
            if response.exit {
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(app) = &mut self.app {
            // every DroppedFile event of this iteration has been delivered by now
            app.flush_drop();

            match app.render() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    app.resize_surface();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Surface out of memory");
                    event_loop.exit();
                }
                Err(e) => log::warn!("Render error: {e:?}"),
            }
            app.window.request_redraw();
        }
    }
}
