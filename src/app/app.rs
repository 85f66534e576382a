use std::sync::Arc;
use std::time::Instant;

use egui_wgpu::ScreenDescriptor;
use egui_winit::State;
use tokio::runtime::Handle;
use winit::window::Window;

use crate::bundle::DroppedFile;
use crate::error::ViewerError;
use crate::renderer::{Renderer, StagePainter};
use crate::settings::Settings;
use crate::texture::TexturePanel;
use crate::ui::{Ui, UiAction};
use crate::viewer::Viewer;

pub struct EventResponse {
    pub repaint: bool,
    pub exit: bool,
}

pub struct App {
    pub window: Arc<Window>,
    ui: Ui,
    renderer: Renderer,
    egui_state: State,
    viewer: Viewer,
    stage: StagePainter,
    texture_panel: TexturePanel,
    settings: Settings,
    /// Files dropped since the last frame; one drop gesture arrives as one event per file.
    pending_drop: Vec<DroppedFile>,
    last_frame: Instant,
}

impl App {
    pub async fn new(window: Arc<Window>, runtime: Handle) -> Result<Self, ViewerError> {
        let mut renderer = Renderer::new(window.clone()).await?;
        let egui_ctx = renderer.egui_context();

        let egui_state = State::new(
            egui_ctx,
            egui::viewport::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let settings = Settings::load();
        renderer.set_clear_color(settings.viewer.background_color);

        let size = window.inner_size();
        let viewer = Viewer::new(
            settings.viewer.clone(),
            runtime,
            (size.width as f32, size.height as f32),
        );

        Ok(Self {
            window,
            ui: Ui::new(),
            renderer,
            egui_state,
            viewer,
            stage: StagePainter::new(),
            texture_panel: TexturePanel::new(),
            settings,
            pending_drop: Vec::new(),
            last_frame: Instant::now(),
        })
    }

    /// Start loading `files` as if they had been dropped together.
    pub fn open(&mut self, files: Vec<DroppedFile>) {
        if !files.is_empty() {
            self.viewer.load(files);
        }
    }

    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> EventResponse {
        let egui_response = self.egui_state.on_window_event(&self.window, event);

        match event {
            winit::event::WindowEvent::CloseRequested => {
                return EventResponse {
                    repaint: false,
                    exit: true,
                };
            }
            winit::event::WindowEvent::KeyboardInput { event, .. } => {
                if !egui_response.consumed
                    && event.logical_key
                        == winit::keyboard::Key::Named(winit::keyboard::NamedKey::Escape)
                {
                    return EventResponse {
                        repaint: false,
                        exit: true,
                    };
                }
            }
            winit::event::WindowEvent::Resized(size) => {
                self.renderer.resize(*size);
            }
            winit::event::WindowEvent::DroppedFile(path) => {
                log::debug!("Dropped {}", path.display());
                self.pending_drop.push(DroppedFile::from_path(path));
            }
            _ => {}
        }

        EventResponse {
            repaint: egui_response.repaint,
            exit: false,
        }
    }

    /// Hand the files collected since the last flush to the viewer as one drop.
    pub fn flush_drop(&mut self) {
        if !self.pending_drop.is_empty() {
            let files = std::mem::take(&mut self.pending_drop);
            log::info!("Drop of {} file(s)", files.len());
            self.viewer.load(files);
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.viewer.poll_loads();
        if !self.viewer.is_loaded() {
            self.stage.clear();
        }

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.viewer.tick(delta);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let egui_ctx = self.renderer.egui_context();

        let mut actions = Vec::new();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            actions = self.ui.show(ctx, &self.viewer, &mut self.settings);

            self.texture_panel.show(
                ctx,
                self.viewer.textures(),
                &self.stage,
                &mut self.settings.ui.show_texture_panel,
            );

            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    let rect = ui.max_rect();
                    self.viewer.resize(rect.width(), rect.height());
                    if let Some(entity) = self.viewer.entity() {
                        self.stage.paint(ui, rect, entity, self.viewer.settings());
                    }
                });
        });

        for action in actions {
            self.dispatch(action);
        }

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let size = self.window.inner_size();
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        self.renderer
            .render(paint_jobs, full_output.textures_delta, screen_descriptor)
    }

    pub fn resize_surface(&mut self) {
        self.renderer.resize(self.window.inner_size());
    }

    fn dispatch(&mut self, action: UiAction) {
        match action {
            UiAction::OpenFiles => {
                if let Some(paths) = rfd::FileDialog::new()
                    .add_filter("Spine assets", &["json", "atlas", "png", "jpg", "jpeg", "bmp"])
                    .pick_files()
                {
                    self.open(paths.into_iter().map(DroppedFile::from_path).collect());
                }
            }
            UiAction::TogglePlayback => self.viewer.toggle_playback(),
            UiAction::SelectAnimation(name) => {
                self.viewer.select_animation(&name);
            }
            UiAction::SelectSkin(name) => {
                self.viewer.select_skin(&name);
            }
            UiAction::SetScale(scale) => self.viewer.set_scale(scale),
            UiAction::SetSpeed(speed) => self.viewer.set_speed(speed),
            UiAction::SetOverlayScale(scale) => self.viewer.set_overlay_scale(scale),
            UiAction::SetFitToViewport(fit) => self.viewer.set_fit_to_viewport(fit),
            UiAction::ToggleOverlay(slot) => {
                self.viewer.toggle_overlay(&slot);
            }
            UiAction::DetachOverlay(slot) => {
                self.viewer.detach_overlay(&slot);
            }
        }
    }
}
