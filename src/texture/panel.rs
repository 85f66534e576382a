use crate::renderer::StagePainter;
use crate::texture::manager::{TextureManager, TextureStatus};

/// "Textures" window: one row per atlas page and what its image resolved to.
#[derive(Default)]
pub struct TexturePanel {
    preview_page: Option<usize>,
}

impl TexturePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        texture_manager: &TextureManager,
        stage: &StagePainter,
        show_panel: &mut bool,
    ) {
        if !*show_panel {
            return;
        }

        if let Some(page_id) = self.preview_page {
            self.show_preview(ctx, texture_manager, stage, page_id);
        }

        egui::Window::new("Textures")
            .default_width(360.0)
            .default_height(400.0)
            .resizable(true)
            .open(show_panel)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("Pages: {}", texture_manager.textures.len()));
                    ui.separator();
                    ui.colored_label(
                        egui::Color32::GREEN,
                        format!("Resolved: {}", texture_manager.resolved_count()),
                    );
                    ui.separator();
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("Missing: {}", texture_manager.missing_count()),
                    );
                    ui.separator();
                    ui.colored_label(
                        egui::Color32::RED,
                        format!("Errors: {}", texture_manager.error_count()),
                    );
                });

                ui.separator();

                if texture_manager.textures.is_empty() {
                    ui.label("Nothing loaded");
                    return;
                }

                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for texture in &texture_manager.textures {
                            ui.group(|ui| {
                                ui.set_min_width(ui.available_width());
                                ui.horizontal(|ui| {
                                    let radius = 6.0;
                                    let (rect, _response) = ui.allocate_exact_size(
                                        egui::vec2(radius * 2.0, radius * 2.0),
                                        egui::Sense::hover(),
                                    );
                                    ui.painter().circle_filled(
                                        rect.center(),
                                        radius,
                                        texture.status_color(),
                                    );
                                    ui.label(&texture.page_name);
                                });

                                ui.horizontal(|ui| {
                                    ui.label("Status:");
                                    ui.colored_label(texture.status_color(), texture.status_text());
                                });

                                if texture.is_resolved() && ui.button("Show").clicked() {
                                    self.preview_page = Some(texture.page_id);
                                }
                            });
                            ui.add_space(4.0);
                        }
                    });
            });
    }

    fn show_preview(
        &mut self,
        ctx: &egui::Context,
        texture_manager: &TextureManager,
        stage: &StagePainter,
        page_id: usize,
    ) {
        let mut is_open = true;
        let title = texture_manager
            .get_texture(page_id)
            .map_or_else(|| format!("Page {page_id}"), |t| t.page_name.clone());

        egui::Window::new(title)
            .id(egui::Id::new(("page-preview", page_id)))
            .default_width(400.0)
            .resizable(true)
            .open(&mut is_open)
            .show(ctx, |ui| match stage.page_texture(page_id) {
                Some(texture) => {
                    let size = texture.size_vec2();
                    let fit = (ui.available_width() / size.x).min(1.0);
                    ui.image(egui::load::SizedTexture::new(texture.id(), size * fit));
                }
                None => {
                    let reason = match texture_manager.get_texture(page_id).map(|t| &t.status) {
                        Some(TextureStatus::Failed(err)) => err.clone(),
                        _ => "Not uploaded yet".to_string(),
                    };
                    ui.colored_label(egui::Color32::RED, reason);
                }
            });

        if !is_open {
            self.preview_page = None;
        }
    }
}
