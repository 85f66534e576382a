use crate::settings::Settings;
use crate::viewer::Viewer;

/// What the user asked for this frame. The app applies these to the viewer
/// after the egui pass.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    OpenFiles,
    TogglePlayback,
    SelectAnimation(String),
    SelectSkin(String),
    SetScale(f32),
    SetSpeed(f32),
    SetOverlayScale(f32),
    SetFitToViewport(bool),
    ToggleOverlay(String),
    DetachOverlay(String),
}

#[derive(Default)]
pub struct Ui {
    slot_filter: String,
}

impl Ui {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ctx: &egui::Context, viewer: &Viewer, settings: &mut Settings) -> Vec<UiAction> {
        let mut actions = Vec::new();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button("📁 Open Files").clicked() {
                    actions.push(UiAction::OpenFiles);
                }

                ui.separator();
                ui.label("📋 Windows:");

                if ui
                    .button(if settings.ui.show_slots { "✅ Slots" } else { "⬜ Slots" })
                    .clicked()
                {
                    settings.ui.show_slots = !settings.ui.show_slots;
                }

                if ui
                    .button(if settings.ui.show_texture_panel {
                        "✅ Textures"
                    } else {
                        "⬜ Textures"
                    })
                    .clicked()
                {
                    settings.ui.show_texture_panel = !settings.ui.show_texture_panel;
                }
            });
        });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.show_status(ui, viewer);
                    if viewer.is_loaded() {
                        ui.separator();
                        Self::show_playback(ui, viewer, &mut actions);
                        ui.separator();
                        Self::show_view(ui, viewer, &mut actions);
                        if settings.ui.show_slots {
                            ui.separator();
                            self.show_slots(ui, viewer, &mut actions);
                        }
                    }
                });
            });

        actions
    }

    fn show_status(&self, ui: &mut egui::Ui, viewer: &Viewer) {
        ui.heading("Spine Viewer");
        if viewer.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading…");
            });
        } else if !viewer.is_loaded() {
            ui.label("Drop a .json skeleton, its .atlas and the page images onto the window.");
        }
        if let Some(error) = viewer.error() {
            ui.colored_label(egui::Color32::RED, format!("⚠ {}", error.message()));
        }
        if let Some(warning) = viewer.warning() {
            ui.colored_label(egui::Color32::YELLOW, warning.to_string());
        }
    }

    fn show_playback(ui: &mut egui::Ui, viewer: &Viewer, actions: &mut Vec<UiAction>) {
        ui.label(egui::RichText::new("Playback").strong());

        let animations = viewer.animations();
        if !animations.is_empty() {
            let label = if viewer.is_playing() { "⏸ Pause" } else { "▶ Play" };
            if ui.button(label).clicked() {
                actions.push(UiAction::TogglePlayback);
            }
        }

        combo(
            ui,
            "Animation",
            viewer.current_animation(),
            &animations,
            |name| actions.push(UiAction::SelectAnimation(name)),
        );
        combo(
            ui,
            "Skin",
            viewer.current_skin(),
            &viewer.skins(),
            |name| actions.push(UiAction::SelectSkin(name)),
        );

        let mut speed = viewer.speed();
        if ui
            .add(egui::Slider::new(&mut speed, 0.0..=3.0).text("Speed"))
            .changed()
        {
            actions.push(UiAction::SetSpeed(speed));
        }
    }

    fn show_view(ui: &mut egui::Ui, viewer: &Viewer, actions: &mut Vec<UiAction>) {
        ui.label(egui::RichText::new("View").strong());

        let mut scale = viewer.scale();
        if ui
            .add(egui::Slider::new(&mut scale, 0.1..=2.0).text("Scale"))
            .changed()
        {
            actions.push(UiAction::SetScale(scale));
        }

        let mut fit = viewer.fit_to_viewport();
        if ui.checkbox(&mut fit, "Fit to viewport").changed() {
            actions.push(UiAction::SetFitToViewport(fit));
        }

        let mut overlay_scale = viewer.overlay_scale();
        if ui
            .add(egui::Slider::new(&mut overlay_scale, 0.1..=5.0).text("Marker scale"))
            .changed()
        {
            actions.push(UiAction::SetOverlayScale(overlay_scale));
        }
    }

    fn show_slots(&mut self, ui: &mut egui::Ui, viewer: &Viewer, actions: &mut Vec<UiAction>) {
        ui.label(egui::RichText::new("Slots").strong());
        ui.horizontal(|ui| {
            ui.label("🔍");
            ui.text_edit_singleline(&mut self.slot_filter);
        });

        egui::ScrollArea::vertical()
            .id_salt("slot_list")
            .max_height(240.0)
            .show(ui, |ui| {
                for slot in viewer.filtered_slots(&self.slot_filter) {
                    let mut attached = viewer.is_attached(&slot);
                    if ui.checkbox(&mut attached, &slot).changed() {
                        actions.push(UiAction::ToggleOverlay(slot));
                    }
                }
            });

        let attached = viewer.attached_slots();
        if !attached.is_empty() {
            ui.separator();
            ui.label(egui::RichText::new("Attached").strong());
            for slot in attached {
                ui.horizontal(|ui| {
                    ui.label(&slot);
                    if ui.small_button("✖").clicked() {
                        actions.push(UiAction::DetachOverlay(slot.clone()));
                    }
                });
            }
        }
    }
}

fn combo(
    ui: &mut egui::Ui,
    label: &str,
    selected: Option<&str>,
    names: &[String],
    mut on_select: impl FnMut(String),
) {
    if names.is_empty() {
        return;
    }
    egui::ComboBox::from_label(label)
        .selected_text(selected.unwrap_or("-"))
        .show_ui(ui, |ui| {
            for name in names {
                if ui
                    .selectable_label(selected == Some(name.as_str()), name)
                    .clicked()
                {
                    on_select(name.clone());
                }
            }
        });
}
