use nalgebra_glm as glm;
use tokio::runtime::Handle;

use crate::atlas::{AtlasTransform, Passthrough};
use crate::bundle::DroppedFile;
use crate::error::ViewerError;
use crate::loader::{LoadMessage, LoadOutcome, Loader};
use crate::settings::ViewerSettings;
use crate::texture::TextureManager;

use super::assembler::{Placement, assemble};
use super::entity::ActiveEntity;
use super::overlay::{LiveBinding, update_positions};
use super::ticker::{TickHandle, Ticker};

/// State the per-frame hooks run over.
pub struct Stage {
    pub entity: Option<ActiveEntity>,
}

fn advance_entity(stage: &mut Stage, delta: f32) {
    if let Some(entity) = stage.entity.as_mut() {
        entity.advance(delta);
    }
}

fn reproject_markers(stage: &mut Stage, _delta: f32) {
    if let Some(entity) = stage.entity.as_mut() {
        update_positions(entity);
    }
}

/// Owns the active entity, its overlay index and the surface it is shown on,
/// and turns user controls into mutations on them.
pub struct Viewer {
    settings: ViewerSettings,
    loader: Loader,
    atlas_transform: Box<dyn AtlasTransform>,
    stage: Stage,
    binding: LiveBinding,
    ticker: Ticker<Stage>,
    entity_hooks: Option<[TickHandle; 2]>,
    surface: glm::Vec2,
    requested_scale: f32,
    speed: f32,
    playing: bool,
    fit_to_viewport: bool,
    textures: TextureManager,
    error: Option<ViewerError>,
    warning: Option<ViewerError>,
}

impl Viewer {
    pub fn new(settings: ViewerSettings, runtime: Handle, surface: (f32, f32)) -> Self {
        Self {
            loader: Loader::new(runtime),
            atlas_transform: Box::new(Passthrough),
            stage: Stage { entity: None },
            binding: LiveBinding::new(settings.initial_overlay_scale),
            ticker: Ticker::new(),
            entity_hooks: None,
            surface: glm::vec2(surface.0, surface.1),
            requested_scale: settings.initial_scale,
            speed: settings.initial_speed,
            playing: false,
            fit_to_viewport: settings.fit_to_viewport,
            textures: TextureManager::new(),
            error: None,
            warning: None,
            settings,
        }
    }

    pub fn with_atlas_transform(mut self, transform: Box<dyn AtlasTransform>) -> Self {
        self.atlas_transform = transform;
        self
    }

    // ---- loading ----

    /// Replace whatever is shown with the contents of a new drop.
    pub fn load(&mut self, files: Vec<DroppedFile>) {
        self.teardown();
        self.error = None;
        self.warning = None;
        if let Err(e) = self.loader.begin(files) {
            log::error!("Load rejected: {}", e.message());
            self.error = Some(e);
        }
    }

    /// Drain finished reads; assembles once both documents are in.
    pub fn poll_loads(&mut self) {
        if let Some(outcome) = self.loader.poll() {
            self.finish_load(outcome);
        }
    }

    /// Wait for the load in flight to finish.
    pub async fn wait_for_load(&mut self) {
        if let Some(outcome) = self.loader.next_outcome().await {
            self.finish_load(outcome);
        }
    }

    /// Feed one read completion through the join gate directly.
    pub fn on_document_read(&mut self, message: LoadMessage) {
        if let Some(outcome) = self.loader.accept(message) {
            self.finish_load(outcome);
        }
    }

    pub fn generation(&self) -> u64 {
        self.loader.generation()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    fn finish_load(&mut self, outcome: LoadOutcome) {
        let documents = match outcome {
            LoadOutcome::Ready(documents) => documents,
            LoadOutcome::Failed(e) => {
                self.error = Some(e);
                return;
            }
        };
        let placement = Placement {
            surface: self.surface,
            scale: self.requested_scale,
            speed: self.speed,
        };
        match assemble(documents, self.atlas_transform.as_ref(), placement) {
            Ok(assembly) => {
                self.teardown();
                self.textures = assembly.textures;
                self.playing = assembly.entity.state.current().is_some();
                self.stage.entity = Some(assembly.entity);
                self.entity_hooks = Some([
                    self.ticker.register(advance_entity),
                    self.ticker.register(reproject_markers),
                ]);
                self.apply_scale();
            }
            Err(e) => {
                log::error!("Assembly failed: {}", e.message());
                self.error = Some(e);
            }
        }
    }

    /// Drop the entity, its markers and its hooks.
    fn teardown(&mut self) {
        if let Some(hooks) = self.entity_hooks.take() {
            for hook in hooks {
                self.ticker.deregister(hook);
            }
        }
        self.binding.clear();
        self.stage.entity = None;
        self.textures.clear();
        self.playing = false;
    }

    // ---- per frame ----

    pub fn tick(&mut self, delta: f32) {
        self.ticker.run(&mut self.stage, delta);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let size = glm::vec2(width, height);
        if size == self.surface {
            return;
        }
        self.surface = size;
        if let Some(entity) = self.stage.entity.as_mut() {
            entity.recenter(size);
        }
        self.apply_scale();
    }

    // ---- playback ----

    pub fn play(&mut self) {
        let speed = self.speed;
        if let Some(entity) = self.stage.entity.as_mut() {
            if entity.state.current().is_some() {
                entity.state.time_scale = speed;
                self.playing = true;
            }
        }
    }

    pub fn pause(&mut self) {
        if let Some(entity) = self.stage.entity.as_mut() {
            entity.state.time_scale = 0.0;
            self.playing = false;
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Restart `name` looping at the current speed. Unknown names are rejected.
    pub fn select_animation(&mut self, name: &str) -> bool {
        let speed = self.speed;
        let Some(entity) = self.stage.entity.as_mut() else {
            self.warning = Some(ViewerError::new("no-active-entity"));
            return false;
        };
        let Some(index) = entity.skeleton.data().find_animation(name) else {
            log::warn!("Unknown animation {name}");
            self.warning = Some(ViewerError::new("animation-not-found").with_arg("name", name));
            return false;
        };
        entity.state.set_animation(index, true);
        entity.state.time_scale = speed;
        self.playing = true;
        self.warning = None;
        true
    }

    /// Switch skin. Unknown names keep the current skin and raise a warning.
    pub fn select_skin(&mut self, name: &str) -> bool {
        let Some(entity) = self.stage.entity.as_mut() else {
            self.warning = Some(ViewerError::new("no-active-entity"));
            return false;
        };
        if !entity.skeleton.set_skin_by_name(name) {
            log::warn!("Unknown skin {name}");
            self.warning = Some(ViewerError::new("skin-not-found").with_arg("name", name));
            return false;
        }
        entity.skeleton.update_world_transform();
        self.warning = None;
        true
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.requested_scale = scale;
        self.apply_scale();
    }

    /// Takes effect now when playing, on the next play otherwise.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        if self.playing {
            if let Some(entity) = self.stage.entity.as_mut() {
                entity.state.time_scale = speed;
            }
        }
    }

    pub fn set_overlay_scale(&mut self, scale: f32) {
        self.binding.set_overlay_scale(self.stage.entity.as_mut(), scale);
    }

    pub fn set_fit_to_viewport(&mut self, fit: bool) {
        self.fit_to_viewport = fit;
        self.apply_scale();
    }

    /// Scale that keeps the entity within the fit margin of the surface.
    pub fn fit_scale(&self) -> Option<f32> {
        let entity = self.stage.entity.as_ref()?;
        let bounds = entity.local_bounds();
        let (w, h) = (bounds.width(), bounds.height());
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        Some((self.surface.x / w).min(self.surface.y / h) * self.settings.fit_margin)
    }

    fn effective_scale(&self) -> f32 {
        match (self.fit_to_viewport, self.fit_scale()) {
            (true, Some(fit)) => self.requested_scale.min(fit),
            _ => self.requested_scale,
        }
    }

    fn apply_scale(&mut self) {
        let scale = self.effective_scale();
        if let Some(entity) = self.stage.entity.as_mut() {
            entity.scale = scale;
        }
    }

    // ---- overlays ----

    /// No-op without an entity or when the slot already has a marker.
    pub fn attach_overlay(&mut self, slot: &str) -> bool {
        match self.stage.entity.as_mut() {
            Some(entity) => self.binding.attach(entity, slot),
            None => false,
        }
    }

    pub fn detach_overlay(&mut self, slot: &str) -> bool {
        match self.stage.entity.as_mut() {
            Some(entity) => self.binding.detach(entity, slot),
            None => false,
        }
    }

    /// Attach when the slot has no marker, detach otherwise.
    pub fn toggle_overlay(&mut self, slot: &str) -> bool {
        if self.binding.is_attached(slot) {
            self.detach_overlay(slot)
        } else {
            self.attach_overlay(slot)
        }
    }

    // ---- queries ----

    pub fn entity(&self) -> Option<&ActiveEntity> {
        self.stage.entity.as_ref()
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn is_loaded(&self) -> bool {
        self.stage.entity.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn scale(&self) -> f32 {
        self.requested_scale
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn overlay_scale(&self) -> f32 {
        self.binding.overlay_scale()
    }

    pub fn fit_to_viewport(&self) -> bool {
        self.fit_to_viewport
    }

    pub fn surface(&self) -> (f32, f32) {
        (self.surface.x, self.surface.y)
    }

    pub fn animations(&self) -> Vec<String> {
        self.names(|e| e.skeleton.data().animations.iter().map(|a| a.name.clone()).collect())
    }

    pub fn skins(&self) -> Vec<String> {
        self.names(|e| e.skeleton.data().skins.iter().map(|s| s.name.clone()).collect())
    }

    pub fn slots(&self) -> Vec<String> {
        self.names(|e| e.skeleton.data().slots.iter().map(|s| s.name.clone()).collect())
    }

    /// Slots whose name contains `filter`, ignoring case. Empty filter keeps all.
    pub fn filtered_slots(&self, filter: &str) -> Vec<String> {
        let needle = filter.to_lowercase();
        let mut slots = self.slots();
        slots.retain(|s| s.to_lowercase().contains(&needle));
        slots
    }

    pub fn attached_slots(&self) -> Vec<String> {
        self.names(|e| self.binding.attached_slots(e))
    }

    pub fn is_attached(&self, slot: &str) -> bool {
        self.binding.is_attached(slot)
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.stage.entity.as_ref()?.animation_name()
    }

    pub fn current_skin(&self) -> Option<&str> {
        self.stage.entity.as_ref()?.skin_name()
    }

    pub fn error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    pub fn warning(&self) -> Option<&ViewerError> {
        self.warning.as_ref()
    }

    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    fn names(&self, f: impl FnOnce(&ActiveEntity) -> Vec<String>) -> Vec<String> {
        self.stage.entity.as_ref().map(f).unwrap_or_default()
    }
}
