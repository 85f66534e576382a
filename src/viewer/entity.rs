use nalgebra_glm as glm;

use crate::atlas::TextureAtlas;
use crate::skeleton::{AnimationState, Bounds, Skeleton};

use super::overlay::OverlayMarker;

/// The one posed, drawable skeleton built from the current drop.
pub struct ActiveEntity {
    /// Load generation this entity came from.
    pub generation: u64,
    pub skeleton: Skeleton,
    pub state: AnimationState,
    /// Pages with their decoded images, for the painter.
    pub atlas: TextureAtlas,
    /// Surface-space point the pivot is drawn at.
    pub position: glm::Vec2,
    /// Centre of the local bounding box.
    pub pivot: glm::Vec2,
    pub scale: f32,
    /// Overlay markers, children of this entity.
    pub markers: Vec<OverlayMarker>,
}

impl ActiveEntity {
    pub fn new(generation: u64, skeleton: Skeleton, state: AnimationState, atlas: TextureAtlas) -> Self {
        Self {
            generation,
            skeleton,
            state,
            atlas,
            position: glm::vec2(0.0, 0.0),
            pivot: glm::vec2(0.0, 0.0),
            scale: 1.0,
            markers: Vec::new(),
        }
    }

    /// Entity-local point to surface space.
    pub fn to_surface(&self, local: glm::Vec2) -> glm::Vec2 {
        self.position + (local - self.pivot) * self.scale
    }

    pub fn local_bounds(&self) -> Bounds {
        self.skeleton.bounds()
    }

    /// Move the pivot to the current bounds centre and the entity to the surface centre.
    pub fn recenter(&mut self, surface: glm::Vec2) {
        self.pivot = self.local_bounds().center();
        self.position = surface * 0.5;
    }

    /// Advance playback and re-solve the pose.
    pub fn advance(&mut self, delta: f32) {
        self.state.update(delta);
        self.state.apply(&mut self.skeleton);
        self.skeleton.update_world_transform();
    }

    pub fn animation_name(&self) -> Option<&str> {
        let index = self.state.current()?;
        self.skeleton
            .data()
            .animations
            .get(index)
            .map(|a| a.name.as_str())
    }

    pub fn skin_name(&self) -> Option<&str> {
        self.skeleton.skin_name()
    }
}
