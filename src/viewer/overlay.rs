use std::collections::HashMap;

use nalgebra_glm as glm;

use super::entity::ActiveEntity;

/// Filled, labelled circle pinned to a slot's bone.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMarker {
    pub slot: String,
    slot_index: usize,
    pub local_scale: f32,
    /// Bone world position in entity-local space. Refreshed every tick.
    pub position: glm::Vec2,
}

/// Slot name to marker index over the markers the active entity owns.
#[derive(Debug)]
pub struct LiveBinding {
    index: HashMap<String, usize>,
    overlay_scale: f32,
}

impl LiveBinding {
    pub fn new(overlay_scale: f32) -> Self {
        Self {
            index: HashMap::new(),
            overlay_scale,
        }
    }

    pub fn overlay_scale(&self) -> f32 {
        self.overlay_scale
    }

    pub fn is_attached(&self, slot: &str) -> bool {
        self.index.contains_key(slot)
    }

    /// Attached slot names in the entity's slot order.
    pub fn attached_slots(&self, entity: &ActiveEntity) -> Vec<String> {
        entity
            .skeleton
            .data()
            .slots
            .iter()
            .filter(|s| self.index.contains_key(&s.name))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Create a marker for `slot`. `false` when it already has one or the
    /// entity has no such slot.
    pub fn attach(&mut self, entity: &mut ActiveEntity, slot: &str) -> bool {
        if self.index.contains_key(slot) {
            return false;
        }
        let Some(slot_index) = entity.skeleton.data().find_slot(slot) else {
            log::warn!("Cannot attach overlay: no slot named {slot}");
            return false;
        };
        let mut marker = OverlayMarker {
            slot: slot.to_string(),
            slot_index,
            local_scale: self.overlay_scale,
            position: glm::vec2(0.0, 0.0),
        };
        if let Some(position) = slot_position(entity, slot_index) {
            marker.position = position;
        }
        entity.markers.push(marker);
        self.index.insert(slot.to_string(), entity.markers.len() - 1);
        true
    }

    /// Remove the marker for `slot`; `false` if there was none.
    pub fn detach(&mut self, entity: &mut ActiveEntity, slot: &str) -> bool {
        let Some(index) = self.index.remove(slot) else {
            return false;
        };
        entity.markers.swap_remove(index);
        if let Some(moved) = entity.markers.get(index) {
            if let Some(entry) = self.index.get_mut(&moved.slot) {
                *entry = index;
            }
        }
        true
    }

    /// Forget every marker. The entity is being torn down.
    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// Rescale every attached marker and remember the value for later attachments.
    pub fn set_overlay_scale(&mut self, entity: Option<&mut ActiveEntity>, scale: f32) {
        self.overlay_scale = scale;
        if let Some(entity) = entity {
            for marker in &mut entity.markers {
                marker.local_scale = scale;
            }
        }
    }
}

/// Re-project every marker onto its slot bone. Runs every frame, so it only
/// writes positions in place.
pub fn update_positions(entity: &mut ActiveEntity) {
    let ActiveEntity {
        skeleton, markers, ..
    } = entity;
    for marker in markers.iter_mut() {
        let bone = skeleton
            .data()
            .slots
            .get(marker.slot_index)
            .and_then(|slot| skeleton.bones.get(slot.bone));
        // missing bone: leave the marker where it was
        if let Some(bone) = bone {
            marker.position = bone.world_position;
        }
    }
}

fn slot_position(entity: &ActiveEntity, slot_index: usize) -> Option<glm::Vec2> {
    let slot = entity.skeleton.data().slots.get(slot_index)?;
    entity
        .skeleton
        .bones
        .get(slot.bone)
        .map(|b| b.world_position)
}
