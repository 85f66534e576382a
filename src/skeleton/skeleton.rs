use std::sync::Arc;

use nalgebra_glm as glm;

use super::bone::Bone;
use super::data::{Attachment, MeshVertices, SkeletonData};

/// Axis-aligned box in skeleton world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: glm::Vec2,
    pub max: glm::Vec2,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min: glm::vec2(f32::MAX, f32::MAX),
            max: glm::vec2(f32::MIN, f32::MIN),
        }
    }

    fn include(&mut self, x: f32, y: f32) {
        self.min.x = self.min.x.min(x);
        self.min.y = self.min.y.min(y);
        self.max.x = self.max.x.max(x);
        self.max.y = self.max.y.max(y);
    }

    fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> glm::Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Posed instance of a [`SkeletonData`]. World space is y-down.
#[derive(Debug, Clone)]
pub struct Skeleton {
    data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
    /// Attachment name currently shown by each slot.
    slot_attachments: Vec<Option<String>>,
    skin: Option<usize>,
    pub position: glm::Vec2,
    pub scale: glm::Vec2,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>) -> Self {
        let bones = data.bones.iter().map(Bone::new).collect();
        let slot_attachments = data.slots.iter().map(|s| s.attachment.clone()).collect();
        let mut skeleton = Self {
            data,
            bones,
            slot_attachments,
            skin: None,
            position: glm::vec2(0.0, 0.0),
            scale: glm::vec2(1.0, -1.0),
        };
        skeleton.update_world_transform();
        skeleton
    }

    pub fn data(&self) -> &SkeletonData {
        &self.data
    }

    pub fn shared_data(&self) -> Arc<SkeletonData> {
        self.data.clone()
    }

    pub fn skin_name(&self) -> Option<&str> {
        self.skin.map(|i| self.data.skins[i].name.as_str())
    }

    /// Switch skin and put every slot back on its setup attachment.
    pub fn set_skin(&mut self, skin: usize) {
        if skin < self.data.skins.len() {
            self.skin = Some(skin);
            self.set_slots_to_setup_pose();
        }
    }

    /// `false` when no skin has that name; the current skin stays.
    pub fn set_skin_by_name(&mut self, name: &str) -> bool {
        match self.data.find_skin(name) {
            Some(skin) => {
                self.set_skin(skin);
                true
            }
            None => false,
        }
    }

    pub fn set_bones_to_setup_pose(&mut self) {
        for (bone, data) in self.bones.iter_mut().zip(&self.data.bones) {
            bone.set_to_setup_pose(data);
        }
    }

    pub fn set_slots_to_setup_pose(&mut self) {
        for (current, slot) in self.slot_attachments.iter_mut().zip(&self.data.slots) {
            current.clone_from(&slot.attachment);
        }
    }

    pub fn set_attachment(&mut self, slot: usize, name: Option<String>) {
        if let Some(current) = self.slot_attachments.get_mut(slot) {
            *current = name;
        }
    }

    /// Resolve the slot's attachment name through the active skin, then the default skin.
    pub fn attachment(&self, slot: usize) -> Option<&Attachment> {
        let name = self.slot_attachments.get(slot)?.as_deref()?;
        self.skin
            .and_then(|s| self.data.skins[s].get(slot, name))
            .or_else(|| {
                self.data
                    .default_skin
                    .and_then(|s| self.data.skins[s].get(slot, name))
            })
    }

    pub fn update_world_transform(&mut self) {
        for index in 0..self.bones.len() {
            match self.bones[index].parent {
                // parents precede children, so the parent is already solved
                Some(parent) => {
                    let (matrix, position) = {
                        let p = &self.bones[parent];
                        (p.world_matrix, p.world_position)
                    };
                    self.bones[index].update_child(&matrix, &position);
                }
                None => {
                    let (scale, position) = (self.scale, self.position);
                    self.bones[index].update_root(scale, position);
                }
            }
        }
    }

    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        self.data.find_bone(name).map(|i| &self.bones[i])
    }

    /// World x,y pairs of `attachment` as worn by `slot`, written into `out`.
    pub fn world_vertices(&self, slot: usize, attachment: &Attachment, out: &mut Vec<f32>) {
        out.clear();
        let bone = &self.bones[self.data.slots[slot].bone];
        match attachment {
            Attachment::Region(region) => {
                for pair in region.offset.chunks_exact(2) {
                    let p = bone.local_to_world(pair[0], pair[1]);
                    out.extend([p.x, p.y]);
                }
            }
            Attachment::Mesh(mesh) => match &mesh.vertices {
                MeshVertices::Unweighted(vertices) => {
                    for pair in vertices.chunks_exact(2) {
                        let p = bone.local_to_world(pair[0], pair[1]);
                        out.extend([p.x, p.y]);
                    }
                }
                MeshVertices::Weighted(vertices) => {
                    for influences in vertices {
                        let mut p = glm::vec2(0.0, 0.0);
                        for w in influences {
                            p += self.bones[w.bone].local_to_world(w.x, w.y) * w.weight;
                        }
                        out.extend([p.x, p.y]);
                    }
                }
            },
        }
    }

    /// Box around every visible attachment, or around the bones when nothing is attached.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        let mut scratch = Vec::new();
        for slot in 0..self.data.slots.len() {
            if let Some(attachment) = self.attachment(slot) {
                self.world_vertices(slot, attachment, &mut scratch);
                for pair in scratch.chunks_exact(2) {
                    bounds.include(pair[0], pair[1]);
                }
            }
        }
        if bounds.is_empty() {
            for bone in &self.bones {
                bounds.include(bone.world_x(), bone.world_y());
            }
        }
        if bounds.is_empty() {
            bounds.include(self.position.x, self.position.y);
        }
        bounds
    }
}
