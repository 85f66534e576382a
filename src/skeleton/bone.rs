// Bone local pose and world transform

use nalgebra_glm as glm;

use super::data::BoneData;

/// Animated local pose of one bone plus its solved world transform.
#[derive(Debug, Clone)]
pub struct Bone {
    pub parent: Option<usize>,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub shear_x: f32,
    pub shear_y: f32,
    /// Columns are the bone's world x and y axes.
    pub world_matrix: glm::Mat2,
    pub world_position: glm::Vec2,
}

impl Bone {
    pub fn new(data: &BoneData) -> Self {
        let mut bone = Self {
            parent: data.parent,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            shear_x: 0.0,
            shear_y: 0.0,
            world_matrix: glm::Mat2::identity(),
            world_position: glm::vec2(0.0, 0.0),
        };
        bone.set_to_setup_pose(data);
        bone
    }

    pub fn set_to_setup_pose(&mut self, data: &BoneData) {
        self.x = data.x;
        self.y = data.y;
        self.rotation = data.rotation;
        self.scale_x = data.scale_x;
        self.scale_y = data.scale_y;
        self.shear_x = data.shear_x;
        self.shear_y = data.shear_y;
    }

    /// Local rotation, scale and shear as a 2x2 matrix.
    pub fn local_matrix(&self) -> glm::Mat2 {
        let rx = (self.rotation + self.shear_x).to_radians();
        let ry = (self.rotation + 90.0 + self.shear_y).to_radians();
        glm::mat2(
            rx.cos() * self.scale_x,
            ry.cos() * self.scale_y,
            rx.sin() * self.scale_x,
            ry.sin() * self.scale_y,
        )
    }

    /// Solve a root bone against the skeleton's own placement.
    pub fn update_root(&mut self, skeleton_scale: glm::Vec2, skeleton_position: glm::Vec2) {
        let flip = glm::mat2(skeleton_scale.x, 0.0, 0.0, skeleton_scale.y);
        self.world_matrix = flip * self.local_matrix();
        self.world_position = flip * glm::vec2(self.x, self.y) + skeleton_position;
    }

    /// Solve a child bone. Only the normal inherit mode is supported.
    pub fn update_child(&mut self, parent_matrix: &glm::Mat2, parent_position: &glm::Vec2) {
        self.world_matrix = parent_matrix * self.local_matrix();
        self.world_position = parent_matrix * glm::vec2(self.x, self.y) + parent_position;
    }

    /// Bone-space point to world space.
    pub fn local_to_world(&self, x: f32, y: f32) -> glm::Vec2 {
        self.world_matrix * glm::vec2(x, y) + self.world_position
    }

    pub fn world_x(&self) -> f32 {
        self.world_position.x
    }

    pub fn world_y(&self) -> f32 {
        self.world_position.y
    }
}
