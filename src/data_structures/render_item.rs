//! Everything needed to issue one draw call.

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::mesh::Submesh;

#[derive(Clone, Debug)]
pub struct RenderItem {
    /// Object to world transform.
    pub world: Matrix4<f32>,
    /// Slot of this item in every frame resource's object constant buffer.
    pub object_index: u32,
    /// Key of the geometry in the scene.
    pub geometry: String,
    pub submesh: Submesh,
    /// How many frame resources still hold stale constants for this item.
    ///
    /// Each frame resource has its own copy of the object constants, so a
    /// change has to be written once per frame resource.
    pub num_frames_dirty: usize,
}

impl RenderItem {
    pub fn new(
        geometry: &str,
        submesh: Submesh,
        world: Matrix4<f32>,
        object_index: u32,
        frame_count: usize,
    ) -> Self {
        Self {
            world,
            object_index,
            geometry: geometry.to_string(),
            submesh,
            num_frames_dirty: frame_count,
        }
    }

    pub fn identity(geometry: &str, submesh: Submesh, object_index: u32, frame_count: usize) -> Self {
        Self::new(geometry, submesh, Matrix4::identity(), object_index, frame_count)
    }

    pub fn is_dirty(&self) -> bool {
        self.num_frames_dirty > 0
    }

    /// Change the transform; every frame resource has to pick it up again.
    pub fn set_world(&mut self, world: Matrix4<f32>, frame_count: usize) {
        self.world = world;
        self.num_frames_dirty = frame_count;
    }

    /// Record that the current frame resource now holds up-to-date constants.
    pub fn mark_written(&mut self) {
        self.num_frames_dirty = self.num_frames_dirty.saturating_sub(1);
    }
}
