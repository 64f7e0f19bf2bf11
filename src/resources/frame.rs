//! Per-frame GPU resources.
//!
//! Everything the CPU rewrites every frame is owned by a [`FrameResource`].
//! Several of them rotate in a [`FrameRing`](crate::sync::FrameRing) so the
//! CPU can prepare one frame while the GPU still renders earlier ones.

use crate::{
    data_structures::vertex::ColorVertex,
    pipelines::layouts::ConstantLayouts,
    resources::upload::UploadBuffer,
};

/// Constants that differ between render items.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
}

impl Default for ObjectConstants {
    fn default() -> Self {
        use cgmath::SquareMatrix;
        Self {
            world: cgmath::Matrix4::identity().into(),
        }
    }
}

/// Constants shared by every draw of a frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassConstants {
    pub view: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub eye_pos_w: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    pub _padding: f32,
    pub render_target_size: [f32; 2],
    pub inv_render_target_size: [f32; 2],
    pub near_z: f32,
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
}

impl Default for PassConstants {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

#[derive(Debug)]
pub struct FrameResource {
    objects: UploadBuffer<ObjectConstants>,
    pass: UploadBuffer<PassConstants>,
    waves: Option<UploadBuffer<ColorVertex>>,
    pub object_bind_group: wgpu::BindGroup,
    pub pass_bind_group: wgpu::BindGroup,
}

impl FrameResource {
    /// # Arguments
    ///
    /// * `object_count` is the number of render items in the scene
    /// * `wave_vertex_count` is the size of the per-frame vertex buffer, if the scene animates one
    pub fn new(
        device: &wgpu::Device,
        layouts: &ConstantLayouts,
        index: usize,
        object_count: u32,
        wave_vertex_count: Option<u32>,
    ) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let objects = UploadBuffer::new(
            device,
            &format!("Object Constants {}", index),
            object_count,
            wgpu::BufferUsages::UNIFORM,
            alignment,
        );
        let pass = UploadBuffer::new(
            device,
            &format!("Pass Constants {}", index),
            1,
            wgpu::BufferUsages::UNIFORM,
            alignment,
        );
        let waves = wave_vertex_count.map(|count| {
            UploadBuffer::new(
                device,
                &format!("Waves Vertex Buffer {}", index),
                count,
                wgpu::BufferUsages::VERTEX,
                1,
            )
        });

        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.object,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: objects.element_binding(),
            }],
            label: Some(&format!("object_bind_group_{}", index)),
        });
        let pass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.pass,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: pass.element_binding(),
            }],
            label: Some(&format!("pass_bind_group_{}", index)),
        });

        Self {
            objects,
            pass,
            waves,
            object_bind_group,
            pass_bind_group,
        }
    }

    /// Dynamic offset selecting the constants of render item `object_index`.
    pub fn object_offset(&self, object_index: u32) -> wgpu::DynamicOffset {
        (object_index as u64 * self.objects.stride()) as wgpu::DynamicOffset
    }

    pub fn write_object(&mut self, object_index: u32, constants: &ObjectConstants) -> anyhow::Result<()> {
        self.objects.copy_data(object_index, constants)
    }

    pub fn write_pass(&mut self, constants: &PassConstants) -> anyhow::Result<()> {
        self.pass.copy_data(0, constants)
    }

    pub fn write_wave_vertices(&mut self, vertices: &[ColorVertex]) -> anyhow::Result<()> {
        match &mut self.waves {
            Some(waves) => waves.copy_slice(vertices),
            None => anyhow::bail!("This frame resource has no wave vertex buffer"),
        }
    }

    pub fn wave_vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.waves.as_ref().map(|waves| waves.buffer())
    }

    /// Whether every staging buffer of this frame can be written by the CPU.
    pub fn is_writable(&self) -> bool {
        self.objects.is_writable()
            && self.pass.is_writable()
            && self.waves.as_ref().is_none_or(|waves| waves.is_writable())
    }

    /// Copy this frame's CPU writes into the buffers the shaders read.
    pub fn record_uploads(&mut self, encoder: &mut wgpu::CommandEncoder) {
        self.objects.record_upload(encoder);
        self.pass.record_upload(encoder);
        if let Some(waves) = &mut self.waves {
            waves.record_upload(encoder);
        }
    }

    pub fn after_submit(&mut self) {
        self.objects.after_submit();
        self.pass.after_submit();
        if let Some(waves) = &mut self.waves {
            waves.after_submit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_layouts_match_the_shader() {
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 64);
        // six matrices, eye position + pad, two vec2 and four scalars
        assert_eq!(std::mem::size_of::<PassConstants>(), 6 * 64 + 16 + 16 + 16);
        assert_eq!(std::mem::size_of::<ColorVertex>(), 28);
    }
}
