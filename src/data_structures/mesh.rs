//! GPU-resident geometry shared by several render items.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::data_structures::geometry::MeshBuilder;

/// A region of a concatenated vertex/index buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Submesh {
    pub index_count: u32,
    pub start_index: u32,
    pub base_vertex: i32,
}

impl Submesh {
    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.start_index..self.start_index + self.index_count
    }
}

/// Vertex and index buffers plus the named submeshes they contain.
///
/// `vertex_buffer` is `None` for geometry whose vertices change every frame;
/// those live in the frame resources instead.
#[derive(Debug)]
pub struct MeshGeometry {
    pub name: String,
    pub vertex_buffer: Option<wgpu::Buffer>,
    pub index_buffer: wgpu::Buffer,
    pub index_format: wgpu::IndexFormat,
    pub vertex_count: u32,
    pub draw_args: HashMap<String, Submesh>,
}

impl MeshGeometry {
    /// Upload everything the builder collected into static buffers.
    pub fn upload(device: &wgpu::Device, name: &str, builder: MeshBuilder) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&builder.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = mk_index_buffer(device, name, &builder.indices);
        Self {
            name: name.to_string(),
            vertex_buffer: Some(vertex_buffer),
            index_buffer,
            index_format: wgpu::IndexFormat::Uint16,
            vertex_count: builder.vertices.len() as u32,
            draw_args: builder.draw_args,
        }
    }

    /// Geometry with a static index buffer and per-frame vertices.
    pub fn dynamic(
        device: &wgpu::Device,
        name: &str,
        vertex_count: u32,
        indices: &[u16],
        draw_args: HashMap<String, Submesh>,
    ) -> Self {
        Self {
            name: name.to_string(),
            vertex_buffer: None,
            index_buffer: mk_index_buffer(device, name, indices),
            index_format: wgpu::IndexFormat::Uint16,
            vertex_count,
            draw_args,
        }
    }
}

fn mk_index_buffer(device: &wgpu::Device, name: &str, indices: &[u16]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Index Buffer", name)),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    })
}
