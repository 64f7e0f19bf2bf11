use crate::resources::frame::{ObjectConstants, PassConstants};

/// Bind group layouts of the colour pipeline.
///
/// Group 0 holds the per-object constants and is re-bound for every draw with
/// a dynamic offset. Group 1 holds the pass constants and is bound once per frame.
#[derive(Debug)]
pub struct ConstantLayouts {
    pub object: wgpu::BindGroupLayout,
    pub pass: wgpu::BindGroupLayout,
}

impl ConstantLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let object = mk_uniform_layout::<ObjectConstants>(device, true, "object_bind_group_layout");
        let pass = mk_uniform_layout::<PassConstants>(device, false, "pass_bind_group_layout");
        Self { object, pass }
    }
}

fn mk_uniform_layout<T>(device: &wgpu::Device, dynamic: bool, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
        label: Some(label),
    })
}
