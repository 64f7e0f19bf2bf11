//! Vertex formats uploaded to the GPU.

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Position and colour, the only input the colour shader consumes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl ColorVertex {
    pub fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

impl Vertex for ColorVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Named colours used by the demo scenes (linear RGBA, written straight into a UNORM target).
pub mod colors {
    pub const LIGHT_STEEL_BLUE: [f32; 4] = [0.690196, 0.768627, 0.870588, 1.0];
    pub const DARK_GREEN: [f32; 4] = [0.0, 0.392157, 0.0, 1.0];
    pub const FOREST_GREEN: [f32; 4] = [0.133333, 0.545098, 0.133333, 1.0];
    pub const CRIMSON: [f32; 4] = [0.862745, 0.078431, 0.235294, 1.0];
    pub const STEEL_BLUE: [f32; 4] = [0.274510, 0.509804, 0.705882, 1.0];
    pub const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
    pub const SANDY_BEACH: [f32; 4] = [1.0, 0.96, 0.62, 1.0];
    pub const LIGHT_YELLOW_GREEN: [f32; 4] = [0.48, 0.77, 0.46, 1.0];
    pub const DARK_YELLOW_GREEN: [f32; 4] = [0.1, 0.48, 0.19, 1.0];
    pub const DARK_BROWN: [f32; 4] = [0.45, 0.39, 0.34, 1.0];
    pub const SNOW: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    pub fn to_wgpu(color: [f32; 4]) -> wgpu::Color {
        wgpu::Color {
            r: color[0] as f64,
            g: color[1] as f64,
            b: color[2] as f64,
            a: color[3] as f64,
        }
    }
}
