//! Render target textures: depth-stencil buffer and multisampled colour buffer.
//!
//! Both are sized to the client area and have to be recreated whenever the
//! window is resized or the sample count changes.

/// A GPU texture together with the view passed to render passes.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// 24-bit depth with an 8-bit stencil.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    /// Create a depth-stencil texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `sample_count` must match the colour target it is used with
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        label: &str,
    ) -> Self {
        Self::create_attachment(
            device,
            size,
            sample_count,
            Self::DEPTH_FORMAT,
            label,
        )
    }

    /// Create the multisampled colour buffer that gets resolved into the back buffer.
    pub fn create_msaa_texture(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::create_attachment(device, size, sample_count, format, "msaa_colour_texture")
    }

    fn create_attachment(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}
