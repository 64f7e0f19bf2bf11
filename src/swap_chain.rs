//! Presentation surface and the render targets sized to it.

use anyhow::bail;

use crate::data_structures::texture::Texture;

/// Back buffers the presentation engine may queue up.
pub const SWAP_CHAIN_BUFFER_COUNT: u32 = 2;

/// The window surface and its configuration.
#[derive(Debug)]
pub struct SwapChain {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
}

impl SwapChain {
    pub fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let surface_caps = surface.get_capabilities(adapter);
        if surface_caps.formats.is_empty() {
            bail!("The surface is incompatible with the adapter");
        }
        // Vertex colours are written as-is, so a UNORM back buffer is preferred.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let present_mode = if surface_caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            surface_caps.present_modes[0]
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: SWAP_CHAIN_BUFFER_COUNT,
        };
        surface.configure(device, &config);
        log::info!(
            "Surface configured: {}x{} {:?} {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(Self {
            surface,
            config,
            device: device.clone(),
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the back buffers. Zero sizes (minimized windows) are ignored.
    ///
    /// Returns whether the surface changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Get the next back buffer.
    ///
    /// `Ok(None)` means this frame should be skipped; the surface has been
    /// reconfigured if it was lost or outdated.
    pub fn acquire(&mut self) -> anyhow::Result<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                bail!("Out of memory while acquiring the next back buffer")
            }
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                Ok(None)
            }
        }
    }
}

/// Depth-stencil and (optionally) multisampled colour targets.
#[derive(Debug)]
pub struct RenderTargets {
    pub depth: Texture,
    pub msaa: Option<Texture>,
    format: wgpu::TextureFormat,
    size: [u32; 2],
}

impl RenderTargets {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: [u32; 2],
        sample_count: u32,
    ) -> Self {
        let depth = Texture::create_depth_texture(device, size, sample_count, "depth_texture");
        let msaa = (sample_count > 1)
            .then(|| Texture::create_msaa_texture(device, size, sample_count, format));
        Self {
            depth,
            msaa,
            format,
            size,
        }
    }

    pub fn rebuild(&mut self, device: &wgpu::Device, size: [u32; 2], sample_count: u32) {
        *self = Self::new(device, self.format, size, sample_count);
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// The view to draw into and the view it resolves into, if multisampled.
    pub fn color_views<'a>(
        &'a self,
        back_buffer: &'a wgpu::TextureView,
    ) -> (&'a wgpu::TextureView, Option<&'a wgpu::TextureView>) {
        match &self.msaa {
            Some(msaa) => (&msaa.view, Some(back_buffer)),
            None => (back_buffer, None),
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            x: 0.0,
            y: 0.0,
            width: self.size[0] as f32,
            height: self.size[1] as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Scissor rectangle `(x, y, width, height)` covering the whole client area.
    pub fn scissor_rect(&self) -> (u32, u32, u32, u32) {
        (0, 0, self.size[0], self.size[1])
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}
