use anyhow::Context as _;

use crate::data_structures::texture::Texture;

/// Handles to the GPU shared by the swap chain and the renderer.
///
/// `wgpu::Device` and `wgpu::Queue` are reference counted internally, so the
/// clones handed to other parts of the application are cheap.
#[derive(Debug)]
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Whether triangles can be rasterized as lines.
    pub wireframe_supported: bool,
}

impl GpuContext {
    pub fn mk_instance() -> wgpu::Instance {
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        })
    }

    /// Pick an adapter (able to present to `surface`, if given) and open a device on it.
    pub async fn new(
        instance: wgpu::Instance,
        surface: Option<&wgpu::Surface<'static>>,
    ) -> anyhow::Result<Self> {
        log::info!("WGPU setup");
        let adapter = request_adapter(&instance, surface).await?;
        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let wireframe_supported = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        if !wireframe_supported {
            log::warn!("Adapter cannot rasterize lines, wireframe is unavailable");
        }
        let required_features = if wireframe_supported {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Orbit Shapes Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("Cannot create the logical device")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            wireframe_supported,
        })
    }

    /// Headless context for offscreen rendering.
    pub async fn headless() -> anyhow::Result<Self> {
        Self::new(Self::mk_instance(), None).await
    }

    /// Whether `format` can be rendered with `samples` samples per pixel.
    pub fn supports_sample_count(&self, format: wgpu::TextureFormat, samples: u32) -> bool {
        let color = self.adapter.get_texture_format_features(format);
        let depth = self.adapter.get_texture_format_features(Texture::DEPTH_FORMAT);
        color.flags.sample_count_supported(samples) && depth.flags.sample_count_supported(samples)
    }
}

async fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'static>>,
) -> anyhow::Result<wgpu::Adapter> {
    let hardware = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await;
    match hardware {
        Ok(adapter) => Ok(adapter),
        Err(e) => {
            log::warn!("No hardware adapter ({}), falling back to a software adapter", e);
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: surface,
                    force_fallback_adapter: true,
                })
                .await
                .context("Cannot find any graphics adapter")
        }
    }
}
