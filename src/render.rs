//! Per-frame update and draw.
//!
//! The [`Renderer`] owns everything that lives on the GPU: the scene geometry,
//! the ring of frame resources guarded by the fence, the render targets and
//! the pipeline. Each frame follows the same steps:
//!
//! 1. [`Renderer::update`] moves to the next frame resource (waiting for the
//!    GPU if that resource is still in flight) and writes the constants and
//!    vertices of this frame into it
//! 2. [`Renderer::render_frame`] records the copies of those writes and the
//!    draws of every render item, submits, and marks the frame resource with
//!    a new fence value
//!
//! Resizing, toggling multisampling and dropping the renderer flush the queue
//! first, as resources the GPU may still use are replaced.

use std::{collections::HashMap, f32::consts::PI, iter};

use anyhow::{Context as _, ensure};

use crate::{
    camera::{self, OrbitCamera, Projection},
    config::DemoKind,
    context::GpuContext,
    data_structures::{mesh::MeshGeometry, render_item::RenderItem, vertex::colors},
    pipelines::{ConstantLayouts, PipelineSettings, mk_color_pipeline},
    resources::frame::{FrameResource, ObjectConstants},
    scene::{Scene, WaterSimulation},
    swap_chain::RenderTargets,
    sync::{Fence, FrameRing, QueueTimeline},
    timer::GameTimer,
};

pub const MSAA_SAMPLE_COUNT: u32 = 4;

/// What the renderer needs to know about its output.
#[derive(Debug, Copy, Clone)]
pub struct RendererConfig {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub frame_resources: usize,
    pub msaa: bool,
    pub wireframe: bool,
}

#[derive(Debug)]
pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    fence: Fence<QueueTimeline>,
    frames: FrameRing<FrameResource>,
    geometries: HashMap<String, MeshGeometry>,
    items: Vec<RenderItem>,
    water: Option<WaterSimulation>,
    layouts: ConstantLayouts,
    pipeline: wgpu::RenderPipeline,
    settings: PipelineSettings,
    targets: RenderTargets,
    msaa_supported: bool,
    pub camera: OrbitCamera,
    pub projection: Projection,
}

impl Renderer {
    /// Upload `scene` and create the frame resources, targets and pipeline.
    ///
    /// The scene has to be built for `config.frame_resources` frames so its
    /// render items start dirty in every one of them.
    pub fn new(ctx: &GpuContext, mut scene: Scene, config: RendererConfig) -> anyhow::Result<Self> {
        let device = ctx.device.clone();
        let queue = ctx.queue.clone();

        let layouts = ConstantLayouts::new(&device);
        let object_count = scene.object_count();
        let wave_vertex_count = scene.dynamic_vertex_count();
        let frames = FrameRing::new(
            (0..config.frame_resources)
                .map(|i| FrameResource::new(&device, &layouts, i, object_count, wave_vertex_count))
                .collect(),
        )?;
        let geometries = scene.upload(&device);
        for item in &scene.items {
            ensure!(
                geometries.contains_key(&item.geometry),
                "Render item {} refers to unknown geometry '{}'",
                item.object_index,
                item.geometry
            );
        }

        let msaa_supported = ctx.supports_sample_count(config.format, MSAA_SAMPLE_COUNT);
        let msaa = if config.msaa && !msaa_supported {
            log::warn!("{:?} does not support 4x MSAA, rendering without", config.format);
            false
        } else {
            config.msaa
        };
        let wireframe = if config.wireframe && !ctx.wireframe_supported {
            log::warn!("Wireframe requested but not supported, filling triangles instead");
            false
        } else {
            config.wireframe
        };
        let settings = PipelineSettings {
            color_format: config.format,
            sample_count: if msaa { MSAA_SAMPLE_COUNT } else { 1 },
            wireframe,
        };
        let pipeline = mk_color_pipeline(&device, &layouts, settings);
        let targets = RenderTargets::new(
            &device,
            config.format,
            [config.width, config.height],
            settings.sample_count,
        );

        let camera = match scene.kind {
            DemoKind::Shapes => OrbitCamera::default(),
            DemoKind::LandAndWaves => OrbitCamera::new(1.5 * PI, 0.2 * PI, 50.0),
        };
        let projection = Projection::new(config.width, config.height, 0.25 * PI, 1.0, 1000.0);

        let fence = Fence::new(QueueTimeline::new(&device, &queue));
        log::info!(
            "Renderer ready: {} render items, {} frame resources, {} samples",
            scene.items.len(),
            frames.len(),
            settings.sample_count
        );

        Ok(Self {
            device,
            queue,
            fence,
            frames,
            geometries,
            items: std::mem::take(&mut scene.items),
            water: scene.water.take(),
            layouts,
            pipeline,
            settings,
            targets,
            msaa_supported,
            camera,
            projection,
        })
    }

    pub fn size(&self) -> [u32; 2] {
        self.targets.size()
    }

    pub fn sample_count(&self) -> u32 {
        self.settings.sample_count
    }

    pub fn msaa_enabled(&self) -> bool {
        self.settings.sample_count > 1
    }

    pub fn frame_index(&self) -> usize {
        self.frames.current_index()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn fence(&self) -> &Fence<QueueTimeline> {
        &self.fence
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    /// Prepare the next frame resource with this frame's data.
    pub fn update(&mut self, timer: &GameTimer) -> anyhow::Result<()> {
        // Runs the completion callbacks of finished submissions.
        self.device
            .poll(wgpu::PollType::Poll)
            .context("Polling the device failed")?;

        self.frames.advance(&self.fence)?;
        if !self.frames.current().is_writable() {
            // The slot's submission is done, its remap only waits for the callback.
            log::debug!(
                "Frame resource {} not mapped yet, polling the device",
                self.frames.current_index()
            );
            self.device
                .poll(wgpu::PollType::Poll)
                .context("Polling the device failed")?;
        }
        ensure!(
            self.frames.current().is_writable(),
            "Frame resource {} is still in use by the GPU",
            self.frames.current_index()
        );

        let frame = self.frames.current_mut();
        for item in self.items.iter_mut().filter(|item| item.is_dirty()) {
            frame.write_object(
                item.object_index,
                &ObjectConstants {
                    world: item.world.into(),
                },
            )?;
            item.mark_written();
        }

        let size = self.targets.size();
        let pass = camera::pass_constants(&self.camera, &self.projection, (size[0], size[1]), timer);
        frame.write_pass(&pass)?;

        if let Some(water) = &mut self.water {
            water.update(timer.total_time(), timer.delta_time())?;
            frame.write_wave_vertices(&water.vertices())?;
        }
        Ok(())
    }

    /// Draw every render item into `back_buffer` and submit.
    ///
    /// Returns the fence value that marks this frame.
    pub fn render_frame(&mut self, back_buffer: &wgpu::TextureView) -> anyhow::Result<u64> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.frames.current_mut().record_uploads(&mut encoder);

        {
            let frame = self.frames.current();
            let (view, resolve_target) = self.targets.color_views(back_buffer);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(colors::to_wgpu(colors::LIGHT_STEEL_BLUE)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let viewport = self.targets.viewport();
            render_pass.set_viewport(
                viewport.x,
                viewport.y,
                viewport.width,
                viewport.height,
                viewport.min_depth,
                viewport.max_depth,
            );
            let (x, y, width, height) = self.targets.scissor_rect();
            render_pass.set_scissor_rect(x, y, width, height);

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(1, &frame.pass_bind_group, &[]);

            for item in &self.items {
                let Some(geometry) = self.geometries.get(&item.geometry) else {
                    continue;
                };
                let vertex_buffer = match &geometry.vertex_buffer {
                    Some(buffer) => buffer,
                    None => frame
                        .wave_vertex_buffer()
                        .context("Dynamic geometry without a per-frame vertex buffer")?,
                };
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.set_index_buffer(geometry.index_buffer.slice(..), geometry.index_format);
                render_pass.set_bind_group(
                    0,
                    &frame.object_bind_group,
                    &[frame.object_offset(item.object_index)],
                );
                render_pass.draw_indexed(item.submesh.index_range(), item.submesh.base_vertex, 0..1);
            }
        }

        let submission = self.queue.submit(iter::once(encoder.finish()));
        self.frames.current_mut().after_submit();

        // Commands up to here are marked with the new fence value. The frame
        // resource is only reused once the GPU has reached it.
        let value = self.fence.signal(Some(submission));
        self.frames.mark_submitted(value);
        Ok(value)
    }

    /// Follow a resize of the presentation surface.
    pub fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.flush()?;
        self.targets
            .rebuild(&self.device, [width, height], self.settings.sample_count);
        self.projection.resize(width, height);
        Ok(())
    }

    /// Switch 4x multisampling on or off. Returns whether it is on afterwards.
    pub fn set_msaa(&mut self, enabled: bool) -> anyhow::Result<bool> {
        if enabled && !self.msaa_supported {
            log::warn!("4x MSAA is not supported for {:?}", self.settings.color_format);
            return Ok(self.msaa_enabled());
        }
        let sample_count = if enabled { MSAA_SAMPLE_COUNT } else { 1 };
        if sample_count == self.settings.sample_count {
            return Ok(enabled);
        }
        self.flush()?;
        self.settings.sample_count = sample_count;
        self.pipeline = mk_color_pipeline(&self.device, &self.layouts, self.settings);
        self.targets
            .rebuild(&self.device, self.targets.size(), sample_count);
        log::info!("MSAA {}", if enabled { "on" } else { "off" });
        Ok(enabled)
    }

    /// Block until the GPU has finished all submitted work.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.fence.flush()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("Failed to flush the queue on shutdown: {}", e);
        }
    }
}
