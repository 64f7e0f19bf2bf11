#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use orbit_shapes::sync::GpuTimeline;

type Callback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct TimelineState {
    submitted: u64,
    /// Callbacks with the submission they wait for.
    pending: Vec<(u64, Callback)>,
    completed: usize,
    blocks: u32,
}

/// A GPU timeline driven by the test.
///
/// Completion callbacks queue up until the test completes them, or until
/// someone blocks on a submission, which finishes that submission and
/// everything before it.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTimeline(Rc<RefCell<TimelineState>>);

impl ScriptedTimeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a queue submission and return its handle.
    pub(crate) fn submit(&self) -> u64 {
        let mut state = self.0.borrow_mut();
        state.submitted += 1;
        state.submitted
    }

    /// Finish the oldest outstanding callback. Returns false if there was none.
    pub(crate) fn complete_next(&self) -> bool {
        self.complete_next_until(u64::MAX)
    }

    fn complete_next_until(&self, submission: u64) -> bool {
        let callback = {
            let mut state = self.0.borrow_mut();
            match state.pending.first() {
                Some((waits_for, _)) if *waits_for <= submission => (),
                _ => return false,
            }
            state.completed += 1;
            state.pending.remove(0).1
        };
        callback();
        true
    }

    pub(crate) fn complete_all(&self) {
        while self.complete_next() {}
    }

    pub(crate) fn pending(&self) -> usize {
        self.0.borrow().pending.len()
    }

    pub(crate) fn completed(&self) -> usize {
        self.0.borrow().completed
    }

    /// How often the CPU had to block on the GPU.
    pub(crate) fn block_count(&self) -> u32 {
        self.0.borrow().blocks
    }
}

impl GpuTimeline for ScriptedTimeline {
    type Submission = u64;

    fn notify_on_completion(&self, callback: Box<dyn FnOnce() + Send + 'static>) {
        let mut state = self.0.borrow_mut();
        let waits_for = state.submitted;
        state.pending.push((waits_for, callback));
    }

    fn block_until(&self, submission: Option<&u64>) -> anyhow::Result<()> {
        self.0.borrow_mut().blocks += 1;
        match submission {
            Some(&submission) => while self.complete_next_until(submission) {},
            None => self.complete_all(),
        }
        Ok(())
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) use gpu::*;

#[cfg(feature = "integration-tests")]
mod gpu {
    use orbit_shapes::{
        DemoKind,
        context::GpuContext,
        render::{Renderer, RendererConfig},
        scene::Scene,
    };

    pub(crate) const TEST_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    // Rows of a copy have to be a multiple of 256 bytes, 64 RGBA pixels fit exactly.
    pub(crate) const TEST_SIZE: u32 = 256;

    pub(crate) fn headless_context() -> GpuContext {
        futures::executor::block_on(GpuContext::headless())
            .expect("Failed to create a headless GPU context")
    }

    pub(crate) fn test_renderer(ctx: &GpuContext, demo: DemoKind, frames: usize, msaa: bool) -> Renderer {
        let scene = Scene::build(demo, frames).expect("Failed to build the scene");
        Renderer::new(
            ctx,
            scene,
            RendererConfig {
                format: TEST_FORMAT,
                width: TEST_SIZE,
                height: TEST_SIZE,
                frame_resources: frames,
                msaa,
                wireframe: false,
            },
        )
        .expect("Failed to create the renderer")
    }

    /// Offscreen stand-in for a back buffer.
    pub(crate) fn target_texture(device: &wgpu::Device) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Output Texture"),
            size: wgpu::Extent3d {
                width: TEST_SIZE,
                height: TEST_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEST_FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    /// Copy `texture` back to the CPU.
    pub(crate) fn read_back(ctx: &GpuContext, texture: &wgpu::Texture) -> image::RgbaImage {
        let u32_size = std::mem::size_of::<u32>() as u32;
        let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            size: (u32_size * TEST_SIZE * TEST_SIZE) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("Test Output Buffer"),
            mapped_at_creation: false,
        });
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Read Back Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(u32_size * TEST_SIZE),
                    rows_per_image: Some(TEST_SIZE),
                },
            },
            texture.size(),
        );
        ctx.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        ctx.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .unwrap();
        futures::executor::block_on(rx.receive()).unwrap().unwrap();

        let data = buffer_slice.get_mapped_range().to_vec();
        image::RgbaImage::from_raw(TEST_SIZE, TEST_SIZE, data).expect("Read back buffer has the wrong size")
    }

    pub(crate) fn to_rgba8(colour: [f32; 4]) -> image::Rgba<u8> {
        let f_to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgba([
            f_to_u8(colour[0]),
            f_to_u8(colour[1]),
            f_to_u8(colour[2]),
            f_to_u8(colour[3]),
        ])
    }

    /// Channel-wise comparison allowing for rounding differences between backends.
    pub(crate) fn close_to(a: image::Rgba<u8>, b: image::Rgba<u8>) -> bool {
        a.0.iter().zip(b.0.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
    }
}
