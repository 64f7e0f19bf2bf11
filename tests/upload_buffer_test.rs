#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn constants(ctx: &orbit_shapes::context::GpuContext) -> orbit_shapes::resources::UploadBuffer<[f32; 4]> {
    orbit_shapes::resources::UploadBuffer::new(
        &ctx.device,
        "Test Constants",
        4,
        wgpu::BufferUsages::UNIFORM,
        256,
    )
}

#[test]
#[cfg(feature = "integration-tests")]
fn copy_data_rejects_elements_out_of_range() {
    use crate::common::test_utils::headless_context;

    let ctx = headless_context();
    let mut buffer = constants(&ctx);
    assert_eq!(buffer.stride(), 256);
    assert!(buffer.copy_data(3, &[1.0; 4]).is_ok());
    assert!(buffer.copy_data(4, &[1.0; 4]).is_err());
    assert!(buffer.copy_data(u32::MAX, &[1.0; 4]).is_err());
}

#[test]
#[cfg(feature = "integration-tests")]
fn copy_data_fails_while_the_gpu_owns_the_staging_memory() {
    use crate::common::test_utils::headless_context;

    let ctx = headless_context();
    let mut buffer = constants(&ctx);

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    assert!(!buffer.record_upload(&mut encoder));

    buffer.copy_data(0, &[0.5; 4]).unwrap();
    buffer.copy_data(2, &[0.25; 4]).unwrap();
    assert!(buffer.record_upload(&mut encoder));
    assert!(!buffer.is_writable());
    assert!(buffer.copy_data(1, &[1.0; 4]).is_err());

    let submission = ctx.queue.submit(std::iter::once(encoder.finish()));
    buffer.after_submit();
    // The mapping only resolves once the device has been polled.
    assert!(buffer.copy_data(1, &[1.0; 4]).is_err());

    ctx.device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })
        .unwrap();
    assert!(buffer.is_writable());
    buffer.copy_data(1, &[1.0; 4]).unwrap();
}

#[test]
#[cfg(feature = "integration-tests")]
fn copy_slice_needs_a_tightly_packed_buffer() {
    use orbit_shapes::{data_structures::vertex::ColorVertex, resources::UploadBuffer};

    use crate::common::test_utils::headless_context;

    let ctx = headless_context();
    let mut strided = constants(&ctx);
    assert!(strided.copy_slice(&[[0.0; 4]; 2]).is_err());

    let mut vertices = UploadBuffer::<ColorVertex>::new(
        &ctx.device,
        "Test Vertices",
        4,
        wgpu::BufferUsages::VERTEX,
        1,
    );
    let vertex = ColorVertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0, 1.0]);
    assert!(vertices.copy_slice(&[vertex; 3]).is_ok());
    assert!(vertices.copy_slice(&[vertex; 5]).is_err());
    assert!(vertices.copy_slice(&[]).is_ok());
}
