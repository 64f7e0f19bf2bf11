//! CPU-writable buffers that are copied into GPU-local memory on submit.
//!
//! Each [`UploadBuffer`] pairs a mappable staging buffer with the buffer the
//! shaders actually read. The CPU writes into the mapped staging memory; the
//! writes are copied over as part of the next submission, after which the
//! staging buffer is mapped again. Mapping only resolves once the GPU is done
//! with that submission, so a write can never land in memory the GPU is
//! still reading.

use std::{
    marker::PhantomData,
    ops::Range,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::ensure;

/// Round `size` up to the next multiple of `alignment`.
///
/// Constant buffers have to be placed at multiples of the device's uniform
/// offset alignment, which is 256 bytes on most hardware.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

#[derive(Debug)]
pub struct UploadBuffer<T: bytemuck::Pod> {
    label: String,
    staging: wgpu::Buffer,
    buffer: wgpu::Buffer,
    stride: u64,
    count: u32,
    mapped: Arc<AtomicBool>,
    written: Vec<Range<u64>>,
    remap_after_submit: bool,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> UploadBuffer<T> {
    /// # Arguments
    ///
    /// * `count` is the number of elements
    /// * `usage` is how the GPU side is bound (`UNIFORM`, `VERTEX`, ...)
    /// * `alignment` spaces elements apart; pass 1 for tightly packed data
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        count: u32,
        usage: wgpu::BufferUsages,
        alignment: u64,
    ) -> Self {
        let element = std::mem::size_of::<T>() as u64;
        let stride = align_to(element, alignment.max(1));
        let size = align_to(stride * count.max(1) as u64, wgpu::COPY_BUFFER_ALIGNMENT);

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Staging", label)),
            size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            label: label.to_string(),
            staging,
            buffer,
            stride,
            count,
            mapped: Arc::new(AtomicBool::new(true)),
            written: Vec::new(),
            remap_after_submit: false,
            _marker: PhantomData,
        }
    }

    /// The buffer shaders bind to.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether the CPU may write right now.
    pub fn is_writable(&self) -> bool {
        self.mapped.load(Ordering::Acquire)
    }

    /// A binding covering exactly one element, used with dynamic offsets.
    pub fn element_binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        })
    }

    /// Write one element.
    pub fn copy_data(&mut self, index: u32, data: &T) -> anyhow::Result<()> {
        ensure!(
            index < self.count,
            "{}: element {} is out of range ({} elements)",
            self.label,
            index,
            self.count
        );
        let bytes = bytemuck::bytes_of(data);
        let start = index as u64 * self.stride;
        let end = start + bytes.len() as u64;
        self.write_bytes(start..end, bytes)
    }

    /// Write consecutive elements starting at element 0. Only valid for tightly packed buffers.
    pub fn copy_slice(&mut self, data: &[T]) -> anyhow::Result<()> {
        ensure!(
            self.stride == std::mem::size_of::<T>() as u64,
            "{}: slices can only be written into tightly packed buffers",
            self.label
        );
        ensure!(
            data.len() <= self.count as usize,
            "{}: {} elements do not fit into {}",
            self.label,
            data.len(),
            self.count
        );
        if data.is_empty() {
            return Ok(());
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.write_bytes(0..bytes.len() as u64, bytes)
    }

    fn write_bytes(&mut self, range: Range<u64>, bytes: &[u8]) -> anyhow::Result<()> {
        ensure!(
            self.is_writable(),
            "{}: staging memory is still in use by the GPU",
            self.label
        );
        // Mapped views start on MAP_ALIGNMENT, copies end on COPY_BUFFER_ALIGNMENT.
        let start = range.start - range.start % wgpu::MAP_ALIGNMENT;
        let end = align_to(range.end, wgpu::COPY_BUFFER_ALIGNMENT);
        {
            let mut view = self.staging.slice(start..end).get_mapped_range_mut();
            let offset = (range.start - start) as usize;
            view[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        self.written.push(start..end);
        Ok(())
    }

    /// Unmap the staging memory and copy everything written since the last upload.
    ///
    /// Returns whether any copy was recorded.
    pub fn record_upload(&mut self, encoder: &mut wgpu::CommandEncoder) -> bool {
        if self.written.is_empty() {
            return false;
        }
        self.staging.unmap();
        self.mapped.store(false, Ordering::Release);
        for range in merge_ranges(std::mem::take(&mut self.written)) {
            encoder.copy_buffer_to_buffer(
                &self.staging,
                range.start,
                &self.buffer,
                range.start,
                range.end - range.start,
            );
        }
        self.remap_after_submit = true;
        true
    }

    /// Request the staging memory back once the submission that read it is done.
    pub fn after_submit(&mut self) {
        if !self.remap_after_submit {
            return;
        }
        self.remap_after_submit = false;
        let mapped = self.mapped.clone();
        let label = self.label.clone();
        self.staging
            .slice(..)
            .map_async(wgpu::MapMode::Write, move |result| match result {
                Ok(()) => mapped.store(true, Ordering::Release),
                Err(e) => log::error!("{}: mapping staging memory failed: {}", label, e),
            });
    }
}

/// Sort and coalesce overlapping or touching ranges.
pub(crate) fn merge_ranges(mut ranges: Vec<Range<u64>>) -> Vec<Range<u64>> {
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<Range<u64>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_constant_buffer_sizes() {
        assert_eq!(align_to(64, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(432, 256), 512);
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(28, 1), 28);
        assert_eq!(align_to(30, 4), 32);
    }

    #[test]
    fn merges_adjacent_writes() {
        let merged = merge_ranges(vec![512..576, 0..64, 256..320, 64..128]);
        assert_eq!(merged, vec![0..128, 256..320, 512..576]);
    }

    #[test]
    fn merges_overlapping_writes() {
        let merged = merge_ranges(vec![0..100, 50..80, 90..120]);
        assert_eq!(merged, vec![0..120]);
    }
}
