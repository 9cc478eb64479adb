//! Reusable GPU buffers that are partially rewritten every frame.

use std::marker::PhantomData;

use bytemuck::Pod;
use sable_test_utils::{GpuBuffer, RenderContext};

/// A fixed-size GPU buffer of `T` elements updated in sub-ranges.
///
/// Typed on the element so uploads stay `bytemuck`-checked. The buffer never
/// grows.
pub struct DynamicBuffer<T> {
    buffer: GpuBuffer,
    capacity: usize,
    // Packing space for strided uploads.
    scratch: Vec<u8>,
    _marker: PhantomData<T>,
}

impl<T: Pod> DynamicBuffer<T> {
    pub fn new(
        context: &dyn RenderContext,
        label: &str,
        usage: wgpu::BufferUsages,
        capacity: usize,
    ) -> Self {
        let size = (capacity * std::mem::size_of::<T>()) as u64;
        let buffer = context.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        tracing::debug!("Created dynamic buffer '{}' ({} bytes)", label, size);

        Self {
            buffer,
            capacity,
            scratch: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn vertex(context: &dyn RenderContext, label: &str, capacity: usize) -> Self {
        Self::new(context, label, wgpu::BufferUsages::VERTEX, capacity)
    }

    pub fn index(context: &dyn RenderContext, label: &str, capacity: usize) -> Self {
        Self::new(context, label, wgpu::BufferUsages::INDEX, capacity)
    }

    /// Capacity in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of the GPU buffer in bytes.
    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.buffer.size()
    }

    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    /// Writes `count` elements of `data`, starting at `data[source_offset]`,
    /// to the buffer at `byte_offset`.
    ///
    /// Elements land `stride` bytes apart. A stride equal to the element size
    /// uploads the slice as-is; a larger stride leaves zeroed gaps. The
    /// written byte range (`count * stride`) must be a multiple of four.
    ///
    /// # Panics
    ///
    /// Panics if the source range is out of bounds, the stride is smaller
    /// than `T`, or the write does not fit in the buffer.
    pub fn set_data(
        &mut self,
        context: &dyn RenderContext,
        byte_offset: u64,
        data: &[T],
        source_offset: usize,
        count: usize,
        stride: usize,
    ) {
        if count == 0 {
            return;
        }

        let element_size = std::mem::size_of::<T>();
        assert!(
            stride >= element_size,
            "stride {} is smaller than the element size {}",
            stride,
            element_size
        );
        let source = &data[source_offset..source_offset + count];
        let byte_len = (count * stride) as u64;
        assert!(
            byte_offset + byte_len <= self.byte_size(),
            "write of {} bytes at offset {} overflows a {} byte buffer",
            byte_len,
            byte_offset,
            self.byte_size()
        );

        if stride == element_size {
            context.write_buffer(&self.buffer, byte_offset, bytemuck::cast_slice(source));
            return;
        }

        self.scratch.clear();
        self.scratch.resize(count * stride, 0);
        for (chunk, element) in self.scratch.chunks_exact_mut(stride).zip(source) {
            chunk[..element_size].copy_from_slice(bytemuck::bytes_of(element));
        }
        context.write_buffer(&self.buffer, byte_offset, &self.scratch);
    }

    /// Releases the GPU buffer.
    pub fn destroy(self, context: &dyn RenderContext) {
        context.destroy_buffer(&self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_test_utils::MockRenderContext;

    #[test]
    fn test_contiguous_upload() {
        let mock = MockRenderContext::new();
        let mut buffer = DynamicBuffer::<u16>::index(&mock, "indices", 12);

        let data: Vec<u16> = (0..12).collect();
        buffer.set_data(&mock, 4, &data, 2, 6, 2);

        let writes = mock.buffer_writes(buffer.buffer());
        assert_eq!(writes.len(), 1);
        let (offset, bytes) = &writes[0];
        assert_eq!(*offset, 4);
        let indices: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(indices, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_strided_upload_leaves_gaps() {
        let mock = MockRenderContext::new();
        let mut buffer = DynamicBuffer::<u32>::vertex(&mock, "strided", 8);

        buffer.set_data(&mock, 0, &[7u32, 9], 0, 2, 8);

        let (_, bytes) = &mock.buffer_writes(buffer.buffer())[0];
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![7, 0, 9, 0]);
    }

    #[test]
    fn test_empty_upload_is_noop() {
        let mock = MockRenderContext::new();
        let mut buffer = DynamicBuffer::<u32>::vertex(&mock, "empty", 4);

        buffer.set_data(&mock, 0, &[], 0, 0, 4);
        assert_eq!(mock.count_buffer_writes(), 0);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_overflow_panics() {
        let mock = MockRenderContext::new();
        let mut buffer = DynamicBuffer::<u32>::vertex(&mock, "small", 2);
        buffer.set_data(&mock, 4, &[1u32, 2], 0, 2, 4);
    }

    #[test]
    fn test_destroy_releases() {
        let mock = MockRenderContext::new();
        let buffer = DynamicBuffer::<u32>::vertex(&mock, "gone", 2);
        buffer.destroy(&mock);
        assert_eq!(mock.count_buffer_destroys(), 1);
    }
}
