//! `wgpu` backend.
//!
//! Instance buffers are `STORAGE | COPY_DST` so a vertex shader can index
//! them by `instance_index`. Each draw writes its indirect arguments into an
//! `INDIRECT` buffer paired with the instance buffer. The host render pass
//! drains [`PreparedDraw`]s once per frame and issues `draw_indexed_indirect`,
//! or `draw_indexed` with `instance_count` for [`DrawMode::RenderMeshPrimitives`].

use std::collections::HashMap;

use super::{BackendError, BufferId, DrawCall, RenderBackend};
use crate::config::DrawMode;
use crate::instancing::DrawIndexedIndirectArgs;
use crate::source::Bounds;

/// A draw ready to be encoded into a render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedDraw {
    /// Instance matrix buffer.
    pub instance_buffer: BufferId,
    /// Per-instance data buffer.
    pub data_buffer: Option<BufferId>,
    /// Indirect argument buffer.
    pub indirect_buffer: BufferId,
    /// Indirect or direct instanced draw.
    pub draw_mode: DrawMode,
    /// Instances to draw, also written into the indirect arguments.
    pub instance_count: u32,
    /// World-space bounds.
    pub bounds: Bounds,
    /// Submesh to bind.
    pub submesh_index: u32,
}

impl PreparedDraw {
    fn from_call(call: &DrawCall<'_>, indirect_buffer: BufferId) -> Self {
        Self {
            instance_buffer: call.instance_buffer,
            data_buffer: call.data_buffer,
            indirect_buffer,
            draw_mode: call.params.draw_mode,
            instance_count: call.instance_count,
            bounds: call.bounds,
            submesh_index: call.params.submesh_index,
        }
    }
}

struct Allocation {
    buffer: wgpu::Buffer,
    size: u64,
}

/// Backend writing into `wgpu` buffers.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: HashMap<BufferId, Allocation>,
    indirect: HashMap<BufferId, BufferId>,
    prepared: Vec<PreparedDraw>,
    next_id: u64,
}

impl WgpuBackend {
    /// Wraps an existing device and queue.
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            indirect: HashMap::new(),
            prepared: Vec::new(),
            next_id: 0,
        }
    }

    /// Underlying buffer for a handle.
    #[must_use]
    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id).map(|allocation| &allocation.buffer)
    }

    /// Draws prepared since the last call. The host must drain this every
    /// frame; undrained draws accumulate.
    pub fn take_prepared(&mut self) -> Vec<PreparedDraw> {
        std::mem::take(&mut self.prepared)
    }

    fn allocate(
        &mut self,
        label: &'static str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId, BackendError> {
        if size > self.device.limits().max_buffer_size {
            return Err(BackendError::OutOfMemory {
                requested_bytes: size,
            });
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(id, Allocation { buffer, size });
        Ok(id)
    }

    fn indirect_for(&mut self, instance_buffer: BufferId) -> Result<BufferId, BackendError> {
        if let Some(&id) = self.indirect.get(&instance_buffer) {
            return Ok(id);
        }
        let id = self.allocate(
            "scatter_indirect_args",
            DrawIndexedIndirectArgs::SIZE as u64,
            wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
        )?;
        self.indirect.insert(instance_buffer, id);
        Ok(id)
    }
}

impl RenderBackend for WgpuBackend {
    fn create_instance_buffer(
        &mut self,
        label: &'static str,
        capacity: usize,
        stride: usize,
    ) -> Result<BufferId, BackendError> {
        let size = (capacity as u64)
            .checked_mul(stride as u64)
            .ok_or(BackendError::OutOfMemory {
                requested_bytes: u64::MAX,
            })?;
        self.allocate(
            label,
            size,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        )
    }

    fn write_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), BackendError> {
        let allocation = self.buffers.get(&id).ok_or(BackendError::UnknownBuffer(id))?;
        if bytes.len() as u64 > allocation.size {
            return Err(BackendError::BufferOverflow {
                written: bytes.len(),
                capacity: allocation.size as usize,
            });
        }
        self.queue.write_buffer(&allocation.buffer, 0, bytes);
        Ok(())
    }

    fn release_buffer(&mut self, id: BufferId) {
        if let Some(allocation) = self.buffers.remove(&id) {
            allocation.buffer.destroy();
        }
        if let Some(indirect) = self.indirect.remove(&id) {
            if let Some(allocation) = self.buffers.remove(&indirect) {
                allocation.buffer.destroy();
            }
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        if !self.buffers.contains_key(&call.instance_buffer) {
            return Err(BackendError::UnknownBuffer(call.instance_buffer));
        }
        let indirect_buffer = self.indirect_for(call.instance_buffer)?;
        self.write_buffer(indirect_buffer, call.indirect.as_bytes())?;
        self.prepared.push(PreparedDraw::from_call(call, indirect_buffer));
        Ok(())
    }
}
