//! In-memory backend for tests, tools and benchmarks.

use std::collections::HashMap;

use scatter_core::InstanceMatrix;

use super::{BackendError, BufferId, DrawCall, RenderBackend};
use crate::config::{DrawMode, MaterialId, MeshInfo};
use crate::instancing::{DrawIndexedIndirectArgs, InstanceTint};
use crate::source::Bounds;

/// Owned copy of a [`DrawCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// World-space bounds.
    pub bounds: Bounds,
    /// Per-instance matrix buffer.
    pub instance_buffer: BufferId,
    /// Per-instance data buffer.
    pub data_buffer: Option<BufferId>,
    /// Instance count.
    pub instance_count: u32,
    /// Mesh drawn.
    pub mesh: Option<MeshInfo>,
    /// Material drawn with.
    pub material: Option<MaterialId>,
    /// Draw mode.
    pub draw_mode: DrawMode,
    /// Submesh drawn.
    pub submesh_index: u32,
    /// Layer.
    pub layer: u8,
    /// Indirect arguments.
    pub indirect: DrawIndexedIndirectArgs,
}

#[derive(Debug)]
struct HeadlessBuffer {
    label: &'static str,
    bytes: Vec<u8>,
}

/// Backend that keeps buffers as byte vectors and records every draw.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    buffers: HashMap<BufferId, HeadlessBuffer>,
    draws: Vec<RecordedDraw>,
    next_id: u64,
    fail_next_create: bool,
    created: usize,
    released: usize,
}

impl HeadlessBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next buffer creation fail with [`BackendError::OutOfMemory`].
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    /// Number of live buffers.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Total buffers created.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Total buffers released.
    #[must_use]
    pub fn released_count(&self) -> usize {
        self.released
    }

    /// Debug label of a live buffer.
    #[must_use]
    pub fn buffer_label(&self, id: BufferId) -> Option<&'static str> {
        self.buffers.get(&id).map(|buffer| buffer.label)
    }

    /// Raw contents of a live buffer.
    #[must_use]
    pub fn buffer_bytes(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|buffer| buffer.bytes.as_slice())
    }

    /// Contents of a live buffer decoded as instance matrices.
    #[must_use]
    pub fn buffer_matrices(&self, id: BufferId) -> Option<Vec<InstanceMatrix>> {
        self.buffer_bytes(id).map(|bytes| {
            bytes
                .chunks_exact(InstanceMatrix::SIZE)
                .map(bytemuck::pod_read_unaligned)
                .collect()
        })
    }

    /// Contents of a live buffer decoded as tints.
    #[must_use]
    pub fn buffer_tints(&self, id: BufferId) -> Option<Vec<InstanceTint>> {
        self.buffer_bytes(id).map(|bytes| {
            bytes
                .chunks_exact(InstanceTint::SIZE)
                .map(bytemuck::pod_read_unaligned)
                .collect()
        })
    }

    /// Every draw issued so far.
    #[must_use]
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Most recent draw.
    #[must_use]
    pub fn last_draw(&self) -> Option<&RecordedDraw> {
        self.draws.last()
    }

    /// Forgets recorded draws.
    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_instance_buffer(
        &mut self,
        label: &'static str,
        capacity: usize,
        stride: usize,
    ) -> Result<BufferId, BackendError> {
        let size = capacity.checked_mul(stride);
        let requested_bytes = size.map_or(u64::MAX, |size| size as u64);
        if std::mem::take(&mut self.fail_next_create) {
            return Err(BackendError::OutOfMemory { requested_bytes });
        }
        let size = size.ok_or(BackendError::OutOfMemory { requested_bytes })?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| BackendError::OutOfMemory { requested_bytes })?;
        bytes.resize(size, 0);

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.buffers.insert(id, HeadlessBuffer { label, bytes });
        Ok(id)
    }

    fn write_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), BackendError> {
        let buffer = self
            .buffers
            .get_mut(&id)
            .ok_or(BackendError::UnknownBuffer(id))?;
        let Some(target) = buffer.bytes.get_mut(..bytes.len()) else {
            return Err(BackendError::BufferOverflow {
                written: bytes.len(),
                capacity: buffer.bytes.len(),
            });
        };
        target.copy_from_slice(bytes);
        Ok(())
    }

    fn release_buffer(&mut self, id: BufferId) {
        if self.buffers.remove(&id).is_some() {
            self.released += 1;
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        if !self.buffers.contains_key(&call.instance_buffer) {
            return Err(BackendError::UnknownBuffer(call.instance_buffer));
        }
        if let Some(data) = call.data_buffer {
            if !self.buffers.contains_key(&data) {
                return Err(BackendError::UnknownBuffer(data));
            }
        }
        self.draws.push(RecordedDraw {
            bounds: call.bounds,
            instance_buffer: call.instance_buffer,
            data_buffer: call.data_buffer,
            instance_count: call.instance_count,
            mesh: call.params.mesh,
            material: call.params.material,
            draw_mode: call.params.draw_mode,
            submesh_index: call.params.submesh_index,
            layer: call.params.layer,
            indirect: call.indirect,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DrawParams;
    use glam::{Quat, Vec3};

    #[test]
    fn test_create_write_release() {
        let mut backend = HeadlessBackend::new();
        let id = backend
            .create_instance_buffer("matrices", 4, InstanceMatrix::SIZE)
            .unwrap();
        assert_eq!(backend.buffer_bytes(id).unwrap().len(), 256);
        assert_eq!(backend.buffer_label(id), Some("matrices"));

        let m = InstanceMatrix::from_trs(Vec3::X, Quat::IDENTITY, Vec3::ONE);
        backend.write_buffer(id, bytemuck::bytes_of(&m)).unwrap();
        let decoded = backend.buffer_matrices(id).unwrap();
        assert_eq!(decoded[0], m);
        assert_eq!(decoded[1], InstanceMatrix::ZERO);

        backend.release_buffer(id);
        backend.release_buffer(id);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.released_count(), 1);
    }

    #[test]
    fn test_overflow_and_unknown() {
        let mut backend = HeadlessBackend::new();
        let id = backend.create_instance_buffer("small", 1, 4).unwrap();
        assert_eq!(
            backend.write_buffer(id, &[0; 8]),
            Err(BackendError::BufferOverflow {
                written: 8,
                capacity: 4
            })
        );
        assert_eq!(
            backend.write_buffer(BufferId(99), &[0]),
            Err(BackendError::UnknownBuffer(BufferId(99)))
        );
    }

    #[test]
    fn test_fault_injection_is_one_shot() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next_create();
        assert!(matches!(
            backend.create_instance_buffer("a", 2, 8),
            Err(BackendError::OutOfMemory { requested_bytes: 16 })
        ));
        assert!(backend.create_instance_buffer("a", 2, 8).is_ok());
    }

    #[test]
    fn test_draw_records_call() {
        let mut backend = HeadlessBackend::new();
        let id = backend.create_instance_buffer("m", 1, 64).unwrap();
        let params = DrawParams::default();
        let call = DrawCall {
            bounds: Bounds::default(),
            instance_buffer: id,
            data_buffer: None,
            instance_count: 1,
            params: &params,
            indirect: DrawIndexedIndirectArgs::default(),
        };
        backend.draw(&call).unwrap();
        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.last_draw().unwrap().instance_count, 1);

        let bad = DrawCall {
            instance_buffer: BufferId(42),
            ..call
        };
        assert!(backend.draw(&bad).is_err());
    }
}
