//! Per-instance GPU data layouts.
//!
//! Matrices travel as [`InstanceMatrix`](scatter_core::InstanceMatrix) (one
//! `mat4` each). The optional second stream carries [`InstanceTint`].

use bytemuck::{Pod, Zeroable};

use crate::config::MeshInfo;

/// Conventional shader slot name for the per-instance matrix buffer.
pub const INSTANCE_MATRIX_SLOT: &str = "_PerInstanceMatrix";

/// Conventional shader slot name for the per-instance data buffer.
pub const INSTANCE_DATA_SLOT: &str = "_PerInstanceData";

/// Per-instance colour record written alongside the matrices.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceTint {
    /// Instance index the tint belongs to.
    pub index: u32,
    /// Linear RGBA colour.
    pub color: [f32; 4],
}

impl InstanceTint {
    /// Size in bytes of one record.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Red to green gradient by position in the buffer.
    #[must_use]
    pub fn gradient(index: usize, len: usize) -> Self {
        let t = if len == 0 {
            0.0
        } else {
            (index as f32 / len as f32).clamp(0.0, 1.0)
        };
        Self {
            index: index as u32,
            color: [1.0 - t, t, 0.0, 1.0],
        }
    }
}

/// Indirect draw arguments.
///
/// Matches the `DrawIndexedIndirect` layout expected by the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// Number of indices per instance.
    pub index_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// First index in the index buffer.
    pub first_index: u32,
    /// Vertex offset added to each index.
    pub base_vertex: i32,
    /// First instance ID.
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Arguments for drawing `instance_count` copies of the selected submesh.
    #[must_use]
    pub const fn for_mesh(mesh: &MeshInfo, instance_count: u32) -> Self {
        Self {
            index_count: mesh.index_count,
            instance_count,
            first_index: mesh.index_start,
            base_vertex: mesh.base_vertex,
            first_instance: 0,
        }
    }

    /// Converts to bytes for buffer upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
