//! Render backend seam.
//!
//! The drawer owns the instance data; a [`RenderBackend`] owns the GPU side:
//! buffer objects and the instanced draw itself. [`HeadlessBackend`] keeps
//! everything in memory, `WgpuBackend` (feature `gpu`) talks to a device.

mod headless;
#[cfg(feature = "gpu")]
mod gpu;

pub use headless::{HeadlessBackend, RecordedDraw};
#[cfg(feature = "gpu")]
pub use gpu::{PreparedDraw, WgpuBackend};

use thiserror::Error;

use crate::config::DrawParams;
use crate::instancing::DrawIndexedIndirectArgs;
use crate::source::Bounds;

/// Opaque handle to a buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Failures reported by a render backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The device could not provide a buffer of the requested size.
    #[error("out of memory allocating {requested_bytes} bytes")]
    OutOfMemory {
        /// Requested size in bytes.
        requested_bytes: u64,
    },

    /// The handle does not name a live buffer.
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),

    /// A write would run past the end of the buffer.
    #[error("write of {written} bytes overflows buffer of {capacity} bytes")]
    BufferOverflow {
        /// Bytes written.
        written: usize,
        /// Buffer size in bytes.
        capacity: usize,
    },

    /// The draw call was rejected.
    #[error("draw rejected: {0}")]
    DrawRejected(String),
}

/// One instanced draw request.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// World-space bounds of all instances.
    pub bounds: Bounds,
    /// Buffer bound to the per-instance matrix slot.
    pub instance_buffer: BufferId,
    /// Buffer bound to the per-instance data slot, if any.
    pub data_buffer: Option<BufferId>,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// Mesh, material, shadow, lighting and layer configuration.
    pub params: &'a DrawParams,
    /// Indirect arguments for indirect draw modes.
    pub indirect: DrawIndexedIndirectArgs,
}

/// GPU-side collaborator of the drawer.
pub trait RenderBackend {
    /// Creates a buffer holding `capacity` elements of `stride` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::OutOfMemory`] when the buffer cannot be created.
    fn create_instance_buffer(
        &mut self,
        label: &'static str,
        capacity: usize,
        stride: usize,
    ) -> Result<BufferId, BackendError>;

    /// Copies `bytes` to the start of a buffer.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles or writes larger than the buffer.
    fn write_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), BackendError>;

    /// Releases a buffer. Unknown handles are ignored.
    fn release_buffer(&mut self, id: BufferId);

    /// Issues one instanced draw.
    ///
    /// # Errors
    ///
    /// Fails when the backend rejects the call.
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError>;
}
