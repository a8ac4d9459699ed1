//! Instance storage lifecycle.
//!
//! Owns the CPU-side matrix arrays (full and culled), the optional tint
//! array, and the backend buffers mirroring them. Capacity is rounded up in
//! [`CHUNK_SIZE`] steps and only ever grows until teardown.

use std::time::Instant;

use scatter_core::InstanceMatrix;
use tracing::debug;

use super::instance_data::InstanceTint;
use crate::backend::{BufferId, RenderBackend};
use crate::error::{DrawError, DrawResult};

/// Allocation granularity, in instances.
pub const CHUNK_SIZE: usize = 256;

/// Capacity allocated for `count` instances: `(count / CHUNK_SIZE + 1) * CHUNK_SIZE`.
///
/// Always strictly greater than `count`. `None` when the result does not fit
/// in `usize`.
#[must_use]
pub const fn rounded_capacity(count: usize) -> Option<usize> {
    match (count / CHUNK_SIZE).checked_add(1) {
        Some(chunks) => chunks.checked_mul(CHUNK_SIZE),
        None => None,
    }
}

/// Writes the NaN sentinel into `array[start..]`. `start >= len` is a no-op.
pub fn fill_sentinel(array: &mut [InstanceMatrix], start: usize) {
    if let Some(tail) = array.get_mut(start..) {
        tail.fill(InstanceMatrix::NAN);
    }
}

fn zeroed<T: Copy + Default>(what: &'static str, capacity: usize) -> DrawResult<Vec<T>> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(capacity)
        .map_err(|_| DrawError::AllocationFailure { what, capacity })?;
    storage.resize(capacity, T::default());
    Ok(storage)
}

/// CPU arrays and backend buffers for one drawer.
#[derive(Debug, Default)]
pub struct InstanceBuffers {
    matrices: Vec<InstanceMatrix>,
    culled: Vec<InstanceMatrix>,
    tints: Vec<InstanceTint>,
    matrix_buffer: Option<BufferId>,
    data_buffer: Option<BufferId>,
    capacity: usize,
    initialized: bool,
}

impl InstanceBuffers {
    /// Creates an uninitialized set of buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocated capacity (0 before init).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once `init` has succeeded and until teardown.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True when `count` instances do not fit, or nothing is allocated.
    #[must_use]
    pub fn needs_init(&self, count: usize) -> bool {
        !self.initialized || count > self.capacity
    }

    /// Releases previous storage and allocates zeroed storage for
    /// `rounded_capacity(count)` instances.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::AllocationFailure`] when the capacity overflows,
    /// a CPU array cannot be reserved or the backend refuses a buffer.
    /// Storage is left released.
    pub fn init(
        &mut self,
        backend: &mut dyn RenderBackend,
        count: usize,
        with_tints: bool,
    ) -> DrawResult<()> {
        let start = Instant::now();
        self.teardown(backend);

        let capacity = rounded_capacity(count).ok_or(DrawError::AllocationFailure {
            what: "matrices",
            capacity: usize::MAX,
        })?;
        if let Err(error) = self.allocate(backend, capacity, with_tints) {
            self.teardown(backend);
            return Err(error);
        }
        self.capacity = capacity;
        self.initialized = true;

        debug!(
            capacity,
            with_tints,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "instance buffers initialized"
        );
        Ok(())
    }

    fn allocate(
        &mut self,
        backend: &mut dyn RenderBackend,
        capacity: usize,
        with_tints: bool,
    ) -> DrawResult<()> {
        self.matrices = zeroed("matrices", capacity)?;
        self.culled = zeroed("culled matrices", capacity)?;

        let buffer = backend
            .create_instance_buffer("scatter_instance_matrices", capacity, InstanceMatrix::SIZE)
            .map_err(|_| DrawError::AllocationFailure {
                what: "instance matrix buffer",
                capacity,
            })?;
        self.matrix_buffer = Some(buffer);

        if with_tints {
            self.tints = zeroed("tints", capacity)?;
            let buffer = backend
                .create_instance_buffer("scatter_instance_data", capacity, InstanceTint::SIZE)
                .map_err(|_| DrawError::AllocationFailure {
                    what: "instance data buffer",
                    capacity,
                })?;
            self.data_buffer = Some(buffer);
        }
        Ok(())
    }

    /// Re-initializes only when [`InstanceBuffers::needs_init`] holds, or
    /// when a tint buffer is now wanted but missing. Returns whether storage
    /// was reallocated.
    ///
    /// # Errors
    ///
    /// Propagates [`InstanceBuffers::init`] failures.
    pub fn resize_if_needed(
        &mut self,
        backend: &mut dyn RenderBackend,
        count: usize,
        with_tints: bool,
    ) -> DrawResult<bool> {
        let missing_tints = with_tints && self.data_buffer.is_none();
        if self.needs_init(count) || missing_tints {
            // Grow only: never shrink below the current capacity.
            let target = count.max(self.capacity.saturating_sub(1));
            self.init(backend, target, with_tints)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Releases every array and backend buffer. Safe to call repeatedly.
    pub fn teardown(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(id) = self.matrix_buffer.take() {
            backend.release_buffer(id);
        }
        if let Some(id) = self.data_buffer.take() {
            backend.release_buffer(id);
        }
        self.matrices = Vec::new();
        self.culled = Vec::new();
        self.tints = Vec::new();
        self.capacity = 0;
        self.initialized = false;
    }

    /// Full matrix array.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before init.
    pub fn matrices(&self) -> DrawResult<&[InstanceMatrix]> {
        self.ready().map(|()| self.matrices.as_slice())
    }

    /// Compacted matrix array.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before init.
    pub fn culled(&self) -> DrawResult<&[InstanceMatrix]> {
        self.ready().map(|()| self.culled.as_slice())
    }

    /// Tint array (empty when tints are disabled).
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before init.
    pub fn tints(&self) -> DrawResult<&[InstanceTint]> {
        self.ready().map(|()| self.tints.as_slice())
    }

    /// Mutable access to the full and culled arrays at once.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before init.
    pub fn arrays_mut(&mut self) -> DrawResult<(&mut [InstanceMatrix], &mut [InstanceMatrix])> {
        self.ready()?;
        Ok((self.matrices.as_mut_slice(), self.culled.as_mut_slice()))
    }

    /// Mutable tint array.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before init.
    pub fn tints_mut(&mut self) -> DrawResult<&mut [InstanceTint]> {
        self.ready()?;
        Ok(self.tints.as_mut_slice())
    }

    /// Backend buffer mirroring the uploaded matrices.
    #[must_use]
    pub fn matrix_buffer(&self) -> Option<BufferId> {
        self.matrix_buffer
    }

    /// Backend buffer mirroring the tints.
    #[must_use]
    pub fn data_buffer(&self) -> Option<BufferId> {
        self.data_buffer
    }

    /// Copies the full or culled array to the matrix buffer, and the tints to
    /// the data buffer when present.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before init, or a backend failure.
    pub fn upload(&self, backend: &mut dyn RenderBackend, use_culled: bool) -> DrawResult<()> {
        self.ready()?;
        let buffer = self.matrix_buffer.ok_or(DrawError::NotInitialized)?;
        let source = if use_culled { &self.culled } else { &self.matrices };
        backend.write_buffer(buffer, bytemuck::cast_slice(source))?;

        if let Some(data) = self.data_buffer {
            backend.write_buffer(data, bytemuck::cast_slice(&self.tints))?;
        }
        Ok(())
    }

    fn ready(&self) -> DrawResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(DrawError::NotInitialized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn test_rounded_capacity() {
        assert_eq!(rounded_capacity(0), Some(256));
        assert_eq!(rounded_capacity(10), Some(256));
        assert_eq!(rounded_capacity(255), Some(256));
        assert_eq!(rounded_capacity(256), Some(512));
        assert_eq!(rounded_capacity(1000), Some(1024));
        assert_eq!(rounded_capacity(usize::MAX), None);
        assert_eq!(rounded_capacity(usize::MAX - 1), None);
    }

    #[test]
    fn test_fill_sentinel_range() {
        let mut array = vec![InstanceMatrix::ZERO; 8];
        fill_sentinel(&mut array, 5);
        assert!(array[..5].iter().all(|m| *m == InstanceMatrix::ZERO));
        assert!(array[5..].iter().all(|m| m.matrix.is_nan() && !m.can_render()));

        fill_sentinel(&mut array, 8);
        fill_sentinel(&mut array, 100);
    }

    #[test]
    fn test_init_allocates_zeroed() {
        let mut backend = HeadlessBackend::new();
        let mut buffers = InstanceBuffers::new();
        assert!(matches!(buffers.matrices(), Err(DrawError::NotInitialized)));

        buffers.init(&mut backend, 10, false).unwrap();
        assert_eq!(buffers.capacity(), 256);
        assert!(buffers.matrices().unwrap().iter().all(|m| *m == InstanceMatrix::ZERO));
        assert_eq!(buffers.culled().unwrap().len(), 256);
        assert!(buffers.tints().unwrap().is_empty());
        assert_eq!(backend.live_buffers(), 1);
    }

    #[test]
    fn test_resize_only_grows() {
        let mut backend = HeadlessBackend::new();
        let mut buffers = InstanceBuffers::new();
        assert!(buffers.resize_if_needed(&mut backend, 100, false).unwrap());
        assert!(!buffers.resize_if_needed(&mut backend, 200, false).unwrap());
        assert!(!buffers.resize_if_needed(&mut backend, 5, false).unwrap());
        assert_eq!(buffers.capacity(), 256);

        assert!(buffers.resize_if_needed(&mut backend, 300, false).unwrap());
        assert_eq!(buffers.capacity(), 512);
        assert_eq!(backend.live_buffers(), 1);
        assert_eq!(backend.released_count(), 1);
    }

    #[test]
    fn test_enabling_tints_keeps_capacity() {
        let mut backend = HeadlessBackend::new();
        let mut buffers = InstanceBuffers::new();
        buffers.init(&mut backend, 600, false).unwrap();
        assert!(buffers.resize_if_needed(&mut backend, 10, true).unwrap());
        assert_eq!(buffers.capacity(), 768);
        assert_eq!(buffers.tints().unwrap().len(), 768);
        assert!(buffers.data_buffer().is_some());
    }

    #[test]
    fn test_teardown_idempotent() {
        let mut backend = HeadlessBackend::new();
        let mut buffers = InstanceBuffers::new();
        buffers.teardown(&mut backend);
        buffers.init(&mut backend, 1, true).unwrap();
        assert_eq!(backend.live_buffers(), 2);
        buffers.teardown(&mut backend);
        buffers.teardown(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert!(!buffers.is_initialized());
        assert_eq!(buffers.capacity(), 0);
    }

    #[test]
    fn test_failed_init_leaves_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut buffers = InstanceBuffers::new();
        buffers.init(&mut backend, 1, false).unwrap();
        backend.fail_next_create();
        let err = buffers.init(&mut backend, 1000, false).unwrap_err();
        assert!(matches!(err, DrawError::AllocationFailure { capacity: 1024, .. }));
        assert!(!buffers.is_initialized());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_overflowing_capacity_is_allocation_failure() {
        let mut backend = HeadlessBackend::new();
        let mut buffers = InstanceBuffers::new();
        buffers.init(&mut backend, 1, false).unwrap();

        let err = buffers.init(&mut backend, usize::MAX, false).unwrap_err();
        assert!(matches!(
            err,
            DrawError::AllocationFailure {
                what: "matrices",
                capacity: usize::MAX
            }
        ));
        assert!(!buffers.is_initialized());
        assert_eq!(buffers.capacity(), 0);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_upload_selected_array() {
        let mut backend = HeadlessBackend::new();
        let mut buffers = InstanceBuffers::new();
        buffers.init(&mut backend, 1, false).unwrap();
        {
            let (full, culled) = buffers.arrays_mut().unwrap();
            full[0] = InstanceMatrix::NAN;
            culled[0] = InstanceMatrix::from_trs(
                glam::Vec3::ONE,
                glam::Quat::IDENTITY,
                glam::Vec3::ONE,
            );
        }
        let id = buffers.matrix_buffer().unwrap();

        buffers.upload(&mut backend, true).unwrap();
        assert!(backend.buffer_matrices(id).unwrap()[0].can_render());

        buffers.upload(&mut backend, false).unwrap();
        assert!(!backend.buffer_matrices(id).unwrap()[0].can_render());
    }
}
