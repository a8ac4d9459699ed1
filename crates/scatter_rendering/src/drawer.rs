//! Draw orchestration.
//!
//! [`InstancedDrawer`] sequences one update as
//! generate → sentinel fill → cull → post-cull → upload, then issues the
//! draw. The host drives it explicitly through [`InstancedDrawer::enable`],
//! [`InstancedDrawer::validate`], [`InstancedDrawer::tick`] and
//! [`InstancedDrawer::disable`].
//!
//! ## State Machine
//!
//! ```text
//! Uninitialized ──init ok──> Initialized ──disable──> Disposed
//!       ^                                                │
//!       └────────────────────── enable ──────────────────┘
//! ```
//!
//! Invalid parameters never mutate storage; they surface as
//! [`TickOutcome::Skipped`].

use std::sync::Arc;
use std::time::Instant;

use scatter_core::{InstanceMatrix, TransformData};

use crate::backend::{DrawCall, RenderBackend};
use crate::config::{DrawParams, DrawerConfig};
use crate::culling::{CameraView, CullParams, FrustumCuller};
use crate::error::{DrawError, DrawResult};
use crate::instancing::{fill_sentinel, DrawIndexedIndirectArgs, InstanceBuffers};
use crate::source::{Bounds, MatrixSource};
use crate::stats::{DrawerId, DrawerRegistry, DrawerReport};

/// Lifecycle state of a drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerState {
    /// No storage allocated yet.
    Uninitialized,
    /// Storage allocated; updates and draws run.
    Initialized,
    /// Storage released by `disable`.
    Disposed,
}

/// Why a call did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The drawer is not enabled.
    Disabled,
    /// Mesh or material missing.
    InvalidParams,
    /// Requested count is zero.
    EmptyCount,
    /// The host drives updates through [`InstancedDrawer::manual_tick`].
    ManualUpdate,
}

/// Result of a drawer entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Buffers were refreshed without drawing.
    Updated {
        /// Instances that will be drawn.
        draw_count: usize,
    },
    /// A draw was issued.
    Drawn {
        /// Instances drawn.
        draw_count: usize,
        /// Buffers were refreshed before drawing.
        updated: bool,
    },
    /// Nothing happened.
    Skipped(SkipReason),
}

/// Registry entry held while enabled. Dropping it unregisters the drawer.
#[derive(Debug)]
struct Registration {
    registry: Arc<DrawerRegistry>,
    id: DrawerId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

/// Owns one instance stream: its configuration, source, storage and
/// statistics registration.
#[derive(Debug)]
pub struct InstancedDrawer<S: MatrixSource> {
    config: DrawerConfig,
    source: S,
    buffers: InstanceBuffers,
    state: DrawerState,
    enabled: bool,
    manual_update: bool,
    draw_count: usize,
    bounds: Bounds,
    registration: Option<Registration>,
}

impl InstancedDrawer<crate::config::DistributionConfig> {
    /// Drawer fed by the distribution named in the configuration.
    #[must_use]
    pub fn from_config(config: DrawerConfig) -> Self {
        let source = config.distribution;
        Self::new(config, source)
    }
}

impl<S: MatrixSource> InstancedDrawer<S> {
    /// Creates a disabled, uninitialized drawer.
    #[must_use]
    pub fn new(config: DrawerConfig, source: S) -> Self {
        Self {
            config,
            source,
            buffers: InstanceBuffers::new(),
            state: DrawerState::Uninitialized,
            enabled: false,
            manual_update: false,
            draw_count: 0,
            bounds: Bounds::default(),
            registration: None,
        }
    }

    /// Registers with `registry`, allocates storage when the configuration
    /// is valid and runs a first update.
    ///
    /// # Errors
    ///
    /// [`DrawError::AllocationFailure`] when storage cannot be allocated;
    /// the drawer then stays [`DrawerState::Uninitialized`].
    pub fn enable(
        &mut self,
        backend: &mut dyn RenderBackend,
        registry: &Arc<DrawerRegistry>,
        transform: &TransformData,
    ) -> DrawResult<TickOutcome> {
        if self.enabled {
            return self.validate(backend, transform);
        }
        if self.state == DrawerState::Disposed {
            self.state = DrawerState::Uninitialized;
        }
        self.enabled = true;
        self.registration = Some(Registration {
            registry: Arc::clone(registry),
            id: registry.register(),
        });
        tracing::info!("instanced drawer enabled ({} instances)", self.config.count);

        self.validate(backend, transform)
    }

    /// Releases all storage, unregisters and enters [`DrawerState::Disposed`].
    pub fn disable(&mut self, backend: &mut dyn RenderBackend) {
        self.registration = None;
        self.buffers.teardown(backend);
        self.draw_count = 0;
        if self.enabled || self.state == DrawerState::Initialized {
            self.state = DrawerState::Disposed;
            tracing::info!("instanced drawer disabled");
        }
        self.enabled = false;
    }

    /// Applies a configuration change: clamps parameters, grows storage when
    /// the count no longer fits and refreshes the buffers.
    ///
    /// # Errors
    ///
    /// Allocation or backend failures.
    pub fn validate(
        &mut self,
        backend: &mut dyn RenderBackend,
        transform: &TransformData,
    ) -> DrawResult<TickOutcome> {
        if let Some(reason) = self.skip_reason() {
            self.publish();
            return Ok(TickOutcome::Skipped(reason));
        }
        self.config.draw.validate();
        self.ensure_storage(backend)?;
        let draw_count = self.update_buffers(backend, transform)?;
        Ok(TickOutcome::Updated { draw_count })
    }

    /// Replaces the draw parameters and runs [`InstancedDrawer::validate`],
    /// which grows storage only when the count no longer fits.
    ///
    /// # Errors
    ///
    /// Allocation or backend failures.
    pub fn set_draw_params(
        &mut self,
        backend: &mut dyn RenderBackend,
        params: DrawParams,
        transform: &TransformData,
    ) -> DrawResult<TickOutcome> {
        self.config.draw = params;
        self.validate(backend, transform)
    }

    /// Per-frame entry point. Skipped when the host drives updates manually.
    ///
    /// # Errors
    ///
    /// Allocation or backend failures.
    pub fn tick(
        &mut self,
        backend: &mut dyn RenderBackend,
        transform: &TransformData,
    ) -> DrawResult<TickOutcome> {
        if self.enabled && self.manual_update {
            return Ok(TickOutcome::Skipped(SkipReason::ManualUpdate));
        }
        self.manual_tick(backend, transform)
    }

    /// Updates (when `always_update` is set) and draws.
    ///
    /// # Errors
    ///
    /// Allocation or backend failures.
    pub fn manual_tick(
        &mut self,
        backend: &mut dyn RenderBackend,
        transform: &TransformData,
    ) -> DrawResult<TickOutcome> {
        if let Some(reason) = self.skip_reason() {
            return Ok(TickOutcome::Skipped(reason));
        }

        let mut updated = self.ensure_storage(backend)?;
        if updated || self.config.always_update {
            self.update_buffers(backend, transform)?;
            updated = true;
        }

        self.draw(backend)?;
        Ok(TickOutcome::Drawn {
            draw_count: self.draw_count,
            updated,
        })
    }

    /// Runs generate → sentinel fill → cull → post-cull → upload and returns
    /// the number of instances to draw.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before storage exists, or a backend
    /// failure during upload.
    pub fn update_buffers(
        &mut self,
        backend: &mut dyn RenderBackend,
        transform: &TransformData,
    ) -> DrawResult<usize> {
        if !self.buffers.is_initialized() {
            return Err(DrawError::NotInitialized);
        }
        let start = Instant::now();
        let count = self.config.count.min(self.buffers.capacity());
        let culling = self.config.draw.culling_enabled();

        self.bounds = self.source.bounds(transform);

        let (matrices, culled) = self.buffers.arrays_mut()?;
        self.source.compute_matrices(matrices, count, transform);
        fill_sentinel(matrices, count);

        let mut draw_count = count;
        if let (true, Some(camera)) = (culling, self.config.draw.camera) {
            draw_count = cull_into(&self.config.draw, &camera, transform, matrices, count, culled);
        }

        let target = if culling { culled } else { matrices };
        draw_count = self.source.post_cull(target, draw_count).min(target.len());

        if self.source.writes_instance_data() {
            self.source.fill_instance_data(self.buffers.tints_mut()?);
        }

        self.buffers.upload(backend, culling)?;
        self.draw_count = draw_count;

        self.config.debug.exec_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        if self.config.debug.show_logs {
            tracing::debug!(
                "buffers updated: {} of {} instances in {}",
                draw_count,
                count,
                self.config.debug.exec_time_label()
            );
        }
        self.publish();
        Ok(draw_count)
    }

    /// Issues the draw for the last update.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before storage exists, or the backend
    /// rejecting the call.
    pub fn draw(&self, backend: &mut dyn RenderBackend) -> DrawResult<()> {
        let instance_buffer = self
            .buffers
            .matrix_buffer()
            .ok_or(DrawError::NotInitialized)?;
        let mesh = self.config.draw.mesh.unwrap_or_default();
        let instance_count = u32::try_from(self.draw_count).unwrap_or(u32::MAX);

        backend.draw(&DrawCall {
            bounds: self.bounds,
            instance_buffer,
            data_buffer: self.buffers.data_buffer(),
            instance_count,
            params: &self.config.draw,
            indirect: DrawIndexedIndirectArgs::for_mesh(&mesh, instance_count),
        })?;
        Ok(())
    }

    fn skip_reason(&self) -> Option<SkipReason> {
        if !self.enabled {
            Some(SkipReason::Disabled)
        } else if !self.config.draw.is_valid() {
            Some(SkipReason::InvalidParams)
        } else if self.config.count == 0 {
            Some(SkipReason::EmptyCount)
        } else {
            None
        }
    }

    fn ensure_storage(&mut self, backend: &mut dyn RenderBackend) -> DrawResult<bool> {
        let with_tints = self.source.writes_instance_data();
        match self
            .buffers
            .resize_if_needed(backend, self.config.count, with_tints)
        {
            Ok(resized) => {
                self.state = DrawerState::Initialized;
                Ok(resized)
            }
            Err(error) => {
                tracing::warn!("instance buffer allocation failed: {}", error);
                self.state = DrawerState::Uninitialized;
                self.draw_count = 0;
                self.publish();
                Err(error)
            }
        }
    }

    fn publish(&self) {
        if let Some(registration) = &self.registration {
            let triangles = u64::from(self.config.draw.mesh_triangle_count.unwrap_or(0));
            registration.registry.report(
                registration.id,
                DrawerReport {
                    active: self.is_active(),
                    exec_time_ms: self.config.debug.exec_time_ms,
                    triangles: triangles * self.draw_count as u64,
                },
            );
        }
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> DrawerState {
        self.state
    }

    /// Enabled, initialized and configured with a valid, non-empty setup.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.state == DrawerState::Initialized && self.skip_reason().is_none()
    }

    /// Whether the drawer is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Instances drawn by the last update.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    /// Allocated instance capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffers.capacity()
    }

    /// Bounds computed by the last update.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Full matrix array, including the sentinel tail.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before storage exists.
    pub fn matrices(&self) -> DrawResult<&[InstanceMatrix]> {
        self.buffers.matrices()
    }

    /// Compacted matrix array. Only the first `draw_count` entries are
    /// meaningful when culling is enabled.
    ///
    /// # Errors
    ///
    /// [`DrawError::NotInitialized`] before storage exists.
    pub fn culled_matrices(&self) -> DrawResult<&[InstanceMatrix]> {
        self.buffers.culled()
    }

    /// Storage owned by this drawer.
    #[must_use]
    pub fn buffers(&self) -> &InstanceBuffers {
        &self.buffers
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    /// Mutable configuration. Call [`InstancedDrawer::validate`] afterwards.
    pub fn config_mut(&mut self) -> &mut DrawerConfig {
        &mut self.config
    }

    /// Matrix source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable matrix source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Sets the camera used for culling.
    pub fn set_camera(&mut self, camera: Option<CameraView>) {
        self.config.draw.camera = camera;
    }

    /// Hands update scheduling to the host: `tick` becomes a no-op and the
    /// host calls [`InstancedDrawer::manual_tick`].
    pub fn set_manual_update(&mut self, manual: bool) {
        self.manual_update = manual;
    }
}

fn cull_into(
    params: &DrawParams,
    camera: &CameraView,
    transform: &TransformData,
    matrices: &[InstanceMatrix],
    count: usize,
    culled: &mut [InstanceMatrix],
) -> usize {
    let culler = FrustumCuller::new(camera, params.cull_policy);
    let cull_params = CullParams {
        mesh_radius: params.mesh_radius,
        offset: transform.position,
    };
    culler.compact(matrices, count, &cull_params, culled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::config::{MaterialId, MeshInfo};
    use scatter_core::DiscProperties;

    fn valid_config(count: usize) -> DrawerConfig {
        let mut config = DrawerConfig {
            count,
            ..DrawerConfig::default()
        };
        config.draw.mesh = Some(MeshInfo {
            index_count: 36,
            triangle_count: Some(12),
            ..MeshInfo::default()
        });
        config.draw.material = Some(MaterialId(1));
        config
    }

    #[test]
    fn test_disabled_drawer_skips() {
        let mut backend = HeadlessBackend::new();
        let mut drawer = InstancedDrawer::new(valid_config(10), DiscProperties::default());
        let outcome = drawer.tick(&mut backend, &TransformData::IDENTITY).unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::Disabled));
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_enable_initializes_and_updates() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(valid_config(10), DiscProperties::default());

        let outcome = drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();
        assert_eq!(outcome, TickOutcome::Updated { draw_count: 10 });
        assert_eq!(drawer.state(), DrawerState::Initialized);
        assert!(drawer.is_active());
        assert_eq!(drawer.capacity(), 256);
        assert_eq!(registry.totals().triangles, 120);
    }

    #[test]
    fn test_invalid_params_do_not_allocate() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(DrawerConfig::default(), DiscProperties::default());

        let outcome = drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::InvalidParams));
        assert_eq!(drawer.state(), DrawerState::Uninitialized);
        assert!(!drawer.is_active());
        assert_eq!(backend.created_count(), 0);
        assert_eq!(registry.summary_lines()[0], "Disabled count : 1");
    }

    #[test]
    fn test_zero_count_skips() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(valid_config(0), DiscProperties::default());
        let outcome = drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::EmptyCount));
        assert_eq!(backend.created_count(), 0);
    }

    #[test]
    fn test_tick_draws_and_respects_always_update() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(valid_config(5), DiscProperties::default());
        drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();

        let outcome = drawer.tick(&mut backend, &TransformData::IDENTITY).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Drawn {
                draw_count: 5,
                updated: true
            }
        );

        drawer.config_mut().always_update = false;
        let outcome = drawer.tick(&mut backend, &TransformData::IDENTITY).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Drawn {
                draw_count: 5,
                updated: false
            }
        );
        assert_eq!(backend.draws().len(), 2);
        assert_eq!(backend.last_draw().unwrap().indirect.index_count, 36);
    }

    #[test]
    fn test_manual_update_mode() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(valid_config(5), DiscProperties::default());
        drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();
        drawer.set_manual_update(true);

        assert_eq!(
            drawer.tick(&mut backend, &TransformData::IDENTITY).unwrap(),
            TickOutcome::Skipped(SkipReason::ManualUpdate)
        );
        assert!(matches!(
            drawer.manual_tick(&mut backend, &TransformData::IDENTITY).unwrap(),
            TickOutcome::Drawn { .. }
        ));
    }

    #[test]
    fn test_disable_and_reenable() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(valid_config(5), DiscProperties::default());
        drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();

        drawer.disable(&mut backend);
        drawer.disable(&mut backend);
        assert_eq!(drawer.state(), DrawerState::Disposed);
        assert!(registry.is_empty());
        assert_eq!(backend.live_buffers(), 0);
        assert!(matches!(drawer.matrices(), Err(DrawError::NotInitialized)));

        drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();
        assert_eq!(drawer.state(), DrawerState::Initialized);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_draw_params_keeps_fitting_storage() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(valid_config(10), DiscProperties::default());
        drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();
        let buffer = drawer.buffers().matrix_buffer();

        let mut params = drawer.config().draw.clone();
        params.layer = 4;
        let outcome = drawer
            .set_draw_params(&mut backend, params, &TransformData::IDENTITY)
            .unwrap();
        assert_eq!(outcome, TickOutcome::Updated { draw_count: 10 });
        assert_eq!(drawer.config().draw.layer, 4);
        assert_eq!(drawer.buffers().matrix_buffer(), buffer);
        assert_eq!(backend.created_count(), 1);
    }

    #[test]
    fn test_dropping_enabled_drawer_unregisters() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        {
            let mut drawer = InstancedDrawer::new(valid_config(10), DiscProperties::default());
            drawer
                .enable(&mut backend, &registry, &TransformData::IDENTITY)
                .unwrap();
            assert_eq!(registry.len(), 1);
            assert_eq!(registry.totals().triangles, 120);
        }
        assert!(registry.is_empty());
        assert_eq!(registry.totals(), DrawerReport::default());
        assert_eq!(
            registry.summary_lines(),
            vec!["(totals) EXEC: 0.00 ms \t TRIS: 0".to_string()]
        );
    }

    #[test]
    fn test_overflowing_count_fails_allocation() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::new(valid_config(10), DiscProperties::default());
        drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();

        drawer.config_mut().count = usize::MAX;
        let err = drawer.tick(&mut backend, &TransformData::IDENTITY).unwrap_err();
        assert!(matches!(err, DrawError::AllocationFailure { .. }));
        assert_eq!(drawer.state(), DrawerState::Uninitialized);
        assert_eq!(drawer.capacity(), 0);
        assert_eq!(backend.live_buffers(), 0);

        drawer.config_mut().count = 10;
        assert!(matches!(
            drawer.tick(&mut backend, &TransformData::IDENTITY).unwrap(),
            TickOutcome::Drawn { draw_count: 10, .. }
        ));
    }

    #[test]
    fn test_update_before_init_is_error() {
        let mut backend = HeadlessBackend::new();
        let mut drawer = InstancedDrawer::new(valid_config(5), DiscProperties::default());
        assert!(matches!(
            drawer.update_buffers(&mut backend, &TransformData::IDENTITY),
            Err(DrawError::NotInitialized)
        ));
        assert!(matches!(drawer.draw(&mut backend), Err(DrawError::NotInitialized)));
    }

    #[test]
    fn test_from_config_uses_distribution() {
        let mut backend = HeadlessBackend::new();
        let registry = Arc::new(DrawerRegistry::new());
        let mut drawer = InstancedDrawer::from_config(valid_config(3));
        drawer
            .enable(&mut backend, &registry, &TransformData::IDENTITY)
            .unwrap();
        let matrices = drawer.matrices().unwrap();
        assert!(matrices[..3].iter().all(InstanceMatrix::can_render));
        assert!(matrices[3..].iter().all(|m| !m.can_render()));
    }
}
