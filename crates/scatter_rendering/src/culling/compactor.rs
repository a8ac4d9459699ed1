//! Data-parallel frustum culling compaction.
//!
//! Each rayon task filters one fixed-size chunk of the active range into a
//! private survivor list. The lists are concatenated in chunk order, so the
//! parallel output is identical to a sequential scan.

use glam::{Mat4, Vec3};
use rayon::prelude::*;
use scatter_core::InstanceMatrix;

use super::frustum::{BoundingSphere, CameraView, Containment, CullPolicy, FrustumPlanes};

/// Number of instances filtered by one rayon task.
pub const CULL_GRAIN: usize = 1024;

/// Per-pass inputs to the inside test besides the planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullParams {
    /// Mesh bounding radius, multiplied by each instance's largest scale.
    pub mesh_radius: f32,
    /// World offset added to every instance position (the emitter position).
    pub offset: Vec3,
}

impl Default for CullParams {
    fn default() -> Self {
        Self {
            mesh_radius: 1.0,
            offset: Vec3::ZERO,
        }
    }
}

impl CullParams {
    /// Bounding sphere of one instance, or `None` if it cannot render.
    #[inline]
    #[must_use]
    pub fn sphere_for(&self, instance: &InstanceMatrix) -> Option<BoundingSphere> {
        instance.can_render().then(|| {
            BoundingSphere::new(
                instance.position() + self.offset,
                self.mesh_radius * instance.radius(),
            )
        })
    }
}

/// Frustum culler for one camera.
#[derive(Debug, Clone, Default)]
pub struct FrustumCuller {
    frustum: FrustumPlanes,
    policy: CullPolicy,
}

impl FrustumCuller {
    /// Creates a culler for the given camera and policy.
    #[must_use]
    pub fn new(camera: &CameraView, policy: CullPolicy) -> Self {
        Self {
            frustum: camera.frustum(),
            policy,
        }
    }

    /// Re-extracts the planes from a camera.
    pub fn update(&mut self, camera: &CameraView) {
        self.frustum = camera.frustum();
    }

    /// Re-extracts the planes from a view-projection matrix.
    pub fn update_from_view_projection(&mut self, view_projection: &Mat4) {
        self.frustum = FrustumPlanes::from_view_projection(view_projection);
    }

    /// Changes which planes take part in the inside test.
    pub fn set_policy(&mut self, policy: CullPolicy) {
        self.policy = policy;
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> CullPolicy {
        self.policy
    }

    /// Returns the current frustum planes.
    #[must_use]
    pub fn frustum(&self) -> &FrustumPlanes {
        &self.frustum
    }

    /// Tests if a sphere is at least partially inside the frustum.
    #[inline]
    #[must_use]
    pub fn test_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.frustum
            .classify(&BoundingSphere::new(center, radius), self.policy)
            != Containment::Outside
    }

    #[inline]
    fn keeps(&self, instance: &InstanceMatrix, params: &CullParams) -> bool {
        params.sphere_for(instance).is_some_and(|sphere| {
            self.frustum.classify(&sphere, self.policy) != Containment::Outside
        })
    }

    /// Writes every surviving instance of `input[..count]` densely into
    /// `output`, starting at 0, and returns the survivor count.
    ///
    /// Slots of `output` past the survivor count keep their previous contents.
    pub fn compact(
        &self,
        input: &[InstanceMatrix],
        count: usize,
        params: &CullParams,
        output: &mut [InstanceMatrix],
    ) -> usize {
        let active = count.min(input.len());
        let survivors: Vec<Vec<InstanceMatrix>> = input[..active]
            .par_chunks(CULL_GRAIN)
            .map(|chunk| {
                chunk
                    .iter()
                    .filter(|instance| self.keeps(instance, params))
                    .copied()
                    .collect()
            })
            .collect();

        let mut written = 0;
        for instance in survivors.iter().flatten() {
            let Some(slot) = output.get_mut(written) else {
                break;
            };
            *slot = *instance;
            written += 1;
        }
        written
    }

    /// Single-threaded reference for [`FrustumCuller::compact`].
    pub fn compact_sequential(
        &self,
        input: &[InstanceMatrix],
        count: usize,
        params: &CullParams,
        output: &mut [InstanceMatrix],
    ) -> usize {
        let active = count.min(input.len());
        let mut written = 0;
        for instance in input[..active]
            .iter()
            .filter(|instance| self.keeps(instance, params))
        {
            let Some(slot) = output.get_mut(written) else {
                break;
            };
            *slot = *instance;
            written += 1;
        }
        written
    }
}
