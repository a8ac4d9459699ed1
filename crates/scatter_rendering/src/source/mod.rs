//! Per-tick providers of bounds and instance matrices.
//!
//! The drawer only depends on [`MatrixSource`]. The stock distributions
//! implement it directly; [`CallbackSource`] adapts user closures.

mod callback;

pub use callback::CallbackSource;

use glam::Vec3;
use rayon::prelude::*;
use scatter_core::{
    generate_into, DiscProperties, InstanceGenerator, InstanceMatrix, SphereProperties,
    TransformData,
};

use crate::config::DistributionConfig;
use crate::instancing::InstanceTint;

/// Axis-aligned world-space bounds handed to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Centre.
    pub center: Vec3,
    /// Full edge lengths.
    pub size: Vec3,
}

impl Bounds {
    /// Creates bounds from a centre and full size.
    #[must_use]
    pub const fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Cube of edge `2 * radius` centred on the emitter position.
    #[must_use]
    pub fn around(transform: &TransformData, radius: f32) -> Self {
        Self::new(transform.position, Vec3::splat(radius * 2.0))
    }

    /// Half edge lengths.
    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// True if `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        ((point - self.center).abs() - self.extents()).max_element() <= 0.0
    }
}

/// Supplies bounds and matrices to a drawer every update.
pub trait MatrixSource: Send {
    /// World-space bounds for the coming draw.
    fn bounds(&self, transform: &TransformData) -> Bounds;

    /// Writes `matrices[..count]`. Slots past `count` are sentinel-filled by
    /// the caller afterwards.
    fn compute_matrices(
        &mut self,
        matrices: &mut [InstanceMatrix],
        count: usize,
        transform: &TransformData,
    );

    /// Runs after culling on the array about to be uploaded. Returns the
    /// number of instances to draw.
    fn post_cull(&mut self, matrices: &mut [InstanceMatrix], draw_count: usize) -> usize {
        let _ = matrices;
        draw_count
    }

    /// Whether this source fills a per-instance data buffer.
    fn writes_instance_data(&self) -> bool {
        false
    }

    /// Fills the per-instance data buffer.
    fn fill_instance_data(&self, tints: &mut [InstanceTint]) {
        let _ = tints;
    }
}

fn fill_gradient(tints: &mut [InstanceTint]) {
    let len = tints.len();
    tints
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, tint)| *tint = InstanceTint::gradient(index, len));
}

impl MatrixSource for DiscProperties {
    fn bounds(&self, transform: &TransformData) -> Bounds {
        Bounds::around(transform, self.extent())
    }

    fn compute_matrices(
        &mut self,
        matrices: &mut [InstanceMatrix],
        count: usize,
        transform: &TransformData,
    ) {
        generate_into(&*self, matrices, count, transform);
    }

    fn writes_instance_data(&self) -> bool {
        self.randomize_color
    }

    fn fill_instance_data(&self, tints: &mut [InstanceTint]) {
        if self.randomize_color {
            fill_gradient(tints);
        }
    }
}

impl MatrixSource for SphereProperties {
    fn bounds(&self, transform: &TransformData) -> Bounds {
        Bounds::around(transform, self.extent())
    }

    fn compute_matrices(
        &mut self,
        matrices: &mut [InstanceMatrix],
        count: usize,
        transform: &TransformData,
    ) {
        generate_into(&*self, matrices, count, transform);
    }
}

impl MatrixSource for DistributionConfig {
    fn bounds(&self, transform: &TransformData) -> Bounds {
        match self {
            Self::Disc(disc) => disc.bounds(transform),
            Self::Sphere(sphere) => sphere.bounds(transform),
        }
    }

    fn compute_matrices(
        &mut self,
        matrices: &mut [InstanceMatrix],
        count: usize,
        transform: &TransformData,
    ) {
        match self {
            Self::Disc(disc) => disc.compute_matrices(matrices, count, transform),
            Self::Sphere(sphere) => sphere.compute_matrices(matrices, count, transform),
        }
    }

    fn writes_instance_data(&self) -> bool {
        match self {
            Self::Disc(disc) => disc.writes_instance_data(),
            Self::Sphere(sphere) => sphere.writes_instance_data(),
        }
    }

    fn fill_instance_data(&self, tints: &mut [InstanceTint]) {
        match self {
            Self::Disc(disc) => disc.fill_instance_data(tints),
            Self::Sphere(sphere) => sphere.fill_instance_data(tints),
        }
    }
}
