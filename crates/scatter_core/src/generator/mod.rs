//! Instance transform generators.
//!
//! A generator maps `(index, emitter transform)` to one [`InstanceMatrix`].
//! Every index owns its own PRNG stream, so indices can be produced in any
//! order on any thread and still come out bit-identical.

mod disc;
mod sphere;

pub use disc::DiscProperties;
pub use sphere::SphereProperties;

use rayon::prelude::*;

use crate::instance::{InstanceMatrix, TransformData};

/// Minimum number of indices handed to one rayon task.
pub const GENERATION_GRAIN: usize = 64;

/// Produces one instance matrix per index.
///
/// Implementations must be pure in `index`: no interior mutability, no
/// dependence on evaluation order.
pub trait InstanceGenerator: Sync {
    /// Generates the matrix for `index` under the given emitter transform.
    fn generate(&self, index: u32, transform: &TransformData) -> InstanceMatrix;

    /// Half-extent of the region the generator fills, before emitter scale.
    fn extent(&self) -> f32;
}

/// Writes the matrix for `index` into `out`, or does nothing when
/// `index >= count` (over-allocated tail slots keep their old contents).
#[inline]
pub fn generate_at<G: InstanceGenerator + ?Sized>(
    generator: &G,
    out: &mut InstanceMatrix,
    index: usize,
    count: usize,
    transform: &TransformData,
) {
    if index >= count {
        return;
    }
    *out = generator.generate(index as u32, transform);
}

/// Fills `out[..count]` in parallel. Slots at and beyond `count` are untouched.
pub fn generate_into<G: InstanceGenerator + ?Sized>(
    generator: &G,
    out: &mut [InstanceMatrix],
    count: usize,
    transform: &TransformData,
) {
    let active = count.min(out.len());
    out[..active]
        .par_iter_mut()
        .with_min_len(GENERATION_GRAIN)
        .enumerate()
        .for_each(|(index, slot)| generate_at(generator, slot, index, count, transform));
}

/// Single-threaded reference for [`generate_into`].
pub fn generate_into_sequential<G: InstanceGenerator + ?Sized>(
    generator: &G,
    out: &mut [InstanceMatrix],
    count: usize,
    transform: &TransformData,
) {
    for (index, slot) in out.iter_mut().enumerate() {
        generate_at(generator, slot, index, count, transform);
    }
}
