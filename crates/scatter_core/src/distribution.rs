//! # Distribution Curves
//!
//! Remaps uniform samples into radial falloffs used to place instances.
//!
//! All functions here are pure and branch-free. They must stay bit-stable:
//! the generators (and their tests) depend on the exact float sequence.

/// Linear interpolation `a + (b - a) * t`.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Radial falloff with shape exponent `k` and bias floor `d`.
///
/// ```text
/// f1 = x^k
/// f2 = 1 - lerp(f1, 1, f1)
/// f3 = f2 * (1 - d) + d
/// ```
///
/// For `x` in `[0, 1)`, `k > 0` and `d` in `[0, 1]` the result lies in
/// `[d, 1]`: `x = 0` maps to the full extent and `x -> 1` approaches `d`.
/// Small `k` packs samples toward the centre, large `k` toward the rim.
#[inline]
#[must_use]
pub fn falloff(x: f32, k: f32, d: f32) -> f32 {
    let f1 = x.powf(k);
    let f2 = 1.0 - lerp(f1, 1.0, f1);
    f2 * (1.0 - d) + d
}

/// Cubic volumetric falloff `1 - (x - 0.05)^3` used to fill sphere interiors.
///
/// Slightly above 1 at `x = 0`; callers clamp after blending.
#[inline]
#[must_use]
pub fn volume_falloff(x: f32) -> f32 {
    1.0 - (x - 0.05).powi(3)
}
