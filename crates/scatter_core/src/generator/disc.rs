//! Disc distribution: instances spread over a thick disc in the local YZ plane.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::InstanceGenerator;
use crate::distribution::{falloff, lerp};
use crate::instance::{InstanceMatrix, TransformData};
use crate::random::Xorshift32;

/// Generation parameters for the disc distribution.
///
/// The disc lies in the local YZ plane; local X is the thickness axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscProperties {
    /// Emit a per-instance colour gradient alongside the matrices.
    pub randomize_color: bool,
    /// Disc radius.
    pub radius: f32,
    /// Full thickness along local X.
    pub thickness: f32,
    /// Base instance scale.
    pub scale: f32,
    /// Blend (0..=1) from uniform scale to a random factor in `[0.5, 2.0)`.
    pub scale_ratio: f32,
    /// Radial falloff exponent (0.5..=8).
    pub distribution_radius: f32,
    /// Thickness falloff exponent (0.5..=8).
    pub distribution_thickness: f32,
    /// Radial bias floor (0..=1); keeps instances away from the centre.
    pub ratio: f32,
    /// PRNG seed.
    pub seed: u32,
}

impl Default for DiscProperties {
    fn default() -> Self {
        Self {
            randomize_color: false,
            radius: 1.0,
            thickness: 1.0,
            scale: 1.0,
            scale_ratio: 0.0,
            distribution_radius: 1.7,
            distribution_thickness: 1.7,
            ratio: 0.0,
            seed: 777,
        }
    }
}

impl InstanceGenerator for DiscProperties {
    fn generate(&self, index: u32, transform: &TransformData) -> InstanceMatrix {
        let mut rng = Xorshift32::for_instance(self.seed, index);

        let radial = falloff(rng.next_f32(), self.distribution_radius, self.ratio);
        let direction = rng.next_direction2() * self.radius * radial;
        let mut position = Vec3::new(0.0, direction.x, direction.y);

        let depth = falloff(rng.next_f32(), self.distribution_thickness, 0.0);
        let sign = if rng.next_bool() { 1.0 } else { -1.0 };
        position.x = sign * (depth * rng.next_f32()) * self.thickness;

        let position = transform.rotation * position;
        let rotation = transform.rotation * rng.next_rotation();

        let factor = lerp(1.0, rng.next_f32() * 1.5 + 0.5, self.scale_ratio);
        let scale = self.scale * factor * transform.scale;

        InstanceMatrix::from_trs(position, rotation, scale)
    }

    fn extent(&self) -> f32 {
        self.radius
    }
}
