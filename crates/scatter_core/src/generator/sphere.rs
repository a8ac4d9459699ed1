//! Sphere distribution: instances on a spherical shell, or filling its volume.

use serde::{Deserialize, Serialize};

use super::InstanceGenerator;
use crate::distribution::{lerp, volume_falloff};
use crate::instance::{InstanceMatrix, TransformData};
use crate::random::Xorshift32;

/// Generation parameters for the sphere distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereProperties {
    /// Shell radius.
    pub radius: f32,
    /// Pull instances inside the shell with the cubic volume falloff.
    pub inside_sphere: bool,
    /// Blend (0..=1) from the volume falloff back toward the shell.
    pub inside_ratio: f32,
    /// Smallest uniform instance scale.
    pub min_scale: f32,
    /// Largest uniform instance scale.
    pub max_scale: f32,
    /// PRNG seed.
    pub seed: u32,
}

impl Default for SphereProperties {
    fn default() -> Self {
        Self {
            radius: 1.0,
            inside_sphere: false,
            inside_ratio: 0.0,
            min_scale: 0.1,
            max_scale: 0.2,
            seed: 777,
        }
    }
}

impl InstanceGenerator for SphereProperties {
    fn generate(&self, index: u32, transform: &TransformData) -> InstanceMatrix {
        let mut rng = Xorshift32::for_instance(self.seed, index);

        let direction = transform.rotation * rng.next_direction3();
        let mut position = direction * self.radius;
        if self.inside_sphere {
            let depth = lerp(volume_falloff(rng.next_f32()), 1.0, self.inside_ratio);
            position *= depth.clamp(0.0, 1.0);
        }

        let rotation = transform.rotation * rng.next_rotation();
        let uniform = rng.next_f32() * (self.max_scale - self.min_scale) + self.min_scale;

        InstanceMatrix::from_trs(position, rotation, uniform * transform.scale)
    }

    fn extent(&self) -> f32 {
        self.radius
    }
}
