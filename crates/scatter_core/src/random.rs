//! # Xorshift Pseudo-Random Stream
//!
//! Small, allocation-free generator used by every instance generator.
//!
//! ## Determinism Guarantee
//!
//! Given the same seed (and instance index for [`Xorshift32::for_instance`]),
//! this generator produces **exactly** the same sequence on any platform, any
//! thread, any time. Editor previews and tests rely on this.

use std::f32::consts::TAU;

use glam::{Quat, Vec2, Vec3};
use rand::RngCore;

/// Replacement state for a zero seed. Xorshift is stuck at zero forever.
pub const DEFAULT_SEED: u32 = 0x6E62_4EB7;

/// Number of distinct scramble depths used by [`Xorshift32::for_instance`].
const INSTANCE_SCRAMBLE_PERIOD: u32 = 5;

/// One step of the 32-bit xorshift triple (13, 17, 5).
#[inline]
#[must_use]
pub const fn xorshift(mut state: u32) -> u32 {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    state
}

/// Seeded 32-bit xorshift generator.
///
/// Produces uniform floats in `[0, 1)`, unit directions and uniform
/// rotations. Cheap to construct, so every instance builds its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Creates a generator from a seed.
    ///
    /// A zero seed is replaced by [`DEFAULT_SEED`]. The state is advanced
    /// once so the first output is already mixed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        let state = if seed == 0 { DEFAULT_SEED } else { seed };
        Self {
            state: xorshift(state),
        }
    }

    /// Creates a decorrelated generator for one instance.
    ///
    /// The seed is offset by the index and then scrambled `index % 5` times,
    /// so neighbouring instances never share a stream even though they are
    /// generated independently and out of order.
    #[inline]
    #[must_use]
    pub const fn for_instance(seed: u32, index: u32) -> Self {
        let mut state = seed.wrapping_add(index);
        let mut round = 0;
        while round < index % INSTANCE_SCRAMBLE_PERIOD {
            state = xorshift(state);
            round += 1;
        }
        Self::new(state)
    }

    /// Returns the current internal state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> u32 {
        self.state
    }

    /// Returns the current state and advances.
    #[inline]
    fn next_state(&mut self) -> u32 {
        let current = self.state;
        self.state = xorshift(self.state);
        current
    }

    /// Uniform float in `[0, 1)` built from the top 23 bits of the state.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        f32::from_bits(0x3F80_0000 | (self.next_state() >> 9)) - 1.0
    }

    /// Fair coin flip from the low bit of the state.
    #[inline]
    pub fn next_bool(&mut self) -> bool {
        self.next_state() & 1 == 1
    }

    /// Uniform float in `[min, max)`.
    #[inline]
    pub fn next_f32_range(&mut self, min: f32, max: f32) -> f32 {
        self.next_f32() * (max - min) + min
    }

    /// Uniformly distributed unit vector on the circle.
    #[inline]
    pub fn next_direction2(&mut self) -> Vec2 {
        let angle = self.next_f32() * TAU;
        let (sin, cos) = angle.sin_cos();
        Vec2::new(cos, sin)
    }

    /// Uniformly distributed unit vector on the sphere.
    #[inline]
    pub fn next_direction3(&mut self) -> Vec3 {
        let u = self.next_f32();
        let v = self.next_f32();
        let z = u * 2.0 - 1.0;
        let r = (1.0 - z * z).max(0.0).sqrt();
        let (sin, cos) = (v * TAU).sin_cos();
        Vec3::new(cos * r, sin * r, z)
    }

    /// Uniformly distributed rotation (Shoemake), with `w >= 0`.
    #[inline]
    pub fn next_rotation(&mut self) -> Quat {
        let theta = self.next_f32() * TAU;
        let rho = self.next_f32() * TAU;
        let u = self.next_f32();

        let i = (1.0 - u).sqrt();
        let j = u.sqrt();
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_rho, cos_rho) = rho.sin_cos();

        let q = Quat::from_xyzw(i * sin_theta, i * cos_theta, j * sin_rho, j * cos_rho);
        if q.w < 0.0 {
            -q
        } else {
            q
        }
    }
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for Xorshift32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_state()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_state());
        let high = u64::from(self.next_state());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_state().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
