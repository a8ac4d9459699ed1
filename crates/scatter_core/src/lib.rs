//! # SCATTER Core
//!
//! Deterministic, data-parallel generation of per-instance transforms.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and index always produce the same matrix
//! 2. **Independent**: Each index owns its PRNG stream, no shared state
//! 3. **Parallel**: Generation fans out over rayon with no ordering constraints
//! 4. **Upload-ready**: [`InstanceMatrix`] is `Pod` and uploads verbatim
//!
//! ## Core Components
//!
//! - `Xorshift32`: seeded stream of floats, directions and rotations
//! - `falloff` / `volume_falloff`: radial remapping curves
//! - `InstanceMatrix`: mat4 with the visibility flag packed in translation w
//! - `DiscProperties` / `SphereProperties`: the two stock distributions
//!
//! ## Example
//!
//! ```rust,ignore
//! use scatter_core::{generate_into, DiscProperties, InstanceMatrix, TransformData};
//!
//! let disc = DiscProperties::default();
//! let mut matrices = vec![InstanceMatrix::ZERO; 256];
//! generate_into(&disc, &mut matrices, 10, &TransformData::IDENTITY);
//! assert!(matrices[..10].iter().all(InstanceMatrix::can_render));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod distribution;
pub mod generator;
pub mod instance;
pub mod random;

pub use distribution::{falloff, lerp, volume_falloff};
pub use generator::{
    generate_at, generate_into, generate_into_sequential, DiscProperties, InstanceGenerator,
    SphereProperties, GENERATION_GRAIN,
};
pub use instance::{InstanceMatrix, TransformData};
pub use random::{xorshift, Xorshift32, DEFAULT_SEED};

/// Re-exported math types used throughout the public API.
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
