//! # SCATTER Rendering
//!
//! Buffer lifecycle, frustum culling and draw orchestration for procedurally
//! scattered instances.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ONE UPDATE TICK                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  MatrixSource → matrices[..count] → NaN tail [count..cap)     │
//! │        ↓                                                      │
//! │  FrustumCuller (rayon) → culled[..draw_count]                 │
//! │        ↓                                                      │
//! │  post-cull → upload → RenderBackend::draw                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! - Capacity is always `(count / 256 + 1) * 256` and only grows until teardown
//! - Slots past the active count hold NaN matrices and never render
//! - Invalid parameters skip the tick without touching storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scatter_rendering::{DrawerConfig, DrawerRegistry, HeadlessBackend, InstancedDrawer};
//!
//! let config = DrawerConfig::from_toml_str(include_str!("drawer.toml"))?;
//! let registry = Arc::new(DrawerRegistry::new());
//! let mut backend = HeadlessBackend::new();
//! let mut drawer = InstancedDrawer::from_config(config);
//!
//! drawer.enable(&mut backend, &registry, &transform)?;
//! loop {
//!     drawer.tick(&mut backend, &transform)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod config;
pub mod culling;
pub mod drawer;
pub mod error;
pub mod instancing;
pub mod source;
pub mod stats;

pub use backend::{BackendError, BufferId, DrawCall, HeadlessBackend, RecordedDraw, RenderBackend};
#[cfg(feature = "gpu")]
pub use backend::{PreparedDraw, WgpuBackend};
pub use config::{
    DebugParams, DistributionConfig, DrawMode, DrawParams, DrawerConfig, LightProbeUsage,
    MaterialId, MeshInfo, MotionVectorMode, ReflectionProbeUsage, ShadowCastingMode, MAX_LAYER,
};
pub use culling::{
    BoundingSphere, CameraView, Containment, CullParams, CullPolicy, EyeFrustum, FrustumCuller,
    FrustumPlanes, Plane,
};
pub use drawer::{DrawerState, InstancedDrawer, SkipReason, TickOutcome};
pub use error::{DrawError, DrawResult};
pub use instancing::{
    fill_sentinel, rounded_capacity, DrawIndexedIndirectArgs, InstanceBuffers, InstanceTint,
    CHUNK_SIZE, INSTANCE_DATA_SLOT, INSTANCE_MATRIX_SLOT,
};
pub use source::{Bounds, CallbackSource, MatrixSource};
pub use stats::{format_triangles, DrawerId, DrawerRegistry, DrawerReport};
