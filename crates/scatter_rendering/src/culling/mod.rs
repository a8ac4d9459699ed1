//! Culling systems for the instance stream.
//!
//! Extracts frustum planes from a camera description and compacts the
//! instances whose bounding spheres survive the inside test.

mod compactor;
mod frustum;

pub use compactor::{CullParams, FrustumCuller, CULL_GRAIN};
pub use frustum::{
    BoundingSphere, CameraView, Containment, CullPolicy, EyeFrustum, FrustumPlanes, Plane,
    DEFAULT_CORNER_DEPTH,
};
