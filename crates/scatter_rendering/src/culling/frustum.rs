//! Frustum extraction for view-dependent culling.
//!
//! Builds world-space clip planes either from per-eye corner rays (mono or
//! stereo cameras) or from a view-projection matrix, and classifies bounding
//! spheres against them.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Reference depth at which eye corner rays are sampled.
pub const DEFAULT_CORNER_DEPTH: f32 = 10.0;

/// A plane in 3D space (`dot(normal, p) + d = 0`).
///
/// Positive signed distance is on the inside of the frustum.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Plane {
    /// Unit normal, pointing into the frustum.
    pub normal: Vec3,
    /// Distance term.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane with the given normal passing through `point`.
    #[must_use]
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane through three points; the normal follows `(b - a) x (c - a)`.
    #[must_use]
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(a),
        }
    }

    /// Normalizes a raw `(a, b, c, d)` plane.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            Self {
                normal: self.normal / len,
                d: self.d / len,
            }
        } else {
            self
        }
    }

    /// Returns the signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Converts to `(nx, ny, nz, d)`.
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.d]
    }

    fn from_vec4(v: Vec4) -> Self {
        Self::new(v.truncate(), v.w).normalized()
    }
}

/// World-space sphere used for the inside test. Built per instance, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Centre.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a bounding sphere.
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Which planes participate in the inside test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullPolicy {
    /// Left, right, bottom and top only. Never false-excludes because of a
    /// misplaced near/far plane, at the cost of keeping instances behind the
    /// camera.
    #[default]
    SidePlanes,
    /// All six planes.
    AllPlanes,
}

impl CullPolicy {
    /// Number of leading planes tested (planes are ordered L, R, B, T, N, F).
    #[must_use]
    pub const fn plane_count(self) -> usize {
        match self {
            Self::SidePlanes => 4,
            Self::AllPlanes => 6,
        }
    }
}

/// Result of classifying a sphere against the frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Fully outside at least one tested plane.
    Outside,
    /// Fully inside every tested plane.
    Inside,
    /// Straddles at least one tested plane.
    Intersecting,
}

/// The six frustum planes in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrustumPlanes {
    /// Left, right, bottom, top, near, far planes.
    pub planes: [Plane; 6],
}

impl FrustumPlanes {
    /// Left plane index.
    pub const LEFT: usize = 0;
    /// Right plane index.
    pub const RIGHT: usize = 1;
    /// Bottom plane index.
    pub const BOTTOM: usize = 2;
    /// Top plane index.
    pub const TOP: usize = 3;
    /// Near plane index.
    pub const NEAR: usize = 4;
    /// Far plane index.
    pub const FAR: usize = 5;

    /// Extracts planes from a camera description.
    ///
    /// Side planes pass through the camera position and the outer corner rays
    /// of both eyes (left eye's left edge, right eye's right edge), so a
    /// stereo pair is covered by one widened frustum.
    #[must_use]
    pub fn from_camera(camera: &CameraView) -> Self {
        let bl = camera.left_eye.corners[EyeFrustum::BOTTOM_LEFT];
        let tl = camera.left_eye.corners[EyeFrustum::TOP_LEFT];
        let tr = camera.right_eye.corners[EyeFrustum::TOP_RIGHT];
        let br = camera.right_eye.corners[EyeFrustum::BOTTOM_RIGHT];

        let local = [
            Plane::from_points(bl, Vec3::ZERO, tl),
            Plane::from_points(tr, Vec3::ZERO, br),
            Plane::from_points(br, Vec3::ZERO, bl),
            Plane::from_points(tl, Vec3::ZERO, tr),
        ];

        let mut planes = [Plane::default(); 6];
        for (world, plane) in planes.iter_mut().zip(local) {
            *world = Plane::from_normal_and_point(camera.rotation * plane.normal, camera.position);
        }

        let forward = camera.forward();
        planes[Self::NEAR] =
            Plane::from_normal_and_point(forward, camera.position + forward * camera.near);
        planes[Self::FAR] =
            Plane::from_normal_and_point(-forward, camera.position + forward * camera.far);

        Self { planes }
    }

    /// Extracts planes from a view-projection matrix (depth range `[0, 1]`).
    #[must_use]
    pub fn from_view_projection(m: &Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));

        Self {
            planes: [
                Plane::from_vec4(r3 + r0),
                Plane::from_vec4(r3 - r0),
                Plane::from_vec4(r3 + r1),
                Plane::from_vec4(r3 - r1),
                Plane::from_vec4(r2),
                Plane::from_vec4(r3 - r2),
            ],
        }
    }

    /// Classifies a sphere against the planes selected by `policy`.
    #[inline]
    #[must_use]
    pub fn classify(&self, sphere: &BoundingSphere, policy: CullPolicy) -> Containment {
        let mut fully_inside = true;
        for plane in &self.planes[..policy.plane_count()] {
            let distance = plane.distance_to_point(sphere.center);
            if distance < -sphere.radius {
                return Containment::Outside;
            }
            fully_inside &= distance > sphere.radius;
        }
        if fully_inside {
            Containment::Inside
        } else {
            Containment::Intersecting
        }
    }

    /// Converts planes to array format for GPU upload.
    #[must_use]
    pub fn as_arrays(&self) -> [[f32; 4]; 6] {
        self.planes.map(|plane| plane.as_array())
    }
}

/// Four corner rays of one eye in camera-local space at a reference depth.
///
/// Camera-local axes: x right, y up, z forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeFrustum {
    /// Bottom-left, top-left, top-right, bottom-right.
    pub corners: [Vec3; 4],
}

impl EyeFrustum {
    /// Bottom-left corner index.
    pub const BOTTOM_LEFT: usize = 0;
    /// Top-left corner index.
    pub const TOP_LEFT: usize = 1;
    /// Top-right corner index.
    pub const TOP_RIGHT: usize = 2;
    /// Bottom-right corner index.
    pub const BOTTOM_RIGHT: usize = 3;

    /// Symmetric eye frustum from a vertical field of view (radians).
    #[must_use]
    pub fn from_fov(vertical_fov: f32, aspect: f32, depth: f32) -> Self {
        let half_height = depth * (vertical_fov * 0.5).tan();
        let half_width = half_height * aspect;
        Self {
            corners: [
                Vec3::new(-half_width, -half_height, depth),
                Vec3::new(-half_width, half_height, depth),
                Vec3::new(half_width, half_height, depth),
                Vec3::new(half_width, -half_height, depth),
            ],
        }
    }

    /// Same frustum with every corner shifted sideways (eye offset).
    #[must_use]
    pub fn offset(self, x: f32) -> Self {
        Self {
            corners: self.corners.map(|corner| corner + Vec3::new(x, 0.0, 0.0)),
        }
    }
}

/// Everything the culler needs from the camera provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// World position.
    pub position: Vec3,
    /// World rotation (camera-local z is forward).
    pub rotation: Quat,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Left eye corners (the only eye for mono cameras).
    pub left_eye: EyeFrustum,
    /// Right eye corners.
    pub right_eye: EyeFrustum,
}

impl CameraView {
    /// Single-eye camera.
    #[must_use]
    pub fn mono(
        position: Vec3,
        rotation: Quat,
        vertical_fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let eye = EyeFrustum::from_fov(vertical_fov, aspect, DEFAULT_CORNER_DEPTH);
        Self {
            position,
            rotation,
            near,
            far,
            left_eye: eye,
            right_eye: eye,
        }
    }

    /// Dual-eye camera with eyes `eye_separation` apart.
    #[must_use]
    pub fn stereo(
        position: Vec3,
        rotation: Quat,
        vertical_fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
        eye_separation: f32,
    ) -> Self {
        let eye = EyeFrustum::from_fov(vertical_fov, aspect, DEFAULT_CORNER_DEPTH);
        let half = eye_separation * 0.5;
        Self {
            position,
            rotation,
            near,
            far,
            left_eye: eye.offset(-half),
            right_eye: eye.offset(half),
        }
    }

    /// World-space view direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Extracts the frustum planes for this camera.
    #[must_use]
    pub fn frustum(&self) -> FrustumPlanes {
        FrustumPlanes::from_camera(self)
    }
}
