//! # Instance Matrix Encoding
//!
//! Per-instance data uploaded to the GPU, plus the emitter transform snapshot.
//!
//! ## Visibility Packing
//!
//! The translation column's `w` component is deliberately overloaded as a
//! visibility flag (`1` = visible, `0` = hidden). This keeps the upload
//! layout a plain `mat4` per instance with no parallel flag array, and the
//! vertex shader reads the matrix unchanged. Any code that writes `w` must
//! go through [`InstanceMatrix::set_visible`] or a full TRS compose.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};

/// One instance transform, laid out as a column-major 4x4 matrix.
///
/// 64 bytes, `Pod`, uploaded verbatim into the per-instance buffer.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceMatrix {
    /// The raw transform. Translation `w` doubles as the visibility flag.
    pub matrix: Mat4,
}

impl InstanceMatrix {
    /// Size in bytes of one uploaded instance.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// All-NaN sentinel marking a slot that must never render.
    pub const NAN: Self = Self {
        matrix: Mat4::NAN,
    };

    /// All-zero matrix (the state of freshly allocated storage).
    pub const ZERO: Self = Self {
        matrix: Mat4::ZERO,
    };

    /// Wraps an existing matrix.
    #[inline]
    #[must_use]
    pub const fn new(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Composes translate * rotate * scale. The result is visible.
    #[inline]
    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            matrix: Mat4::from_scale_rotation_translation(scale, rotation, position),
        }
    }

    /// Returns a copy with the visibility flag set or cleared.
    #[inline]
    #[must_use]
    pub fn set_visible(mut self, visible: bool) -> Self {
        self.matrix.w_axis.w = if visible { 1.0 } else { 0.0 };
        self
    }

    /// Reads the visibility flag. NaN reads as hidden.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.matrix.w_axis.w > 0.0
    }

    /// True when any entry is NaN (the sentinel included) or the matrix is
    /// all zero (never written).
    #[inline]
    #[must_use]
    pub fn is_nan_or_zero(&self) -> bool {
        self.matrix.is_nan() || self.matrix == Mat4::ZERO
    }

    /// Visible, and neither a sentinel nor an untouched slot.
    #[inline]
    #[must_use]
    pub fn can_render(&self) -> bool {
        self.is_visible() && !self.is_nan_or_zero()
    }

    /// Translation column xyz.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Overwrites the translation, preserving the visibility flag.
    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        let w = self.matrix.w_axis.w;
        self.matrix.w_axis = Vec4::new(position.x, position.y, position.z, w);
    }

    /// Lengths of the upper-left 3x3 column vectors.
    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        Vec3::new(
            self.matrix.x_axis.truncate().length(),
            self.matrix.y_axis.truncate().length(),
            self.matrix.z_axis.truncate().length(),
        )
    }

    /// Largest scale component, used as the bounding-sphere radius factor.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.scale().max_element()
    }
}

impl Default for InstanceMatrix {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Mat4> for InstanceMatrix {
    fn from(matrix: Mat4) -> Self {
        Self { matrix }
    }
}

/// Snapshot of the emitter transform for one tick.
///
/// Equality is component-wise on position, rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformData {
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// Lossy world scale (non-uniform).
    pub scale: Vec3,
}

impl TransformData {
    /// Identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform snapshot.
    #[inline]
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Identity transform moved to `position`.
    #[inline]
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }
}

impl Default for TransformData {
    fn default() -> Self {
        Self::IDENTITY
    }
}
