//! Closure-backed matrix source.

use scatter_core::{InstanceMatrix, TransformData};

use super::{Bounds, MatrixSource};

type BoundsFn = dyn Fn(&TransformData) -> Bounds + Send;
type MatricesFn = dyn FnMut(&mut [InstanceMatrix], usize, &TransformData) + Send;
type PostCullFn = dyn FnMut(&mut [InstanceMatrix], usize) -> usize + Send;

/// Matrix source driven by user callbacks.
///
/// ```rust,ignore
/// let source = CallbackSource::new(
///     |t| Bounds::around(t, 10.0),
///     |matrices, count, t| grid_layout(matrices, count, t),
/// )
/// .with_post_cull(|matrices, n| n.min(100));
/// ```
pub struct CallbackSource {
    bounds: Box<BoundsFn>,
    matrices: Box<MatricesFn>,
    post_cull: Option<Box<PostCullFn>>,
}

impl CallbackSource {
    /// Creates a source from a bounds callback and a matrix callback.
    pub fn new<B, M>(bounds: B, matrices: M) -> Self
    where
        B: Fn(&TransformData) -> Bounds + Send + 'static,
        M: FnMut(&mut [InstanceMatrix], usize, &TransformData) + Send + 'static,
    {
        Self {
            bounds: Box::new(bounds),
            matrices: Box::new(matrices),
            post_cull: None,
        }
    }

    /// Adds a callback run on the culled array before upload. It returns the
    /// number of instances to draw.
    #[must_use]
    pub fn with_post_cull<P>(mut self, post_cull: P) -> Self
    where
        P: FnMut(&mut [InstanceMatrix], usize) -> usize + Send + 'static,
    {
        self.post_cull = Some(Box::new(post_cull));
        self
    }
}

impl std::fmt::Debug for CallbackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSource")
            .field("post_cull", &self.post_cull.is_some())
            .finish_non_exhaustive()
    }
}

impl MatrixSource for CallbackSource {
    fn bounds(&self, transform: &TransformData) -> Bounds {
        (self.bounds)(transform)
    }

    fn compute_matrices(
        &mut self,
        matrices: &mut [InstanceMatrix],
        count: usize,
        transform: &TransformData,
    ) {
        (self.matrices)(matrices, count, transform);
    }

    fn post_cull(&mut self, matrices: &mut [InstanceMatrix], draw_count: usize) -> usize {
        match self.post_cull.as_mut() {
            Some(callback) => callback(matrices, draw_count),
            None => draw_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn line_source() -> CallbackSource {
        CallbackSource::new(
            |t| Bounds::around(t, 5.0),
            |matrices, count, t| {
                for (index, slot) in matrices.iter_mut().take(count).enumerate() {
                    let position = t.position + Vec3::X * index as f32;
                    *slot = InstanceMatrix::from_trs(position, Quat::IDENTITY, Vec3::ONE);
                }
            },
        )
    }

    #[test]
    fn test_callbacks_are_invoked() {
        let mut source = line_source();
        let transform = TransformData::from_position(Vec3::Y);
        assert_eq!(source.bounds(&transform).center, Vec3::Y);

        let mut matrices = vec![InstanceMatrix::ZERO; 4];
        source.compute_matrices(&mut matrices, 3, &transform);
        assert_eq!(matrices[2].position(), Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(matrices[3], InstanceMatrix::ZERO);
        assert_eq!(source.post_cull(&mut matrices, 3), 3);
    }

    #[test]
    fn test_post_cull_can_trim() {
        let mut source = line_source().with_post_cull(|matrices, n| {
            matrices[0] = matrices[0].set_visible(false);
            n.saturating_sub(1)
        });
        let mut matrices = vec![InstanceMatrix::ZERO; 4];
        source.compute_matrices(&mut matrices, 4, &TransformData::IDENTITY);
        assert_eq!(source.post_cull(&mut matrices, 4), 3);
        assert!(!matrices[0].is_visible());
    }
}
