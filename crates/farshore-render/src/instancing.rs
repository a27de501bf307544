//! Instanced draw submission with per-draw batching.

use glam::{Mat4, Quat, Vec3};
use tracing::trace;

/// Most graphics backends cap a single instanced call at 1023 matrices,
/// so larger transform sets are split into batches of this size.
pub const MAX_INSTANCES_PER_DRAW: usize = 1023;

/// Opaque handle to an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshRef(pub u64);

/// Opaque handle to a material/shader binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialRef(pub u64);

/// Per-instance placement, expanded to a model matrix at submission time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl InstanceTransform {
    pub fn new(position: Vec3, rotation: Quat, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }
}

/// Backend seam for submitting instanced geometry.
///
/// Implementations receive at most [`MAX_INSTANCES_PER_DRAW`] transforms per
/// call; the [`submit_batched`] helper performs the splitting.
pub trait InstancedRenderer {
    /// Draw `transforms.len()` copies of the mesh. When `tints` is present it
    /// is the same length as `transforms`.
    fn draw_instanced(
        &mut self,
        mesh: MeshRef,
        material: MaterialRef,
        transforms: &[InstanceTransform],
        tints: Option<&[[f32; 4]]>,
    );
}

/// Splits an arbitrarily large instance set into backend-sized draw calls.
pub fn submit_batched(
    renderer: &mut dyn InstancedRenderer,
    mesh: MeshRef,
    material: MaterialRef,
    transforms: &[InstanceTransform],
    tints: Option<&[[f32; 4]]>,
) -> FrameStats {
    if let Some(t) = tints {
        debug_assert_eq!(t.len(), transforms.len(), "tint count mismatch");
    }
    let mut stats = FrameStats::default();
    let mut start = 0;
    while start < transforms.len() {
        let end = (start + MAX_INSTANCES_PER_DRAW).min(transforms.len());
        renderer.draw_instanced(
            mesh,
            material,
            &transforms[start..end],
            tints.map(|t| &t[start..end]),
        );
        stats.draw_calls += 1;
        stats.instances += end - start;
        start = end;
    }
    trace!(
        mesh = mesh.0,
        draws = stats.draw_calls,
        instances = stats.instances,
        "submitted instanced batches"
    );
    stats
}

/// Draw submission counters for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub instances: usize,
}

impl FrameStats {
    pub fn merge(&mut self, other: FrameStats) {
        self.draw_calls += other.draw_calls;
        self.instances += other.instances;
    }
}

/// One recorded submission, for assertions in tests.
#[derive(Clone, Debug)]
pub struct DrawCall {
    pub mesh: MeshRef,
    pub material: MaterialRef,
    pub transforms: Vec<InstanceTransform>,
    pub tints: Option<Vec<[f32; 4]>>,
}

/// Renderer that records every submission instead of drawing.
#[derive(Default)]
pub struct RecordingRenderer {
    pub calls: Vec<DrawCall>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_instances(&self) -> usize {
        self.calls.iter().map(|c| c.transforms.len()).sum()
    }
}

impl InstancedRenderer for RecordingRenderer {
    fn draw_instanced(
        &mut self,
        mesh: MeshRef,
        material: MaterialRef,
        transforms: &[InstanceTransform],
        tints: Option<&[[f32; 4]]>,
    ) {
        self.calls.push(DrawCall {
            mesh,
            material,
            transforms: transforms.to_vec(),
            tints: tints.map(|t| t.to_vec()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transforms(n: usize) -> Vec<InstanceTransform> {
        (0..n)
            .map(|i| InstanceTransform::new(Vec3::new(i as f32, 0.0, 0.0), Quat::IDENTITY, 1.0))
            .collect()
    }

    #[test]
    fn test_small_set_single_draw() {
        let mut renderer = RecordingRenderer::new();
        let t = transforms(10);
        let stats = submit_batched(&mut renderer, MeshRef(1), MaterialRef(2), &t, None);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.instances, 10);
        assert_eq!(renderer.calls.len(), 1);
    }

    #[test]
    fn test_large_set_splits_at_limit() {
        let mut renderer = RecordingRenderer::new();
        let t = transforms(MAX_INSTANCES_PER_DRAW * 2 + 5);
        let stats = submit_batched(&mut renderer, MeshRef(1), MaterialRef(2), &t, None);
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(renderer.calls[0].transforms.len(), MAX_INSTANCES_PER_DRAW);
        assert_eq!(renderer.calls[1].transforms.len(), MAX_INSTANCES_PER_DRAW);
        assert_eq!(renderer.calls[2].transforms.len(), 5);
        assert_eq!(renderer.total_instances(), t.len());
        assert_eq!(stats.instances, t.len());
    }

    #[test]
    fn test_tints_split_with_transforms() {
        let mut renderer = RecordingRenderer::new();
        let t = transforms(MAX_INSTANCES_PER_DRAW + 1);
        let tints = vec![[1.0, 0.5, 0.25, 1.0]; t.len()];
        submit_batched(&mut renderer, MeshRef(1), MaterialRef(2), &t, Some(&tints));
        assert_eq!(
            renderer.calls[0].tints.as_ref().unwrap().len(),
            MAX_INSTANCES_PER_DRAW
        );
        assert_eq!(renderer.calls[1].tints.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_set_no_draws() {
        let mut renderer = RecordingRenderer::new();
        let stats = submit_batched(&mut renderer, MeshRef(1), MaterialRef(2), &[], None);
        assert_eq!(stats, FrameStats::default());
        assert!(renderer.calls.is_empty());
    }

    #[test]
    fn test_transform_matrix_applies_position_and_scale() {
        let t = InstanceTransform::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, 2.0);
        let m = t.to_matrix();
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5, "got {p}");
    }
}
