//! Seam for instantiating discrete world objects.
//!
//! Spawners talk to a [`Placer`] instead of the engine's scene graph, so
//! placement logic can run headless in tests.

use farshore_render::InstanceTransform;
use rustc_hash::FxHashMap;

/// Opaque handle to a spawnable asset (prefab, model, archetype).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetRef(pub u64);

/// Handle to one placed object, returned by [`Placer::place`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlacementHandle(pub u64);

/// Scene-side object lifecycle.
pub trait Placer {
    fn place(&mut self, asset: AssetRef, transform: InstanceTransform) -> PlacementHandle;

    /// Removes a previously placed object. Unknown handles are ignored.
    fn destroy(&mut self, handle: PlacementHandle);
}

/// In-memory placer that tracks live objects, for tests and headless runs.
#[derive(Default)]
pub struct RecordingPlacer {
    next_handle: u64,
    live: FxHashMap<PlacementHandle, (AssetRef, InstanceTransform)>,
}

impl RecordingPlacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn get(&self, handle: PlacementHandle) -> Option<&(AssetRef, InstanceTransform)> {
        self.live.get(&handle)
    }

    /// Transforms of all live objects of one asset.
    pub fn transforms_of(&self, asset: AssetRef) -> Vec<InstanceTransform> {
        self.live
            .values()
            .filter(|(a, _)| *a == asset)
            .map(|(_, t)| *t)
            .collect()
    }
}

impl Placer for RecordingPlacer {
    fn place(&mut self, asset: AssetRef, transform: InstanceTransform) -> PlacementHandle {
        let handle = PlacementHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle, (asset, transform));
        handle
    }

    fn destroy(&mut self, handle: PlacementHandle) {
        self.live.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn transform_at(x: f32) -> InstanceTransform {
        InstanceTransform::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY, 1.0)
    }

    #[test]
    fn test_place_and_destroy() {
        let mut placer = RecordingPlacer::new();
        let h = placer.place(AssetRef(1), transform_at(5.0));
        assert_eq!(placer.live_count(), 1);
        placer.destroy(h);
        assert_eq!(placer.live_count(), 0);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut placer = RecordingPlacer::new();
        let a = placer.place(AssetRef(1), transform_at(0.0));
        let b = placer.place(AssetRef(1), transform_at(1.0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_destroy_unknown_handle_is_noop() {
        let mut placer = RecordingPlacer::new();
        placer.place(AssetRef(1), transform_at(0.0));
        placer.destroy(PlacementHandle(999));
        assert_eq!(placer.live_count(), 1);
    }

    #[test]
    fn test_transforms_filtered_by_asset() {
        let mut placer = RecordingPlacer::new();
        placer.place(AssetRef(1), transform_at(0.0));
        placer.place(AssetRef(2), transform_at(1.0));
        placer.place(AssetRef(1), transform_at(2.0));
        assert_eq!(placer.transforms_of(AssetRef(1)).len(), 2);
        assert_eq!(placer.transforms_of(AssetRef(2)).len(), 1);
    }
}
