//! Indicator overlays paired 1:1 with live handles.
//!
//! Some descriptor kinds have no visible geometry of their own (spawnpoints,
//! lights, teleports). For those, every live handle is shadowed by an
//! indicator instance the operator can see and pick. Bindings are owned by
//! the composition's live set, so dropping a composition drops its overlay
//! table with it.
//!
//! Indicators follow their owner: [`IndicatorOverlay::follow`] runs every
//! tick and forces each indicator onto its owner's current position. The
//! same pass checks the 1:1 invariant and releases indicators whose owner
//! is gone.

use hashbrown::HashMap;
use log::{debug, warn};

use crate::backend::{InstanceId, SceneBackend};
use crate::descriptor::Descriptor;
use crate::handle::{HandleId, ObjectHandle};

/// Auxiliary visual bound to exactly one live handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    /// Backend instance rendering the indicator.
    pub instance: InstanceId,
    /// Handle the indicator follows.
    pub owner: HandleId,
}

/// What a [`IndicatorOverlay::follow`] pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowReport {
    /// Indicators moved onto their owner's position.
    pub moved: usize,
    /// Indicators released because their owner no longer exists.
    pub orphaned: usize,
}

/// Binding table from indicator instance to owning handle.
#[derive(Debug, Default)]
pub struct IndicatorOverlay {
    bindings: HashMap<InstanceId, HandleId>,
}

impl IndicatorOverlay {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound indicators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no indicator is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates every binding.
    pub fn iter(&self) -> impl Iterator<Item = Indicator> + '_ {
        self.bindings.iter().map(|(&instance, &owner)| Indicator { instance, owner })
    }

    /// Finds the indicator bound to `owner`.
    ///
    /// Scans every binding; overlays are bounded by the number of
    /// selectable objects.
    #[must_use]
    pub fn try_get(&self, owner: HandleId) -> Option<Indicator> {
        self.iter().find(|indicator| indicator.owner == owner)
    }

    /// Spawns or refreshes the indicator for `handle`.
    ///
    /// Returns `false` when `descriptor` has no indicator capability or the
    /// backend could not produce one.
    pub fn try_spawn_or_update<B>(
        &mut self,
        handle: &ObjectHandle,
        descriptor: &Descriptor,
        backend: &mut B,
    ) -> bool
    where
        B: SceneBackend + ?Sized,
    {
        if !descriptor.has_indicator() {
            return false;
        }

        let existing = self.try_get(handle.handle).map(|i| i.instance);
        let Some(instance) = backend.spawn_or_update_indicator(descriptor, &handle.region, existing)
        else {
            warn!("backend produced no indicator for {handle}");
            return existing.is_some();
        };

        if let Some(previous) = existing.filter(|previous| *previous != instance) {
            self.bindings.remove(&previous);
        }
        self.bindings.insert(instance, handle.handle);
        true
    }

    /// Releases the indicator bound to `owner`.
    ///
    /// Returns `false` when none existed.
    pub fn try_destroy<B>(&mut self, owner: HandleId, backend: &mut B) -> bool
    where
        B: SceneBackend + ?Sized,
    {
        let Some(indicator) = self.try_get(owner) else {
            return false;
        };
        self.bindings.remove(&indicator.instance);
        backend.destroy(indicator.instance);
        true
    }

    /// Releases every indicator and clears the table.
    pub fn clear_all<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend + ?Sized,
    {
        for (instance, _) in self.bindings.drain() {
            backend.destroy(instance);
        }
    }

    /// Moves every indicator onto its owner and drops orphaned bindings.
    pub fn follow<B>(&mut self, handles: &[ObjectHandle], backend: &mut B) -> FollowReport
    where
        B: SceneBackend + ?Sized,
    {
        let mut report = FollowReport::default();
        let mut orphans = Vec::new();

        for (&instance, &owner) in &self.bindings {
            let Some(handle) = handles.iter().find(|h| h.handle == owner) else {
                orphans.push(instance);
                continue;
            };
            let Some(target) = backend.position(handle.instance) else {
                continue;
            };
            if backend.position(instance) != Some(target) {
                backend.set_position(instance, target);
                report.moved += 1;
            }
        }

        for instance in orphans {
            debug!("releasing orphaned indicator {instance}");
            self.bindings.remove(&instance);
            backend.destroy(instance);
            report.orphaned += 1;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessScene, Region};
    use crate::descriptor::{ItemSpawnpointDescriptor, PrimitiveDescriptor};
    use glam::Vec3;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scene() -> HeadlessScene {
        HeadlessScene::new()
    }

    fn spawned(scene: &mut HeadlessScene, descriptor: &Descriptor, handle: u64) -> ObjectHandle {
        let region = Region::world();
        let instance = scene
            .spawn_or_update(descriptor, &region, None)
            .unwrap_or_else(|| panic!("headless spawn should succeed"));
        ObjectHandle {
            handle: HandleId(handle),
            map: "test".to_owned(),
            id: format!("obj{handle}"),
            region,
            instance,
        }
    }

    #[rstest]
    fn descriptors_without_capability_get_no_indicator(mut scene: HeadlessScene) {
        let descriptor = Descriptor::from(PrimitiveDescriptor::default());
        let handle = spawned(&mut scene, &descriptor, 1);
        let mut overlay = IndicatorOverlay::new();

        assert!(!overlay.try_spawn_or_update(&handle, &descriptor, &mut scene));
        assert!(overlay.try_get(handle.handle).is_none());
    }

    #[rstest]
    fn spawning_twice_keeps_a_single_indicator(mut scene: HeadlessScene) {
        let descriptor = Descriptor::from(ItemSpawnpointDescriptor::default());
        let handle = spawned(&mut scene, &descriptor, 1);
        let mut overlay = IndicatorOverlay::new();

        assert!(overlay.try_spawn_or_update(&handle, &descriptor, &mut scene));
        assert!(overlay.try_spawn_or_update(&handle, &descriptor, &mut scene));

        assert_eq!(overlay.len(), 1);
        assert_eq!(scene.indicator_count(), 1);
        assert_eq!(overlay.try_get(handle.handle).map(|i| i.owner), Some(handle.handle));
    }

    #[rstest]
    fn destroying_releases_binding_and_instance(mut scene: HeadlessScene) {
        let descriptor = Descriptor::from(ItemSpawnpointDescriptor::default());
        let handle = spawned(&mut scene, &descriptor, 1);
        let mut overlay = IndicatorOverlay::new();
        overlay.try_spawn_or_update(&handle, &descriptor, &mut scene);

        assert!(overlay.try_destroy(handle.handle, &mut scene));
        assert!(!overlay.try_destroy(handle.handle, &mut scene));
        assert!(overlay.is_empty());
        assert_eq!(scene.indicator_count(), 0);
    }

    #[rstest]
    fn follow_moves_indicators_and_drops_orphans(mut scene: HeadlessScene) {
        let descriptor = Descriptor::from(ItemSpawnpointDescriptor::default());
        let kept = spawned(&mut scene, &descriptor, 1);
        let gone = spawned(&mut scene, &descriptor, 2);
        let mut overlay = IndicatorOverlay::new();
        overlay.try_spawn_or_update(&kept, &descriptor, &mut scene);
        overlay.try_spawn_or_update(&gone, &descriptor, &mut scene);

        scene.set_position(kept.instance, Vec3::new(4.0, 5.0, 6.0));
        let report = overlay.follow(std::slice::from_ref(&kept), &mut scene);

        assert_eq!(report, FollowReport { moved: 1, orphaned: 1 });
        let indicator = overlay
            .try_get(kept.handle)
            .unwrap_or_else(|| panic!("indicator for kept handle should survive"));
        assert_eq!(scene.position(indicator.instance), Some(Vec3::new(4.0, 5.0, 6.0)));
        assert!(overlay.try_get(gone.handle).is_none());
    }

    #[rstest]
    fn clear_all_releases_everything(mut scene: HeadlessScene) {
        let descriptor = Descriptor::from(ItemSpawnpointDescriptor::default());
        let mut overlay = IndicatorOverlay::new();
        for n in 1..=3 {
            let handle = spawned(&mut scene, &descriptor, n);
            overlay.try_spawn_or_update(&handle, &descriptor, &mut scene);
        }

        overlay.clear_all(&mut scene);

        assert!(overlay.is_empty());
        assert_eq!(scene.indicator_count(), 0);
    }
}
