//! Object registry for one composition ("map").
//!
//! A [`Composition`] owns the authoritative descriptors of a map in a single
//! id-keyed table, so an id can never belong to two kinds at once. It also
//! owns the [`LiveSet`]: the live handles spawned from those descriptors and
//! the indicator overlay paired with them. Nothing outside the composition
//! holds handles across a tick; callers re-resolve them by [`HandleId`].

use std::collections::BTreeMap;

use log::{debug, info};

use crate::backend::SceneBackend;
use crate::descriptor::{Descriptor, ObjectKind};
use crate::handle::{HandleId, HandleIds, ObjectHandle};
use crate::indicator::{FollowReport, IndicatorOverlay};

/// What a [`Composition::reload`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Handles destroyed before respawning.
    pub destroyed: usize,
    /// Handles created.
    pub spawned: usize,
    /// Native doors that received descriptor fields instead of a spawn.
    pub doors_configured: usize,
}

/// Live handles of a composition together with their indicator overlay.
#[derive(Debug, Default)]
pub struct LiveSet {
    handles: Vec<ObjectHandle>,
    indicators: IndicatorOverlay,
    ids: HandleIds,
}

impl LiveSet {
    /// Live handles in spawn order.
    #[must_use]
    pub fn handles(&self) -> &[ObjectHandle] {
        &self.handles
    }

    /// Indicator overlay paired with the handles.
    #[must_use]
    pub const fn indicators(&self) -> &IndicatorOverlay {
        &self.indicators
    }

    fn spawn<B>(&mut self, map: &str, id: &str, descriptor: &Descriptor, backend: &mut B) -> usize
    where
        B: SceneBackend + ?Sized,
    {
        let mut spawned = 0;
        for region in backend.resolve_regions(descriptor) {
            let index = backend.region_index(&region);
            if descriptor.region_index() >= 0 && descriptor.region_index() != index {
                continue;
            }
            let Some(instance) = backend.spawn_or_update(descriptor, &region, None) else {
                debug!("{map}:{id} produced no instance in {region}");
                continue;
            };
            let handle = ObjectHandle {
                handle: self.ids.allocate(),
                map: map.to_owned(),
                id: id.to_owned(),
                region,
                instance,
            };
            self.indicators
                .try_spawn_or_update(&handle, descriptor, backend);
            self.handles.push(handle);
            spawned += 1;
        }
        spawned
    }

    fn destroy_where<B, F>(&mut self, backend: &mut B, mut matches: F) -> Vec<HandleId>
    where
        B: SceneBackend + ?Sized,
        F: FnMut(&ObjectHandle) -> bool,
    {
        let (doomed, kept): (Vec<_>, Vec<_>) =
            self.handles.drain(..).partition(|h| matches(h));
        self.handles = kept;
        doomed
            .into_iter()
            .map(|handle| {
                self.indicators.try_destroy(handle.handle, backend);
                backend.destroy(handle.instance);
                handle.handle
            })
            .collect()
    }

    fn refresh<B>(&mut self, id: &str, descriptor: &Descriptor, backend: &mut B) -> usize
    where
        B: SceneBackend + ?Sized,
    {
        let mut refreshed = 0;
        for handle in self.handles.iter_mut().filter(|h| h.id == id) {
            if let Some(instance) =
                backend.spawn_or_update(descriptor, &handle.region, Some(handle.instance))
            {
                handle.instance = instance;
            }
            self.indicators
                .try_spawn_or_update(handle, descriptor, backend);
            refreshed += 1;
        }
        refreshed
    }
}

/// Named, persistable collection of descriptors plus its live state.
#[derive(Debug, Default)]
pub struct Composition {
    name: String,
    objects: BTreeMap<String, Descriptor>,
    dirty: bool,
    generation: u64,
    live: LiveSet,
}

impl Composition {
    /// Creates an empty, clean composition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Composition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load generation assigned by the editor.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) const fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Whether the composition changed since it was last marked clean.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flags the composition as modified.
    pub const fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag, typically after saving.
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Number of descriptors across every kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the composition holds no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether `id` is used by any kind.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// Descriptor stored under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Descriptor> {
        self.objects.get(id)
    }

    /// Mutable descriptor stored under `id`.
    ///
    /// Edits are not detected: follow them with
    /// [`Editor::update_object`](crate::editor::Editor::update_object).
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Descriptor> {
        self.objects.get_mut(id)
    }

    /// Every descriptor keyed by id.
    #[must_use]
    pub const fn descriptors(&self) -> &BTreeMap<String, Descriptor> {
        &self.objects
    }

    /// Ids of every descriptor of `kind`, ascending.
    pub fn ids_of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &str> + '_ {
        self.objects
            .iter()
            .filter(move |(_, d)| d.kind() == kind)
            .map(|(id, _)| id.as_str())
    }

    /// Descriptor count per kind, in reload order.
    #[must_use]
    pub fn kind_counts(&self) -> Vec<(ObjectKind, usize)> {
        ObjectKind::ALL
            .iter()
            .map(|&kind| (kind, self.ids_of_kind(kind).count()))
            .collect()
    }

    /// Inserts `descriptor` under `id`.
    ///
    /// Fails without touching the composition when `id` is already used by
    /// a descriptor of any kind.
    pub fn try_add(&mut self, id: &str, descriptor: impl Into<Descriptor>) -> bool {
        if self.objects.contains_key(id) {
            return false;
        }
        self.objects.insert(id.to_owned(), descriptor.into());
        self.dirty = true;
        true
    }

    /// Removes the descriptor stored under `id`.
    ///
    /// Live handles are left alone; pair with [`Self::destroy_object`].
    pub fn try_remove(&mut self, id: &str) -> bool {
        if self.objects.remove(id).is_none() {
            return false;
        }
        self.dirty = true;
        true
    }

    /// Copies every descriptor of `other` into this composition.
    ///
    /// Colliding ids are overwritten by `other` (last writer wins), even when
    /// the kinds differ. Callers merging untrusted compositions must check
    /// id uniqueness beforehand. Neither the dirty flag nor live handles are
    /// touched.
    pub fn merge(&mut self, other: &Self) -> &mut Self {
        self.objects.extend(
            other
                .objects
                .iter()
                .map(|(id, descriptor)| (id.clone(), descriptor.clone())),
        );
        self
    }

    /// Live handles in spawn order.
    #[must_use]
    pub fn handles(&self) -> &[ObjectHandle] {
        self.live.handles()
    }

    /// Live handles bound to `id`.
    pub fn handles_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ObjectHandle> + 'a {
        self.live.handles.iter().filter(move |h| h.id == id)
    }

    /// Live handle with identity `handle`.
    #[must_use]
    pub fn handle(&self, handle: HandleId) -> Option<&ObjectHandle> {
        self.live.handles.iter().find(|h| h.handle == handle)
    }

    /// Indicator overlay of the live set.
    #[must_use]
    pub const fn indicators(&self) -> &IndicatorOverlay {
        self.live.indicators()
    }

    /// Spawns `descriptor` in every eligible region and returns how many
    /// handles were created.
    ///
    /// Regions whose index does not match a non-negative
    /// [`region_index`](Descriptor::region_index) are skipped, as are
    /// regions where the backend produced no instance.
    pub fn spawn_object<B>(&mut self, id: &str, descriptor: &Descriptor, backend: &mut B) -> usize
    where
        B: SceneBackend + ?Sized,
    {
        self.live.spawn(&self.name, id, descriptor, backend)
    }

    /// Destroys every live handle bound to `id`, indicators first.
    pub fn destroy_object<B>(&mut self, id: &str, backend: &mut B) -> Vec<HandleId>
    where
        B: SceneBackend + ?Sized,
    {
        self.live.destroy_where(backend, |h| h.id == id)
    }

    /// Destroys every live handle.
    pub fn destroy_all<B>(&mut self, backend: &mut B) -> Vec<HandleId>
    where
        B: SceneBackend + ?Sized,
    {
        let destroyed = self.live.destroy_where(backend, |_| true);
        self.live.indicators.clear_all(backend);
        destroyed
    }

    /// Refreshes every live handle bound to `id` in place.
    ///
    /// Returns the number of handles refreshed; zero when `id` is unknown.
    pub fn refresh_object<B>(&mut self, id: &str, backend: &mut B) -> usize
    where
        B: SceneBackend + ?Sized,
    {
        let Some(descriptor) = self.objects.get(id) else {
            return 0;
        };
        self.live.refresh(id, descriptor, backend)
    }

    /// Destroys every live handle and spawns every descriptor again.
    ///
    /// Kinds are visited in [`ObjectKind::ALL`] order and ids ascending
    /// within a kind. Doors already present in the scene receive the
    /// descriptor's fields instead of an editor-owned copy.
    pub fn reload<B>(&mut self, backend: &mut B) -> ReloadReport
    where
        B: SceneBackend + ?Sized,
    {
        let mut report = ReloadReport {
            destroyed: self.destroy_all(backend).len(),
            ..ReloadReport::default()
        };

        for kind in ObjectKind::ALL {
            for (id, descriptor) in self.objects.iter().filter(|(_, d)| d.kind() == kind) {
                if let Descriptor::Door(door) = descriptor {
                    if let Some(native) = backend.native_door(id) {
                        backend.configure_native_door(door, native);
                        report.doors_configured += 1;
                        continue;
                    }
                }
                report.spawned += self.live.spawn(&self.name, id, descriptor, backend);
            }
        }

        info!(
            "reloaded {}: {} destroyed, {} spawned, {} native doors",
            self.name, report.destroyed, report.spawned, report.doors_configured
        );
        report
    }

    /// Releases every indicator and rebuilds them for the current handles.
    pub fn refresh_indicators<B>(&mut self, backend: &mut B) -> usize
    where
        B: SceneBackend + ?Sized,
    {
        let LiveSet {
            handles,
            indicators,
            ..
        } = &mut self.live;
        indicators.clear_all(backend);
        handles
            .iter()
            .filter(|handle| {
                self.objects
                    .get(&handle.id)
                    .is_some_and(|d| indicators.try_spawn_or_update(handle, d, backend))
            })
            .count()
    }

    /// Moves indicators onto their owners; see [`IndicatorOverlay::follow`].
    pub fn follow_indicators<B>(&mut self, backend: &mut B) -> FollowReport
    where
        B: SceneBackend + ?Sized,
    {
        self.live.indicators.follow(&self.live.handles, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessScene;
    use crate::descriptor::{
        DoorDescriptor, LightDescriptor, Placement, PlayerSpawnpointDescriptor,
        PrimitiveDescriptor, TeleportDescriptor,
    };
    use glam::Vec3;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scene() -> HeadlessScene {
        HeadlessScene::new()
            .with_region("hall", 0, Vec3::ZERO)
            .with_region("hall", 1, Vec3::X * 50.0)
            .with_region("hall", 2, Vec3::X * 100.0)
    }

    fn in_hall(index: i32) -> Placement {
        Placement::in_region("hall", Vec3::ZERO).with_region_index(index)
    }

    #[rstest]
    fn add_rejects_ids_used_by_another_kind() {
        let mut map = Composition::new("lobby");
        assert!(map.try_add("obj", LightDescriptor::default()));
        map.mark_clean();

        assert!(!map.try_add("obj", PrimitiveDescriptor::default()));
        assert!(!map.is_dirty());
        assert_eq!(map.get("obj").map(Descriptor::kind), Some(ObjectKind::Light));
    }

    #[rstest]
    fn remove_of_unknown_id_leaves_dirty_flag() {
        let mut map = Composition::new("lobby");
        assert!(!map.try_remove("missing"));
        assert!(!map.is_dirty());
    }

    #[rstest]
    fn merge_overwrites_colliding_ids() {
        let mut base = Composition::new("base");
        base.try_add("shared", LightDescriptor::default());
        base.try_add("only_base", LightDescriptor::default());
        base.mark_clean();

        let mut other = Composition::new("other");
        other.try_add("shared", TeleportDescriptor::default());

        base.merge(&other);

        assert_eq!(base.len(), 2);
        assert_eq!(base.get("shared").map(Descriptor::kind), Some(ObjectKind::Teleport));
        assert!(!base.is_dirty());
    }

    #[rstest]
    #[case(-1, 3)]
    #[case(1, 1)]
    #[case(7, 0)]
    fn spawn_fans_out_over_matching_regions(
        mut scene: HeadlessScene,
        #[case] index: i32,
        #[case] expected: usize,
    ) {
        let mut map = Composition::new("lobby");
        let descriptor = Descriptor::from(PrimitiveDescriptor {
            placement: in_hall(index),
            ..PrimitiveDescriptor::default()
        });

        assert_eq!(map.spawn_object("box", &descriptor, &mut scene), expected);
        assert_eq!(map.handles_for("box").count(), expected);
    }

    #[rstest]
    fn destroy_removes_every_copy_and_indicator(mut scene: HeadlessScene) {
        let mut map = Composition::new("lobby");
        let descriptor = Descriptor::from(PlayerSpawnpointDescriptor {
            placement: in_hall(-1),
            ..PlayerSpawnpointDescriptor::default()
        });
        map.spawn_object("spawn", &descriptor, &mut scene);
        assert_eq!(map.indicators().len(), 3);

        assert_eq!(map.destroy_object("spawn", &mut scene).len(), 3);
        assert!(map.handles().is_empty());
        assert!(map.indicators().is_empty());
        assert_eq!(scene.instance_count(), 0);
    }

    #[rstest]
    fn reload_configures_native_doors_instead_of_spawning(mut scene: HeadlessScene) {
        let native = scene.add_native_door("gate_a");
        let mut map = Composition::new("lobby");
        map.try_add(
            "gate_a",
            DoorDescriptor {
                placement: Placement::in_region("", Vec3::new(1.0, 2.0, 3.0)),
                ..DoorDescriptor::default()
            },
        );
        map.try_add("gate_b", DoorDescriptor::default());

        let report = map.reload(&mut scene);

        assert_eq!(report.doors_configured, 1);
        assert_eq!(report.spawned, 1);
        assert_eq!(map.handles_for("gate_a").count(), 0);
        assert_eq!(scene.position(native), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[rstest]
    fn reload_spawns_kinds_in_fixed_order(mut scene: HeadlessScene) {
        let mut map = Composition::new("lobby");
        map.try_add("a_teleport", TeleportDescriptor::default());
        map.try_add("z_primitive", PrimitiveDescriptor::default());
        map.try_add("m_light", LightDescriptor::default());

        map.reload(&mut scene);

        let order: Vec<&str> = map.handles().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(order, ["z_primitive", "m_light", "a_teleport"]);
    }

    #[rstest]
    fn refresh_indicators_rebuilds_one_per_capable_handle(mut scene: HeadlessScene) {
        let mut map = Composition::new("lobby");
        map.try_add("light", LightDescriptor::default());
        map.try_add("box", PrimitiveDescriptor::default());
        map.reload(&mut scene);

        assert_eq!(map.refresh_indicators(&mut scene), 1);
        assert_eq!(map.indicators().len(), 1);
        assert_eq!(scene.indicator_count(), 1);
    }
}
