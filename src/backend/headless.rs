//! In-memory scene used by the command-line tool and the test suite.
//!
//! `HeadlessScene` keeps instances in hash tables instead of rendering them.
//! It resolves regions by name, places instances relative to each region's
//! origin and records how often each backend operation ran so callers can
//! inspect the traffic the registry generates.

use glam::Vec3;
use hashbrown::{HashMap, HashSet};
use log::{debug, trace};

use super::{InstanceId, Region, SceneBackend};
use crate::descriptor::{Descriptor, DoorDescriptor, ObjectKind};

/// Counters for backend operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Instances created.
    pub spawned: usize,
    /// Instances refreshed in place.
    pub updated: usize,
    /// Instances released.
    pub destroyed: usize,
    /// Native doors reconfigured.
    pub doors_configured: usize,
}

/// One instance living in a [`HeadlessScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInstance {
    /// Kind of the descriptor that produced the instance.
    pub kind: ObjectKind,
    /// Region hosting the instance.
    pub region: Region,
    /// World position.
    pub position: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
    /// Whether the instance is an indicator overlay.
    pub is_indicator: bool,
}

/// Scene backend that keeps every instance in memory.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    regions: Vec<(Region, Vec3)>,
    instances: HashMap<InstanceId, SceneInstance>,
    native_doors: HashMap<String, InstanceId>,
    rejected_kinds: HashSet<ObjectKind>,
    next_id: u64,
    stats: BackendStats,
}

impl HeadlessScene {
    /// Creates an empty scene with only the world region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named region whose origin sits at `origin`.
    #[must_use]
    pub fn with_region(mut self, name: &str, index: i32, origin: Vec3) -> Self {
        self.regions.push((Region::new(name, index), origin));
        self
    }

    /// Registers a door that exists independently of the editor.
    pub fn add_native_door(&mut self, id: &str) -> InstanceId {
        let instance = self.allocate();
        self.instances.insert(
            instance,
            SceneInstance {
                kind: ObjectKind::Door,
                region: Region::world(),
                position: Vec3::ZERO,
                scale: Vec3::ONE,
                is_indicator: false,
            },
        );
        self.native_doors.insert(id.to_owned(), instance);
        instance
    }

    /// Makes every spawn of `kind` fail, as a backend without that prefab
    /// would.
    pub fn reject_kind(&mut self, kind: ObjectKind) {
        self.rejected_kinds.insert(kind);
    }

    /// Looks up a live instance.
    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&SceneInstance> {
        self.instances.get(&id)
    }

    /// Number of live instances, indicators included.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of live indicator instances.
    #[must_use]
    pub fn indicator_count(&self) -> usize {
        self.instances.values().filter(|i| i.is_indicator).count()
    }

    /// Operation counters accumulated since construction.
    #[must_use]
    pub const fn stats(&self) -> BackendStats {
        self.stats
    }

    fn allocate(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    fn origin_of(&self, region: &Region) -> Vec3 {
        self.regions
            .iter()
            .find(|(r, _)| r == region)
            .map_or(Vec3::ZERO, |(_, origin)| *origin)
    }

    fn write_instance(
        &mut self,
        descriptor: &Descriptor,
        region: &Region,
        existing: Option<InstanceId>,
        is_indicator: bool,
    ) -> InstanceId {
        let placement = descriptor.placement();
        let state = SceneInstance {
            kind: descriptor.kind(),
            region: region.clone(),
            position: self.origin_of(region) + placement.position,
            scale: placement.scale,
            is_indicator,
        };
        match existing.filter(|id| self.instances.contains_key(id)) {
            Some(id) => {
                self.instances.insert(id, state);
                self.stats.updated += 1;
                trace!("updated {id} in {region}");
                id
            }
            None => {
                let id = self.allocate();
                self.instances.insert(id, state);
                self.stats.spawned += 1;
                trace!("spawned {id} in {region}");
                id
            }
        }
    }
}

impl SceneBackend for HeadlessScene {
    fn resolve_regions(&self, descriptor: &Descriptor) -> Vec<Region> {
        if !descriptor.supports_region_resolution() {
            return vec![Region::world()];
        }
        let name = &descriptor.placement().region;
        self.regions
            .iter()
            .filter(|(region, _)| &region.name == name)
            .map(|(region, _)| region.clone())
            .collect()
    }

    fn spawn_or_update(
        &mut self,
        descriptor: &Descriptor,
        region: &Region,
        existing: Option<InstanceId>,
    ) -> Option<InstanceId> {
        if self.rejected_kinds.contains(&descriptor.kind()) {
            debug!("no prefab for {} in {region}", descriptor.kind());
            return None;
        }
        Some(self.write_instance(descriptor, region, existing, false))
    }

    fn destroy(&mut self, instance: InstanceId) {
        if self.instances.remove(&instance).is_some() {
            self.stats.destroyed += 1;
            self.native_doors.retain(|_, door| *door != instance);
        }
    }

    fn spawn_or_update_indicator(
        &mut self,
        descriptor: &Descriptor,
        region: &Region,
        existing: Option<InstanceId>,
    ) -> Option<InstanceId> {
        Some(self.write_instance(descriptor, region, existing, true))
    }

    fn position(&self, instance: InstanceId) -> Option<Vec3> {
        self.instances.get(&instance).map(|i| i.position)
    }

    fn set_position(&mut self, instance: InstanceId, position: Vec3) {
        if let Some(state) = self.instances.get_mut(&instance) {
            state.position = position;
        }
    }

    fn native_door(&self, id: &str) -> Option<InstanceId> {
        self.native_doors.get(id).copied()
    }

    fn configure_native_door(&mut self, door: &DoorDescriptor, instance: InstanceId) {
        if let Some(state) = self.instances.get_mut(&instance) {
            state.position = door.placement.position;
            state.scale = door.placement.scale;
            self.stats.doors_configured += 1;
        }
    }
}
