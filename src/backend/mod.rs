//! Contract between the registry and the scene that hosts live instances.
//!
//! The registry never allocates or renders anything itself. It asks a
//! [`SceneBackend`] which regions can host a descriptor, to create or
//! refresh instances inside them, and to release instances again. Backends
//! report failure by returning `None`; callers tolerate that silently so a
//! multi-region spawn can partially succeed.

pub mod headless;

use std::fmt;

use glam::Vec3;

use crate::descriptor::{Descriptor, DoorDescriptor};

pub use headless::{BackendStats, HeadlessScene, SceneInstance};

/// Opaque identifier of a live instance owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete spatial subdivision a backend can instantiate objects into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    /// Stable per-region identifier among regions sharing a name.
    pub index: i32,
    /// Region type name descriptors target. Empty for world space.
    pub name: String,
}

impl Region {
    /// Creates a region.
    #[must_use]
    pub fn new(name: impl Into<String>, index: i32) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    /// The single world-space region used for descriptors without a region
    /// name.
    #[must_use]
    pub const fn world() -> Self {
        Self {
            index: 0,
            name: String::new(),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str("world")
        } else {
            write!(f, "{}[{}]", self.name, self.index)
        }
    }
}

/// Scene that allocates, refreshes and releases live instances.
pub trait SceneBackend {
    /// Regions eligible to host `descriptor`.
    fn resolve_regions(&self, descriptor: &Descriptor) -> Vec<Region>;

    /// Stable integer identifier of `region`.
    fn region_index(&self, region: &Region) -> i32 {
        region.index
    }

    /// Creates an instance of `descriptor` in `region`, or refreshes
    /// `existing` in place.
    ///
    /// Returns `None` when the backend could not produce an instance.
    fn spawn_or_update(
        &mut self,
        descriptor: &Descriptor,
        region: &Region,
        existing: Option<InstanceId>,
    ) -> Option<InstanceId>;

    /// Releases an instance and its replication state.
    fn destroy(&mut self, instance: InstanceId);

    /// Creates or refreshes the indicator visual for `descriptor`.
    fn spawn_or_update_indicator(
        &mut self,
        descriptor: &Descriptor,
        region: &Region,
        existing: Option<InstanceId>,
    ) -> Option<InstanceId>;

    /// Current world position of an instance.
    fn position(&self, instance: InstanceId) -> Option<Vec3>;

    /// Moves an instance.
    fn set_position(&mut self, instance: InstanceId, position: Vec3);

    /// Door already present in the scene (not created by the editor) that
    /// answers to `id`.
    fn native_door(&self, id: &str) -> Option<InstanceId>;

    /// Pushes descriptor fields onto a native door.
    fn configure_native_door(&mut self, door: &DoorDescriptor, instance: InstanceId);
}
