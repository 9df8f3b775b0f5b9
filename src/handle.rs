//! Live bindings between descriptors and spawned instances.

use std::fmt;

use crate::backend::{InstanceId, Region};

/// Identity of one live handle.
///
/// Unique within the owning composition only; pair it with the
/// composition name when comparing handles of different maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// Allocator for [`HandleId`] values.
#[derive(Debug, Default)]
pub struct HandleIds {
    next: u64,
}

impl HandleIds {
    /// Returns a fresh identifier.
    pub fn allocate(&mut self) -> HandleId {
        self.next += 1;
        HandleId(self.next)
    }
}

/// One spawned instance of one descriptor in one region.
///
/// Several handles may share a descriptor id when the descriptor fans out
/// over multiple regions. The descriptor itself is owned by the
/// [`Composition`](crate::composition::Composition) and looked up by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    /// Identity of the handle.
    pub handle: HandleId,
    /// Name of the owning composition.
    pub map: String,
    /// Descriptor id.
    pub id: String,
    /// Region the instance was spawned into.
    pub region: Region,
    /// Backend instance.
    pub instance: InstanceId,
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} in {} ({}, {})",
            self.map, self.id, self.region, self.instance, self.handle
        )
    }
}

/// Result of [`Editor::update_object`](crate::editor::Editor::update_object).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Every handle sharing the id was refreshed in place.
    Refreshed {
        /// Number of handles refreshed.
        handles: usize,
    },
    /// Handles were destroyed and a respawn is pending.
    RespawnScheduled {
        /// Number of handles destroyed.
        destroyed: usize,
        /// Pending task that will rebuild them.
        task: crate::schedule::TaskId,
    },
}
