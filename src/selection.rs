//! Which actor has which live object selected.
//!
//! Selection belongs to the picking tool, which lives outside this crate.
//! The editor only needs to read who selected an object before a full
//! respawn invalidates its handles and to point the selection at the
//! rebuilt handle afterwards. [`SelectionTable`] is the in-memory
//! implementation the editor uses.

use std::fmt;

use hashbrown::HashMap;

use crate::handle::{HandleId, ObjectHandle};

/// Identity of an operator able to select objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// What an actor currently has selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedObject {
    /// Composition name.
    pub map: String,
    /// Descriptor id.
    pub id: String,
    /// Selected handle. Only valid until the next destroy of that id.
    pub handle: HandleId,
}

/// Read/write access to actor selections.
pub trait Selection {
    /// Selection held by `actor`.
    fn get_selection(&self, actor: ActorId) -> Option<&SelectedObject>;

    /// Points `actor`'s selection at `handle`.
    fn set_selection(&mut self, actor: ActorId, handle: &ObjectHandle);

    /// Drops `actor`'s selection.
    fn clear_selection(&mut self, actor: ActorId) -> Option<SelectedObject>;

    /// First actor whose selection refers to `id` in `map`.
    fn selector_of(&self, map: &str, id: &str) -> Option<ActorId>;
}

/// Hash table of selections keyed by actor.
#[derive(Debug, Default)]
pub struct SelectionTable {
    selections: HashMap<ActorId, SelectedObject>,
}

impl SelectionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every selection pointing at `handle` of composition `map` and
    /// returns the actors that lost it.
    pub fn release_handle(&mut self, map: &str, handle: HandleId) -> Vec<ActorId> {
        let actors: Vec<ActorId> = self
            .selections
            .iter()
            .filter(|(_, selected)| selected.handle == handle && selected.map == map)
            .map(|(actor, _)| *actor)
            .collect();
        for actor in &actors {
            self.selections.remove(actor);
        }
        actors
    }

    /// Drops every selection inside `map`.
    pub fn release_map(&mut self, map: &str) {
        self.selections.retain(|_, selected| selected.map != map);
    }
}

impl Selection for SelectionTable {
    fn get_selection(&self, actor: ActorId) -> Option<&SelectedObject> {
        self.selections.get(&actor)
    }

    fn set_selection(&mut self, actor: ActorId, handle: &ObjectHandle) {
        self.selections.insert(
            actor,
            SelectedObject {
                map: handle.map.clone(),
                id: handle.id.clone(),
                handle: handle.handle,
            },
        );
    }

    fn clear_selection(&mut self, actor: ActorId) -> Option<SelectedObject> {
        self.selections.remove(&actor)
    }

    fn selector_of(&self, map: &str, id: &str) -> Option<ActorId> {
        self.selections
            .iter()
            .filter(|(_, selected)| selected.map == map && selected.id == id)
            .map(|(actor, _)| *actor)
            .min()
    }
}
