//! Root that owns loaded compositions, the scene backend and pending work.
//!
//! The [`Editor`] is the single logical thread every mutation goes through.
//! Edits to a descriptor are followed by [`Editor::update_object`], which
//! either refreshes every live copy in place or destroys them and queues a
//! respawn for a later [`Editor::tick`]. The destroy half always completes
//! before `update_object` returns, so no caller ever observes a handle that
//! is being torn down.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;

use crate::backend::SceneBackend;
use crate::composition::{Composition, ReloadReport};
use crate::descriptor::Descriptor;
use crate::handle::{HandleId, UpdateOutcome};
use crate::indicator::FollowReport;
use crate::schedule::{PendingRespawn, RespawnQueue, TaskId};
use crate::selection::{Selection, SelectionTable};
use crate::settings::EditorSettings;
use crate::RESPAWN_DELAY;

/// Errors surfaced by [`Editor`] entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// No composition with this name is loaded.
    #[error("composition `{0}` is not loaded")]
    MapNotLoaded(String),
    /// The handle was destroyed or never belonged to the composition.
    #[error("{handle} is not live in `{map}`")]
    StaleHandle {
        /// Composition name.
        map: String,
        /// Handle that was looked up.
        handle: HandleId,
    },
    /// The id is already used by a descriptor of some kind.
    #[error("id `{id}` already exists in `{map}`")]
    DuplicateId {
        /// Composition name.
        map: String,
        /// Colliding id.
        id: String,
    },
    /// No descriptor uses the id.
    #[error("id `{id}` does not exist in `{map}`")]
    UnknownId {
        /// Composition name.
        map: String,
        /// Missing id.
        id: String,
    },
}

/// What one [`Editor::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Deferred respawns that produced at least one handle.
    pub respawned: usize,
    /// Deferred respawns that found their composition or descriptor gone.
    pub skipped: usize,
    /// Indicator follow pass across every composition.
    pub indicators: FollowReport,
}

/// Owner of every loaded composition and the backend they spawn into.
#[derive(Debug)]
pub struct Editor<B> {
    backend: B,
    maps: BTreeMap<String, Composition>,
    selection: SelectionTable,
    respawns: RespawnQueue,
    clock: Duration,
    respawn_delay: Duration,
    generations: u64,
}

impl<B: SceneBackend> Editor<B> {
    /// Creates an editor with default settings.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            maps: BTreeMap::new(),
            selection: SelectionTable::new(),
            respawns: RespawnQueue::new(),
            clock: Duration::ZERO,
            respawn_delay: RESPAWN_DELAY,
            generations: 0,
        }
    }

    /// Creates an editor configured from `settings`.
    #[must_use]
    pub fn with_settings(backend: B, settings: &EditorSettings) -> Self {
        let mut editor = Self::new(backend);
        editor.apply_settings(settings);
        editor
    }

    /// Applies tunables from `settings`.
    pub fn apply_settings(&mut self, settings: &EditorSettings) {
        self.respawn_delay = settings.respawn_delay();
    }

    /// Backend hosting live instances.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access.
    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Time accumulated by [`Self::tick`].
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Delay applied to full respawns.
    #[must_use]
    pub const fn respawn_delay(&self) -> Duration {
        self.respawn_delay
    }

    /// Actor selections.
    #[must_use]
    pub const fn selection(&self) -> &SelectionTable {
        &self.selection
    }

    /// Mutable actor selections.
    pub const fn selection_mut(&mut self) -> &mut SelectionTable {
        &mut self.selection
    }

    /// Respawns waiting for their delay.
    #[must_use]
    pub const fn pending_respawns(&self) -> &RespawnQueue {
        &self.respawns
    }

    /// Loaded composition called `name`.
    #[must_use]
    pub fn map(&self, name: &str) -> Option<&Composition> {
        self.maps.get(name)
    }

    /// Mutable loaded composition called `name`.
    pub fn map_mut(&mut self, name: &str) -> Option<&mut Composition> {
        self.maps.get_mut(name)
    }

    /// Every loaded composition, by name.
    pub fn maps(&self) -> impl Iterator<Item = &Composition> + '_ {
        self.maps.values()
    }

    /// Mutable descriptor `id` of composition `map`.
    ///
    /// Follow any edit with [`Self::update_object`].
    pub fn descriptor_mut(&mut self, map: &str, id: &str) -> Option<&mut Descriptor> {
        self.maps.get_mut(map).and_then(|c| c.get_mut(id))
    }

    /// Loads `composition` and spawns its descriptors.
    ///
    /// A composition already loaded under the same name is unloaded first.
    pub fn load(&mut self, mut composition: Composition) -> ReloadReport {
        let name = composition.name().to_owned();
        if self.maps.contains_key(&name) {
            self.release(&name);
        }
        self.generations += 1;
        composition.set_generation(self.generations);
        let report = composition.reload(&mut self.backend);
        info!(
            "loaded {name} (generation {}, {} objects)",
            self.generations,
            composition.len()
        );
        self.maps.insert(name, composition);
        report
    }

    /// Destroys every live handle of `name` and hands the composition back.
    ///
    /// # Errors
    /// Returns [`EditorError::MapNotLoaded`] when nothing is loaded under
    /// `name`.
    pub fn unload(&mut self, name: &str) -> Result<Composition, EditorError> {
        self.release(name)
            .ok_or_else(|| EditorError::MapNotLoaded(name.to_owned()))
    }

    fn release(&mut self, name: &str) -> Option<Composition> {
        let mut composition = self.maps.remove(name)?;
        let cancelled = self.respawns.cancel_map(name);
        self.selection.release_map(name);
        let destroyed = composition.destroy_all(&mut self.backend).len();
        info!("unloaded {name}: {destroyed} handles destroyed, {cancelled} respawns cancelled");
        Some(composition)
    }

    /// Destroys and respawns every live handle of `name`.
    ///
    /// Pending respawns of the composition are cancelled because the reload
    /// rebuilds those objects too. Selections inside it are dropped.
    ///
    /// # Errors
    /// Returns [`EditorError::MapNotLoaded`] when nothing is loaded under
    /// `name`.
    pub fn reload(&mut self, name: &str) -> Result<ReloadReport, EditorError> {
        let composition = self
            .maps
            .get_mut(name)
            .ok_or_else(|| EditorError::MapNotLoaded(name.to_owned()))?;
        self.respawns.cancel_map(name);
        self.selection.release_map(name);
        Ok(composition.reload(&mut self.backend))
    }

    /// Reloads every composition and rebuilds all indicators.
    pub fn reload_all(&mut self) -> ReloadReport {
        let names: Vec<String> = self.maps.keys().cloned().collect();
        let mut total = ReloadReport::default();
        for name in names {
            if let Ok(report) = self.reload(&name) {
                total.destroyed += report.destroyed;
                total.spawned += report.spawned;
                total.doors_configured += report.doors_configured;
            }
        }
        self.refresh_indicators();
        total
    }

    /// Adds `descriptor` to `map` under `id` and spawns it.
    ///
    /// Returns the number of live handles created.
    ///
    /// # Errors
    /// Fails when `map` is not loaded or `id` is taken.
    pub fn place_object(
        &mut self,
        map: &str,
        id: &str,
        descriptor: impl Into<Descriptor>,
    ) -> Result<usize, EditorError> {
        let composition = self
            .maps
            .get_mut(map)
            .ok_or_else(|| EditorError::MapNotLoaded(map.to_owned()))?;
        let descriptor = descriptor.into();
        if !composition.try_add(id, descriptor.clone()) {
            return Err(EditorError::DuplicateId {
                map: map.to_owned(),
                id: id.to_owned(),
            });
        }
        Ok(composition.spawn_object(id, &descriptor, &mut self.backend))
    }

    /// Removes `id` from `map` and destroys its live handles.
    ///
    /// Returns the number of handles destroyed.
    ///
    /// # Errors
    /// Fails when `map` is not loaded or `id` is unknown.
    pub fn remove_object(&mut self, map: &str, id: &str) -> Result<usize, EditorError> {
        let composition = self
            .maps
            .get_mut(map)
            .ok_or_else(|| EditorError::MapNotLoaded(map.to_owned()))?;
        if !composition.try_remove(id) {
            return Err(EditorError::UnknownId {
                map: map.to_owned(),
                id: id.to_owned(),
            });
        }
        let destroyed = composition.destroy_object(id, &mut self.backend);
        for handle in &destroyed {
            self.selection.release_handle(map, *handle);
        }
        Ok(destroyed.len())
    }

    /// Destroys every live handle of `id` in `map`, keeping the descriptor.
    ///
    /// # Errors
    /// Returns [`EditorError::MapNotLoaded`] when `map` is not loaded.
    pub fn destroy_object(&mut self, map: &str, id: &str) -> Result<Vec<HandleId>, EditorError> {
        let composition = self
            .maps
            .get_mut(map)
            .ok_or_else(|| EditorError::MapNotLoaded(map.to_owned()))?;
        let destroyed = composition.destroy_object(id, &mut self.backend);
        for handle in &destroyed {
            self.selection.release_handle(map, *handle);
        }
        Ok(destroyed)
    }

    /// Propagates an edit of the descriptor behind `handle` to the scene.
    ///
    /// The composition is marked dirty first. Descriptors flagged with
    /// [`Descriptor::requires_full_respawn`] have every live copy destroyed
    /// now and rebuilt after the respawn delay, with the selecting actor (if
    /// any) re-pointed at the rebuilt handle. Other descriptors are
    /// refreshed in place across every region they occupy.
    ///
    /// # Errors
    /// Fails when `map` is not loaded or `handle` is no longer live.
    pub fn update_object(&mut self, map: &str, handle: HandleId) -> Result<UpdateOutcome, EditorError> {
        let due = self.clock + self.respawn_delay;
        let composition = self
            .maps
            .get_mut(map)
            .ok_or_else(|| EditorError::MapNotLoaded(map.to_owned()))?;
        let id = composition
            .handle(handle)
            .map(|h| h.id.clone())
            .ok_or_else(|| EditorError::StaleHandle {
                map: map.to_owned(),
                handle,
            })?;

        composition.mark_dirty();

        let Some(descriptor) = composition.get_mut(&id).filter(|d| d.requires_full_respawn())
        else {
            let handles = composition.refresh_object(&id, &mut self.backend);
            return Ok(UpdateOutcome::Refreshed { handles });
        };
        descriptor.begin_full_respawn();

        let selector = self.selection.selector_of(map, &id);
        let destroyed = composition.destroy_object(&id, &mut self.backend);
        for dead in &destroyed {
            self.selection.release_handle(map, *dead);
        }
        let task = self
            .respawns
            .schedule(map, composition.generation(), &id, selector, due);
        debug!(
            "{map}:{id} destroyed {} handles, respawn {task} due at {due:?}",
            destroyed.len()
        );
        Ok(UpdateOutcome::RespawnScheduled {
            destroyed: destroyed.len(),
            task,
        })
    }

    /// Cancels a queued respawn. Returns `false` if it already ran.
    pub fn cancel_respawn(&mut self, task: TaskId) -> bool {
        self.respawns.cancel(task)
    }

    /// Releases and rebuilds the indicators of every loaded composition.
    ///
    /// Returns the number of indicators bound afterwards.
    pub fn refresh_indicators(&mut self) -> usize {
        self.maps
            .values_mut()
            .map(|composition| composition.refresh_indicators(&mut self.backend))
            .sum()
    }

    /// Advances the clock by `delta`, runs due respawns, then moves every
    /// indicator onto its owner.
    pub fn tick(&mut self, delta: Duration) -> TickReport {
        self.clock += delta;
        let mut report = TickReport::default();

        for task in self.respawns.take_due(self.clock) {
            if self.run_respawn(&task) {
                report.respawned += 1;
            } else {
                report.skipped += 1;
            }
        }

        for composition in self.maps.values_mut() {
            let follow = composition.follow_indicators(&mut self.backend);
            report.indicators.moved += follow.moved;
            report.indicators.orphaned += follow.orphaned;
        }

        report
    }

    fn run_respawn(&mut self, task: &PendingRespawn) -> bool {
        let Some(composition) = self
            .maps
            .get_mut(&task.map)
            .filter(|c| c.generation() == task.generation)
        else {
            debug!("{} skipped: {} is no longer loaded", task.task, task.map);
            return false;
        };
        let Some(descriptor) = composition.get(&task.id).cloned() else {
            debug!("{} skipped: {}:{} was removed", task.task, task.map, task.id);
            return false;
        };

        let spawned = composition.spawn_object(&task.id, &descriptor, &mut self.backend);
        if let Some(actor) = task.selector {
            if let Some(handle) = composition.handles_for(&task.id).next() {
                self.selection.set_selection(actor, handle);
            }
        }
        debug!("{} respawned {}:{} as {spawned} handles", task.task, task.map, task.id);
        spawned > 0
    }
}
