//! One-shot deferred respawn tasks.
//!
//! A full respawn destroys live instances immediately and rebuilds them on a
//! later tick. The rebuild is queued here together with the composition's
//! generation at scheduling time. When the task comes due the editor
//! compares that generation with the composition currently loaded under the
//! same name; a mismatch or a missing composition turns the task into a
//! no-op.

use std::fmt;
use std::time::Duration;

use crate::selection::ActorId;

/// Identity of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A respawn waiting for its delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRespawn {
    /// Identity of the task.
    pub task: TaskId,
    /// Composition name.
    pub map: String,
    /// Generation of the composition when the task was queued.
    pub generation: u64,
    /// Descriptor id to respawn.
    pub id: String,
    /// Actor whose selection is restored after the respawn.
    pub selector: Option<ActorId>,
    /// Editor clock reading at which the task runs.
    pub due: Duration,
}

/// Queue of pending respawns ordered by due time.
#[derive(Debug, Default)]
pub struct RespawnQueue {
    pending: Vec<PendingRespawn>,
    next: u64,
}

impl RespawnQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether a respawn of `id` in `map` is queued.
    #[must_use]
    pub fn is_pending(&self, map: &str, id: &str) -> bool {
        self.pending.iter().any(|p| p.map == map && p.id == id)
    }

    /// Queues a respawn, replacing any queued respawn of the same object.
    ///
    /// A replaced task hands its selector over when the new request has
    /// none, so a selection captured by the first request survives.
    pub fn schedule(
        &mut self,
        map: &str,
        generation: u64,
        id: &str,
        selector: Option<ActorId>,
        due: Duration,
    ) -> TaskId {
        let mut inherited = None;
        self.pending.retain(|p| {
            let same = p.map == map && p.id == id;
            if same {
                inherited = p.selector;
            }
            !same
        });

        self.next += 1;
        let task = TaskId(self.next);
        self.pending.push(PendingRespawn {
            task,
            map: map.to_owned(),
            generation,
            id: id.to_owned(),
            selector: selector.or(inherited),
            due,
        });
        task
    }

    /// Cancels a single task. Returns `false` if it already ran or never
    /// existed.
    pub fn cancel(&mut self, task: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.task != task);
        self.pending.len() != before
    }

    /// Cancels every task queued for `map` and returns how many were
    /// dropped.
    pub fn cancel_map(&mut self, map: &str) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.map != map);
        before - self.pending.len()
    }

    /// Removes and returns every task due at `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<PendingRespawn> {
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;
        due.sort_by_key(|p| (p.due, p.task));
        due
    }
}
