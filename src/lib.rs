#![cfg_attr(docsrs, feature(doc_cfg))]
//! Scene composition registry with live instance lifecycle management.
//!
//! Operators compose maps out of a fixed catalog of placeable objects. This
//! crate keeps the authoritative descriptors of every loaded map, mirrors
//! them into a [`SceneBackend`] as live instances across one or more
//! regions, and keeps that mirror in sync as descriptors are edited:
//! in-place refreshes for cheap changes, destroy and deferred respawn for
//! structural ones, plus indicator overlays for otherwise invisible objects.
//!
//! ```
//! use tessera::prelude::*;
//!
//! let mut editor = Editor::new(HeadlessScene::new());
//! editor.load(Composition::new("lobby"));
//! let spawned = editor
//!     .place_object("lobby", "lamp", LightDescriptor::default())
//!     .unwrap_or_default();
//! assert_eq!(spawned, 1);
//! ```
pub mod backend;
pub mod composition;
pub mod constants;
pub mod descriptor;
pub mod editor;
pub mod handle;
pub mod indicator;
pub mod logging;
mod macros;
pub mod persistence;
pub mod plugin;
pub mod schedule;
pub mod selection;
pub mod settings;
pub use constants::*;

pub use backend::{HeadlessScene, InstanceId, Region, SceneBackend};
pub use composition::{Composition, ReloadReport};
pub use descriptor::{Descriptor, ObjectKind, Placement};
pub use editor::{Editor, EditorError, TickReport};
pub use handle::{HandleId, ObjectHandle, UpdateOutcome};
pub use indicator::{Indicator, IndicatorOverlay};
pub use logging::init as init_logging;
pub use persistence::{MapStore, PersistenceError};
pub use plugin::{EditorResource, MapEditorPlugin};
pub use selection::{ActorId, Selection, SelectionTable};
pub use settings::EditorSettings;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use tessera::prelude::*;
    //! ```

    pub use crate::descriptor::{
        CameraDescriptor, DoorDescriptor, InteractivePropDescriptor, ItemSpawnpointDescriptor,
        LightDescriptor, PlayerSpawnpointDescriptor, PrimitiveDescriptor,
        ShootingTargetDescriptor, SubSceneDescriptor, TeleportDescriptor, TextDescriptor,
        WorkstationDescriptor,
    };
    pub use crate::{
        ActorId, Composition, Descriptor, Editor, HandleId, HeadlessScene, ObjectKind, Placement,
        Region, SceneBackend, Selection, UpdateOutcome,
    };
}
