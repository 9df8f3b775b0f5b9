//! Utility helpers for tests.

use std::time::Duration;

use glam::Vec3;
use tessera::descriptor::{
    CameraDescriptor, DoorDescriptor, InteractivePropDescriptor, ItemSpawnpointDescriptor,
    LightDescriptor, PlayerSpawnpointDescriptor, PrimitiveDescriptor, ShootingTargetDescriptor,
    SubSceneDescriptor, TeleportDescriptor, TextDescriptor, WorkstationDescriptor,
};
use tessera::{
    Composition, Descriptor, Editor, HandleId, HeadlessScene, ObjectKind, Placement,
    SceneBackend,
};

/// Name of the region family built by [`hall_scene`].
pub const HALL: &str = "hall";

/// Number of `hall` regions in [`hall_scene`].
pub const HALL_COPIES: usize = 3;

/// Scene with three `hall` regions (indices 0 to 2, 50 units apart) and a
/// single `vault` region at index 5.
pub fn hall_scene() -> HeadlessScene {
    HeadlessScene::new()
        .with_region(HALL, 0, Vec3::ZERO)
        .with_region(HALL, 1, Vec3::X * 50.0)
        .with_region(HALL, 2, Vec3::X * 100.0)
        .with_region("vault", 5, Vec3::Z * -200.0)
}

/// Placement inside every `hall` region.
pub fn in_hall(position: Vec3) -> Placement {
    Placement::in_region(HALL, position)
}

/// Default descriptor of `kind` placed at `placement`.
pub fn descriptor_of(kind: ObjectKind, placement: Placement) -> Descriptor {
    match kind {
        ObjectKind::Primitive => PrimitiveDescriptor {
            placement,
            ..PrimitiveDescriptor::default()
        }
        .into(),
        ObjectKind::Light => LightDescriptor {
            placement,
            ..LightDescriptor::default()
        }
        .into(),
        ObjectKind::Door => DoorDescriptor {
            placement,
            ..DoorDescriptor::default()
        }
        .into(),
        ObjectKind::Workstation => WorkstationDescriptor {
            placement,
            ..WorkstationDescriptor::default()
        }
        .into(),
        ObjectKind::ItemSpawnpoint => ItemSpawnpointDescriptor {
            placement,
            ..ItemSpawnpointDescriptor::default()
        }
        .into(),
        ObjectKind::PlayerSpawnpoint => PlayerSpawnpointDescriptor {
            placement,
            ..PlayerSpawnpointDescriptor::default()
        }
        .into(),
        ObjectKind::InteractiveProp => InteractivePropDescriptor {
            placement,
            ..InteractivePropDescriptor::default()
        }
        .into(),
        ObjectKind::Text => TextDescriptor {
            placement,
            ..TextDescriptor::default()
        }
        .into(),
        ObjectKind::SubScene => SubSceneDescriptor {
            placement,
            ..SubSceneDescriptor::default()
        }
        .into(),
        ObjectKind::Camera => CameraDescriptor {
            placement,
            ..CameraDescriptor::default()
        }
        .into(),
        ObjectKind::ShootingTarget => ShootingTargetDescriptor {
            placement,
            ..ShootingTargetDescriptor::default()
        }
        .into(),
        ObjectKind::Teleport => TeleportDescriptor {
            placement,
            ..TeleportDescriptor::default()
        }
        .into(),
    }
}

/// Composition holding one `hall` descriptor of every kind, keyed by the
/// kind's collection name.
pub fn one_of_each(name: &str) -> Composition {
    let mut composition = Composition::new(name);
    for kind in ObjectKind::ALL {
        composition.try_add(
            kind.collection_name(),
            descriptor_of(kind, in_hall(Vec3::ZERO)),
        );
    }
    composition.mark_clean();
    composition
}

/// First live handle of `id` in `map`.
///
/// # Panics
/// Panics when the object has no live handle.
pub fn first_handle<B: SceneBackend>(editor: &Editor<B>, map: &str, id: &str) -> HandleId {
    editor
        .map(map)
        .and_then(|m| m.handles_for(id).next())
        .map(|h| h.handle)
        .unwrap_or_else(|| panic!("{map}:{id} has no live handle"))
}

/// Ticks `editor` in `step` increments until no respawn is pending.
///
/// Returns the number of ticks taken.
///
/// # Panics
/// Panics if work is still pending after `max_ticks`.
pub fn tick_until_idle<B: SceneBackend>(
    editor: &mut Editor<B>,
    step: Duration,
    max_ticks: usize,
) -> usize {
    for ticks in 0..max_ticks {
        if editor.pending_respawns().is_empty() {
            return ticks;
        }
        editor.tick(step);
    }
    assert!(
        editor.pending_respawns().is_empty(),
        "respawns still pending after {max_ticks} ticks"
    );
    max_ticks
}
