//! Propagating descriptor edits to live copies: in-place refreshes,
//! deferred full respawns and selection restore.

use std::time::Duration;

use glam::Vec3;
use mockall::mock;
use rstest::{fixture, rstest};
use tessera::descriptor::DoorDescriptor;
use tessera::{
    ActorId, Composition, Descriptor, Editor, EditorSettings, HeadlessScene, InstanceId,
    ObjectKind, Region, SceneBackend, Selection, UpdateOutcome, RESPAWN_DELAY,
};
use test_utils::{
    descriptor_of, first_handle, hall_scene, in_hall, tick_until_idle, HALL, HALL_COPIES,
};

mock! {
    Scene {}
    impl SceneBackend for Scene {
        fn resolve_regions(&self, descriptor: &Descriptor) -> Vec<Region>;
        fn spawn_or_update(
            &mut self,
            descriptor: &Descriptor,
            region: &Region,
            existing: Option<InstanceId>,
        ) -> Option<InstanceId>;
        fn destroy(&mut self, instance: InstanceId);
        fn spawn_or_update_indicator(
            &mut self,
            descriptor: &Descriptor,
            region: &Region,
            existing: Option<InstanceId>,
        ) -> Option<InstanceId>;
        fn position(&self, instance: InstanceId) -> Option<Vec3>;
        fn set_position(&mut self, instance: InstanceId, position: Vec3);
        fn native_door(&self, id: &str) -> Option<InstanceId>;
        fn configure_native_door(&mut self, door: &DoorDescriptor, instance: InstanceId);
    }
}

fn three_halls() -> Vec<Region> {
    (0..3).map(|index| Region::new(HALL, index)).collect()
}

/// Mock that hands out fresh instances for new spawns.
fn spawning_scene() -> MockScene {
    let mut scene = MockScene::new();
    scene.expect_resolve_regions().returning(|_| three_halls());
    let mut next = 0;
    scene
        .expect_spawn_or_update()
        .withf(|_, _, existing| existing.is_none())
        .returning(move |_, _, _| {
            next += 1;
            Some(InstanceId(next))
        });
    scene
}

fn editor_with(scene: MockScene) -> Editor<MockScene> {
    let mut editor = Editor::new(scene);
    editor.load(Composition::new("lobby"));
    editor
}

#[fixture]
fn headless() -> Editor<HeadlessScene> {
    let mut editor = Editor::new(hall_scene());
    editor.load(Composition::new("lobby"));
    editor
        .place_object(
            "lobby",
            "lamp",
            descriptor_of(ObjectKind::Light, in_hall(Vec3::ZERO)),
        )
        .unwrap_or_else(|e| panic!("place failed: {e}"));
    editor
}

#[rstest]
fn scale_edit_refreshes_every_copy_in_place() {
    let mut scene = spawning_scene();
    scene
        .expect_spawn_or_update()
        .withf(|descriptor, _, existing| {
            existing.is_some() && descriptor.placement().scale == Vec3::splat(2.0)
        })
        .times(HALL_COPIES)
        .returning(|_, _, existing| existing);
    scene.expect_destroy().never();
    scene.expect_spawn_or_update_indicator().never();

    let mut editor = editor_with(scene);
    editor
        .place_object(
            "lobby",
            "crate",
            descriptor_of(ObjectKind::Primitive, in_hall(Vec3::ZERO)),
        )
        .unwrap_or_else(|e| panic!("place failed: {e}"));
    if let Some(map) = editor.map_mut("lobby") {
        map.mark_clean();
    }
    let handle = first_handle(&editor, "lobby", "crate");

    if let Some(d) = editor.descriptor_mut("lobby", "crate") {
        d.placement_mut().scale = Vec3::splat(2.0);
    }
    let outcome = editor.update_object("lobby", handle);

    assert_eq!(outcome, Ok(UpdateOutcome::Refreshed { handles: HALL_COPIES }));
    assert!(editor.map("lobby").is_some_and(Composition::is_dirty));
    assert!(editor.pending_respawns().is_empty());
}

#[rstest]
fn region_index_edit_destroys_now_and_respawns_later() {
    let mut scene = spawning_scene();
    scene.expect_destroy().times(HALL_COPIES).return_const(());
    scene.expect_spawn_or_update_indicator().never();

    let mut editor = editor_with(scene);
    editor
        .place_object(
            "lobby",
            "crate",
            descriptor_of(ObjectKind::Primitive, in_hall(Vec3::ZERO)),
        )
        .unwrap_or_else(|e| panic!("place failed: {e}"));
    let handle = first_handle(&editor, "lobby", "crate");

    if let Some(d) = editor.descriptor_mut("lobby", "crate") {
        d.set_region_index(1);
    }
    let outcome = editor.update_object("lobby", handle);

    assert!(matches!(
        outcome,
        Ok(UpdateOutcome::RespawnScheduled { destroyed, .. }) if destroyed == HALL_COPIES
    ));
    assert!(editor
        .map("lobby")
        .is_some_and(|m| m.handles_for("crate").next().is_none()));

    let early = editor.tick(RESPAWN_DELAY / 2);
    assert_eq!(early.respawned, 0);
    assert!(editor.pending_respawns().is_pending("lobby", "crate"));

    let due = editor.tick(RESPAWN_DELAY / 2);
    assert_eq!(due.respawned, 1);
    let regions: Vec<i32> = editor
        .map("lobby")
        .into_iter()
        .flat_map(|m| m.handles_for("crate"))
        .map(|h| h.region.index)
        .collect();
    assert_eq!(regions, [1]);
}

#[rstest]
fn respawn_flag_is_consumed_by_the_update(mut headless: Editor<HeadlessScene>) {
    let handle = first_handle(&headless, "lobby", "lamp");
    if let Some(d) = headless.descriptor_mut("lobby", "lamp") {
        d.set_region_index(2);
    }
    headless
        .update_object("lobby", handle)
        .unwrap_or_else(|e| panic!("update failed: {e}"));

    let placement = headless
        .map("lobby")
        .and_then(|m| m.get("lamp"))
        .map(|d| d.placement().clone())
        .unwrap_or_else(|| panic!("lamp should exist"));
    assert!(!placement.requires_full_respawn);
    assert_eq!(placement.previous_region_index, Some(-1));
}

#[rstest]
fn selection_moves_to_the_respawned_copy(mut headless: Editor<HeadlessScene>) {
    let actor = ActorId(7);
    let handle = first_handle(&headless, "lobby", "lamp");
    let Some(owner) = headless
        .map("lobby")
        .and_then(|m| m.handle(handle))
        .cloned()
    else {
        panic!("lamp should be live");
    };
    headless.selection_mut().set_selection(actor, &owner);

    if let Some(d) = headless.descriptor_mut("lobby", "lamp") {
        d.set_region_index(1);
    }
    headless
        .update_object("lobby", handle)
        .unwrap_or_else(|e| panic!("update failed: {e}"));
    assert!(headless.selection().get_selection(actor).is_none());

    tick_until_idle(&mut headless, Duration::from_millis(16), 20);

    let rebuilt = first_handle(&headless, "lobby", "lamp");
    let selected = headless
        .selection()
        .get_selection(actor)
        .unwrap_or_else(|| panic!("selection should be restored"));
    assert_eq!(selected.handle, rebuilt);
    assert_ne!(rebuilt, handle);
    assert_eq!(headless.backend().indicator_count(), 1);
}

#[rstest]
fn respawn_for_a_reloaded_map_is_dropped(mut headless: Editor<HeadlessScene>) {
    let handle = first_handle(&headless, "lobby", "lamp");
    if let Some(d) = headless.descriptor_mut("lobby", "lamp") {
        d.set_region("vault");
    }
    headless
        .update_object("lobby", handle)
        .unwrap_or_else(|e| panic!("update failed: {e}"));

    let replacement = headless
        .unload("lobby")
        .unwrap_or_else(|e| panic!("unload failed: {e}"));
    headless.load(replacement);
    let live = headless.backend().instance_count();

    let report = headless.tick(RESPAWN_DELAY);

    assert_eq!(report.respawned, 0);
    assert_eq!(headless.backend().instance_count(), live);
}

#[rstest]
fn repeated_updates_queue_one_respawn(mut headless: Editor<HeadlessScene>) {
    let handle = first_handle(&headless, "lobby", "lamp");
    if let Some(d) = headless.descriptor_mut("lobby", "lamp") {
        d.set_region_index(0);
    }
    headless
        .update_object("lobby", handle)
        .unwrap_or_else(|e| panic!("update failed: {e}"));
    assert!(matches!(
        headless.update_object("lobby", handle),
        Err(tessera::EditorError::StaleHandle { .. })
    ));

    assert_eq!(headless.pending_respawns().len(), 1);
    let report = headless.tick(RESPAWN_DELAY);
    assert_eq!(report.respawned, 1);
    assert_eq!(
        headless
            .map("lobby")
            .map(|m| m.handles_for("lamp").count()),
        Some(1)
    );
}

#[rstest]
fn cancelled_respawn_never_runs(mut headless: Editor<HeadlessScene>) {
    let handle = first_handle(&headless, "lobby", "lamp");
    if let Some(d) = headless.descriptor_mut("lobby", "lamp") {
        d.set_region_index(0);
    }
    let Ok(UpdateOutcome::RespawnScheduled { task, .. }) = headless.update_object("lobby", handle)
    else {
        panic!("expected a scheduled respawn");
    };

    assert!(headless.cancel_respawn(task));
    assert!(!headless.cancel_respawn(task));
    assert_eq!(headless.tick(RESPAWN_DELAY).respawned, 0);
    assert_eq!(headless.backend().instance_count(), 0);
}

#[rstest]
fn respawn_delay_comes_from_settings() {
    let settings = EditorSettings {
        respawn_delay_ms: 500,
        ..EditorSettings::default()
    };
    let mut editor = Editor::with_settings(hall_scene(), &settings);
    editor.load(Composition::new("lobby"));
    editor
        .place_object(
            "lobby",
            "lamp",
            descriptor_of(ObjectKind::Light, in_hall(Vec3::ZERO)),
        )
        .unwrap_or_else(|e| panic!("place failed: {e}"));
    let handle = first_handle(&editor, "lobby", "lamp");
    if let Some(d) = editor.descriptor_mut("lobby", "lamp") {
        d.set_region_index(1);
    }
    editor
        .update_object("lobby", handle)
        .unwrap_or_else(|e| panic!("update failed: {e}"));

    assert_eq!(editor.tick(RESPAWN_DELAY).respawned, 0);
    assert_eq!(editor.tick(Duration::from_millis(400)).respawned, 1);
}

#[derive(Debug, Clone, Copy)]
enum LobbyEdit {
    Remove,
    Destroy,
    FullRespawn,
}

#[rstest]
#[case(LobbyEdit::Remove)]
#[case(LobbyEdit::Destroy)]
#[case(LobbyEdit::FullRespawn)]
fn edits_in_one_map_keep_selections_in_another(
    mut headless: Editor<HeadlessScene>,
    #[case] edit: LobbyEdit,
) {
    let mut vault = Composition::new("vault");
    vault.try_add("crate", descriptor_of(ObjectKind::Primitive, in_hall(Vec3::ZERO)));
    headless.load(vault);

    let lamp = first_handle(&headless, "lobby", "lamp");
    let vault_crate = first_handle(&headless, "vault", "crate");
    assert_eq!(lamp, vault_crate, "handle ids are numbered per composition");

    let actor = ActorId(9);
    let Some(owner) = headless
        .map("vault")
        .and_then(|m| m.handle(vault_crate))
        .cloned()
    else {
        panic!("vault crate should be live");
    };
    headless.selection_mut().set_selection(actor, &owner);

    match edit {
        LobbyEdit::Remove => {
            assert_eq!(headless.remove_object("lobby", "lamp"), Ok(HALL_COPIES));
        }
        LobbyEdit::Destroy => {
            let destroyed = headless
                .destroy_object("lobby", "lamp")
                .unwrap_or_else(|e| panic!("destroy failed: {e}"));
            assert!(destroyed.contains(&lamp));
        }
        LobbyEdit::FullRespawn => {
            if let Some(d) = headless.descriptor_mut("lobby", "lamp") {
                d.set_region_index(0);
            }
            headless
                .update_object("lobby", lamp)
                .unwrap_or_else(|e| panic!("update failed: {e}"));
        }
    }

    let selected = headless
        .selection()
        .get_selection(actor)
        .unwrap_or_else(|| panic!("{edit:?} in lobby cleared a vault selection"));
    assert_eq!(selected.map, "vault");
    assert_eq!(selected.handle, vault_crate);
}
