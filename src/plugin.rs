//! Bevy integration: drive the editor from the app's clock.
//!
//! The editor is inserted by the host as an [`EditorResource`]. The plugin
//! applies [`EditorSettings`] on start-up and calls [`Editor::tick`] every
//! `Update` with the frame delta, which is where deferred respawns fire and
//! indicators catch up with their owners.

use std::marker::PhantomData;

use bevy::prelude::*;
use log::debug;

use crate::backend::SceneBackend;
use crate::editor::Editor;
use crate::settings::EditorSettings;

/// Resource wrapping the editor so Bevy systems can reach it.
#[derive(Resource, Debug)]
pub struct EditorResource<B>(pub Editor<B>)
where
    B: SceneBackend + Send + Sync + 'static;

/// Plugin ticking an [`EditorResource<B>`] once per frame.
pub struct MapEditorPlugin<B> {
    backend: PhantomData<fn() -> B>,
}

impl<B> Default for MapEditorPlugin<B> {
    fn default() -> Self {
        Self {
            backend: PhantomData,
        }
    }
}

impl<B> Plugin for MapEditorPlugin<B>
where
    B: SceneBackend + Send + Sync + 'static,
{
    fn build(&self, app: &mut App) {
        app.init_resource::<EditorSettings>();
        app.add_systems(
            Startup,
            configure_editor_system::<B>.run_if(resource_exists::<EditorResource<B>>),
        );
        app.add_systems(
            Update,
            tick_editor_system::<B>.run_if(resource_exists::<EditorResource<B>>),
        );
    }
}

/// Applies the current [`EditorSettings`] to the editor.
pub fn configure_editor_system<B>(
    settings: Res<EditorSettings>,
    mut editor: ResMut<EditorResource<B>>,
) where
    B: SceneBackend + Send + Sync + 'static,
{
    editor.0.apply_settings(&settings);
}

/// Advances the editor by the frame delta.
pub fn tick_editor_system<B>(time: Res<Time>, mut editor: ResMut<EditorResource<B>>)
where
    B: SceneBackend + Send + Sync + 'static,
{
    let report = editor.0.tick(time.delta());
    if report.respawned > 0 || report.skipped > 0 {
        debug!(
            "tick: {} respawned, {} skipped",
            report.respawned, report.skipped
        );
    }
}
