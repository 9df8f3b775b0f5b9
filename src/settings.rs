//! Runtime configuration for the editor and the headless scene.

use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::Resource;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::backend::HeadlessScene;
use crate::{DEFAULT_MAPS_DIR, RESPAWN_DELAY};

/// A region the headless scene exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSettings {
    /// Region type name.
    pub name: String,
    /// Index among regions sharing the name.
    pub index: i32,
    /// World position of the region origin.
    #[serde(default)]
    pub origin: Vec3,
}

/// Editor configuration, usually read from a JSON file.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Milliseconds between destroying and rebuilding a full respawn.
    pub respawn_delay_ms: u64,
    /// Directory holding persisted compositions.
    pub maps_dir: PathBuf,
    /// Compositions loaded at start-up. Empty loads every stored map.
    pub autoload: Vec<String>,
    /// Regions of the headless scene.
    pub regions: Vec<RegionSettings>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            respawn_delay_ms: u64::try_from(RESPAWN_DELAY.as_millis()).unwrap_or(u64::MAX),
            maps_dir: PathBuf::from(DEFAULT_MAPS_DIR),
            autoload: Vec::new(),
            regions: Vec::new(),
        }
    }
}

impl EditorSettings {
    /// Parses settings from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    /// Returns the parser error when `json` is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Respawn delay as a [`Duration`].
    #[must_use]
    pub const fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }

    /// Builds a headless scene exposing the configured regions.
    #[must_use]
    pub fn headless_scene(&self) -> HeadlessScene {
        self.regions
            .iter()
            .fold(HeadlessScene::new(), |scene, region| {
                scene.with_region(&region.name, region.index, region.origin)
            })
    }
}
