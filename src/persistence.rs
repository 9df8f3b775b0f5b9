//! Persisted shape of a composition and a directory-backed store.
//!
//! On disk a composition is twelve named collections, one per kind, each
//! mapping an id to that kind's fields. The file name carries the
//! composition name. Loading rejects files in which two collections share an
//! id, since the in-memory registry keeps a single id namespace.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composition::Composition;
use crate::descriptor::{
    CameraDescriptor, Descriptor, DoorDescriptor, InteractivePropDescriptor,
    ItemSpawnpointDescriptor, LightDescriptor, ObjectKind, PlayerSpawnpointDescriptor,
    PrimitiveDescriptor, ShootingTargetDescriptor, SubSceneDescriptor, TeleportDescriptor,
    TextDescriptor, WorkstationDescriptor,
};

/// File extension of stored compositions.
pub const MAP_EXTENSION: &str = "json";

/// Errors raised while reading or writing compositions.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem access failed.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is not a valid composition.
    #[error("composition `{name}` is malformed: {source}")]
    Malformed {
        /// Composition name.
        name: String,
        /// Parser error.
        source: serde_json::Error,
    },
    /// Two collections use the same id.
    #[error("id `{id}` appears in both {first} and {second}")]
    DuplicateId {
        /// Colliding id.
        id: String,
        /// Collection that claimed the id first.
        first: ObjectKind,
        /// Collection that repeated it.
        second: ObjectKind,
    },
    /// The name cannot be used as a file name.
    #[error("`{0}` is not a valid composition name")]
    InvalidName(String),
}

macro_rules! composition_file {
    ($($field:ident: $ty:ty => $variant:ident),* $(,)?) => {
        /// Serialisable form of a composition: one collection per kind.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct CompositionFile {
            $(
                #[doc = concat!("`", stringify!($variant), "` descriptors keyed by id.")]
                #[serde(skip_serializing_if = "BTreeMap::is_empty")]
                pub $field: BTreeMap<String, $ty>,
            )*
        }

        impl CompositionFile {
            /// Splits the descriptors of `composition` into per-kind
            /// collections.
            #[must_use]
            pub fn from_composition(composition: &Composition) -> Self {
                let mut file = Self::default();
                for (id, descriptor) in composition.descriptors() {
                    match descriptor {
                        $(
                            Descriptor::$variant(inner) => {
                                file.$field.insert(id.clone(), inner.clone());
                            }
                        )*
                    }
                }
                file
            }

            /// Rebuilds a clean composition called `name`.
            ///
            /// # Errors
            /// Returns [`PersistenceError::DuplicateId`] when two collections
            /// share an id.
            pub fn into_composition(self, name: &str) -> Result<Composition, PersistenceError> {
                let mut composition = Composition::new(name);
                $(
                    for (id, inner) in self.$field {
                        if let Some(first) = composition.get(&id).map(Descriptor::kind) {
                            return Err(PersistenceError::DuplicateId {
                                id,
                                first,
                                second: ObjectKind::$variant,
                            });
                        }
                        composition.try_add(&id, Descriptor::$variant(inner));
                    }
                )*
                composition.mark_clean();
                Ok(composition)
            }
        }
    };
}

composition_file! {
    primitives: PrimitiveDescriptor => Primitive,
    lights: LightDescriptor => Light,
    doors: DoorDescriptor => Door,
    workstations: WorkstationDescriptor => Workstation,
    item_spawnpoints: ItemSpawnpointDescriptor => ItemSpawnpoint,
    player_spawnpoints: PlayerSpawnpointDescriptor => PlayerSpawnpoint,
    interactive_props: InteractivePropDescriptor => InteractiveProp,
    texts: TextDescriptor => Text,
    sub_scenes: SubSceneDescriptor => SubScene,
    cameras: CameraDescriptor => Camera,
    shooting_targets: ShootingTargetDescriptor => ShootingTarget,
    teleports: TeleportDescriptor => Teleport,
}

/// Serialises `composition` as pretty-printed JSON.
///
/// # Errors
/// Returns [`PersistenceError::Malformed`] if serialisation fails.
pub fn to_json(composition: &Composition) -> Result<String, PersistenceError> {
    serde_json::to_string_pretty(&CompositionFile::from_composition(composition)).map_err(|source| {
        PersistenceError::Malformed {
            name: composition.name().to_owned(),
            source,
        }
    })
}

/// Parses a composition called `name` from JSON.
///
/// # Errors
/// Fails on malformed JSON or ids shared between collections.
pub fn from_json(name: &str, json: &str) -> Result<Composition, PersistenceError> {
    let file: CompositionFile =
        serde_json::from_str(json).map_err(|source| PersistenceError::Malformed {
            name: name.to_owned(),
            source,
        })?;
    file.into_composition(name)
}

/// Directory of `<name>.json` compositions.
#[derive(Debug, Clone)]
pub struct MapStore {
    dir: PathBuf,
}

impl MapStore {
    /// Creates a store rooted at `dir`. The directory is created on first
    /// save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the composition called `name`.
    ///
    /// # Errors
    /// Returns [`PersistenceError::InvalidName`] for empty names and names
    /// that would escape the store directory.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', ':']);
        if !valid {
            return Err(PersistenceError::InvalidName(name.to_owned()));
        }
        Ok(self.dir.join(format!("{name}.{MAP_EXTENSION}")))
    }

    /// Writes `composition` and marks it clean.
    ///
    /// # Errors
    /// Fails on invalid names or I/O errors.
    pub fn save(&self, composition: &mut Composition) -> Result<PathBuf, PersistenceError> {
        let path = self.path_for(composition.name())?;
        let json = to_json(composition)?;
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        composition.mark_clean();
        info!("saved {} to {}", composition.name(), path.display());
        Ok(path)
    }

    /// Reads the composition called `name`.
    ///
    /// # Errors
    /// Fails on invalid names, I/O errors, malformed files or duplicate ids.
    pub fn load(&self, name: &str) -> Result<Composition, PersistenceError> {
        let path = self.path_for(name)?;
        let json = fs::read_to_string(&path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        let composition = from_json(name, &json)?;
        debug!("read {} objects from {}", composition.len(), path.display());
        Ok(composition)
    }

    /// Names of every stored composition, sorted.
    ///
    /// A missing directory yields an empty list.
    ///
    /// # Errors
    /// Fails when the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<String>, PersistenceError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == MAP_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Placement;
    use glam::Vec3;
    use rstest::rstest;

    #[rstest]
    fn collections_are_named_after_kinds() {
        let mut composition = Composition::new("lobby");
        composition.try_add("spawn", PlayerSpawnpointDescriptor::default());
        composition.try_add("tp", TeleportDescriptor::default());

        let json = to_json(&composition).unwrap_or_else(|e| panic!("serialise failed: {e}"));
        let value: serde_json::Value =
            serde_json::from_str(&json).unwrap_or_else(|e| panic!("reparse failed: {e}"));

        for kind in [ObjectKind::PlayerSpawnpoint, ObjectKind::Teleport] {
            assert!(value.get(kind.collection_name()).is_some(), "missing {kind}");
        }
        assert!(value.get("primitives").is_none());
    }

    #[rstest]
    fn loaded_composition_is_clean_and_keeps_fields() {
        let mut composition = Composition::new("lobby");
        composition.try_add(
            "box",
            PrimitiveDescriptor {
                placement: Placement::in_region("hall", Vec3::new(1.0, 2.0, 3.0))
                    .with_region_index(2),
                ..PrimitiveDescriptor::default()
            },
        );
        let json = to_json(&composition).unwrap_or_else(|e| panic!("serialise failed: {e}"));

        let loaded = from_json("lobby", &json).unwrap_or_else(|e| panic!("parse failed: {e}"));

        assert!(!loaded.is_dirty());
        assert_eq!(loaded.descriptors(), composition.descriptors());
    }

    #[rstest]
    fn ids_shared_between_collections_are_rejected() {
        let json = r#"{
            "lights": { "dup": {} },
            "teleports": { "dup": {} }
        }"#;
        let err = from_json("lobby", json).err();
        assert!(matches!(
            err,
            Some(PersistenceError::DuplicateId {
                first: ObjectKind::Light,
                second: ObjectKind::Teleport,
                ..
            })
        ));
    }

    #[rstest]
    #[case("")]
    #[case("../escape")]
    #[case(".hidden")]
    #[case("a/b")]
    fn unsafe_names_are_rejected(#[case] name: &str) {
        let store = MapStore::new("maps");
        assert!(matches!(
            store.path_for(name),
            Err(PersistenceError::InvalidName(_))
        ));
    }
}
