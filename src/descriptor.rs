//! Catalog of placeable object kinds.
//!
//! A [`Descriptor`] is the serialisable, engine-agnostic description of one
//! placed object. Every variant embeds a [`Placement`] block carrying the
//! transform and the region targeting shared by all kinds; the remaining
//! fields are specific to the kind. Descriptors carry no behaviour beyond
//! capability queries: spawning and updating are driven by the
//! [`Composition`](crate::composition::Composition) and the
//! [`SceneBackend`](crate::backend::SceneBackend).

use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::macros::for_each_kind;
use crate::ANY_REGION;

/// Discriminant for the twelve descriptor kinds.
///
/// The declaration order matches [`ObjectKind::ALL`], which is the order in
/// which a composition reloads its descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Static mesh primitive.
    Primitive,
    /// Point light.
    Light,
    /// Door, possibly bound to a native door already present in the scene.
    Door,
    /// Crafting workstation.
    Workstation,
    /// Point where items appear.
    ItemSpawnpoint,
    /// Point where players appear.
    PlayerSpawnpoint,
    /// Prop operators can interact with.
    InteractiveProp,
    /// Floating text label.
    Text,
    /// Nested sub-scene.
    SubScene,
    /// Surveillance camera.
    Camera,
    /// Shooting range target.
    ShootingTarget,
    /// Teleport link to other teleports.
    Teleport,
}

impl ObjectKind {
    /// Every kind in reload order.
    ///
    /// Door lookups during reload rely on this order being stable.
    pub const ALL: [Self; 12] = [
        Self::Primitive,
        Self::Light,
        Self::Door,
        Self::Workstation,
        Self::ItemSpawnpoint,
        Self::PlayerSpawnpoint,
        Self::InteractiveProp,
        Self::Text,
        Self::SubScene,
        Self::Camera,
        Self::ShootingTarget,
        Self::Teleport,
    ];

    /// Name of the persisted collection holding descriptors of this kind.
    #[must_use]
    pub const fn collection_name(self) -> &'static str {
        match self {
            Self::Primitive => "primitives",
            Self::Light => "lights",
            Self::Door => "doors",
            Self::Workstation => "workstations",
            Self::ItemSpawnpoint => "item_spawnpoints",
            Self::PlayerSpawnpoint => "player_spawnpoints",
            Self::InteractiveProp => "interactive_props",
            Self::Text => "texts",
            Self::SubScene => "sub_scenes",
            Self::Camera => "cameras",
            Self::ShootingTarget => "shooting_targets",
            Self::Teleport => "teleports",
        }
    }

    /// Whether descriptors of this kind get an indicator overlay.
    ///
    /// Spawnpoints, lights and teleports are otherwise invisible to the
    /// operator, so they are paired with a visual aid.
    #[must_use]
    pub const fn has_indicator(self) -> bool {
        matches!(
            self,
            Self::ItemSpawnpoint | Self::PlayerSpawnpoint | Self::Light | Self::Teleport
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

/// Transform and region targeting shared by every descriptor kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Position relative to the resolved region.
    pub position: Vec3,
    /// Euler rotation in degrees.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
    /// Region type name the backend resolves candidates from. Empty means
    /// world space.
    pub region: String,
    /// `-1` spawns in every matching region, otherwise only in the region
    /// with this index.
    pub region_index: i32,
    /// Set when a change cannot be applied to live instances in place.
    #[serde(skip)]
    pub requires_full_respawn: bool,
    /// Region index the live copies occupied before the structural edit
    /// that raised `requires_full_respawn`.
    #[serde(skip)]
    pub previous_region_index: Option<i32>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            region: String::new(),
            region_index: ANY_REGION,
            requires_full_respawn: false,
            previous_region_index: None,
        }
    }
}

impl Placement {
    /// Creates a placement at `position` inside regions named `region`.
    #[must_use]
    pub fn in_region(region: impl Into<String>, position: Vec3) -> Self {
        Self {
            position,
            region: region.into(),
            ..Self::default()
        }
    }

    /// Returns a copy bound to the region with `index`.
    #[must_use]
    pub const fn with_region_index(mut self, index: i32) -> Self {
        self.region_index = index;
        self
    }

    /// Raises the respawn flag, remembering the region index the live
    /// copies occupy if this is the first structural edit since the last
    /// respawn.
    const fn flag_full_respawn(&mut self) {
        if !self.requires_full_respawn {
            self.previous_region_index = Some(self.region_index);
            self.requires_full_respawn = true;
        }
    }
}

/// RGBA colour with linear components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Creates an opaque colour.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Mesh used by a [`PrimitiveDescriptor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveShape {
    /// Unit cube.
    #[default]
    Cube,
    /// Unit sphere.
    Sphere,
    /// Upright cylinder.
    Cylinder,
    /// Upright capsule.
    Capsule,
    /// Double-sided plane.
    Plane,
    /// Single-sided quad.
    Quad,
}

/// Door prefab family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorType {
    /// Light containment door.
    #[default]
    Light,
    /// Heavy containment door.
    Heavy,
    /// Entrance zone door.
    Entrance,
    /// Large bulkhead door.
    Bulkhead,
}

/// Static mesh primitive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Mesh shape.
    pub shape: PrimitiveShape,
    /// Surface colour.
    pub color: Color,
    /// Whether the primitive blocks movement.
    pub collidable: bool,
    /// Whether the primitive is rendered.
    pub visible: bool,
}

/// Point light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Emitted colour.
    pub color: Color,
    /// Brightness multiplier.
    pub intensity: f32,
    /// Falloff distance.
    pub range: f32,
    /// Whether the light casts shadows.
    pub shadows: bool,
}

impl Default for LightDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
            shadows: true,
        }
    }
}

/// Door.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Prefab family; changing it requires a full respawn.
    pub door_type: DoorType,
    /// Whether the door refuses to open.
    pub locked: bool,
    /// Whether the door starts open.
    pub open: bool,
    /// Damage the door absorbs before breaking.
    pub health: f32,
}

impl Default for DoorDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            door_type: DoorType::default(),
            locked: false,
            open: false,
            health: 150.0,
        }
    }
}

/// Crafting workstation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkstationDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Whether players may use the workstation.
    pub interactable: bool,
}

impl Default for WorkstationDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            interactable: true,
        }
    }
}

/// Point where items appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSpawnpointDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Item type name.
    pub item: String,
    /// Percentage chance (0-100) that the item appears.
    pub spawn_chance: f32,
    /// Number of items spawned.
    pub count: u32,
    /// Whether spawned pickups count towards the pickup limit.
    pub use_pickup_limit: bool,
}

impl Default for ItemSpawnpointDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            item: "keycard".to_owned(),
            spawn_chance: 100.0,
            count: 1,
            use_pickup_limit: true,
        }
    }
}

/// Point where players of a role appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSpawnpointDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Role name the spawnpoint serves.
    pub role: String,
}

impl Default for PlayerSpawnpointDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            role: "guard".to_owned(),
        }
    }
}

/// Prop operators can interact with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractivePropDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Model name.
    pub model: String,
    /// Seconds the interaction takes.
    pub interaction_duration: f32,
    /// Whether interaction is disabled.
    pub locked: bool,
}

/// Floating text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Label contents.
    pub text: String,
    /// Font size in points.
    pub font_size: f32,
    /// Text colour.
    pub color: Color,
}

impl Default for TextDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            text: String::new(),
            font_size: 12.0,
            color: Color::WHITE,
        }
    }
}

/// Surveillance camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Name shown to camera operators.
    pub label: String,
    /// Minimum and maximum pitch in degrees.
    pub vertical_limits: Vec2,
    /// Minimum and maximum yaw in degrees.
    pub horizontal_limits: Vec2,
}

impl Default for CameraDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            label: String::new(),
            vertical_limits: Vec2::new(-45.0, 45.0),
            horizontal_limits: Vec2::new(-90.0, 90.0),
        }
    }
}

/// Shooting range target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootingTargetDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Target model name.
    pub target_type: String,
    /// Whether hits are replicated to every observer.
    pub syncs_hits: bool,
}

impl Default for ShootingTargetDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            target_type: "sport".to_owned(),
            syncs_hits: true,
        }
    }
}

/// Nested sub-scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubSceneDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Name of the nested composition; changing it requires a full respawn.
    pub schematic: String,
}

/// Teleport link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportDescriptor {
    /// Shared transform and region targeting.
    #[serde(flatten)]
    pub placement: Placement,
    /// Ids of the teleports this one can send players to.
    pub targets: Vec<String>,
    /// Seconds before the teleport can be used again.
    pub cooldown: f32,
    /// Percentage chance (0-100) that the teleport fires.
    pub chance: f32,
}

impl Default for TeleportDescriptor {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            targets: Vec::new(),
            cooldown: 10.0,
            chance: 100.0,
        }
    }
}

/// Serialisable description of one placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor {
    /// Static mesh primitive.
    Primitive(PrimitiveDescriptor),
    /// Point light.
    Light(LightDescriptor),
    /// Door.
    Door(DoorDescriptor),
    /// Crafting workstation.
    Workstation(WorkstationDescriptor),
    /// Point where items appear.
    ItemSpawnpoint(ItemSpawnpointDescriptor),
    /// Point where players appear.
    PlayerSpawnpoint(PlayerSpawnpointDescriptor),
    /// Prop operators can interact with.
    InteractiveProp(InteractivePropDescriptor),
    /// Floating text label.
    Text(TextDescriptor),
    /// Surveillance camera.
    Camera(CameraDescriptor),
    /// Shooting range target.
    ShootingTarget(ShootingTargetDescriptor),
    /// Nested sub-scene.
    SubScene(SubSceneDescriptor),
    /// Teleport link.
    Teleport(TeleportDescriptor),
}

impl Descriptor {
    /// Returns the kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Primitive(_) => ObjectKind::Primitive,
            Self::Light(_) => ObjectKind::Light,
            Self::Door(_) => ObjectKind::Door,
            Self::Workstation(_) => ObjectKind::Workstation,
            Self::ItemSpawnpoint(_) => ObjectKind::ItemSpawnpoint,
            Self::PlayerSpawnpoint(_) => ObjectKind::PlayerSpawnpoint,
            Self::InteractiveProp(_) => ObjectKind::InteractiveProp,
            Self::Text(_) => ObjectKind::Text,
            Self::Camera(_) => ObjectKind::Camera,
            Self::ShootingTarget(_) => ObjectKind::ShootingTarget,
            Self::SubScene(_) => ObjectKind::SubScene,
            Self::Teleport(_) => ObjectKind::Teleport,
        }
    }

    /// Borrows the shared placement block.
    #[must_use]
    pub const fn placement(&self) -> &Placement {
        for_each_kind!(self, inner => &inner.placement)
    }

    /// Mutably borrows the shared placement block.
    pub fn placement_mut(&mut self) -> &mut Placement {
        for_each_kind!(self, inner => &mut inner.placement)
    }

    /// Region index filter; see [`Placement::region_index`].
    #[must_use]
    pub const fn region_index(&self) -> i32 {
        self.placement().region_index
    }

    /// Whether the backend should resolve candidate regions by name.
    ///
    /// Descriptors without a region name live in world space.
    #[must_use]
    pub fn supports_region_resolution(&self) -> bool {
        !self.placement().region.is_empty()
    }

    /// Whether live instances of this descriptor carry an indicator.
    #[must_use]
    pub const fn has_indicator(&self) -> bool {
        self.kind().has_indicator()
    }

    /// Whether the next update must destroy and recreate live instances.
    #[must_use]
    pub const fn requires_full_respawn(&self) -> bool {
        self.placement().requires_full_respawn
    }

    /// Sets the region index, flagging a full respawn when it changes.
    pub fn set_region_index(&mut self, index: i32) {
        let placement = self.placement_mut();
        if placement.region_index != index {
            placement.flag_full_respawn();
            placement.region_index = index;
        }
    }

    /// Sets the region name, flagging a full respawn when it changes.
    pub fn set_region(&mut self, region: &str) {
        let placement = self.placement_mut();
        if placement.region != region {
            placement.flag_full_respawn();
            region.clone_into(&mut placement.region);
        }
    }

    /// Sets the door family, flagging a full respawn when it changes.
    ///
    /// Returns `false` when the descriptor is not a door.
    pub fn set_door_type(&mut self, door_type: DoorType) -> bool {
        let Self::Door(door) = self else {
            return false;
        };
        if door.door_type != door_type {
            door.placement.flag_full_respawn();
            door.door_type = door_type;
        }
        true
    }

    /// Points a sub-scene at another composition, flagging a full respawn.
    ///
    /// Returns `false` when the descriptor is not a sub-scene.
    pub fn set_schematic(&mut self, schematic: &str) -> bool {
        let Self::SubScene(sub) = self else {
            return false;
        };
        if sub.schematic != schematic {
            sub.placement.flag_full_respawn();
            schematic.clone_into(&mut sub.schematic);
        }
        true
    }

    /// Clears the respawn flag once a full respawn has been scheduled.
    ///
    /// `previous_region_index` keeps the index the live copies occupied
    /// before the edit. Raising the flag by writing the field directly
    /// takes no snapshot: the value from the last respawn stays, or the
    /// current index is recorded if there never was one.
    pub fn begin_full_respawn(&mut self) {
        let placement = self.placement_mut();
        if placement.previous_region_index.is_none() {
            placement.previous_region_index = Some(placement.region_index);
        }
        placement.requires_full_respawn = false;
    }
}

macro_rules! impl_from_kind {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Descriptor {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_kind! {
    PrimitiveDescriptor => Primitive,
    LightDescriptor => Light,
    DoorDescriptor => Door,
    WorkstationDescriptor => Workstation,
    ItemSpawnpointDescriptor => ItemSpawnpoint,
    PlayerSpawnpointDescriptor => PlayerSpawnpoint,
    InteractivePropDescriptor => InteractiveProp,
    TextDescriptor => Text,
    CameraDescriptor => Camera,
    ShootingTargetDescriptor => ShootingTarget,
    SubSceneDescriptor => SubScene,
    TeleportDescriptor => Teleport,
}
