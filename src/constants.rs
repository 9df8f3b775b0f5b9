//! Tunables shared across the registry, the update protocol and the plugin.

use std::time::Duration;

/// Region index meaning "every region that matches the descriptor".
pub const ANY_REGION: i32 = -1;

/// Delay between destroying live instances and recreating them during a
/// full respawn.
///
/// The backend must finish tearing instances down before new ones are built
/// from the same descriptor, so the rebuild always lands on a later tick.
pub const RESPAWN_DELAY: Duration = Duration::from_millis(100);

/// Directory searched for persisted compositions when none is configured.
pub const DEFAULT_MAPS_DIR: &str = "maps";
