#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Squarelife engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for the host application to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Length of a single square tile edge measured in world units.
pub const TILE_SIZE: f32 = 32.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Sets the player's horizontal movement intent for the coming tick.
    SetMoveIntent {
        /// Direction of travel, or `None` to coast and decelerate.
        direction: Option<Facing>,
    },
    /// Launches the player upward with the requested jump strength.
    Jump {
        /// Whether this is the primary jump or the weaker mid-air jump.
        strength: JumpStrength,
    },
    /// Truncates the player's ascent after an early jump-key release.
    CutJump,
    /// Requests that the player fire a bullet in its facing direction.
    FireBullet,
    /// Drives an enemy's horizontal motion and facing for the coming tick.
    SetEnemyMotion {
        /// Identifier of the enemy being driven.
        enemy: EnemyId,
        /// Signed horizontal velocity in world units per second.
        velocity_x: f32,
        /// Facing direction the enemy should adopt.
        facing: Facing,
    },
    /// Launches a grounded or airborne enemy into a jump.
    EnemyJump {
        /// Identifier of the enemy attempting the jump.
        enemy: EnemyId,
        /// Upward launch speed in world units per second.
        impulse: f32,
        /// Signed horizontal velocity added on top of the jump.
        forward_boost: f32,
    },
    /// Spawns an enemy projectile travelling in the enemy's facing direction.
    SpawnEnemyShot {
        /// Identifier of the enemy firing the shot.
        enemy: EnemyId,
        /// Projectile speed in world units per second.
        speed: f32,
    },
    /// Records a change of an enemy's alert state.
    SetEnemyAlert {
        /// Identifier of the enemy changing state.
        enemy: EnemyId,
        /// New alert state observed by the enemy's behavior.
        alerted: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// The player's death sequence completed; the run is over.
    PlayerDied,
    /// The player entered an unlocked exit portal.
    LevelCompleted {
        /// Identifier of the level the run should transition to.
        next_level: LevelId,
    },
    /// The active info-zone text changed since the previous tick.
    InfoChanged {
        /// New text, or `None` when the player left all info zones.
        text: Option<String>,
    },
    /// The player fired a bullet and spent one round of ammunition.
    AmmoConsumed {
        /// Rounds remaining after the shot.
        remaining: u32,
    },
    /// A player bullet left the muzzle.
    PlayerFired,
    /// The player collected the level key, unlocking the portal.
    KeyCollected,
    /// A player bullet struck an enemy that survived the hit.
    EnemyHit {
        /// Identifier of the enemy that was struck.
        enemy: EnemyId,
        /// Hit points remaining after the hit.
        remaining_hp: u32,
    },
    /// An enemy's alert state changed.
    EnemyAlerted {
        /// Identifier of the enemy whose state changed.
        enemy: EnemyId,
        /// New alert state.
        alerted: bool,
    },
    /// An enemy was destroyed by gunfire.
    EnemyDestroyed {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
    },
    /// A button is held down by the player or a box this tick.
    ButtonPressed {
        /// Identifier of the pressed button.
        button: ButtonId,
    },
    /// A once-behavior button latched into its permanent active state.
    ButtonLatched {
        /// Identifier of the latched button.
        button: ButtonId,
    },
    /// A door finished opening and stopped colliding.
    DoorFullyOpened {
        /// Identifier of the fully opened door.
        door: DoorId,
    },
}

/// Horizontal facing direction shared by the player and enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Facing toward decreasing x coordinates.
    Left,
    /// Facing toward increasing x coordinates.
    Right,
}

impl Facing {
    /// Signed unit factor for the direction: `-1.0` left, `1.0` right.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Returns the opposite facing.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Facing that points from the origin toward the given x offset.
    ///
    /// A zero offset resolves to [`Facing::Right`].
    #[must_use]
    pub fn toward(delta_x: f32) -> Self {
        if delta_x < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Strength class of a player jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JumpStrength {
    /// Full-strength jump launched from the ground or coyote window.
    Primary,
    /// Weaker mid-air jump, applied at 0.9x of the primary impulse.
    Double,
}

/// Behavioral class fixed at an enemy's spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Patrols and kills on contact; never detects the player.
    #[serde(rename = "triangle_basic")]
    Basic,
    /// Chases on sight, jumping over gaps and walls.
    #[serde(rename = "triangle_hunter")]
    Hunter,
    /// Aligns with the player and fires single aimed shots.
    #[serde(rename = "triangle_ranged")]
    Ranged,
    /// Strafes while firing three-round bursts.
    #[serde(rename = "triangle_rapid")]
    Rapid,
    /// Winds up and charges; grows more aggressive when hurt.
    #[serde(rename = "triangle_heavy")]
    Heavy,
}

impl Archetype {
    /// Default hit points for the archetype, before level overrides.
    #[must_use]
    pub const fn base_hp(self) -> u32 {
        match self {
            Self::Basic | Self::Hunter | Self::Ranged => 1,
            Self::Rapid => 3,
            Self::Heavy => 5,
        }
    }

    /// Default patrol speed in world units per second, before overrides.
    #[must_use]
    pub const fn base_speed(self) -> f32 {
        match self {
            Self::Basic => 100.0,
            Self::Hunter => 220.0,
            Self::Ranged => 180.0,
            Self::Rapid => 140.0,
            Self::Heavy => 80.0,
        }
    }

    /// Half extents of the collision box in world units.
    #[must_use]
    pub const fn half_extents(self) -> Vec2 {
        match self {
            Self::Heavy => Vec2::new(22.0, 22.0),
            _ => Vec2::new(14.0, 14.0),
        }
    }
}

/// Per-frame contact flags recomputed by collision resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContactFlags {
    /// Touching a solid above.
    pub up: bool,
    /// Resting on a solid below.
    pub down: bool,
    /// Blocked by a solid to the left.
    pub left: bool,
    /// Blocked by a solid to the right.
    pub right: bool,
}

impl ContactFlags {
    /// Reports whether any side is in contact with a solid.
    #[must_use]
    pub const fn any(self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Reports whether either lateral side is blocked.
    #[must_use]
    pub const fn blocked_sideways(self) -> bool {
        self.left || self.right
    }
}

/// Continuously sampled logical input intents for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    /// Move-left intent is active.
    pub left: bool,
    /// Move-right intent is active.
    pub right: bool,
    /// Jump intent is active.
    pub jump: bool,
    /// Fire intent is active.
    pub fire: bool,
}

impl InputState {
    /// Resolves the net horizontal direction, with left taking precedence
    /// when both intents are held, matching the original input handling.
    #[must_use]
    pub const fn direction(self) -> Option<Facing> {
        if self.left {
            Some(Facing::Left)
        } else if self.right {
            Some(Facing::Right)
        } else {
            None
        }
    }
}

/// Activation semantics linking a button to its door.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonBehavior {
    /// The door tracks the live pressed state; releasing reverses it.
    #[default]
    Hold,
    /// The first press latches the button permanently active.
    Once,
}

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

id_newtype!(
    /// Unique identifier assigned to an enemy at spawn.
    EnemyId
);
id_newtype!(
    /// Unique identifier assigned to a bullet at spawn.
    BulletId
);
id_newtype!(
    /// Unique identifier assigned to a pushable box.
    BoxId
);
id_newtype!(
    /// Unique identifier assigned to a button, interned from its string id.
    ButtonId
);
id_newtype!(
    /// Unique identifier assigned to a door, interned from its string id.
    DoorId
);

/// Identifier of a level within a campaign.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LevelId(u32);

impl LevelId {
    /// Creates a new level identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}
