#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level data schema for Squarelife.
//!
//! Levels are designer-authored JSON documents describing the static geometry
//! and entity placements of a single run. The schema is trusted input: parse
//! failures and broken id references are reported through [`LevelError`],
//! while missing optional fields fall back to deterministic defaults so the
//! world never has to guess. All coordinates are tile units; the world
//! converts them using [`squarelife_core::TILE_SIZE`].

mod campaign;

pub use campaign::Campaign;

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize};
use squarelife_core::{Archetype, ButtonBehavior, LevelId, TILE_SIZE};
use thiserror::Error;

/// Identifier of the only weapon the campaign currently hands out.
pub const LIGHT_GUN: &str = "light_gun";

const DEFAULT_SPAWN: TilePos = TilePos { x: 5.0, y: 10.0 };
const PORTAL_FALLBACK_RAISE: f32 = 50.0;

/// Errors raised while loading or validating level data.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The document was not valid JSON for the level schema.
    #[error("could not parse level data: {0}")]
    Parse(#[from] serde_json::Error),
    /// Two doors within one level share the same string id.
    #[error("duplicate door id '{0}'")]
    DuplicateDoorId(String),
    /// Two buttons within one level share the same string id.
    #[error("duplicate button id '{0}'")]
    DuplicateButtonId(String),
    /// A button references a door id that does not exist in the level.
    #[error("button '{button}' links to unknown door '{door}'")]
    DanglingDoorLink {
        /// String id of the offending button.
        button: String,
        /// Door id the button references.
        door: String,
    },
}

/// Player movement and combat tuning shared by every level of a campaign.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTuning {
    /// Constant downward acceleration in world units per second squared.
    pub gravity: f32,
    /// Horizontal run speed in world units per second.
    pub speed: f32,
    /// Upward launch speed of a primary jump in world units per second.
    pub jump_force: f32,
    /// Ammunition granted at the start of a fresh run.
    pub default_ammo: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            gravity: 1400.0,
            speed: 300.0,
            jump_force: 580.0,
            default_ammo: 25,
        }
    }
}

/// Complete description of one level's geometry and entity placements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Identifier of the level within its campaign.
    pub id: LevelId,
    /// Designer-facing display name.
    pub name: String,
    /// Static map geometry.
    pub map: MapDef,
    /// Enemy placements, empty when absent.
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    /// Items granted at level start, empty when absent.
    #[serde(default)]
    pub items: Vec<ItemDef>,
    /// Pushable box placements, empty when absent.
    #[serde(default)]
    pub boxes: Vec<TilePos>,
    /// Button placements, empty when absent.
    #[serde(default)]
    pub buttons: Vec<ButtonDef>,
    /// Door placements, empty when absent.
    #[serde(default)]
    pub doors: Vec<DoorDef>,
    /// Whether the exit portal starts locked behind the level key.
    #[serde(default)]
    pub has_key: bool,
    /// Position of the key pickup, required when `has_key` is set.
    #[serde(default)]
    pub key_pos: Option<TilePos>,
    /// Explicit portal position; auto-computed from geometry when absent.
    #[serde(default)]
    pub portal_pos: Option<TilePos>,
    /// Player spawn checkpoints; the first one is used.
    #[serde(default)]
    pub checkpoints: Vec<TilePos>,
    /// Horizontal zones that display tutorial text.
    #[serde(default)]
    pub info_points: Vec<InfoPoint>,
    /// Level transition taken on completing the level.
    pub exit: ExitDef,
    /// Optional campaign ending shown after this level.
    #[serde(default)]
    pub ending: Option<EndingDef>,
}

impl Level {
    /// Parses a level from its JSON representation and validates references.
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(text)?;
        level.validate()?;
        Ok(level)
    }

    /// Serializes the level back to its JSON representation.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("level serialization never fails")
    }

    /// Checks id uniqueness and button-to-door references.
    pub fn validate(&self) -> Result<(), LevelError> {
        for (index, door) in self.doors.iter().enumerate() {
            if self.doors[..index].iter().any(|other| other.id == door.id) {
                return Err(LevelError::DuplicateDoorId(door.id.clone()));
            }
        }
        for (index, button) in self.buttons.iter().enumerate() {
            if self.buttons[..index]
                .iter()
                .any(|other| other.id == button.id)
            {
                return Err(LevelError::DuplicateButtonId(button.id.clone()));
            }
        }
        for button in &self.buttons {
            if !self.doors.iter().any(|door| door.id == button.link_to_door_id) {
                return Err(LevelError::DanglingDoorLink {
                    button: button.id.clone(),
                    door: button.link_to_door_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Whether starting this level grants the player the light gun.
    #[must_use]
    pub fn grants_weapon(&self) -> bool {
        self.items.iter().any(|item| item.weapon == LIGHT_GUN)
    }

    /// Player spawn point in tile units: the first checkpoint, or the
    /// default spawn when the level defines none.
    #[must_use]
    pub fn spawn_point(&self) -> TilePos {
        self.checkpoints.first().copied().unwrap_or(DEFAULT_SPAWN)
    }

    /// Portal center in world units.
    ///
    /// When `portal_pos` is absent the position is derived from the map
    /// geometry: two tiles short of the right edge, floating slightly above
    /// the last authored platform.
    #[must_use]
    pub fn portal_world_position(&self) -> Vec2 {
        if let Some(pos) = self.portal_pos {
            return Vec2::new(pos.x * TILE_SIZE, pos.y * TILE_SIZE);
        }

        let x = (self.map.size.w as f32 - 2.0) * TILE_SIZE;
        let platform_y = self
            .map
            .platforms
            .last()
            .map_or(300.0, |platform| platform.y * TILE_SIZE);
        Vec2::new(x, platform_y - PORTAL_FALLBACK_RAISE)
    }

    /// World-space top of the platform spanning the given tile column, used
    /// to seat enemies on the ground they patrol.
    #[must_use]
    pub fn platform_top_world(&self, tile_x: f32) -> Option<f32> {
        self.map
            .platforms
            .iter()
            .find(|platform| tile_x >= platform.x && tile_x <= platform.x + platform.w)
            .map(|platform| platform.y * TILE_SIZE)
    }
}

/// Static map geometry of one level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapDef {
    /// Map dimensions in whole tiles.
    pub size: MapSize,
    /// Static collidable platforms.
    pub platforms: Vec<PlatformDef>,
}

/// Map dimensions in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    /// Width in tiles.
    pub w: u32,
    /// Height in tiles.
    pub h: u32,
}

/// Axis-aligned static platform in tile units, collidable from all sides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformDef {
    /// Left edge in tiles.
    pub x: f32,
    /// Top edge in tiles.
    pub y: f32,
    /// Width in tiles.
    pub w: f32,
    /// Height in tiles, one tile when omitted.
    #[serde(default = "default_platform_height")]
    pub h: f32,
}

fn default_platform_height() -> f32 {
    1.0
}

/// Position expressed in tile units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TilePos {
    /// Horizontal tile coordinate.
    pub x: f32,
    /// Vertical tile coordinate.
    pub y: f32,
}

/// Enemy placement within a level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Behavioral archetype; unknown or missing types fall back to basic.
    #[serde(
        rename = "type",
        default = "default_archetype",
        deserialize_with = "archetype_or_basic"
    )]
    pub kind: Archetype,
    /// Horizontal placement in tiles.
    pub x: f32,
    /// Optional hit-point override.
    #[serde(default)]
    pub hp: Option<u32>,
    /// Optional patrol-speed override in world units per second.
    #[serde(default)]
    pub speed: Option<f32>,
}

fn default_archetype() -> Archetype {
    Archetype::Basic
}

fn archetype_or_basic<'de, D>(deserializer: D) -> Result<Archetype, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("triangle_hunter") => Archetype::Hunter,
        Some("triangle_ranged") => Archetype::Ranged,
        Some("triangle_rapid") => Archetype::Rapid,
        Some("triangle_heavy") => Archetype::Heavy,
        _ => Archetype::Basic,
    })
}

/// Item handed to the player at level start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Weapon identifier, currently only [`LIGHT_GUN`].
    pub weapon: String,
}

/// Button placement and door linkage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonDef {
    /// Horizontal placement in tiles.
    pub x: f32,
    /// Vertical placement in tiles.
    pub y: f32,
    /// String id unique within the level.
    pub id: String,
    /// Id of the single door this button drives.
    pub link_to_door_id: String,
    /// Activation semantics, hold when omitted.
    #[serde(default)]
    pub behavior: ButtonBehavior,
}

/// Door placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoorDef {
    /// Horizontal placement in tiles.
    pub x: f32,
    /// Vertical placement of the door's bottom row in tiles.
    pub y: f32,
    /// Door height in tiles, three when omitted.
    #[serde(default = "default_door_height")]
    pub h: f32,
    /// String id unique within the level.
    pub id: String,
}

fn default_door_height() -> f32 {
    3.0
}

/// Horizontal trigger zone that displays tutorial text while entered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfoPoint {
    /// Left edge in tiles.
    pub x: f32,
    /// Width in tiles.
    pub w: f32,
    /// Text shown while the player is inside the zone.
    pub text: String,
}

/// Level transition taken on completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitDef {
    /// Identifier of the next level.
    pub to: LevelId,
}

/// Campaign ending shown after the final level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndingDef {
    /// Closing message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_level(extra: &str) -> String {
        format!(
            r#"{{
                "id": 7,
                "name": "Test",
                "map": {{ "size": {{ "w": 40, "h": 20 }},
                          "platforms": [{{ "x": 0, "y": 14, "w": 30 }}] }},
                "exit": {{ "to": 1 }}{extra}
            }}"#
        )
    }

    #[test]
    fn minimal_level_parses_with_defaults() {
        let level = Level::from_json(&minimal_level("")).expect("level parses");
        assert_eq!(level.id, LevelId::new(7));
        assert!(level.enemies.is_empty());
        assert!(!level.has_key);
        assert!(!level.grants_weapon());
        assert_eq!(level.map.platforms[0].h, 1.0);
        assert_eq!(level.spawn_point().x, 5.0);
        assert_eq!(level.spawn_point().y, 10.0);
    }

    #[test]
    fn unknown_enemy_type_falls_back_to_basic() {
        let extra = r#", "enemies": [
            { "type": "triangle_spinner", "x": 10 },
            { "x": 12 },
            { "type": "triangle_heavy", "x": 14, "hp": 9 }
        ]"#;
        let level = Level::from_json(&minimal_level(extra)).expect("level parses");
        assert_eq!(level.enemies[0].kind, Archetype::Basic);
        assert_eq!(level.enemies[1].kind, Archetype::Basic);
        assert_eq!(level.enemies[2].kind, Archetype::Heavy);
        assert_eq!(level.enemies[2].hp, Some(9));
    }

    #[test]
    fn dangling_button_link_is_rejected() {
        let extra = r#", "buttons": [
            { "x": 5, "y": 13, "id": "b1", "linkToDoorId": "missing" }
        ]"#;
        let error = Level::from_json(&minimal_level(extra)).unwrap_err();
        assert!(matches!(error, LevelError::DanglingDoorLink { .. }));
    }

    #[test]
    fn duplicate_door_ids_are_rejected() {
        let extra = r#", "doors": [
            { "x": 10, "y": 13, "id": "d" },
            { "x": 12, "y": 13, "id": "d" }
        ]"#;
        let error = Level::from_json(&minimal_level(extra)).unwrap_err();
        assert!(matches!(error, LevelError::DuplicateDoorId(id) if id == "d"));
    }

    #[test]
    fn button_behavior_defaults_to_hold() {
        let extra = r#", "doors": [{ "x": 10, "y": 13, "id": "d" }],
            "buttons": [
                { "x": 5, "y": 13, "id": "b1", "linkToDoorId": "d" },
                { "x": 6, "y": 13, "id": "b2", "linkToDoorId": "d", "behavior": "once" }
            ]"#;
        let level = Level::from_json(&minimal_level(extra)).expect("level parses");
        assert_eq!(level.buttons[0].behavior, ButtonBehavior::Hold);
        assert_eq!(level.buttons[1].behavior, ButtonBehavior::Once);
    }

    #[test]
    fn portal_fallback_floats_above_last_platform() {
        let level = Level::from_json(&minimal_level("")).expect("level parses");
        let portal = level.portal_world_position();
        assert_eq!(portal.x, (40.0 - 2.0) * TILE_SIZE);
        assert_eq!(portal.y, 14.0 * TILE_SIZE - 50.0);
    }

    #[test]
    fn level_round_trips_through_json() {
        let extra = r#", "hasKey": true, "keyPos": { "x": 20, "y": 6 },
            "infoPoints": [{ "x": 1, "w": 10, "text": "hello" }]"#;
        let level = Level::from_json(&minimal_level(extra)).expect("level parses");
        let restored = Level::from_json(&level.to_json()).expect("round trip");
        assert_eq!(level, restored);
    }
}
