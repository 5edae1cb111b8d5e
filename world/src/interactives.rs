//! Level furniture: buttons, doors, the key pickup and the exit portal.
//!
//! These types hold per-entity state and geometry only. The world decides
//! when a button counts as pressed and which events to broadcast; doors just
//! step their shutter height toward whatever target the world hands them.

use glam::Vec2;
use squarelife_core::{ButtonBehavior, ButtonId, DoorId, TILE_SIZE};
use squarelife_level::{ButtonDef, DoorDef};

use crate::physics::Rect;

const BUTTON_HALF: Vec2 = Vec2::new(12.0, 5.0);
const DOOR_HALF_WIDTH: f32 = 8.0;
const DOOR_STEP: f32 = 6.0;
const KEY_HALF: Vec2 = Vec2::new(16.0, 16.0);
const PORTAL_HALF: Vec2 = Vec2::new(20.0, 30.0);

/// Pressure plate driving a single door.
#[derive(Clone, Debug)]
pub(crate) struct Button {
    pub(crate) id: ButtonId,
    pub(crate) door: DoorId,
    pub(crate) behavior: ButtonBehavior,
    pub(crate) zone: Rect,
    /// Recomputed from overlaps every tick.
    pub(crate) pressed: bool,
    /// Permanent once a once-behavior button has been pressed.
    pub(crate) latched: bool,
}

impl Button {
    pub(crate) fn from_def(def: &ButtonDef, id: ButtonId, door: DoorId) -> Self {
        // The plate sits proud of the platform top, thin enough that only
        // bodies resting on the platform can depress it.
        let center = Vec2::new(
            def.x * TILE_SIZE,
            def.y * TILE_SIZE + TILE_SIZE - BUTTON_HALF.y,
        );
        Self {
            id,
            door,
            behavior: def.behavior,
            zone: Rect::new(center, BUTTON_HALF),
            pressed: false,
            latched: false,
        }
    }

    /// Whether the linked door should currently be driven open.
    pub(crate) fn active(&self) -> bool {
        self.latched || self.pressed
    }
}

/// Vertical shutter that retracts upward while its button is active.
#[derive(Clone, Debug)]
pub(crate) struct Door {
    pub(crate) id: DoorId,
    center_x: f32,
    /// Fixed world-space top edge; the shutter shrinks away from the bottom.
    top_y: f32,
    max_height: f32,
    pub(crate) height: f32,
}

impl Door {
    pub(crate) fn from_def(def: &DoorDef, id: DoorId) -> Self {
        let max_height = def.h * TILE_SIZE;
        Self {
            id,
            center_x: def.x * TILE_SIZE + TILE_SIZE / 2.0,
            top_y: (def.y + 1.0) * TILE_SIZE - max_height,
            max_height,
            height: max_height,
        }
    }

    /// Steps the shutter toward open or closed and reports whether it
    /// finished opening on this exact step.
    pub(crate) fn step(&mut self, open: bool) -> bool {
        if open {
            if self.height <= 0.0 {
                return false;
            }
            self.height = (self.height - DOOR_STEP).max(0.0);
            self.height <= 0.0
        } else {
            self.height = (self.height + DOOR_STEP).min(self.max_height);
            false
        }
    }

    /// Collidable shutter rectangle, absent once fully open.
    pub(crate) fn solid(&self) -> Option<Rect> {
        if self.height <= 0.0 {
            return None;
        }
        Some(Rect::from_min_size(
            Vec2::new(self.center_x - DOOR_HALF_WIDTH, self.top_y),
            Vec2::new(DOOR_HALF_WIDTH * 2.0, self.height),
        ))
    }

    pub(crate) fn fraction_open(&self) -> f32 {
        1.0 - self.height / self.max_height
    }
}

/// Collectible that unlocks the exit portal.
#[derive(Clone, Copy, Debug)]
pub(crate) struct KeyPickup {
    pub(crate) zone: Rect,
    pub(crate) collected: bool,
}

impl KeyPickup {
    pub(crate) fn at(position: Vec2) -> Self {
        Self {
            zone: Rect::new(position, KEY_HALF),
            collected: false,
        }
    }
}

/// Exit zone at the end of the level.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Portal {
    pub(crate) zone: Rect,
    pub(crate) locked: bool,
}

impl Portal {
    pub(crate) fn at(position: Vec2, locked: bool) -> Self {
        Self {
            zone: Rect::new(position, PORTAL_HALF),
            locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door() -> Door {
        Door::from_def(
            &DoorDef {
                x: 45.0,
                y: 18.0,
                h: 3.0,
                id: "door1".into(),
            },
            DoorId::new(0),
        )
    }

    #[test]
    fn door_opens_in_fixed_steps_and_reports_completion_once() {
        let mut door = door();
        assert_eq!(door.height, 96.0);

        let mut completions = 0;
        for _ in 0..20 {
            if door.step(true) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(door.height, 0.0);
        assert!(door.solid().is_none());
        assert_eq!(door.fraction_open(), 1.0);
    }

    #[test]
    fn door_closes_back_down_and_becomes_solid_again() {
        let mut door = door();
        for _ in 0..20 {
            let _ = door.step(true);
        }
        let _ = door.step(false);
        assert_eq!(door.height, 6.0);

        let solid = door.solid().expect("partially closed door collides");
        assert_eq!(solid.min().y, (18.0 + 1.0) * TILE_SIZE - 96.0);
        assert_eq!(solid.max().y, solid.min().y + 6.0);
        assert_eq!(solid.max().x - solid.min().x, 16.0);
    }

    #[test]
    fn door_top_edge_never_moves() {
        let mut door = door();
        let top = door.solid().expect("closed door collides").min().y;
        for _ in 0..5 {
            let _ = door.step(true);
            if let Some(solid) = door.solid() {
                assert_eq!(solid.min().y, top);
            }
        }
    }

    #[test]
    fn once_button_stays_active_after_release() {
        let def = ButtonDef {
            x: 60.0,
            y: 14.0,
            id: "btn_final".into(),
            link_to_door_id: "door_final".into(),
            behavior: ButtonBehavior::Once,
        };
        let mut button = Button::from_def(&def, ButtonId::new(0), DoorId::new(0));
        assert!(!button.active());

        button.pressed = true;
        button.latched = true;
        button.pressed = false;
        assert!(button.active());
    }
}
