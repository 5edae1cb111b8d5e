#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns sampled input into player commands.
//!
//! The world only understands explicit motions: move intents, jump impulses,
//! jump cuts and fire requests. This system owns the feel-oriented timing
//! around them: the coyote window after stepping off a ledge, the jump
//! buffer that banks an early press until landing, the two-jump air limit
//! and the fire cooldown.

use std::time::Duration;

use squarelife_core::{Command, InputState, JumpStrength};
use squarelife_world::query::PlayerSnapshot;

/// Ticks after leaving the ground during which a primary jump still works.
const COYOTE_TICKS: u32 = 6;
/// Ticks a jump press stays banked while waiting for the ground.
const JUMP_BUFFER_TICKS: u32 = 8;
/// Total jumps allowed before touching the ground again.
const MAX_JUMPS: u32 = 2;
const FIRE_COOLDOWN: Duration = Duration::from_millis(250);

/// Pure system that reacts to input and player state, emitting commands.
#[derive(Debug)]
pub struct PlayerControl {
    ticks_since_grounded: u32,
    ticks_since_jump_press: u32,
    jumps_used: u32,
    jump_was_held: bool,
    fire_ready_at: Duration,
}

impl PlayerControl {
    /// Consumes one tick of input and the pre-tick player snapshot to emit
    /// movement and combat commands.
    pub fn handle(
        &mut self,
        input: &InputState,
        player: &PlayerSnapshot,
        clock: Duration,
        out: &mut Vec<Command>,
    ) {
        if !player.alive {
            return;
        }

        out.push(Command::SetMoveIntent {
            direction: input.direction(),
        });

        if player.contact.down {
            self.ticks_since_grounded = 0;
            self.jumps_used = 0;
        } else {
            self.ticks_since_grounded = self.ticks_since_grounded.saturating_add(1);
        }

        let fresh_press = input.jump && !self.jump_was_held;
        if fresh_press {
            self.ticks_since_jump_press = 0;
        } else {
            self.ticks_since_jump_press = self.ticks_since_jump_press.saturating_add(1);
        }

        let buffered = self.ticks_since_jump_press < JUMP_BUFFER_TICKS;
        let can_primary = player.contact.down || self.ticks_since_grounded < COYOTE_TICKS;
        if buffered && can_primary && self.jumps_used == 0 {
            out.push(Command::Jump {
                strength: JumpStrength::Primary,
            });
            self.jumps_used = 1;
            self.ticks_since_jump_press = JUMP_BUFFER_TICKS;
        } else if fresh_press && self.jumps_used < MAX_JUMPS {
            // Air jump: each fresh press in the air spends one of the two
            // jumps, so a ledge walk-off still allows two before landing.
            out.push(Command::Jump {
                strength: JumpStrength::Double,
            });
            self.jumps_used += 1;
            self.ticks_since_jump_press = JUMP_BUFFER_TICKS;
        }

        if !input.jump && player.velocity.y < 0.0 {
            out.push(Command::CutJump);
        }
        self.jump_was_held = input.jump;

        if input.fire && player.has_weapon && player.ammo > 0 && clock >= self.fire_ready_at {
            out.push(Command::FireBullet);
            self.fire_ready_at = clock + FIRE_COOLDOWN;
        }
    }
}

impl Default for PlayerControl {
    fn default() -> Self {
        Self {
            // Not recently grounded until the first contact report says so.
            ticks_since_grounded: COYOTE_TICKS,
            ticks_since_jump_press: JUMP_BUFFER_TICKS,
            jumps_used: 0,
            jump_was_held: false,
            fire_ready_at: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use squarelife_core::{ContactFlags, Facing};

    fn snapshot(grounded: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            position: Vec2::new(160.0, 433.0),
            velocity: Vec2::ZERO,
            half: Vec2::new(15.0, 15.0),
            contact: ContactFlags {
                down: grounded,
                ..ContactFlags::default()
            },
            facing: Facing::Right,
            alive: true,
            has_weapon: true,
            ammo: 10,
            has_key: false,
        }
    }

    fn jumps_in(commands: &[Command]) -> Vec<JumpStrength> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::Jump { strength } => Some(*strength),
                _ => None,
            })
            .collect()
    }

    const JUMP: InputState = InputState {
        left: false,
        right: false,
        jump: true,
        fire: false,
    };
    const IDLE: InputState = InputState {
        left: false,
        right: false,
        jump: false,
        fire: false,
    };

    #[test]
    fn grounded_press_produces_a_primary_jump() {
        let mut control = PlayerControl::default();
        let mut out = Vec::new();
        control.handle(&JUMP, &snapshot(true), Duration::ZERO, &mut out);
        assert_eq!(jumps_in(&out), vec![JumpStrength::Primary]);
    }

    #[test]
    fn press_with_spent_jumps_is_buffered_until_landing() {
        let mut control = PlayerControl::default();
        let mut out = Vec::new();

        // Exhaust both air jumps, then press again while still falling.
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        assert_eq!(
            jumps_in(&out),
            vec![JumpStrength::Double, JumpStrength::Double]
        );

        // Touching down within the buffer window pays the press out.
        for _ in 0..4 {
            control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        }
        control.handle(&JUMP, &snapshot(true), Duration::ZERO, &mut out);
        assert_eq!(
            jumps_in(&out),
            vec![
                JumpStrength::Double,
                JumpStrength::Double,
                JumpStrength::Primary
            ]
        );
    }

    #[test]
    fn stale_press_is_forgotten() {
        let mut control = PlayerControl::default();
        let mut out = Vec::new();

        // Spend both air jumps, press again, then fall past the buffer
        // window before landing.
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        for _ in 0..JUMP_BUFFER_TICKS {
            control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        }
        control.handle(&JUMP, &snapshot(true), Duration::ZERO, &mut out);
        assert_eq!(
            jumps_in(&out),
            vec![JumpStrength::Double, JumpStrength::Double]
        );
    }

    #[test]
    fn ledge_walk_off_still_allows_two_air_jumps() {
        let mut control = PlayerControl::default();
        let mut out = Vec::new();

        // Walk off without jumping and let the coyote window lapse.
        control.handle(&IDLE, &snapshot(true), Duration::ZERO, &mut out);
        for _ in 0..COYOTE_TICKS {
            control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        }

        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        assert_eq!(
            jumps_in(&out),
            vec![JumpStrength::Double, JumpStrength::Double]
        );
    }

    #[test]
    fn coyote_window_allows_a_late_primary_jump() {
        let mut control = PlayerControl::default();
        let mut out = Vec::new();

        control.handle(&IDLE, &snapshot(true), Duration::ZERO, &mut out);
        for _ in 0..3 {
            control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        }
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        assert_eq!(jumps_in(&out), vec![JumpStrength::Primary]);
    }

    #[test]
    fn expired_coyote_press_spends_the_air_jump() {
        let mut control = PlayerControl::default();
        let mut out = Vec::new();

        control.handle(&IDLE, &snapshot(true), Duration::ZERO, &mut out);
        for _ in 0..COYOTE_TICKS {
            control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        }
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        assert_eq!(jumps_in(&out), vec![JumpStrength::Double]);
    }

    #[test]
    fn two_jumps_per_airtime_and_no_more() {
        let mut control = PlayerControl::default();
        let mut out = Vec::new();

        control.handle(&JUMP, &snapshot(true), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(false), Duration::ZERO, &mut out);
        assert_eq!(
            jumps_in(&out),
            vec![JumpStrength::Primary, JumpStrength::Double]
        );

        // Let the last press go stale, then touch down: both jumps re-arm.
        for _ in 0..JUMP_BUFFER_TICKS {
            control.handle(&IDLE, &snapshot(false), Duration::ZERO, &mut out);
        }
        control.handle(&IDLE, &snapshot(true), Duration::ZERO, &mut out);
        control.handle(&JUMP, &snapshot(true), Duration::ZERO, &mut out);
        assert_eq!(
            jumps_in(&out),
            vec![
                JumpStrength::Primary,
                JumpStrength::Double,
                JumpStrength::Primary
            ]
        );
    }

    #[test]
    fn releasing_the_jump_key_cuts_a_rising_jump() {
        let mut control = PlayerControl::default();
        let mut rising = snapshot(false);
        rising.velocity.y = -400.0;

        let mut out = Vec::new();
        control.handle(&IDLE, &rising, Duration::ZERO, &mut out);
        assert!(out.contains(&Command::CutJump));

        out.clear();
        control.handle(&JUMP, &rising, Duration::ZERO, &mut out);
        assert!(!out.contains(&Command::CutJump));
    }

    #[test]
    fn fire_respects_the_cooldown() {
        let mut control = PlayerControl::default();
        let firing = InputState {
            fire: true,
            ..IDLE
        };
        let mut out = Vec::new();

        control.handle(&firing, &snapshot(true), Duration::ZERO, &mut out);
        assert_eq!(
            out.iter()
                .filter(|command| matches!(command, Command::FireBullet))
                .count(),
            1
        );

        out.clear();
        control.handle(&firing, &snapshot(true), Duration::from_millis(100), &mut out);
        assert!(!out.contains(&Command::FireBullet));

        control.handle(&firing, &snapshot(true), Duration::from_millis(250), &mut out);
        assert!(out.contains(&Command::FireBullet));
    }

    #[test]
    fn unarmed_player_never_fires() {
        let mut control = PlayerControl::default();
        let mut unarmed = snapshot(true);
        unarmed.has_weapon = false;

        let firing = InputState {
            fire: true,
            ..IDLE
        };
        let mut out = Vec::new();
        control.handle(&firing, &unarmed, Duration::ZERO, &mut out);
        assert!(!out.contains(&Command::FireBullet));
    }
}
