#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that drives every enemy archetype.
//!
//! The system reads pre-tick snapshots, keeps its own per-enemy timers and
//! phase machines, and responds exclusively with command batches: motion
//! drives, jump impulses, shot spawns and alert transitions. Randomness is
//! confined to a seeded linear congruential generator so identical inputs
//! always produce identical command streams.

use std::time::Duration;

use glam::Vec2;
use squarelife_core::{Archetype, Command, EnemyId, Facing};
use squarelife_world::query::{EnemySnapshot, GeometryView, PlayerSnapshot};

/// Beyond this distance from the player an enemy stands still.
const IDLE_DISTANCE: f32 = 1000.0;

const LOOK_AHEAD_MARGIN: f32 = 10.0;
const LOOK_AHEAD_PER_SPEED: f32 = 0.2;
const PROBE_DROP: f32 = 20.0;
const PROBE_DROP_HEAVY: f32 = 32.0;

const HUNTER_RANGE: f32 = 320.0;
const HUNTER_VERTICAL: f32 = 50.0;
const HUNTER_JUMP_IMPULSE: f32 = 520.0;
const HUNTER_JUMP_BOOST: f32 = 120.0;
const HUNTER_AIR_JUMP_IMPULSE: f32 = 480.0;
const HUNTER_AIR_JUMP_BOOST: f32 = 80.0;
const HUNTER_FALLING_SPEED: f32 = 50.0;
const HUNTER_MAX_AIR_JUMPS: u32 = 2;

const RANGED_RANGE: f32 = 600.0;
const RANGED_VERTICAL: f32 = 60.0;
const RANGED_ALIGN: f32 = 20.0;
const RANGED_KITE_DISTANCE: f32 = 50.0;
const RANGED_SHOT_SPEED: f32 = 500.0;
const RANGED_COOLDOWN: Duration = Duration::from_millis(1500);

const RAPID_RANGE: f32 = 400.0;
const RAPID_VERTICAL: f32 = 60.0;
const RAPID_ALIGN: f32 = 40.0;
const RAPID_SHOT_SPEED: f32 = 550.0;
const RAPID_BURST_LENGTH: u32 = 3;
const RAPID_BURST_GAP: Duration = Duration::from_millis(150);
const RAPID_COOLDOWN: Duration = Duration::from_millis(2500);
const RAPID_STRAFE_FLIP: Duration = Duration::from_millis(400);

const HEAVY_RANGE: f32 = 300.0;
const HEAVY_VERTICAL: f32 = 80.0;
const HEAVY_WINDUP: Duration = Duration::from_millis(300);
const HEAVY_CHARGE_FACTOR: f32 = 2.5;
const HEAVY_CHARGE_JUMP_IMPULSE: f32 = 500.0;
const HEAVY_CHARGE_OVERSHOOT: f32 = 40.0;
const HEAVY_CHARGE_COOLDOWN: Duration = Duration::from_millis(1800);

const DEFAULT_RNG_SEED: u64 = 0x5157_4c5f_4149_0001;

/// Pure system that reacts to world snapshots and emits enemy commands.
#[derive(Debug)]
pub struct EnemyAi {
    states: Vec<EnemyState>,
    rng: Lcg,
}

impl EnemyAi {
    /// Creates the system with an explicit random seed, making whole-run
    /// replays reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            states: Vec::new(),
            rng: Lcg::new(seed),
        }
    }

    /// Consumes pre-tick snapshots and emits one command batch driving every
    /// enemy for the coming tick.
    pub fn handle(
        &mut self,
        player: &PlayerSnapshot,
        enemies: &[EnemySnapshot],
        geometry: GeometryView<'_>,
        clock: Duration,
        out: &mut Vec<Command>,
    ) {
        self.states
            .retain(|state| enemies.iter().any(|enemy| enemy.id == state.id));

        if !player.alive {
            for enemy in enemies {
                out.push(Command::SetEnemyMotion {
                    enemy: enemy.id,
                    velocity_x: 0.0,
                    facing: enemy.facing,
                });
            }
            return;
        }

        for enemy in enemies {
            if self.states.iter().all(|state| state.id != enemy.id) {
                self.states.push(EnemyState::new(enemy));
            }
            let index = self
                .states
                .iter()
                .position(|state| state.id == enemy.id)
                .unwrap_or(0);

            let delta = player.position - enemy.position;
            if delta.length() > IDLE_DISTANCE {
                out.push(Command::SetEnemyMotion {
                    enemy: enemy.id,
                    velocity_x: 0.0,
                    facing: enemy.facing,
                });
                continue;
            }

            let state = &mut self.states[index];
            if enemy.alerted {
                state.alerted = true;
            }
            if !state.alerted && detects(enemy, delta) {
                state.alerted = true;
                out.push(Command::SetEnemyAlert {
                    enemy: enemy.id,
                    alerted: true,
                });
            }

            match &mut state.behavior {
                Behavior::Patrol => {
                    let (velocity_x, facing) = patrol_drive(enemy, geometry);
                    out.push(Command::SetEnemyMotion {
                        enemy: enemy.id,
                        velocity_x,
                        facing,
                    });
                }
                Behavior::Hunter { airborne_jumps } => {
                    if state.alerted {
                        hunt(enemy, delta, geometry, airborne_jumps, out);
                    } else {
                        let (velocity_x, facing) = patrol_drive(enemy, geometry);
                        out.push(Command::SetEnemyMotion {
                            enemy: enemy.id,
                            velocity_x,
                            facing,
                        });
                    }
                }
                Behavior::Ranged { next_shot_at } => {
                    if state.alerted {
                        snipe(enemy, delta, clock, next_shot_at, out);
                    } else {
                        let (velocity_x, facing) = patrol_drive(enemy, geometry);
                        out.push(Command::SetEnemyMotion {
                            enemy: enemy.id,
                            velocity_x,
                            facing,
                        });
                    }
                }
                Behavior::Rapid(rapid) => {
                    if state.alerted {
                        suppress(enemy, delta, clock, rapid, &mut self.rng, out);
                    } else {
                        let (velocity_x, facing) = patrol_drive(enemy, geometry);
                        out.push(Command::SetEnemyMotion {
                            enemy: enemy.id,
                            velocity_x,
                            facing,
                        });
                    }
                }
                Behavior::Heavy { phase } => {
                    if state.alerted {
                        ram(enemy, player, delta, clock, phase, out);
                    } else {
                        let (velocity_x, facing) = patrol_drive(enemy, geometry);
                        out.push(Command::SetEnemyMotion {
                            enemy: enemy.id,
                            velocity_x,
                            facing,
                        });
                    }
                }
            }
        }
    }
}

impl Default for EnemyAi {
    fn default() -> Self {
        Self::with_seed(DEFAULT_RNG_SEED)
    }
}

/// Whether the enemy notices the player this tick.
fn detects(enemy: &EnemySnapshot, delta: Vec2) -> bool {
    let distance = delta.length();
    let vertical = delta.y.abs();
    match enemy.archetype {
        Archetype::Basic => false,
        Archetype::Hunter => {
            distance < HUNTER_RANGE
                && vertical < HUNTER_VERTICAL
                && enemy.facing == Facing::toward(delta.x)
        }
        Archetype::Ranged => distance < RANGED_RANGE && vertical < RANGED_VERTICAL,
        Archetype::Rapid => distance < RAPID_RANGE && vertical < RAPID_VERTICAL,
        Archetype::Heavy => {
            distance < HEAVY_RANGE
                && vertical < HEAVY_VERTICAL
                && enemy.facing == Facing::toward(delta.x)
        }
    }
}

/// Walks forward, turning around at walls and platform edges.
fn patrol_drive(enemy: &EnemySnapshot, geometry: GeometryView<'_>) -> (f32, Facing) {
    let mut facing = enemy.facing;
    if enemy.contact.blocked_sideways() {
        facing = facing.flipped();
    } else if enemy.contact.down && !floor_ahead(enemy, facing, geometry) {
        facing = facing.flipped();
    }
    (facing.sign() * enemy.speed, facing)
}

fn floor_ahead(enemy: &EnemySnapshot, facing: Facing, geometry: GeometryView<'_>) -> bool {
    let look_ahead = enemy.half.x + LOOK_AHEAD_MARGIN + enemy.speed * LOOK_AHEAD_PER_SPEED;
    let drop = if enemy.archetype == Archetype::Heavy {
        PROBE_DROP_HEAVY
    } else {
        PROBE_DROP
    };
    let probe = Vec2::new(
        enemy.position.x + facing.sign() * look_ahead,
        enemy.position.y + enemy.half.y + drop,
    );
    geometry.has_floor_at(probe)
}

/// Chases the player head-on, vaulting walls and gaps.
fn hunt(
    enemy: &EnemySnapshot,
    delta: Vec2,
    geometry: GeometryView<'_>,
    airborne_jumps: &mut u32,
    out: &mut Vec<Command>,
) {
    let facing = Facing::toward(delta.x);
    out.push(Command::SetEnemyMotion {
        enemy: enemy.id,
        velocity_x: facing.sign() * enemy.speed,
        facing,
    });

    if enemy.contact.down {
        *airborne_jumps = 0;
        let gap_ahead = !floor_ahead(enemy, facing, geometry);
        if enemy.contact.blocked_sideways() || gap_ahead {
            out.push(Command::EnemyJump {
                enemy: enemy.id,
                impulse: HUNTER_JUMP_IMPULSE,
                forward_boost: facing.sign() * HUNTER_JUMP_BOOST,
            });
        }
    } else if enemy.velocity.y > HUNTER_FALLING_SPEED && *airborne_jumps < HUNTER_MAX_AIR_JUMPS {
        *airborne_jumps += 1;
        out.push(Command::EnemyJump {
            enemy: enemy.id,
            impulse: HUNTER_AIR_JUMP_IMPULSE,
            forward_boost: facing.sign() * HUNTER_AIR_JUMP_BOOST,
        });
    }
}

/// Holds position, backs off when crowded, and fires aimed single shots.
fn snipe(
    enemy: &EnemySnapshot,
    delta: Vec2,
    clock: Duration,
    next_shot_at: &mut Duration,
    out: &mut Vec<Command>,
) {
    let facing = Facing::toward(delta.x);
    let velocity_x = if delta.x.abs() < RANGED_KITE_DISTANCE {
        facing.flipped().sign() * enemy.speed
    } else {
        0.0
    };
    out.push(Command::SetEnemyMotion {
        enemy: enemy.id,
        velocity_x,
        facing,
    });

    if delta.y.abs() < RANGED_ALIGN && clock >= *next_shot_at {
        *next_shot_at = clock + RANGED_COOLDOWN;
        out.push(Command::SpawnEnemyShot {
            enemy: enemy.id,
            speed: RANGED_SHOT_SPEED,
        });
    }
}

/// Strafes erratically while firing three-round bursts.
fn suppress(
    enemy: &EnemySnapshot,
    delta: Vec2,
    clock: Duration,
    rapid: &mut RapidState,
    rng: &mut Lcg,
    out: &mut Vec<Command>,
) {
    if clock >= rapid.next_strafe_flip {
        rapid.strafe = if rng.coin() { Facing::Right } else { Facing::Left };
        rapid.next_strafe_flip = clock + RAPID_STRAFE_FLIP;
    }
    out.push(Command::SetEnemyMotion {
        enemy: enemy.id,
        velocity_x: rapid.strafe.sign() * enemy.speed,
        facing: Facing::toward(delta.x),
    });

    if rapid.burst_left == 0
        && clock >= rapid.cooldown_until
        && delta.y.abs() < RAPID_ALIGN
    {
        rapid.burst_left = RAPID_BURST_LENGTH;
        rapid.next_burst_shot_at = clock;
    }
    if rapid.burst_left > 0 && clock >= rapid.next_burst_shot_at {
        rapid.burst_left -= 1;
        out.push(Command::SpawnEnemyShot {
            enemy: enemy.id,
            speed: RAPID_SHOT_SPEED,
        });
        if rapid.burst_left == 0 {
            rapid.cooldown_until = clock + RAPID_COOLDOWN;
        } else {
            rapid.next_burst_shot_at = clock + RAPID_BURST_GAP;
        }
    }
}

/// Closes in, winds up, then charges past where the player stood.
fn ram(
    enemy: &EnemySnapshot,
    player: &PlayerSnapshot,
    delta: Vec2,
    clock: Duration,
    phase: &mut HeavyPhase,
    out: &mut Vec<Command>,
) {
    match *phase {
        HeavyPhase::Ready => {
            let facing = Facing::toward(delta.x);
            if delta.length() < HEAVY_RANGE && delta.y.abs() < HEAVY_VERTICAL {
                *phase = HeavyPhase::WindUp {
                    until: clock + HEAVY_WINDUP,
                    target_x: player.position.x + facing.sign() * HEAVY_CHARGE_OVERSHOOT,
                };
                out.push(Command::SetEnemyMotion {
                    enemy: enemy.id,
                    velocity_x: 0.0,
                    facing,
                });
            } else {
                out.push(Command::SetEnemyMotion {
                    enemy: enemy.id,
                    velocity_x: facing.sign() * enemy.speed,
                    facing,
                });
            }
        }
        HeavyPhase::WindUp { until, target_x } => {
            let facing = Facing::toward(target_x - enemy.position.x);
            if clock >= until {
                *phase = HeavyPhase::Charging { target_x };
            }
            out.push(Command::SetEnemyMotion {
                enemy: enemy.id,
                velocity_x: 0.0,
                facing,
            });
        }
        HeavyPhase::Charging { target_x } => {
            let toward_target = target_x - enemy.position.x;
            let facing = Facing::toward(toward_target);
            let arrived = toward_target * facing.sign() <= 0.0;
            let walled_in_air = enemy.contact.blocked_sideways() && !enemy.contact.down;
            if arrived || walled_in_air {
                *phase = HeavyPhase::Cooldown {
                    until: clock + HEAVY_CHARGE_COOLDOWN,
                };
                out.push(Command::SetEnemyMotion {
                    enemy: enemy.id,
                    velocity_x: 0.0,
                    facing,
                });
            } else {
                // A grounded wall hit mid-charge is vaulted, not aborted.
                if enemy.contact.blocked_sideways() {
                    out.push(Command::EnemyJump {
                        enemy: enemy.id,
                        impulse: HEAVY_CHARGE_JUMP_IMPULSE,
                        forward_boost: 0.0,
                    });
                }
                out.push(Command::SetEnemyMotion {
                    enemy: enemy.id,
                    velocity_x: facing.sign() * enemy.speed * HEAVY_CHARGE_FACTOR,
                    facing,
                });
            }
        }
        HeavyPhase::Cooldown { until } => {
            if clock >= until {
                *phase = HeavyPhase::Ready;
            }
            out.push(Command::SetEnemyMotion {
                enemy: enemy.id,
                velocity_x: 0.0,
                facing: enemy.facing,
            });
        }
    }
}

#[derive(Debug)]
struct EnemyState {
    id: EnemyId,
    alerted: bool,
    behavior: Behavior,
}

impl EnemyState {
    fn new(enemy: &EnemySnapshot) -> Self {
        let behavior = match enemy.archetype {
            Archetype::Basic => Behavior::Patrol,
            Archetype::Hunter => Behavior::Hunter { airborne_jumps: 0 },
            Archetype::Ranged => Behavior::Ranged {
                next_shot_at: Duration::ZERO,
            },
            Archetype::Rapid => Behavior::Rapid(RapidState::default()),
            Archetype::Heavy => Behavior::Heavy {
                phase: HeavyPhase::Ready,
            },
        };
        Self {
            id: enemy.id,
            alerted: enemy.alerted,
            behavior,
        }
    }
}

#[derive(Debug)]
enum Behavior {
    Patrol,
    Hunter { airborne_jumps: u32 },
    Ranged { next_shot_at: Duration },
    Rapid(RapidState),
    Heavy { phase: HeavyPhase },
}

#[derive(Debug)]
struct RapidState {
    strafe: Facing,
    next_strafe_flip: Duration,
    burst_left: u32,
    next_burst_shot_at: Duration,
    cooldown_until: Duration,
}

impl Default for RapidState {
    fn default() -> Self {
        Self {
            strafe: Facing::Left,
            next_strafe_flip: Duration::ZERO,
            burst_left: 0,
            next_burst_shot_at: Duration::ZERO,
            cooldown_until: Duration::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum HeavyPhase {
    Ready,
    WindUp { until: Duration, target_x: f32 },
    Charging { target_x: f32 },
    Cooldown { until: Duration },
}

/// Deterministic linear congruential generator.
#[derive(Debug)]
struct Lcg(u64);

impl Lcg {
    const fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        self.0
    }

    fn coin(&mut self) -> bool {
        (self.next() >> 63) == 1
    }
}
