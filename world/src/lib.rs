#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for a single Squarelife level.
//!
//! The world owns every mutable gameplay fact: bodies, interactives, bullets,
//! the clock and the run outcome. Adapters and systems mutate it exclusively
//! through [`apply`], which executes one [`Command`] and appends the resulting
//! [`Event`]s. Read access goes through the [`query`] module, which hands out
//! immutable snapshots in deterministic order.

mod interactives;
mod physics;

use std::time::Duration;

use glam::Vec2;
use squarelife_core::{
    Archetype, BoxId, BulletId, ButtonBehavior, ButtonId, Command, DoorId, EnemyId, Event, Facing,
    JumpStrength, LevelId, TILE_SIZE,
};
use squarelife_level::{Level, PlayerTuning};

use interactives::{Button, Door, KeyPickup, Portal};
use physics::{Body, Rect};

const PLAYER_HALF: Vec2 = Vec2::new(15.0, 15.0);
const BOX_HALF: Vec2 = Vec2::new(16.0, 16.0);
const PLAYER_BULLET_HALF: Vec2 = Vec2::new(6.0, 3.0);
const ENEMY_SHOT_HALF: Vec2 = Vec2::new(5.0, 5.0);

const MAX_VELOCITY: Vec2 = Vec2::new(400.0, 1500.0);
const PLAYER_DRAG: f32 = 2000.0;
const BOX_DRAG: f32 = 10_000.0;

const MUZZLE_OFFSET: f32 = 20.0;
const PLAYER_BULLET_SPEED: f32 = 800.0;
const PLAYER_BULLET_TTL: Duration = Duration::from_millis(600);
const ENEMY_SHOT_TTL: Duration = Duration::from_secs(3);

const JUMP_CUT_FACTOR: f32 = 0.5;
const JUMP_CUT_THRESHOLD: f32 = -50.0;
const DOUBLE_JUMP_FACTOR: f32 = 0.9;

const DEATH_KNOCKBACK: Vec2 = Vec2::new(0.0, -400.0);
const DEATH_DELAY: Duration = Duration::from_secs(1);
const PLAYER_FALL_MARGIN: f32 = 400.0;
const ENEMY_FALL_MARGIN: f32 = 200.0;
const BOX_FALL_MARGIN: f32 = 50.0;

const SEPARATION_PUSH: f32 = 2.0;
const SEPARATION_COOLDOWN: Duration = Duration::from_millis(250);

const HEAVY_RAGE_SPEED_BONUS: f32 = 30.0;

/// Text surfaced while the player stands at a locked portal.
pub const PORTAL_LOCKED_TEXT: &str = "LOCKED. Find the Key.";

/// Equipment the player carries between levels of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Loadout {
    /// Whether the light gun has been picked up.
    pub has_weapon: bool,
    /// Rounds remaining.
    pub ammo: u32,
}

impl Loadout {
    /// Loadout of a brand-new run: unarmed, full default ammo reserve.
    #[must_use]
    pub const fn fresh(tuning: PlayerTuning) -> Self {
        Self {
            has_weapon: false,
            ammo: tuning.default_ammo,
        }
    }
}

/// Terminal state of a level run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The player's death sequence completed.
    Died,
    /// The player entered the unlocked exit portal.
    Completed {
        /// Level the run transitions to next.
        next_level: LevelId,
    },
}

#[derive(Clone, Debug)]
struct Player {
    body: Body,
    facing: Facing,
    intent: Option<Facing>,
    alive: bool,
    death_deadline: Option<Duration>,
    has_weapon: bool,
    ammo: u32,
    has_key: bool,
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    archetype: Archetype,
    body: Body,
    facing: Facing,
    hp: u32,
    speed: f32,
    alerted: bool,
    drive_x: f32,
    separation_ready_at: Duration,
}

#[derive(Clone, Debug)]
struct PushBox {
    id: BoxId,
    body: Body,
}

#[derive(Clone, Debug)]
struct Bullet {
    id: BulletId,
    position: Vec2,
    velocity: Vec2,
    half: Vec2,
    from_player: bool,
    expires_at: Duration,
}

impl Bullet {
    fn rect(&self) -> Rect {
        Rect::new(self.position, self.half)
    }
}

#[derive(Clone, Debug)]
struct InfoZone {
    min_x: f32,
    max_x: f32,
    text: String,
}

/// Represents the authoritative state of one level run.
#[derive(Debug)]
pub struct World {
    tuning: PlayerTuning,
    level_id: LevelId,
    exit_to: LevelId,
    map_bottom: f32,
    platforms: Vec<Rect>,
    player: Player,
    enemies: Vec<Enemy>,
    boxes: Vec<PushBox>,
    buttons: Vec<Button>,
    doors: Vec<Door>,
    key: Option<KeyPickup>,
    portal: Portal,
    info_zones: Vec<InfoZone>,
    active_info: Option<String>,
    bullets: Vec<Bullet>,
    next_bullet: u32,
    clock: Duration,
    tick_index: u64,
    finished: Option<Outcome>,
}

impl World {
    /// Builds the world for one level, seating every entity on the authored
    /// geometry and merging the carried loadout with the level's item grants.
    #[must_use]
    pub fn new(level: &Level, tuning: PlayerTuning, carried: Loadout) -> Self {
        let platforms: Vec<Rect> = level
            .map
            .platforms
            .iter()
            .map(|platform| {
                Rect::from_min_size(
                    Vec2::new(platform.x * TILE_SIZE, platform.y * TILE_SIZE),
                    Vec2::new(platform.w * TILE_SIZE, platform.h * TILE_SIZE),
                )
            })
            .collect();

        let spawn = level.spawn_point();
        let mut loadout = carried;
        if level.grants_weapon() {
            loadout.has_weapon = true;
            loadout.ammo = tuning.default_ammo;
        }
        let player = Player {
            body: Body::at(Vec2::new(spawn.x * TILE_SIZE, spawn.y * TILE_SIZE), PLAYER_HALF),
            facing: Facing::Right,
            intent: None,
            alive: true,
            death_deadline: None,
            has_weapon: loadout.has_weapon,
            ammo: loadout.ammo,
            has_key: false,
        };

        let enemies = level
            .enemies
            .iter()
            .enumerate()
            .map(|(index, spawn)| {
                let half = spawn.kind.half_extents();
                let top = level
                    .platform_top_world(spawn.x)
                    .unwrap_or(10.0 * TILE_SIZE);
                Enemy {
                    id: EnemyId::new(index as u32),
                    archetype: spawn.kind,
                    body: Body::at(Vec2::new(spawn.x * TILE_SIZE, top - half.y), half),
                    facing: Facing::Left,
                    hp: spawn.hp.unwrap_or(spawn.kind.base_hp()),
                    speed: spawn.speed.unwrap_or(spawn.kind.base_speed()),
                    alerted: false,
                    drive_x: 0.0,
                    separation_ready_at: Duration::ZERO,
                }
            })
            .collect();

        let boxes = level
            .boxes
            .iter()
            .enumerate()
            .map(|(index, pos)| PushBox {
                id: BoxId::new(index as u32),
                body: Body::at(
                    Vec2::new(pos.x * TILE_SIZE, pos.y * TILE_SIZE),
                    BOX_HALF,
                ),
            })
            .collect();

        let doors: Vec<Door> = level
            .doors
            .iter()
            .enumerate()
            .map(|(index, def)| Door::from_def(def, DoorId::new(index as u32)))
            .collect();
        let buttons = level
            .buttons
            .iter()
            .enumerate()
            .map(|(index, def)| {
                let door_index = level
                    .doors
                    .iter()
                    .position(|door| door.id == def.link_to_door_id)
                    .unwrap_or(0);
                Button::from_def(def, ButtonId::new(index as u32), DoorId::new(door_index as u32))
            })
            .collect();

        let key = level.key_pos.map(|pos| {
            KeyPickup::at(Vec2::new(pos.x * TILE_SIZE, pos.y * TILE_SIZE))
        });
        let portal = Portal::at(level.portal_world_position(), level.has_key);

        let info_zones = level
            .info_points
            .iter()
            .map(|point| InfoZone {
                min_x: point.x * TILE_SIZE,
                max_x: (point.x + point.w) * TILE_SIZE,
                text: point.text.clone(),
            })
            .collect();

        Self {
            tuning,
            level_id: level.id,
            exit_to: level.exit.to,
            map_bottom: level.map.size.h as f32 * TILE_SIZE,
            platforms,
            player,
            enemies,
            boxes,
            buttons,
            doors,
            key,
            portal,
            info_zones,
            active_info: None,
            bullets: Vec::new(),
            next_bullet: 0,
            clock: Duration::ZERO,
            tick_index: 0,
            finished: None,
        }
    }

    fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|enemy| enemy.id == id)
    }

    fn spawn_bullet(&mut self, position: Vec2, velocity: Vec2, half: Vec2, from_player: bool) {
        let ttl = if from_player {
            PLAYER_BULLET_TTL
        } else {
            ENEMY_SHOT_TTL
        };
        self.bullets.push(Bullet {
            id: BulletId::new(self.next_bullet),
            position,
            velocity,
            half,
            from_player,
            expires_at: self.clock + ttl,
        });
        self.next_bullet = self.next_bullet.wrapping_add(1);
    }

    fn kill_player(&mut self) {
        if !self.player.alive {
            return;
        }
        self.player.alive = false;
        self.player.body.velocity = DEATH_KNOCKBACK;
        self.player.death_deadline = Some(self.clock + DEATH_DELAY);
    }

    /// Static solids plus every closed door shutter.
    fn static_solids(&self) -> Vec<Rect> {
        let mut solids = self.platforms.clone();
        solids.extend(self.doors.iter().filter_map(Door::solid));
        solids
    }

    fn step(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.finished.is_some() {
            return;
        }
        self.clock += dt;
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });
        let seconds = dt.as_secs_f32();

        self.step_boxes(seconds);
        self.step_player(seconds);
        self.step_buttons(out_events);
        self.step_doors(out_events);
        self.step_info(out_events);
        self.step_enemies(seconds);
        self.step_bullets(seconds, out_events);
        self.step_pickups(out_events);
        self.step_outcome(out_events);
    }

    fn step_boxes(&mut self, seconds: f32) {
        // Pushes are decided from pre-move positions so player and box stay
        // flush while sliding together. Standing on a box never drags it.
        let push_speed = self.tuning.speed;
        let mut pushes = vec![0.0_f32; self.boxes.len()];
        if self.player.alive {
            if let Some(direction) = self.player.intent {
                for (index, push_box) in self.boxes.iter().enumerate() {
                    let box_on_left = direction == Facing::Left;
                    if self.player.body.beside(push_box.body.rect(), box_on_left)
                        && !self.player.body.standing_on(push_box.body.rect())
                    {
                        pushes[index] = direction.sign() * push_speed;
                    }
                }
            }
        }

        let statics = self.static_solids();
        let rects: Vec<Rect> = self.boxes.iter().map(|b| b.body.rect()).collect();
        for (index, push_box) in self.boxes.iter_mut().enumerate() {
            if pushes[index] != 0.0 {
                push_box.body.velocity.x = pushes[index];
            } else {
                push_box.body.apply_drag(BOX_DRAG, seconds);
            }
            push_box.body.apply_gravity(self.tuning.gravity, seconds);
            push_box.body.clamp_velocity(MAX_VELOCITY);

            let mut solids = statics.clone();
            solids.extend(
                rects
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .map(|(_, rect)| *rect),
            );
            push_box.body.move_and_collide(seconds, &solids);
        }
        let floor = self.map_bottom + BOX_FALL_MARGIN;
        self.boxes.retain(|push_box| push_box.body.position.y < floor);
    }

    fn step_player(&mut self, seconds: f32) {
        if !self.player.alive {
            // The death tumble ignores collision entirely.
            self.player.body.apply_gravity(self.tuning.gravity, seconds);
            let delta = self.player.body.velocity * seconds;
            self.player.body.position += delta;
            return;
        }

        let mut solids = self.static_solids();
        solids.extend(self.boxes.iter().map(|b| b.body.rect()));

        match self.player.intent {
            Some(direction) => {
                self.player.body.velocity.x = direction.sign() * self.tuning.speed;
                self.player.facing = direction;
            }
            None => self.player.body.apply_drag(PLAYER_DRAG, seconds),
        }
        self.player.body.apply_gravity(self.tuning.gravity, seconds);
        self.player.body.clamp_velocity(MAX_VELOCITY);
        self.player.body.move_and_collide(seconds, &solids);

        if self.player.body.position.y > self.map_bottom + PLAYER_FALL_MARGIN {
            self.kill_player();
        }
    }

    fn step_buttons(&mut self, out_events: &mut Vec<Event>) {
        let player_rect = self.player.body.rect();
        for button in &mut self.buttons {
            let was_pressed = button.pressed;
            let player_on = self.player.alive && button.zone.overlaps(player_rect);
            let box_on = self
                .boxes
                .iter()
                .any(|push_box| button.zone.overlaps(push_box.body.rect()));
            button.pressed = player_on || box_on;

            if button.pressed && !was_pressed {
                out_events.push(Event::ButtonPressed { button: button.id });
            }
            if button.pressed && !button.latched && button.behavior == ButtonBehavior::Once {
                button.latched = true;
                out_events.push(Event::ButtonLatched { button: button.id });
            }
        }
    }

    fn step_doors(&mut self, out_events: &mut Vec<Event>) {
        for door in &mut self.doors {
            let open = self
                .buttons
                .iter()
                .any(|button| button.door == door.id && button.active());
            if door.step(open) {
                out_events.push(Event::DoorFullyOpened { door: door.id });
            }
        }
    }

    fn step_pickups(&mut self, out_events: &mut Vec<Event>) {
        if !self.player.alive {
            return;
        }
        let player_rect = self.player.body.rect();
        if let Some(key) = &mut self.key {
            if !key.collected && key.zone.overlaps(player_rect) {
                key.collected = true;
                self.player.has_key = true;
                self.portal.locked = false;
                out_events.push(Event::KeyCollected);
            }
        }
    }

    fn step_enemies(&mut self, seconds: f32) {
        let statics = self.static_solids();
        let mut solids = statics;
        solids.extend(self.boxes.iter().map(|b| b.body.rect()));

        for enemy in &mut self.enemies {
            enemy.body.velocity.x = enemy.drive_x;
            enemy.body.apply_gravity(self.tuning.gravity, seconds);
            enemy.body.clamp_velocity(MAX_VELOCITY);
            enemy.body.move_and_collide(seconds, &solids);
        }

        // Overlapping enemies shove each other apart a little, rate limited
        // so crowds jostle instead of teleporting.
        for first in 0..self.enemies.len() {
            for second in first + 1..self.enemies.len() {
                let (left, right) = self.enemies.split_at_mut(second);
                let a = &mut left[first];
                let b = &mut right[0];
                if !a.body.rect().overlaps(b.body.rect()) {
                    continue;
                }
                if self.clock < a.separation_ready_at || self.clock < b.separation_ready_at {
                    continue;
                }
                let push = if a.body.position.x <= b.body.position.x {
                    SEPARATION_PUSH
                } else {
                    -SEPARATION_PUSH
                };
                a.body.position.x -= push;
                b.body.position.x += push;
                a.facing = Facing::toward(-push);
                b.facing = Facing::toward(push);
                a.separation_ready_at = self.clock + SEPARATION_COOLDOWN;
                b.separation_ready_at = self.clock + SEPARATION_COOLDOWN;
            }
        }

        let floor = self.map_bottom + ENEMY_FALL_MARGIN;
        self.enemies.retain(|enemy| enemy.body.position.y < floor);

        if self.player.alive {
            let player_rect = self.player.body.rect();
            let touched = self
                .enemies
                .iter()
                .any(|enemy| enemy.body.rect().overlaps(player_rect));
            if touched {
                self.kill_player();
            }
        }
    }

    fn step_bullets(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        let mut solids = self.static_solids();
        solids.extend(self.boxes.iter().map(|b| b.body.rect()));
        let clock = self.clock;
        let player_rect = self.player.body.rect();
        let player_alive = self.player.alive;

        let mut player_hit = false;
        let mut destroyed: Vec<EnemyId> = Vec::new();
        let enemies = &mut self.enemies;
        self.bullets.retain_mut(|bullet| {
            bullet.position += bullet.velocity * seconds;
            if clock >= bullet.expires_at {
                return false;
            }
            let rect = bullet.rect();
            if solids.iter().any(|solid| rect.overlaps(*solid)) {
                return false;
            }

            if bullet.from_player {
                for enemy in enemies.iter_mut() {
                    if enemy.hp == 0 || !rect.overlaps(enemy.body.rect()) {
                        continue;
                    }
                    enemy.hp -= 1;
                    if enemy.hp == 0 {
                        destroyed.push(enemy.id);
                        out_events.push(Event::EnemyDestroyed { enemy: enemy.id });
                    } else {
                        if enemy.archetype == Archetype::Heavy {
                            enemy.speed += HEAVY_RAGE_SPEED_BONUS;
                        }
                        // Getting shot tells shooters and brutes where the
                        // player is, even from outside detection range.
                        let wakes = matches!(
                            enemy.archetype,
                            Archetype::Ranged | Archetype::Rapid | Archetype::Heavy
                        );
                        if wakes && !enemy.alerted {
                            enemy.alerted = true;
                            out_events.push(Event::EnemyAlerted {
                                enemy: enemy.id,
                                alerted: true,
                            });
                        }
                        out_events.push(Event::EnemyHit {
                            enemy: enemy.id,
                            remaining_hp: enemy.hp,
                        });
                    }
                    return false;
                }
                true
            } else if player_alive && rect.overlaps(player_rect) {
                player_hit = true;
                false
            } else {
                true
            }
        });

        self.enemies.retain(|enemy| !destroyed.contains(&enemy.id));
        if player_hit {
            self.kill_player();
        }
    }

    fn step_info(&mut self, out_events: &mut Vec<Event>) {
        let text = if !self.player.alive {
            None
        } else if self.portal.locked && self.portal.zone.overlaps(self.player.body.rect()) {
            Some(PORTAL_LOCKED_TEXT.to_owned())
        } else {
            let x = self.player.body.position.x;
            self.info_zones
                .iter()
                .find(|zone| x >= zone.min_x && x <= zone.max_x)
                .map(|zone| zone.text.clone())
        };

        if text != self.active_info {
            self.active_info = text.clone();
            out_events.push(Event::InfoChanged { text });
        }
    }

    fn step_outcome(&mut self, out_events: &mut Vec<Event>) {
        if self.player.alive {
            if !self.portal.locked && self.portal.zone.overlaps(self.player.body.rect()) {
                self.finished = Some(Outcome::Completed {
                    next_level: self.exit_to,
                });
                out_events.push(Event::LevelCompleted {
                    next_level: self.exit_to,
                });
            }
            return;
        }
        if let Some(deadline) = self.player.death_deadline {
            if self.clock >= deadline {
                self.player.death_deadline = None;
                self.finished = Some(Outcome::Died);
                out_events.push(Event::PlayerDied);
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.step(dt, out_events),
        Command::SetMoveIntent { direction } => {
            world.player.intent = direction;
        }
        Command::Jump { strength } => {
            if world.player.alive {
                let factor = match strength {
                    JumpStrength::Primary => 1.0,
                    JumpStrength::Double => DOUBLE_JUMP_FACTOR,
                };
                world.player.body.velocity.y = -world.tuning.jump_force * factor;
            }
        }
        Command::CutJump => {
            if world.player.alive && world.player.body.velocity.y < JUMP_CUT_THRESHOLD {
                world.player.body.velocity.y *= JUMP_CUT_FACTOR;
            }
        }
        Command::FireBullet => {
            let player = &world.player;
            if !player.alive || !player.has_weapon || player.ammo == 0 {
                return;
            }
            world.player.ammo -= 1;
            let facing = world.player.facing;
            let muzzle = world.player.body.position + Vec2::new(facing.sign() * MUZZLE_OFFSET, 0.0);
            world.spawn_bullet(
                muzzle,
                Vec2::new(facing.sign() * PLAYER_BULLET_SPEED, 0.0),
                PLAYER_BULLET_HALF,
                true,
            );
            out_events.push(Event::AmmoConsumed {
                remaining: world.player.ammo,
            });
            out_events.push(Event::PlayerFired);
        }
        Command::SetEnemyMotion {
            enemy,
            velocity_x,
            facing,
        } => {
            if let Some(enemy) = world.enemy_mut(enemy) {
                enemy.drive_x = velocity_x;
                enemy.facing = facing;
            }
        }
        Command::EnemyJump {
            enemy,
            impulse,
            forward_boost,
        } => {
            if let Some(enemy) = world.enemy_mut(enemy) {
                enemy.body.velocity.y = -impulse;
                enemy.drive_x += forward_boost;
            }
        }
        Command::SpawnEnemyShot { enemy, speed } => {
            let Some(enemy) = world.enemies.iter().find(|e| e.id == enemy) else {
                return;
            };
            let facing = enemy.facing;
            let muzzle =
                enemy.body.position + Vec2::new(facing.sign() * (enemy.body.half.x + 6.0), 0.0);
            world.spawn_bullet(
                muzzle,
                Vec2::new(facing.sign() * speed, 0.0),
                ENEMY_SHOT_HALF,
                false,
            );
        }
        Command::SetEnemyAlert { enemy, alerted } => {
            if let Some(found) = world.enemy_mut(enemy) {
                if found.alerted != alerted {
                    found.alerted = alerted;
                    out_events.push(Event::EnemyAlerted { enemy, alerted });
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use squarelife_core::{
        Archetype, BoxId, BulletId, ButtonId, ContactFlags, DoorId, EnemyId, Facing, LevelId,
    };

    use super::{Loadout, Outcome, World};

    /// Identifier of the level this world simulates.
    #[must_use]
    pub fn level_id(world: &World) -> LevelId {
        world.level_id
    }

    /// Total simulated time elapsed in this run.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks executed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Terminal outcome, once the run has ended.
    #[must_use]
    pub fn finished(world: &World) -> Option<Outcome> {
        world.finished
    }

    /// Equipment the player would carry into the next level.
    #[must_use]
    pub fn loadout(world: &World) -> Loadout {
        Loadout {
            has_weapon: world.player.has_weapon,
            ammo: world.player.ammo,
        }
    }

    /// Info text currently shown to the player, if any.
    #[must_use]
    pub fn active_info(world: &World) -> Option<&str> {
        world.active_info.as_deref()
    }

    /// Captures a read-only view of the player.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        let player = &world.player;
        PlayerSnapshot {
            position: player.body.position,
            velocity: player.body.velocity,
            half: player.body.half,
            contact: player.body.contact,
            facing: player.facing,
            alive: player.alive,
            has_weapon: player.has_weapon,
            ammo: player.ammo,
            has_key: player.has_key,
        }
    }

    /// Captures a read-only view of all enemies in deterministic order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        let mut snapshots: Vec<EnemySnapshot> = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                archetype: enemy.archetype,
                position: enemy.body.position,
                velocity: enemy.body.velocity,
                half: enemy.body.half,
                contact: enemy.body.contact,
                facing: enemy.facing,
                hp: enemy.hp,
                speed: enemy.speed,
                alerted: enemy.alerted,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Captures a read-only view of all live bullets in spawn order.
    #[must_use]
    pub fn bullets(world: &World) -> Vec<BulletSnapshot> {
        world
            .bullets
            .iter()
            .map(|bullet| BulletSnapshot {
                id: bullet.id,
                position: bullet.position,
                velocity: bullet.velocity,
                from_player: bullet.from_player,
            })
            .collect()
    }

    /// Captures a read-only view of all pushable boxes.
    #[must_use]
    pub fn boxes(world: &World) -> Vec<BoxSnapshot> {
        world
            .boxes
            .iter()
            .map(|push_box| BoxSnapshot {
                id: push_box.id,
                position: push_box.body.position,
                half: push_box.body.half,
            })
            .collect()
    }

    /// Captures a read-only view of all doors in authored order.
    #[must_use]
    pub fn doors(world: &World) -> Vec<DoorSnapshot> {
        world
            .doors
            .iter()
            .map(|door| DoorSnapshot {
                id: door.id,
                fraction_open: door.fraction_open(),
                solid: door.solid().is_some(),
            })
            .collect()
    }

    /// Captures a read-only view of all buttons in authored order.
    #[must_use]
    pub fn buttons(world: &World) -> Vec<ButtonSnapshot> {
        world
            .buttons
            .iter()
            .map(|button| ButtonSnapshot {
                id: button.id,
                door: button.door,
                pressed: button.pressed,
                latched: button.latched,
            })
            .collect()
    }

    /// Exposes the static geometry for look-ahead probes.
    #[must_use]
    pub fn geometry(world: &World) -> GeometryView<'_> {
        GeometryView { world }
    }

    /// Immutable representation of the player's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PlayerSnapshot {
        /// Center of the player's collision box in world units.
        pub position: Vec2,
        /// Velocity in world units per second.
        pub velocity: Vec2,
        /// Half extents of the collision box.
        pub half: Vec2,
        /// Contact flags from the most recent collision pass.
        pub contact: ContactFlags,
        /// Current facing direction.
        pub facing: Facing,
        /// Whether the player is alive.
        pub alive: bool,
        /// Whether the light gun has been picked up.
        pub has_weapon: bool,
        /// Rounds remaining.
        pub ammo: u32,
        /// Whether the level key has been collected.
        pub has_key: bool,
    }

    /// Immutable representation of a single enemy's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Unique identifier assigned at spawn.
        pub id: EnemyId,
        /// Behavioral archetype fixed at spawn.
        pub archetype: Archetype,
        /// Center of the collision box in world units.
        pub position: Vec2,
        /// Velocity in world units per second.
        pub velocity: Vec2,
        /// Half extents of the collision box.
        pub half: Vec2,
        /// Contact flags from the most recent collision pass.
        pub contact: ContactFlags,
        /// Current facing direction.
        pub facing: Facing,
        /// Hit points remaining.
        pub hp: u32,
        /// Current movement speed, including rage bonuses.
        pub speed: f32,
        /// Whether the enemy is alerted to the player.
        pub alerted: bool,
    }

    /// Immutable representation of one bullet in flight.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct BulletSnapshot {
        /// Unique identifier assigned at spawn.
        pub id: BulletId,
        /// Center position in world units.
        pub position: Vec2,
        /// Velocity in world units per second.
        pub velocity: Vec2,
        /// Whether the player fired this bullet.
        pub from_player: bool,
    }

    /// Immutable representation of one pushable box.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct BoxSnapshot {
        /// Unique identifier assigned at level load.
        pub id: BoxId,
        /// Center position in world units.
        pub position: Vec2,
        /// Half extents of the collision box.
        pub half: Vec2,
    }

    /// Immutable representation of one door's shutter state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct DoorSnapshot {
        /// Unique identifier assigned at level load.
        pub id: DoorId,
        /// Opening progress from `0.0` (closed) to `1.0` (fully open).
        pub fraction_open: f32,
        /// Whether the shutter still collides.
        pub solid: bool,
    }

    /// Immutable representation of one button's state.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ButtonSnapshot {
        /// Unique identifier assigned at level load.
        pub id: ButtonId,
        /// Door this button drives.
        pub door: DoorId,
        /// Whether a body depresses the plate this tick.
        pub pressed: bool,
        /// Whether a once-behavior button has latched.
        pub latched: bool,
    }

    /// Read-only access to static level geometry for AI look-ahead probes.
    #[derive(Clone, Copy, Debug)]
    pub struct GeometryView<'a> {
        world: &'a World,
    }

    impl GeometryView<'_> {
        /// Reports whether walkable ground exists near the probe point: a
        /// platform spanning the probe's x whose top edge lies within 40
        /// world units of the probe's y.
        #[must_use]
        pub fn has_floor_at(&self, probe: Vec2) -> bool {
            self.world.platforms.iter().any(|platform| {
                probe.x >= platform.min().x
                    && probe.x <= platform.max().x
                    && (probe.y - platform.min().y).abs() < 40.0
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squarelife_core::InputState;

    const DT: Duration = Duration::from_nanos(16_666_667);

    fn tick(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::Tick { dt: DT }, &mut events);
        events
    }

    fn ticks(world: &mut World, count: usize) -> Vec<Event> {
        let mut all = Vec::new();
        for _ in 0..count {
            all.extend(tick(world));
        }
        all
    }

    fn level(extra: &str) -> Level {
        let text = format!(
            r#"{{
                "id": 1,
                "name": "Test",
                "map": {{ "size": {{ "w": 60, "h": 20 }},
                          "platforms": [{{ "x": 0, "y": 14, "w": 30 }}] }},
                "exit": {{ "to": 2 }}{extra}
            }}"#
        );
        Level::from_json(&text).expect("test level parses")
    }

    fn world(extra: &str) -> World {
        let tuning = PlayerTuning::default();
        World::new(&level(extra), tuning, Loadout::fresh(tuning))
    }

    fn armed_world(extra: &str, ammo: u32) -> World {
        World::new(
            &level(extra),
            PlayerTuning::default(),
            Loadout {
                has_weapon: true,
                ammo,
            },
        )
    }

    #[test]
    fn player_settles_onto_the_platform() {
        let mut world = world(r#", "checkpoints": [{ "x": 5, "y": 12 }]"#);
        let _ = ticks(&mut world, 30);

        let player = query::player(&world);
        assert!(player.contact.down);
        assert_eq!(player.position.y, 14.0 * TILE_SIZE - PLAYER_HALF.y);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn move_intent_drives_and_drag_stops() {
        let mut world = world(r#", "checkpoints": [{ "x": 5, "y": 12 }]"#);
        let _ = ticks(&mut world, 30);
        let start_x = query::player(&world).position.x;

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetMoveIntent {
                direction: InputState {
                    right: true,
                    ..InputState::default()
                }
                .direction(),
            },
            &mut events,
        );
        let _ = ticks(&mut world, 10);
        let moving = query::player(&world);
        assert!(moving.position.x > start_x);
        assert_eq!(moving.facing, Facing::Right);

        apply(&mut world, Command::SetMoveIntent { direction: None }, &mut events);
        let _ = ticks(&mut world, 30);
        assert_eq!(query::player(&world).velocity.x, 0.0);
    }

    #[test]
    fn fire_consumes_ammo_and_stops_at_zero() {
        let mut world = armed_world(r#", "checkpoints": [{ "x": 5, "y": 12 }]"#, 1);
        let mut events = Vec::new();
        apply(&mut world, Command::FireBullet, &mut events);
        assert!(events.contains(&Event::AmmoConsumed { remaining: 0 }));
        assert!(events.contains(&Event::PlayerFired));
        assert_eq!(query::bullets(&world).len(), 1);

        events.clear();
        apply(&mut world, Command::FireBullet, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::bullets(&world).len(), 1);
    }

    #[test]
    fn weapon_grant_refills_ammo_on_entry() {
        let mut carried = Loadout {
            has_weapon: true,
            ammo: 3,
        };
        let plain = World::new(&level(""), PlayerTuning::default(), carried);
        assert_eq!(query::loadout(&plain).ammo, 3);

        carried.ammo = 3;
        let armory = World::new(
            &level(r#", "items": [{ "weapon": "light_gun" }]"#),
            PlayerTuning::default(),
            carried,
        );
        assert_eq!(query::loadout(&armory).ammo, 25);
    }

    #[test]
    fn bullets_whittle_enemy_hp_and_destroy_on_the_last_hit() {
        let extra = r#", "checkpoints": [{ "x": 5, "y": 13 }],
            "enemies": [{ "type": "triangle_rapid", "x": 10 }]"#;
        let mut world = armed_world(extra, 25);
        let _ = ticks(&mut world, 30);

        let mut hits = Vec::new();
        for _ in 0..3 {
            let mut events = Vec::new();
            apply(&mut world, Command::FireBullet, &mut events);
            for _ in 0..30 {
                let batch = tick(&mut world);
                hits.extend(batch.into_iter().filter(|event| {
                    matches!(event, Event::EnemyHit { .. } | Event::EnemyDestroyed { .. })
                }));
            }
        }

        assert_eq!(
            hits,
            vec![
                Event::EnemyHit {
                    enemy: EnemyId::new(0),
                    remaining_hp: 2
                },
                Event::EnemyHit {
                    enemy: EnemyId::new(0),
                    remaining_hp: 1
                },
                Event::EnemyDestroyed {
                    enemy: EnemyId::new(0)
                },
            ]
        );
        assert!(query::enemies(&world).is_empty());
    }

    #[test]
    fn shot_shooters_wake_up_even_out_of_range() {
        let extra = r#", "checkpoints": [{ "x": 5, "y": 13 }],
            "enemies": [{ "type": "triangle_ranged", "x": 10, "hp": 3 }]"#;
        let mut world = armed_world(extra, 25);
        let _ = ticks(&mut world, 30);
        assert!(!query::enemies(&world)[0].alerted);

        let mut events = Vec::new();
        apply(&mut world, Command::FireBullet, &mut events);
        let batch = ticks(&mut world, 30);

        assert!(query::enemies(&world)[0].alerted);
        assert!(batch.contains(&Event::EnemyAlerted {
            enemy: EnemyId::new(0),
            alerted: true,
        }));
    }

    #[test]
    fn heavy_rages_when_hit() {
        let extra = r#", "checkpoints": [{ "x": 5, "y": 13 }],
            "enemies": [{ "type": "triangle_heavy", "x": 10 }]"#;
        let mut world = armed_world(extra, 25);
        let _ = ticks(&mut world, 30);
        let calm_speed = query::enemies(&world)[0].speed;

        let mut events = Vec::new();
        apply(&mut world, Command::FireBullet, &mut events);
        let batch = ticks(&mut world, 30);

        let raged = &query::enemies(&world)[0];
        assert_eq!(raged.speed, calm_speed + HEAVY_RAGE_SPEED_BONUS);
        assert!(raged.alerted);
        assert!(batch.iter().any(|event| matches!(
            event,
            Event::EnemyAlerted { alerted: true, .. }
        )));
    }

    #[test]
    fn enemy_contact_kills_after_the_death_delay() {
        let extra = r#", "checkpoints": [{ "x": 10, "y": 13 }],
            "enemies": [{ "x": 10 }]"#;
        let mut world = world(extra);

        let events = ticks(&mut world, 90);
        assert!(events.contains(&Event::PlayerDied));
        assert_eq!(query::finished(&world), Some(Outcome::Died));
        assert!(!query::player(&world).alive);
    }

    #[test]
    fn falling_out_of_the_map_ends_the_run() {
        let mut world = world(r#", "checkpoints": [{ "x": 50, "y": 10 }]"#);
        let events = ticks(&mut world, 240);
        assert!(events.contains(&Event::PlayerDied));
        assert_eq!(query::finished(&world), Some(Outcome::Died));
    }

    #[test]
    fn unlocked_portal_completes_the_level() {
        let mut world = world(r#", "portalPos": { "x": 5, "y": 12.5 }"#);
        let events = ticks(&mut world, 30);
        assert!(events.contains(&Event::LevelCompleted {
            next_level: LevelId::new(2)
        }));
        assert_eq!(
            query::finished(&world),
            Some(Outcome::Completed {
                next_level: LevelId::new(2)
            })
        );
    }

    #[test]
    fn locked_portal_shows_text_until_the_key_is_collected() {
        let extra = r#", "hasKey": true,
            "keyPos": { "x": 10, "y": 13 },
            "portalPos": { "x": 5, "y": 12.5 },
            "checkpoints": [{ "x": 5, "y": 12 }]"#;
        let mut world = world(extra);

        let events = ticks(&mut world, 30);
        assert!(events.contains(&Event::InfoChanged {
            text: Some(PORTAL_LOCKED_TEXT.to_owned())
        }));
        assert!(query::finished(&world).is_none());

        // Walk right to the key, then return to the portal.
        let mut scratch = Vec::new();
        apply(
            &mut world,
            Command::SetMoveIntent {
                direction: Some(Facing::Right),
            },
            &mut scratch,
        );
        let walk = ticks(&mut world, 60);
        assert!(walk.contains(&Event::KeyCollected));
        assert!(query::player(&world).has_key);

        apply(
            &mut world,
            Command::SetMoveIntent {
                direction: Some(Facing::Left),
            },
            &mut scratch,
        );
        let back = ticks(&mut world, 120);
        assert!(back.contains(&Event::LevelCompleted {
            next_level: LevelId::new(2)
        }));
    }

    #[test]
    fn hold_button_opens_while_pressed_and_closes_after() {
        let extra = r#", "checkpoints": [{ "x": 10, "y": 12 }],
            "buttons": [{ "x": 10, "y": 13, "id": "b", "linkToDoorId": "d" }],
            "doors": [{ "x": 20, "y": 13, "id": "d" }]"#;
        let mut world = world(extra);

        // Spawned on the plate: the door steps fully open.
        let events = ticks(&mut world, 40);
        assert!(events.iter().any(|event| matches!(event, Event::ButtonPressed { .. })));
        assert!(events.iter().any(|event| matches!(event, Event::DoorFullyOpened { .. })));
        assert!(!query::doors(&world)[0].solid);

        // Walk off the plate: the door steps closed again.
        let mut scratch = Vec::new();
        apply(
            &mut world,
            Command::SetMoveIntent {
                direction: Some(Facing::Left),
            },
            &mut scratch,
        );
        let _ = ticks(&mut world, 60);
        let door = query::doors(&world)[0];
        assert!(door.solid);
        assert_eq!(door.fraction_open, 0.0);
    }

    #[test]
    fn once_button_keeps_its_door_open_forever() {
        let extra = r#", "checkpoints": [{ "x": 10, "y": 12 }],
            "buttons": [{ "x": 10, "y": 13, "id": "b", "linkToDoorId": "d", "behavior": "once" }],
            "doors": [{ "x": 20, "y": 13, "id": "d" }]"#;
        let mut world = world(extra);

        let events = ticks(&mut world, 40);
        assert!(events.iter().any(|event| matches!(event, Event::ButtonLatched { .. })));

        let mut scratch = Vec::new();
        apply(
            &mut world,
            Command::SetMoveIntent {
                direction: Some(Facing::Left),
            },
            &mut scratch,
        );
        let _ = ticks(&mut world, 60);
        let door = query::doors(&world)[0];
        assert!(!door.solid);
        assert_eq!(door.fraction_open, 1.0);
        assert!(query::buttons(&world)[0].latched);
    }

    #[test]
    fn box_resting_on_a_button_holds_the_door_open() {
        let extra = r#", "boxes": [{ "x": 10, "y": 13 }],
            "buttons": [{ "x": 10, "y": 13, "id": "b", "linkToDoorId": "d" }],
            "doors": [{ "x": 20, "y": 13, "id": "d" }]"#;
        let mut world = world(extra);

        let _ = ticks(&mut world, 60);
        assert!(query::buttons(&world)[0].pressed);
        assert!(!query::doors(&world)[0].solid);
    }

    #[test]
    fn lateral_intent_pushes_a_box_at_player_speed() {
        // The checkpoint seats the player flush against the box's left face.
        let extra = r#", "checkpoints": [{ "x": 9.03125, "y": 12 }],
            "boxes": [{ "x": 10, "y": 13 }]"#;
        let mut world = world(extra);
        let _ = ticks(&mut world, 30);
        assert_eq!(query::boxes(&world)[0].position.x, 320.0);

        let mut scratch = Vec::new();
        apply(
            &mut world,
            Command::SetMoveIntent {
                direction: Some(Facing::Right),
            },
            &mut scratch,
        );
        let _ = ticks(&mut world, 12);

        // 12 ticks at the full 300 u/s move speed cover about 60 units.
        let pushed = query::boxes(&world)[0].position.x;
        assert!(pushed > 375.0 && pushed < 385.0, "box at {pushed}");
    }

    #[test]
    fn standing_on_a_box_never_drags_it() {
        let extra = r#", "checkpoints": [{ "x": 10, "y": 12 }],
            "boxes": [{ "x": 10, "y": 13 }]"#;
        let mut world = world(extra);
        let _ = ticks(&mut world, 30);

        // Settled on top of the box, not beside it.
        let player = query::player(&world);
        assert!(player.contact.down);
        assert_eq!(player.position.y, 416.0 - PLAYER_HALF.y);

        let mut scratch = Vec::new();
        apply(
            &mut world,
            Command::SetMoveIntent {
                direction: Some(Facing::Right),
            },
            &mut scratch,
        );
        let _ = ticks(&mut world, 3);
        assert_eq!(query::boxes(&world)[0].position.x, 320.0);
    }

    #[test]
    fn boxes_block_gunfire() {
        let extra = r#", "checkpoints": [{ "x": 5, "y": 13 }],
            "boxes": [{ "x": 10, "y": 13 }],
            "enemies": [{ "type": "triangle_rapid", "x": 15 }]"#;
        let mut world = armed_world(extra, 25);
        let _ = ticks(&mut world, 30);

        let mut events = Vec::new();
        apply(&mut world, Command::FireBullet, &mut events);
        let aftermath = ticks(&mut world, 40);

        assert!(!aftermath.iter().any(|event| {
            matches!(event, Event::EnemyHit { .. } | Event::EnemyDestroyed { .. })
        }));
        assert!(query::bullets(&world).is_empty());
        assert_eq!(query::enemies(&world)[0].hp, Archetype::Rapid.base_hp());
    }

    #[test]
    fn geometry_probe_finds_platform_tops_only_nearby() {
        let world = world("");
        let geometry = query::geometry(&world);
        let top = 14.0 * TILE_SIZE;
        assert!(geometry.has_floor_at(Vec2::new(100.0, top + 10.0)));
        assert!(!geometry.has_floor_at(Vec2::new(100.0, top - 100.0)));
        assert!(!geometry.has_floor_at(Vec2::new(31.0 * TILE_SIZE, top + 10.0)));
    }

    #[test]
    fn cut_jump_halves_a_fast_ascent_only() {
        let mut world = world(r#", "checkpoints": [{ "x": 5, "y": 12 }]"#);
        let _ = ticks(&mut world, 30);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Jump {
                strength: JumpStrength::Primary,
            },
            &mut events,
        );
        assert_eq!(query::player(&world).velocity.y, -580.0);

        apply(&mut world, Command::CutJump, &mut events);
        assert_eq!(query::player(&world).velocity.y, -290.0);

        // Below the cut threshold the command is a no-op.
        world.player.body.velocity.y = -20.0;
        apply(&mut world, Command::CutJump, &mut events);
        assert_eq!(query::player(&world).velocity.y, -20.0);
    }
}
