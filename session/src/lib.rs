#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Campaign orchestration: one run of consecutive level worlds.
//!
//! A session owns the active [`World`] plus the two pure systems, and drives
//! the fixed command cadence every tick: systems read pre-tick snapshots and
//! queue commands, the session drains the queue through [`apply`], and a
//! final `Tick` command advances the clock. Level completion swaps in the
//! next world with the carried loadout; death restarts the current level
//! with a fresh one.

use std::time::Duration;

use squarelife_core::{Command, Event, InputState, LevelId};
use squarelife_level::Campaign;
use squarelife_system_enemy_ai::EnemyAi;
use squarelife_system_player_control::PlayerControl;
use squarelife_world::{apply, query, Loadout, Outcome, World};
use thiserror::Error;

/// Errors raised while assembling or advancing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The campaign contains no levels at all.
    #[error("campaign has no levels")]
    EmptyCampaign,
    /// A level transition referenced an id the campaign does not define.
    #[error("campaign defines no level {0:?}")]
    UnknownLevel(LevelId),
}

/// One run through a campaign: the active world plus system state.
#[derive(Debug)]
pub struct Session {
    campaign: Campaign,
    world: World,
    control: PlayerControl,
    ai: EnemyAi,
    commands: Vec<Command>,
    events: Vec<Event>,
    level: LevelId,
    ending: Option<String>,
}

impl Session {
    /// Starts a fresh run at the campaign's first level.
    pub fn new(campaign: Campaign) -> Result<Self, SessionError> {
        let first = campaign.first_level().ok_or(SessionError::EmptyCampaign)?;
        let level = first.id;
        Self::starting_at(campaign, level)
    }

    /// Starts a fresh run at an arbitrary campaign level.
    pub fn starting_at(campaign: Campaign, level: LevelId) -> Result<Self, SessionError> {
        let start = campaign
            .level(level)
            .ok_or(SessionError::UnknownLevel(level))?;
        let tuning = campaign.player();
        let world = World::new(start, tuning, Loadout::fresh(tuning));
        Ok(Self {
            ai: ai_for_level(level),
            campaign,
            world,
            control: PlayerControl::default(),
            commands: Vec::new(),
            events: Vec::new(),
            level,
            ending: None,
        })
    }

    /// Advances the run by one tick of sampled input, returning the events
    /// the tick produced. Level transitions happen at the end of the tick,
    /// after their triggering event has been recorded.
    pub fn tick(&mut self, input: InputState, dt: Duration) -> Result<&[Event], SessionError> {
        self.events.clear();
        if self.ending.is_some() {
            return Ok(&self.events);
        }

        let player = query::player(&self.world);
        let enemies = query::enemies(&self.world);
        let clock = query::clock(&self.world);
        self.control
            .handle(&input, &player, clock, &mut self.commands);
        self.ai.handle(
            &player,
            &enemies,
            query::geometry(&self.world),
            clock,
            &mut self.commands,
        );
        for command in self.commands.drain(..) {
            apply(&mut self.world, command, &mut self.events);
        }
        apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        match query::finished(&self.world) {
            None => {}
            Some(Outcome::Completed { next_level }) => {
                let current = self
                    .campaign
                    .level(self.level)
                    .ok_or(SessionError::UnknownLevel(self.level))?;
                if let Some(ending) = &current.ending {
                    self.ending = Some(ending.message.clone());
                } else {
                    let carried = query::loadout(&self.world);
                    self.enter_level(next_level, carried)?;
                }
            }
            Some(Outcome::Died) => {
                let tuning = self.campaign.player();
                self.enter_level(self.level, Loadout::fresh(tuning))?;
            }
        }
        Ok(&self.events)
    }

    fn enter_level(&mut self, id: LevelId, loadout: Loadout) -> Result<(), SessionError> {
        let level = self
            .campaign
            .level(id)
            .ok_or(SessionError::UnknownLevel(id))?;
        self.world = World::new(level, self.campaign.player(), loadout);
        self.control = PlayerControl::default();
        self.ai = ai_for_level(id);
        self.level = id;
        Ok(())
    }

    /// Identifier of the level currently simulated.
    #[must_use]
    pub fn level_id(&self) -> LevelId {
        self.level
    }

    /// Read-only access to the active world for adapter queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The campaign driving this session.
    #[must_use]
    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    /// Closing message once the final level has been completed.
    #[must_use]
    pub fn ending(&self) -> Option<&str> {
        self.ending.as_deref()
    }

    /// Whether the campaign has been finished.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.ending.is_some()
    }
}

/// Enemy behavior is reseeded per level so replaying a level replays its
/// enemies exactly.
fn ai_for_level(level: LevelId) -> EnemyAi {
    EnemyAi::with_seed(0x5157_4c5f_0000_0000 ^ u64::from(level.get()))
}
