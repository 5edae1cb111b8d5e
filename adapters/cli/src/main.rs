#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Squarelife headlessly.
//!
//! The runner simulates a campaign session at a fixed 60 Hz cadence, feeding
//! it inputs from an optional script file and printing the event stream as it
//! unfolds. Levels can also be exported to, and imported from, single-line
//! transfer strings for sharing.

mod level_transfer;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use squarelife_core::{Event, InputState, LevelId};
use squarelife_level::{Campaign, ExitDef, Level, PlayerTuning};
use squarelife_session::Session;
use squarelife_world::query;

const TICK: Duration = Duration::from_nanos(16_666_667);

#[derive(Debug, Parser)]
#[command(name = "squarelife", about = "Headless Squarelife simulation runner")]
struct Args {
    /// Campaign level id to start from.
    #[arg(long)]
    level: Option<u32>,
    /// Number of 60 Hz ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Input script: one line per tick, tokens joined with '+'
    /// (left, right, jump, fire, idle).
    #[arg(long)]
    script: Option<PathBuf>,
    /// Campaign JSON file overriding the built-in campaign.
    #[arg(long)]
    campaign: Option<PathBuf>,
    /// Print the transfer string for a campaign level and exit.
    #[arg(long, value_name = "LEVEL_ID")]
    export: Option<u32>,
    /// Run a level decoded from a transfer string instead of the campaign.
    #[arg(long, value_name = "TRANSFER", conflicts_with = "level")]
    import: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let campaign = match &args.campaign {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("could not read campaign file {}", path.display()))?;
            Campaign::from_json(&text).context("campaign file is invalid")?
        }
        None => Campaign::builtin().context("built-in campaign is invalid")?,
    };

    if let Some(id) = args.export {
        let level = campaign
            .level(LevelId::new(id))
            .with_context(|| format!("campaign defines no level {id}"))?;
        println!("{}", level_transfer::encode(level));
        return Ok(());
    }

    let mut session = match &args.import {
        Some(text) => {
            let level =
                level_transfer::decode(text).context("could not decode transfer string")?;
            Session::new(single_level_campaign(level)?)?
        }
        None => match args.level {
            Some(id) => Session::starting_at(campaign, LevelId::new(id))?,
            None => Session::new(campaign)?,
        },
    };

    let script = match &args.script {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("could not read script file {}", path.display()))?;
            parse_script(&text)?
        }
        None => Vec::new(),
    };

    for tick in 0..args.ticks {
        let input = script
            .get(usize::try_from(tick).unwrap_or(usize::MAX))
            .copied()
            .unwrap_or_default();
        let events = session.tick(input, TICK)?;
        for event in events {
            if let Some(line) = describe(event) {
                println!("[{tick:>5}] {line}");
            }
        }
        if session.is_over() {
            break;
        }
    }

    if let Some(message) = session.ending() {
        println!("campaign complete: {message}");
    } else {
        let world = session.world();
        let player = query::player(world);
        println!(
            "stopped in level {} after {} ticks; player at ({:.1}, {:.1}), ammo {}",
            session.level_id().get(),
            query::tick_index(world),
            player.position.x,
            player.position.y,
            player.ammo,
        );
    }
    Ok(())
}

/// Wraps an imported level into a one-level campaign that loops onto itself.
fn single_level_campaign(mut level: Level) -> Result<Campaign> {
    level.exit = ExitDef { to: level.id };
    let doc = serde_json::json!({
        "meta": { "gameId": "imported", "build": "transfer" },
        "player": PlayerTuning::default(),
        "levels": [level],
    });
    Campaign::from_json(&doc.to_string()).context("imported level does not form a valid campaign")
}

/// Parses one input state per script line. Blank lines and lines starting
/// with '#' count as idle ticks.
fn parse_script(text: &str) -> Result<Vec<InputState>> {
    let mut states = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            states.push(InputState::default());
            continue;
        }
        let mut state = InputState::default();
        for token in line.split('+').map(str::trim) {
            match token {
                "left" => state.left = true,
                "right" => state.right = true,
                "jump" => state.jump = true,
                "fire" => state.fire = true,
                "idle" | "" => {}
                other => bail!("script line {}: unknown input token '{other}'", number + 1),
            }
        }
        states.push(state);
    }
    Ok(states)
}

/// Renders an event as a log line; clock ticks are too noisy to print.
fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TimeAdvanced { .. } => None,
        Event::PlayerDied => Some("player died".to_owned()),
        Event::LevelCompleted { next_level } => {
            Some(format!("level completed, next is {}", next_level.get()))
        }
        Event::InfoChanged { text: Some(text) } => Some(format!("info: {text}")),
        Event::InfoChanged { text: None } => Some("info cleared".to_owned()),
        Event::AmmoConsumed { remaining } => Some(format!("ammo left: {remaining}")),
        Event::PlayerFired => Some("player fired".to_owned()),
        Event::KeyCollected => Some("key collected".to_owned()),
        Event::EnemyHit { enemy, remaining_hp } => Some(format!(
            "enemy {} hit, {} hp left",
            enemy.get(),
            remaining_hp
        )),
        Event::EnemyAlerted { enemy, alerted } => Some(format!(
            "enemy {} {}",
            enemy.get(),
            if *alerted { "alerted" } else { "calmed down" }
        )),
        Event::EnemyDestroyed { enemy } => Some(format!("enemy {} destroyed", enemy.get())),
        Event::ButtonPressed { button } => Some(format!("button {} pressed", button.get())),
        Event::ButtonLatched { button } => Some(format!("button {} latched", button.get())),
        Event::DoorFullyOpened { door } => Some(format!("door {} fully open", door.get())),
    }
}
