//! Built-in campaign embedded as a JSON asset.

use serde::Deserialize;
use squarelife_core::LevelId;

use crate::{Level, LevelError, PlayerTuning};

const CAMPAIGN_JSON: &str = include_str!("../assets/campaign.json");

/// A named sequence of levels sharing one player tuning block.
#[derive(Clone, Debug, Deserialize)]
pub struct Campaign {
    meta: CampaignMeta,
    player: PlayerTuning,
    levels: Vec<Level>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CampaignMeta {
    game_id: String,
    build: String,
}

impl Campaign {
    /// Loads and validates the campaign shipped with the engine.
    pub fn builtin() -> Result<Self, LevelError> {
        Self::from_json(CAMPAIGN_JSON)
    }

    /// Parses a campaign document and validates every contained level.
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let campaign: Self = serde_json::from_str(text)?;
        for level in &campaign.levels {
            level.validate()?;
        }
        Ok(campaign)
    }

    /// Campaign identifier from the meta block.
    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.meta.game_id
    }

    /// Build string from the meta block.
    #[must_use]
    pub fn build(&self) -> &str {
        &self.meta.build
    }

    /// Player tuning shared by every level.
    #[must_use]
    pub const fn player(&self) -> PlayerTuning {
        self.player
    }

    /// Looks up a level by its identifier.
    #[must_use]
    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.iter().find(|level| level.id == id)
    }

    /// First level of the campaign, where a fresh run begins.
    #[must_use]
    pub fn first_level(&self) -> Option<&Level> {
        self.levels.first()
    }

    /// All levels in authored order.
    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squarelife_core::Archetype;

    #[test]
    fn builtin_campaign_parses_and_validates() {
        let campaign = Campaign::builtin().expect("builtin campaign loads");
        assert_eq!(campaign.game_id(), "a_squares_life");
        assert_eq!(campaign.levels().len(), 6);
        for (index, level) in campaign.levels().iter().enumerate() {
            assert_eq!(level.id, LevelId::new(index as u32 + 1));
        }
    }

    #[test]
    fn builtin_tuning_matches_defaults() {
        let campaign = Campaign::builtin().expect("builtin campaign loads");
        assert_eq!(campaign.player(), PlayerTuning::default());
    }

    #[test]
    fn campaign_wraps_around_after_the_ending() {
        let campaign = Campaign::builtin().expect("builtin campaign loads");
        let last = campaign.level(LevelId::new(6)).expect("final level");
        assert_eq!(last.exit.to, LevelId::new(1));
        assert!(last.ending.is_some());
        assert!(last
            .enemies
            .iter()
            .any(|spawn| spawn.kind == Archetype::Rapid));
    }

    #[test]
    fn locked_level_defines_its_key() {
        let campaign = Campaign::builtin().expect("builtin campaign loads");
        let locked = campaign.level(LevelId::new(3)).expect("locked level");
        assert!(locked.has_key);
        assert!(locked.key_pos.is_some());
    }
}
