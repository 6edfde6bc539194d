//! Prestige: the one-way reset-and-multiply transform at the level cap.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use spiritbox_core::{Profile, level_from_xp};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::{PrestigeUpdate, ProfileStore};

/// Level required before the transform is offered.
pub const PRESTIGE_LEVEL: i32 = 100;

/// Share of current XP converted into permanent prestige XP.
const PRESTIGE_XP_SHARE: f64 = 0.2;

/// Share of current XP carried over as a head start.
const CARRYOVER_SHARE: f64 = 0.1;

/// Money granted per prestige tier reached.
const MONEY_PER_TIER: i64 = 10_000;

/// One-time item grants keyed by the prestige tier that earns them.
const TIER_ITEMS: &[(i32, &str)] = &[
    (1, "spectral_lantern"),
    (5, "cursed_mirror"),
    (10, "ouija_board"),
];

/// Escalating titles keyed by the prestige tier that earns them.
const TIER_TITLES: &[(i32, &str)] = &[
    (1, "Apparition"),
    (3, "Poltergeist"),
    (5, "Banshee"),
    (10, "Revenant"),
    (15, "Demon"),
    (20, "Thaye"),
];

/// Passive bonuses a prestige tier confers.
///
/// The XP multiplier here is deliberately not folded into the
/// per-message multiplier pipeline; callers that want it compose it
/// themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeBonuses {
    /// Passive XP multiplier
    pub xp_multiplier: f64,
    /// Passive money multiplier
    pub money_multiplier: f64,
    /// Displayed level cap at this tier
    pub max_level: i32,
    /// Item rewards earned at or below this tier
    pub special_rewards: Vec<String>,
}

/// Pure tier → bonuses table.
pub fn prestige_bonuses(prestige: i32) -> PrestigeBonuses {
    let prestige = prestige.max(0);
    PrestigeBonuses {
        xp_multiplier: 1.0 + prestige as f64 * 0.1,
        money_multiplier: 1.0 + prestige as f64 * 0.05,
        max_level: 100 + prestige * 10,
        special_rewards: TIER_ITEMS
            .iter()
            .filter(|(tier, _)| *tier <= prestige)
            .map(|(_, item)| item.to_string())
            .collect(),
    }
}

/// Display-only composite of base level, tier, and prestige XP.
///
/// Never persisted as the canonical level.
pub fn effective_level(profile: &Profile) -> i32 {
    profile.level + profile.prestige * 100 + (profile.prestige_xp / 10_000) as i32
}

/// Result of a prestige attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrestigeOutcome {
    /// The transform was applied.
    Completed {
        /// Tier before the transform
        old_prestige: i32,
        /// Tier after the transform
        new_prestige: i32,
        /// Amount added to the permanent pool
        prestige_xp_gain: i64,
        /// Money granted for reaching the tier
        money_bonus: i64,
        /// Items granted by the tier table, if this tier has any
        special_rewards: Vec<String>,
        /// Titles granted by the tier table, if this tier has any
        titles: Vec<String>,
        /// XP after the burn
        new_xp: i64,
        /// Level derived from the new XP
        new_level: i32,
        /// Passive bonuses at the new tier
        bonuses: PrestigeBonuses,
    },
    /// The profile has not reached the level cap.
    NotEligible {
        /// Current level
        level: i32,
        /// Level required
        required: i32,
    },
    /// The user has no profile in this guild.
    NoProfile,
}

/// One row of the prestige leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeStanding {
    /// Discord user id
    pub user_id: i64,
    /// Prestige tier
    pub prestige: i32,
    /// Permanent prestige XP pool
    pub prestige_xp: i64,
    /// Current-band XP
    pub xp: i64,
    /// Display-only composite level
    pub effective_level: i32,
}

/// State machine over a profile's prestige dimension.
pub struct PrestigeManager {
    profiles: Arc<dyn ProfileStore>,
}

impl PrestigeManager {
    /// Create a manager over a profile store.
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Whether a profile qualifies for the transform.
    pub fn is_eligible(profile: &Profile) -> bool {
        level_from_xp(profile.xp) >= PRESTIGE_LEVEL
    }

    /// Attempt the transform. Ineligibility is a tagged outcome, never
    /// an error; only store failures propagate.
    #[instrument(skip(self))]
    pub async fn perform_prestige(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> DatabaseResult<PrestigeOutcome> {
        let Some(profile) = self.profiles.find(user_id, guild_id).await? else {
            return Ok(PrestigeOutcome::NoProfile);
        };

        if !Self::is_eligible(&profile) {
            return Ok(PrestigeOutcome::NotEligible {
                level: profile.level,
                required: PRESTIGE_LEVEL,
            });
        }

        let old_prestige = profile.prestige;
        let new_prestige = old_prestige + 1;
        let prestige_xp_gain = (profile.xp as f64 * PRESTIGE_XP_SHARE).floor() as i64;
        let new_xp = (profile.xp as f64 * CARRYOVER_SHARE).floor() as i64;
        let new_level = level_from_xp(new_xp);
        let money_bonus = MONEY_PER_TIER * new_prestige as i64;

        let special_rewards: Vec<String> = TIER_ITEMS
            .iter()
            .filter(|(tier, _)| *tier == new_prestige)
            .map(|(_, item)| item.to_string())
            .collect();
        let titles: Vec<String> = TIER_TITLES
            .iter()
            .filter(|(tier, _)| *tier == new_prestige)
            .map(|(_, title)| title.to_string())
            .collect();

        let update = PrestigeUpdate {
            xp: new_xp,
            level: new_level,
            prestige: new_prestige,
            prestige_xp_gain,
            money_bonus,
            items: special_rewards
                .iter()
                .map(|item| (item.clone(), 1))
                .collect::<BTreeMap<_, _>>(),
            titles: titles.clone(),
        };
        self.profiles.apply_prestige(user_id, guild_id, &update).await?;

        info!(
            user_id,
            guild_id,
            old_prestige,
            new_prestige,
            prestige_xp_gain,
            "Prestige applied"
        );

        Ok(PrestigeOutcome::Completed {
            old_prestige,
            new_prestige,
            prestige_xp_gain,
            money_bonus,
            special_rewards,
            titles,
            new_xp,
            new_level,
            bonuses: prestige_bonuses(new_prestige),
        })
    }

    /// Top prestige standings for a guild. Pure read.
    pub async fn leaderboard(
        &self,
        guild_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<PrestigeStanding>> {
        let profiles = self.profiles.top_by_prestige(guild_id, limit).await?;
        Ok(profiles
            .iter()
            .map(|profile| PrestigeStanding {
                user_id: profile.user_id,
                prestige: profile.prestige,
                prestige_xp: profile.prestige_xp,
                xp: profile.xp,
                effective_level: effective_level(profile),
            })
            .collect())
    }
}
