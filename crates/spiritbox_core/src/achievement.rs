//! Achievement catalog definitions and unlock records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spiritbox_error::{CatalogError, CatalogErrorKind, CatalogResult};

use crate::requirements::AchievementRequirements;
use crate::rewards::RewardBundle;

/// Broad grouping for display and filtering.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    /// Level and XP milestones
    Progression,
    /// Message counts and streaks
    Activity,
    /// Balance and earnings milestones
    Economy,
    /// Investigation outcomes
    Investigation,
    /// Hunt outcomes
    Hunting,
    /// Everything else
    Special,
}

/// Drop-rate flavor used for display and point weighting.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Most members will earn these
    Common,
    /// Takes sustained activity
    Uncommon,
    /// Takes dedication
    Rare,
    /// Few members ever qualify
    Epic,
    /// Server legends only
    Legendary,
}

/// A permanent, snapshot-evaluated, exactly-once-unlockable milestone.
///
/// Definitions are immutable at evaluation time; the manager works off a
/// loaded catalog snapshot, never a live row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    /// Stable catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Grouping
    pub category: AchievementCategory,
    /// Thresholds that must all hold
    #[serde(default)]
    pub requirements: AchievementRequirements,
    /// What unlocking grants
    #[serde(default)]
    pub rewards: RewardBundle,
    /// Display rarity
    pub rarity: Rarity,
    /// Points added to the profile's achievement score
    pub points: i32,
    /// Some: only this guild; None: global
    #[serde(default)]
    pub guild_id: Option<i64>,
    /// Disabled definitions are never evaluated
    pub enabled: bool,
}

impl Achievement {
    /// Whether this definition applies in the given guild.
    pub fn applies_to(&self, guild_id: i64) -> bool {
        self.enabled && self.guild_id.is_none_or(|scoped| scoped == guild_id)
    }

    /// Validate the definition for catalog admission.
    ///
    /// Rejects unknown custom-condition names here so typos surface at
    /// load time instead of failing closed silently at evaluation.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.id.is_empty() {
            return Err(CatalogError::new(CatalogErrorKind::InvalidDefinition {
                definition: "<unnamed>".into(),
                reason: "empty id".into(),
            }));
        }
        if let Some(Err(name)) = self.requirements.parsed_condition() {
            return Err(CatalogError::new(CatalogErrorKind::UnknownCondition {
                definition: self.id.clone(),
                condition: name,
            }));
        }
        Ok(())
    }
}

/// Record of one user's unlock of one achievement in one guild.
///
/// Existence of this record is the source of truth for "already
/// unlocked"; creation is exactly-once per `(user, guild, achievement)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievement {
    /// Discord user id
    pub user_id: i64,
    /// Discord guild id
    pub guild_id: i64,
    /// Catalog id of the unlocked achievement
    pub achievement_id: String,
    /// Instant of the unlock
    pub unlocked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: &str) -> Achievement {
        Achievement {
            id: id.into(),
            name: "Ghost Whisperer".into(),
            description: "Identify ten ghosts".into(),
            category: AchievementCategory::Investigation,
            requirements: AchievementRequirements::default(),
            rewards: RewardBundle::default(),
            rarity: Rarity::Uncommon,
            points: 25,
            guild_id: None,
            enabled: true,
        }
    }

    #[test]
    fn test_global_applies_everywhere() {
        assert!(definition("a").applies_to(1));
        assert!(definition("a").applies_to(2));
    }

    #[test]
    fn test_guild_scoping() {
        let mut scoped = definition("a");
        scoped.guild_id = Some(42);
        assert!(scoped.applies_to(42));
        assert!(!scoped.applies_to(43));
    }

    #[test]
    fn test_disabled_never_applies() {
        let mut disabled = definition("a");
        disabled.enabled = false;
        assert!(!disabled.applies_to(1));
    }

    #[test]
    fn test_validate_rejects_unknown_condition() {
        let mut bad = definition("haunted");
        bad.requirements.custom_condition = Some("blood_moon".into());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_known_condition() {
        let mut good = definition("haunted");
        good.requirements.custom_condition = Some("low_sanity".into());
        assert!(good.validate().is_ok());
    }
}
