//! Row types and domain conversions.
//!
//! Sparse bags (requirements, rewards, boosters, progress, inventory)
//! live in jsonb columns and round-trip through serde. Enum-valued
//! columns (category, rarity, challenge type) are stored as their
//! snake_case names and parsed on read; a row that fails to parse is a
//! serialization error, not a silent default.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;

use spiritbox_core::{
    Achievement, AchievementCategory, AchievementRequirements, Challenge, ChallengeRequirements,
    ChallengeType, Profile, Rarity, RewardBundle, UserAchievement, UserChallenge, XpBooster,
};
use spiritbox_error::{DatabaseError, DatabaseErrorKind, DatabaseResult};
use spiritbox_social::{GreetingConfig, RoleReward};

fn parse_enum<T: FromStr>(value: &str, what: &str) -> DatabaseResult<T> {
    T::from_str(value).map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Serialization(format!(
            "unrecognized {}: '{}'",
            what, value
        )))
    })
}

/// Database row for the profiles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(primary_key(user_id, guild_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileRow {
    pub user_id: i64,
    pub guild_id: i64,

    pub xp: i64,
    pub level: i32,
    pub prestige: i32,
    pub prestige_xp: i64,

    pub message_count: i64,
    pub message_streak: i32,
    pub last_message_day: Option<i32>,
    pub daily_xp: i64,
    pub weekly_xp: i64,
    pub monthly_xp: i64,

    pub balance: i64,
    pub total_earnings: i64,
    pub money_spent: i64,

    pub sanity: i32,
    pub total_investigations: i32,
    pub successful_investigations: i32,
    pub total_hunts: i32,
    pub successful_hunts: i32,
    pub hunt_streak: i32,
    pub nightmare_hunts: i32,
    pub items_used: i32,
    pub photos_taken: i32,
    pub ghosts_exorcised: i32,

    pub boosters: serde_json::Value,
    pub premium_until: Option<DateTime<Utc>>,

    pub achievements: serde_json::Value,
    pub achievement_points: i32,
    pub completed_challenges: i32,

    pub inventory: serde_json::Value,
    pub titles: serde_json::Value,
    pub active_title: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DatabaseError;

    fn try_from(row: ProfileRow) -> DatabaseResult<Profile> {
        Ok(Profile {
            user_id: row.user_id,
            guild_id: row.guild_id,
            xp: row.xp,
            level: row.level,
            prestige: row.prestige,
            prestige_xp: row.prestige_xp,
            message_count: row.message_count,
            message_streak: row.message_streak,
            last_message_day: row.last_message_day,
            daily_xp: row.daily_xp,
            weekly_xp: row.weekly_xp,
            monthly_xp: row.monthly_xp,
            balance: row.balance,
            total_earnings: row.total_earnings,
            money_spent: row.money_spent,
            sanity: row.sanity,
            total_investigations: row.total_investigations,
            successful_investigations: row.successful_investigations,
            total_hunts: row.total_hunts,
            successful_hunts: row.successful_hunts,
            hunt_streak: row.hunt_streak,
            nightmare_hunts: row.nightmare_hunts,
            items_used: row.items_used,
            photos_taken: row.photos_taken,
            ghosts_exorcised: row.ghosts_exorcised,
            boosters: serde_json::from_value::<Vec<XpBooster>>(row.boosters)?,
            premium_until: row.premium_until,
            achievements: serde_json::from_value(row.achievements)?,
            achievement_points: row.achievement_points,
            completed_challenges: row.completed_challenges,
            inventory: serde_json::from_value(row.inventory)?,
            titles: serde_json::from_value(row.titles)?,
            active_title: row.active_title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable struct for fresh profile rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::profiles)]
pub struct NewProfile {
    pub(crate) user_id: i64,
    pub(crate) guild_id: i64,
    pub(crate) sanity: i32,
    pub(crate) boosters: serde_json::Value,
    pub(crate) achievements: serde_json::Value,
    pub(crate) inventory: serde_json::Value,
    pub(crate) titles: serde_json::Value,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl NewProfile {
    /// Fresh row for a user/guild pair; everything else takes the
    /// schema defaults.
    pub fn fresh(user_id: i64, guild_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            guild_id,
            sanity: 100,
            boosters: serde_json::json!([]),
            achievements: serde_json::json!([]),
            inventory: serde_json::json!({}),
            titles: serde_json::json!([]),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Database row for the achievements catalog table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::achievements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AchievementRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub rarity: String,
    pub points: i32,
    pub guild_id: Option<i64>,
    pub enabled: bool,
    pub requirements: serde_json::Value,
    pub rewards: serde_json::Value,
    pub unlock_count: i64,
}

impl TryFrom<AchievementRow> for Achievement {
    type Error = DatabaseError;

    fn try_from(row: AchievementRow) -> DatabaseResult<Achievement> {
        Ok(Achievement {
            id: row.id,
            name: row.name,
            description: row.description,
            category: parse_enum::<AchievementCategory>(&row.category, "achievement category")?,
            requirements: serde_json::from_value::<AchievementRequirements>(row.requirements)?,
            rewards: serde_json::from_value::<RewardBundle>(row.rewards)?,
            rarity: parse_enum::<Rarity>(&row.rarity, "rarity")?,
            points: row.points,
            guild_id: row.guild_id,
            enabled: row.enabled,
        })
    }
}

impl AchievementRow {
    /// Row for inserting/replacing a definition. The unlock counter
    /// starts at zero and is preserved on conflict.
    pub fn from_definition(definition: &Achievement) -> DatabaseResult<Self> {
        Ok(Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            category: definition.category.to_string(),
            rarity: definition.rarity.to_string(),
            points: definition.points,
            guild_id: definition.guild_id,
            enabled: definition.enabled,
            requirements: serde_json::to_value(&definition.requirements)?,
            rewards: serde_json::to_value(&definition.rewards)?,
            unlock_count: 0,
        })
    }
}

/// Database row for the user_achievements join table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::user_achievements)]
#[diesel(primary_key(user_id, guild_id, achievement_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserAchievementRow {
    pub user_id: i64,
    pub guild_id: i64,
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

impl From<UserAchievementRow> for UserAchievement {
    fn from(row: UserAchievementRow) -> UserAchievement {
        UserAchievement {
            user_id: row.user_id,
            guild_id: row.guild_id,
            achievement_id: row.achievement_id,
            unlocked_at: row.unlocked_at,
        }
    }
}

/// Insertable struct for unlock records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::user_achievements)]
pub struct NewUserAchievement {
    pub(crate) user_id: i64,
    pub(crate) guild_id: i64,
    pub(crate) achievement_id: String,
    pub(crate) unlocked_at: DateTime<Utc>,
}

impl From<&UserAchievement> for NewUserAchievement {
    fn from(record: &UserAchievement) -> Self {
        Self {
            user_id: record.user_id,
            guild_id: record.guild_id,
            achievement_id: record.achievement_id.clone(),
            unlocked_at: record.unlocked_at,
        }
    }
}

/// Database row for the challenges catalog table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::challenges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChallengeRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub challenge_type: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub guild_id: Option<i64>,
    pub max_completions: i32,
    pub enabled: bool,
    pub requirements: serde_json::Value,
    pub rewards: serde_json::Value,
    pub completed_by: i64,
}

impl TryFrom<ChallengeRow> for Challenge {
    type Error = DatabaseError;

    fn try_from(row: ChallengeRow) -> DatabaseResult<Challenge> {
        Ok(Challenge {
            id: row.id,
            name: row.name,
            description: row.description,
            challenge_type: parse_enum::<ChallengeType>(&row.challenge_type, "challenge type")?,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            requirements: serde_json::from_value::<ChallengeRequirements>(row.requirements)?,
            rewards: serde_json::from_value::<RewardBundle>(row.rewards)?,
            guild_id: row.guild_id,
            max_completions: row.max_completions,
            enabled: row.enabled,
        })
    }
}

impl ChallengeRow {
    /// Row for inserting/replacing an instance.
    pub fn from_instance(challenge: &Challenge) -> DatabaseResult<Self> {
        Ok(Self {
            id: challenge.id.clone(),
            name: challenge.name.clone(),
            description: challenge.description.clone(),
            challenge_type: challenge.challenge_type.to_string(),
            starts_at: challenge.starts_at,
            ends_at: challenge.ends_at,
            guild_id: challenge.guild_id,
            max_completions: challenge.max_completions,
            enabled: challenge.enabled,
            requirements: serde_json::to_value(&challenge.requirements)?,
            rewards: serde_json::to_value(&challenge.rewards)?,
            completed_by: 0,
        })
    }
}

/// Database row for the user_challenges join table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::user_challenges)]
#[diesel(primary_key(user_id, guild_id, challenge_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserChallengeRow {
    pub user_id: i64,
    pub guild_id: i64,
    pub challenge_id: String,
    pub progress: serde_json::Value,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_count: i32,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserChallengeRow> for UserChallenge {
    type Error = DatabaseError;

    fn try_from(row: UserChallengeRow) -> DatabaseResult<UserChallenge> {
        Ok(UserChallenge {
            user_id: row.user_id,
            guild_id: row.guild_id,
            challenge_id: row.challenge_id,
            progress: serde_json::from_value(row.progress)?,
            completed: row.completed,
            completed_at: row.completed_at,
            completion_count: row.completion_count,
        })
    }
}

/// Insertable struct for fresh progress rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::user_challenges)]
pub struct NewUserChallenge {
    pub(crate) user_id: i64,
    pub(crate) guild_id: i64,
    pub(crate) challenge_id: String,
    pub(crate) progress: serde_json::Value,
    pub(crate) completed: bool,
    pub(crate) completion_count: i32,
    pub(crate) updated_at: DateTime<Utc>,
}

impl NewUserChallenge {
    /// Row for a progress record, stamped at `now`.
    pub fn from_record(record: &UserChallenge, now: DateTime<Utc>) -> DatabaseResult<Self> {
        Ok(Self {
            user_id: record.user_id,
            guild_id: record.guild_id,
            challenge_id: record.challenge_id.clone(),
            progress: serde_json::to_value(&record.progress)?,
            completed: record.completed,
            completion_count: record.completion_count,
            updated_at: now,
        })
    }
}

/// Database row for the greeting_configs table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::greeting_configs)]
#[diesel(primary_key(guild_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GreetingConfigRow {
    pub guild_id: i64,
    pub welcome_enabled: bool,
    pub welcome_channel_id: Option<i64>,
    pub welcome_template: String,
    pub farewell_enabled: bool,
    pub farewell_channel_id: Option<i64>,
    pub farewell_template: String,
    pub updated_at: DateTime<Utc>,
}

impl From<GreetingConfigRow> for GreetingConfig {
    fn from(row: GreetingConfigRow) -> GreetingConfig {
        GreetingConfig {
            guild_id: row.guild_id,
            welcome_enabled: row.welcome_enabled,
            welcome_channel_id: row.welcome_channel_id,
            welcome_template: row.welcome_template,
            farewell_enabled: row.farewell_enabled,
            farewell_channel_id: row.farewell_channel_id,
            farewell_template: row.farewell_template,
        }
    }
}

impl GreetingConfigRow {
    /// Row for inserting/replacing a guild's configuration.
    pub fn from_config(config: &GreetingConfig, now: DateTime<Utc>) -> Self {
        Self {
            guild_id: config.guild_id,
            welcome_enabled: config.welcome_enabled,
            welcome_channel_id: config.welcome_channel_id,
            welcome_template: config.welcome_template.clone(),
            farewell_enabled: config.farewell_enabled,
            farewell_channel_id: config.farewell_channel_id,
            farewell_template: config.farewell_template.clone(),
            updated_at: now,
        }
    }
}

/// Database row for the role_rewards table.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::role_rewards)]
#[diesel(primary_key(guild_id, level))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleRewardRow {
    pub guild_id: i64,
    pub level: i32,
    pub role_id: i64,
}

impl From<RoleRewardRow> for RoleReward {
    fn from(row: RoleRewardRow) -> RoleReward {
        RoleReward {
            guild_id: row.guild_id,
            level: row.level,
            role_id: row.role_id,
        }
    }
}

impl From<&RoleReward> for RoleRewardRow {
    fn from(reward: &RoleReward) -> Self {
        Self {
            guild_id: reward.guild_id,
            level: reward.level,
            role_id: reward.role_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_achievement_row_round_trip() {
        let definition = Achievement {
            id: "chatty".into(),
            name: "Chatty Investigator".into(),
            description: "Send 10 messages".into(),
            category: AchievementCategory::Activity,
            requirements: AchievementRequirements {
                message_count: Some(10),
                ..Default::default()
            },
            rewards: RewardBundle {
                xp: 100,
                ..Default::default()
            },
            rarity: Rarity::Common,
            points: 10,
            guild_id: None,
            enabled: true,
        };
        let row = AchievementRow::from_definition(&definition).unwrap();
        let back: Achievement = row.try_into().unwrap();
        assert_eq!(back, definition);
    }

    #[test]
    fn test_unknown_enum_value_is_serialization_error() {
        let mut row = AchievementRow::from_definition(&Achievement {
            id: "x".into(),
            name: String::new(),
            description: String::new(),
            category: AchievementCategory::Special,
            requirements: AchievementRequirements::default(),
            rewards: RewardBundle::default(),
            rarity: Rarity::Common,
            points: 0,
            guild_id: None,
            enabled: true,
        })
        .unwrap();
        row.rarity = "mythic".into();
        assert!(Achievement::try_from(row).is_err());
    }

    #[test]
    fn test_challenge_row_round_trip() {
        let challenge = Challenge {
            id: "daily-2026-03-10-ghost-stories".into(),
            name: "Ghost Stories".into(),
            description: String::new(),
            challenge_type: ChallengeType::Daily,
            starts_at: Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap(),
            requirements: [("send_messages".to_string(), 20)].into_iter().collect(),
            rewards: RewardBundle::default(),
            guild_id: Some(9),
            max_completions: 1,
            enabled: true,
        };
        let row = ChallengeRow::from_instance(&challenge).unwrap();
        let back: Challenge = row.try_into().unwrap();
        assert_eq!(back, challenge);
    }
}
