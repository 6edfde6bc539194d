//! Persistence trait seams.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use spiritbox_core::{
    Achievement, Challenge, ChallengeType, Profile, RewardBundle, UserAchievement, UserChallenge,
    XpBooster,
};
use spiritbox_error::DatabaseResult;

/// Outcome of an optimistic insert against a unique constraint.
///
/// `AlreadyExists` is not an error: two concurrent evaluations racing on
/// the same key both succeed, and exactly one of them observes
/// `Inserted` and applies side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This call created the row.
    Inserted,
    /// Another call created the row first.
    AlreadyExists,
}

impl InsertOutcome {
    /// Whether this call won the insert race.
    pub fn inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// The single combined write for one counted message.
///
/// Everything here is applied in one atomic update keyed by
/// `(user_id, guild_id)`: counters as SQL increments, streak fields as
/// absolute values computed from the pre-award state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageAward {
    /// XP granted (post-multiplier)
    pub xp_gained: i64,
    /// Streak value after this message
    pub streak: i32,
    /// UTC day number stamped as the last message day
    pub day_number: i32,
}

/// A resolved reward application.
///
/// Produced from a [`RewardBundle`] at grant time: the booster expiry is
/// made absolute, and the triggering achievement/challenge bookkeeping
/// rides along so the store can apply everything in one profile write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewardGrant {
    /// Flat XP to add
    pub xp: i64,
    /// Flat balance to add (also added to total earnings)
    pub money: i64,
    /// Inventory increments, name → quantity
    pub items: BTreeMap<String, i64>,
    /// Booster to upsert by name
    pub booster: Option<XpBooster>,
    /// Title to append if not already held
    pub title: Option<String>,
    /// Achievement id to append plus its point value
    pub achievement: Option<(String, i32)>,
    /// Whether to bump the completed-challenge counter
    pub completed_challenge: bool,
}

impl RewardGrant {
    /// Resolve a definition-time bundle into an applicable grant.
    pub fn from_bundle(bundle: &RewardBundle, now: DateTime<Utc>) -> Self {
        Self {
            xp: bundle.xp,
            money: bundle.money,
            items: bundle.items.clone(),
            booster: bundle.booster.as_ref().map(|grant| XpBooster {
                name: grant.name.clone(),
                description: grant.description.clone(),
                multiplier: grant.multiplier,
                expires_at: now + Duration::hours(grant.duration_hours),
                added_at: now,
            }),
            title: bundle.title.clone(),
            achievement: None,
            completed_challenge: false,
        }
    }
}

/// The one-way prestige transform, applied as a single profile write.
#[derive(Debug, Clone, PartialEq)]
pub struct PrestigeUpdate {
    /// New (reduced) XP value
    pub xp: i64,
    /// Level recomputed from the new XP
    pub level: i32,
    /// New prestige tier
    pub prestige: i32,
    /// Amount added to the permanent prestige XP pool
    pub prestige_xp_gain: i64,
    /// Money bonus added to balance and total earnings
    pub money_bonus: i64,
    /// Items granted by the tier table
    pub items: BTreeMap<String, i64>,
    /// Titles granted by the tier table
    pub titles: Vec<String>,
}

/// Boundary at which periodic XP counters reset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResetPeriod {
    /// Zero `daily_xp`
    Daily,
    /// Zero `weekly_xp`
    Weekly,
    /// Zero `monthly_xp`
    Monthly,
}

/// Profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile, `None` when the user has never been seen here.
    async fn find(&self, user_id: i64, guild_id: i64) -> DatabaseResult<Option<Profile>>;

    /// Fetch-or-create; creation is an upsert safe under races.
    async fn get_or_create(&self, user_id: i64, guild_id: i64) -> DatabaseResult<Profile>;

    /// Apply the combined message award atomically and return the
    /// post-award profile with its level re-derived from XP.
    async fn apply_message_award(
        &self,
        user_id: i64,
        guild_id: i64,
        award: &MessageAward,
    ) -> DatabaseResult<Profile>;

    /// Apply a reward grant to the profile in one write and return the
    /// updated profile.
    async fn apply_rewards(
        &self,
        user_id: i64,
        guild_id: i64,
        grant: &RewardGrant,
    ) -> DatabaseResult<Profile>;

    /// Replace the booster list wholesale. Returns `false` when the
    /// profile does not exist.
    async fn set_boosters(
        &self,
        user_id: i64,
        guild_id: i64,
        boosters: &[XpBooster],
    ) -> DatabaseResult<bool>;

    /// Apply the prestige transform in one write and return the updated
    /// profile.
    async fn apply_prestige(
        &self,
        user_id: i64,
        guild_id: i64,
        update: &PrestigeUpdate,
    ) -> DatabaseResult<Profile>;

    /// Top profiles in a guild by XP.
    async fn top_by_xp(&self, guild_id: i64, limit: i64) -> DatabaseResult<Vec<Profile>>;

    /// Top profiles in a guild by `(prestige, prestige_xp, xp)` descending.
    async fn top_by_prestige(&self, guild_id: i64, limit: i64) -> DatabaseResult<Vec<Profile>>;

    /// Zero the periodic counter for a boundary across all profiles.
    /// Returns the number of profiles touched. Idempotent.
    async fn reset_periodic_counters(&self, period: ResetPeriod) -> DatabaseResult<u64>;
}

/// Achievement catalog and unlock persistence.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    /// All enabled definitions, global and guild-scoped alike.
    async fn list_enabled(&self) -> DatabaseResult<Vec<Achievement>>;

    /// Ids already unlocked by this user in this guild.
    async fn unlocked_ids(&self, user_id: i64, guild_id: i64) -> DatabaseResult<HashSet<String>>;

    /// One unlock record, `None` when the achievement is still locked.
    async fn find_unlock(
        &self,
        user_id: i64,
        guild_id: i64,
        achievement_id: &str,
    ) -> DatabaseResult<Option<UserAchievement>>;

    /// Optimistic insert of an unlock record; the unique constraint on
    /// `(user, guild, achievement)` is the source of truth.
    async fn insert_if_absent(&self, record: &UserAchievement) -> DatabaseResult<InsertOutcome>;

    /// Bump the definition's global unlock counter.
    async fn increment_unlock_count(&self, achievement_id: &str) -> DatabaseResult<()>;

    /// Insert or replace a catalog definition (seeding/administration).
    async fn upsert_definition(&self, definition: &Achievement) -> DatabaseResult<()>;
}

/// Challenge catalog and progress persistence.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// All enabled instances; window/guild filtering happens in memory.
    async fn list_enabled(&self) -> DatabaseResult<Vec<Challenge>>;

    /// One user's progress row, if any.
    async fn find_progress(
        &self,
        user_id: i64,
        guild_id: i64,
        challenge_id: &str,
    ) -> DatabaseResult<Option<UserChallenge>>;

    /// Every progress row a user holds in a guild.
    async fn list_progress(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> DatabaseResult<Vec<UserChallenge>>;

    /// Optimistic insert of a fresh progress row.
    async fn insert_progress_if_absent(
        &self,
        record: &UserChallenge,
    ) -> DatabaseResult<InsertOutcome>;

    /// Persist updated progress counters.
    async fn save_progress(&self, record: &UserChallenge) -> DatabaseResult<()>;

    /// Flip `completed` exactly once. Returns `true` only for the call
    /// that performed the flip; the guard is `WHERE completed = false`.
    async fn mark_completed(
        &self,
        user_id: i64,
        guild_id: i64,
        challenge_id: &str,
        at: DateTime<Utc>,
    ) -> DatabaseResult<bool>;

    /// Bump the instance's global completion counter.
    async fn increment_completed_by(&self, challenge_id: &str) -> DatabaseResult<()>;

    /// Insert or replace an instance; regeneration relies on this being
    /// idempotent under deterministic ids.
    async fn upsert_instance(&self, challenge: &Challenge) -> DatabaseResult<()>;

    /// Delete instances of the given types whose window has passed.
    /// Returns the number deleted.
    async fn delete_expired(
        &self,
        types: &[ChallengeType],
        now: DateTime<Utc>,
    ) -> DatabaseResult<u64>;
}
