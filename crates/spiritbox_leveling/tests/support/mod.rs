//! In-memory store implementations for engine tests.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use spiritbox_core::{
    Achievement, Challenge, ChallengeType, Notification, Profile, UserAchievement, UserChallenge,
    XpBooster, level_from_xp,
};
use spiritbox_error::{DatabaseError, DatabaseErrorKind, DatabaseResult};
use spiritbox_interface::{
    AchievementStore, ChallengeStore, InsertOutcome, MessageAward, NotificationSink,
    PrestigeUpdate, ProfileStore, ResetPeriod, RewardGrant,
};
use spiritbox_social::{RoleReward, RoleRewardStore};

/// Profile store backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<(i64, i64), Profile>>,
}

impl MemoryProfileStore {
    pub fn with_profile(profile: Profile) -> Self {
        let store = Self::default();
        store
            .profiles
            .lock()
            .unwrap()
            .insert((profile.user_id, profile.guild_id), profile);
        store
    }

    pub fn snapshot(&self, user_id: i64, guild_id: i64) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&(user_id, guild_id)).cloned()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find(&self, user_id: i64, guild_id: i64) -> DatabaseResult<Option<Profile>> {
        Ok(self.snapshot(user_id, guild_id))
    }

    async fn get_or_create(&self, user_id: i64, guild_id: i64) -> DatabaseResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(profiles
            .entry((user_id, guild_id))
            .or_insert_with(|| Profile::new(user_id, guild_id, Utc::now()))
            .clone())
    }

    async fn apply_message_award(
        &self,
        user_id: i64,
        guild_id: i64,
        award: &MessageAward,
    ) -> DatabaseResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&(user_id, guild_id))
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
        profile.xp += award.xp_gained;
        profile.message_count += 1;
        profile.daily_xp += award.xp_gained;
        profile.weekly_xp += award.xp_gained;
        profile.monthly_xp += award.xp_gained;
        profile.message_streak = award.streak;
        profile.last_message_day = Some(award.day_number);
        profile.recompute_level();
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn apply_rewards(
        &self,
        user_id: i64,
        guild_id: i64,
        grant: &RewardGrant,
    ) -> DatabaseResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&(user_id, guild_id))
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
        profile.xp += grant.xp;
        profile.balance += grant.money;
        if grant.money > 0 {
            profile.total_earnings += grant.money;
        }
        for (item, quantity) in &grant.items {
            *profile.inventory.entry(item.clone()).or_insert(0) += quantity;
        }
        if let Some(booster) = &grant.booster {
            match profile.boosters.iter_mut().find(|b| b.name == booster.name) {
                Some(existing) => *existing = booster.clone(),
                None => profile.boosters.push(booster.clone()),
            }
        }
        if let Some(title) = &grant.title {
            if !profile.titles.contains(title) {
                profile.titles.push(title.clone());
            }
        }
        if let Some((id, points)) = &grant.achievement {
            profile.achievements.push(id.clone());
            profile.achievement_points += points;
        }
        if grant.completed_challenge {
            profile.completed_challenges += 1;
        }
        profile.recompute_level();
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_boosters(
        &self,
        user_id: i64,
        guild_id: i64,
        boosters: &[XpBooster],
    ) -> DatabaseResult<bool> {
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(&(user_id, guild_id)) {
            Some(profile) => {
                profile.boosters = boosters.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_prestige(
        &self,
        user_id: i64,
        guild_id: i64,
        update: &PrestigeUpdate,
    ) -> DatabaseResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&(user_id, guild_id))
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
        profile.xp = update.xp;
        profile.level = update.level;
        profile.prestige = update.prestige;
        profile.prestige_xp += update.prestige_xp_gain;
        profile.balance += update.money_bonus;
        profile.total_earnings += update.money_bonus;
        for (item, quantity) in &update.items {
            *profile.inventory.entry(item.clone()).or_insert(0) += quantity;
        }
        for title in &update.titles {
            if !profile.titles.contains(title) {
                profile.titles.push(title.clone());
            }
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn top_by_xp(&self, guild_id: i64, limit: i64) -> DatabaseResult<Vec<Profile>> {
        let mut rows: Vec<_> = self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.guild_id == guild_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| std::cmp::Reverse(p.xp));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn top_by_prestige(&self, guild_id: i64, limit: i64) -> DatabaseResult<Vec<Profile>> {
        let mut rows: Vec<_> = self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.guild_id == guild_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| std::cmp::Reverse((p.prestige, p.prestige_xp, p.xp)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn reset_periodic_counters(&self, period: ResetPeriod) -> DatabaseResult<u64> {
        let mut profiles = self.profiles.lock().unwrap();
        for profile in profiles.values_mut() {
            match period {
                ResetPeriod::Daily => profile.daily_xp = 0,
                ResetPeriod::Weekly => profile.weekly_xp = 0,
                ResetPeriod::Monthly => profile.monthly_xp = 0,
            }
        }
        Ok(profiles.len() as u64)
    }
}

/// Achievement store backed by mutex-guarded collections.
#[derive(Default)]
pub struct MemoryAchievementStore {
    pub definitions: Mutex<Vec<Achievement>>,
    unlocks: Mutex<HashMap<(i64, i64, String), UserAchievement>>,
    unlock_counts: Mutex<HashMap<String, i64>>,
}

impl MemoryAchievementStore {
    pub fn with_definitions(definitions: Vec<Achievement>) -> Self {
        Self {
            definitions: Mutex::new(definitions),
            ..Default::default()
        }
    }

    pub fn unlock_count(&self, achievement_id: &str) -> i64 {
        self.unlock_counts
            .lock()
            .unwrap()
            .get(achievement_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.unlocks.lock().unwrap().len()
    }
}

#[async_trait]
impl AchievementStore for MemoryAchievementStore {
    async fn list_enabled(&self) -> DatabaseResult<Vec<Achievement>> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.enabled)
            .cloned()
            .collect())
    }

    async fn unlocked_ids(&self, user_id: i64, guild_id: i64) -> DatabaseResult<HashSet<String>> {
        Ok(self
            .unlocks
            .lock()
            .unwrap()
            .keys()
            .filter(|(u, g, _)| *u == user_id && *g == guild_id)
            .map(|(_, _, id)| id.clone())
            .collect())
    }

    async fn find_unlock(
        &self,
        user_id: i64,
        guild_id: i64,
        achievement_id: &str,
    ) -> DatabaseResult<Option<UserAchievement>> {
        Ok(self
            .unlocks
            .lock()
            .unwrap()
            .get(&(user_id, guild_id, achievement_id.to_string()))
            .cloned())
    }

    async fn insert_if_absent(&self, record: &UserAchievement) -> DatabaseResult<InsertOutcome> {
        let mut unlocks = self.unlocks.lock().unwrap();
        let key = (
            record.user_id,
            record.guild_id,
            record.achievement_id.clone(),
        );
        if unlocks.contains_key(&key) {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            unlocks.insert(key, record.clone());
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn increment_unlock_count(&self, achievement_id: &str) -> DatabaseResult<()> {
        *self
            .unlock_counts
            .lock()
            .unwrap()
            .entry(achievement_id.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn upsert_definition(&self, definition: &Achievement) -> DatabaseResult<()> {
        let mut definitions = self.definitions.lock().unwrap();
        match definitions.iter_mut().find(|d| d.id == definition.id) {
            Some(existing) => *existing = definition.clone(),
            None => definitions.push(definition.clone()),
        }
        Ok(())
    }
}

/// A wrapper that always reports nothing unlocked, simulating two
/// concurrent evaluations that both read before either wrote.
pub struct RacingAchievementStore(pub MemoryAchievementStore);

#[async_trait]
impl AchievementStore for RacingAchievementStore {
    async fn list_enabled(&self) -> DatabaseResult<Vec<Achievement>> {
        self.0.list_enabled().await
    }

    async fn unlocked_ids(&self, _user_id: i64, _guild_id: i64) -> DatabaseResult<HashSet<String>> {
        Ok(HashSet::new())
    }

    async fn find_unlock(
        &self,
        user_id: i64,
        guild_id: i64,
        achievement_id: &str,
    ) -> DatabaseResult<Option<UserAchievement>> {
        self.0.find_unlock(user_id, guild_id, achievement_id).await
    }

    async fn insert_if_absent(&self, record: &UserAchievement) -> DatabaseResult<InsertOutcome> {
        self.0.insert_if_absent(record).await
    }

    async fn increment_unlock_count(&self, achievement_id: &str) -> DatabaseResult<()> {
        self.0.increment_unlock_count(achievement_id).await
    }

    async fn upsert_definition(&self, definition: &Achievement) -> DatabaseResult<()> {
        self.0.upsert_definition(definition).await
    }
}

/// Challenge store backed by mutex-guarded collections.
#[derive(Default)]
pub struct MemoryChallengeStore {
    pub instances: Mutex<Vec<Challenge>>,
    progress: Mutex<HashMap<(i64, i64, String), UserChallenge>>,
    completed_by: Mutex<HashMap<String, i64>>,
    pub fail_reads: Mutex<bool>,
}

impl MemoryChallengeStore {
    pub fn with_instances(instances: Vec<Challenge>) -> Self {
        Self {
            instances: Mutex::new(instances),
            ..Default::default()
        }
    }

    pub fn progress_of(&self, user_id: i64, guild_id: i64, challenge_id: &str) -> Option<UserChallenge> {
        self.progress
            .lock()
            .unwrap()
            .get(&(user_id, guild_id, challenge_id.to_string()))
            .cloned()
    }

    pub fn completed_by(&self, challenge_id: &str) -> i64 {
        self.completed_by
            .lock()
            .unwrap()
            .get(challenge_id)
            .copied()
            .unwrap_or(0)
    }

    fn check_failure(&self) -> DatabaseResult<()> {
        if *self.fail_reads.lock().unwrap() {
            return Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "injected failure".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn list_enabled(&self) -> DatabaseResult<Vec<Challenge>> {
        self.check_failure()?;
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.enabled)
            .cloned()
            .collect())
    }

    async fn find_progress(
        &self,
        user_id: i64,
        guild_id: i64,
        challenge_id: &str,
    ) -> DatabaseResult<Option<UserChallenge>> {
        self.check_failure()?;
        Ok(self.progress_of(user_id, guild_id, challenge_id))
    }

    async fn list_progress(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> DatabaseResult<Vec<UserChallenge>> {
        self.check_failure()?;
        Ok(self
            .progress
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id && r.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn insert_progress_if_absent(
        &self,
        record: &UserChallenge,
    ) -> DatabaseResult<InsertOutcome> {
        let mut progress = self.progress.lock().unwrap();
        let key = (
            record.user_id,
            record.guild_id,
            record.challenge_id.clone(),
        );
        if progress.contains_key(&key) {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            progress.insert(key, record.clone());
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn save_progress(&self, record: &UserChallenge) -> DatabaseResult<()> {
        let mut progress = self.progress.lock().unwrap();
        let key = (
            record.user_id,
            record.guild_id,
            record.challenge_id.clone(),
        );
        let stored = progress.entry(key).or_insert_with(|| record.clone());
        stored.progress = record.progress.clone();
        Ok(())
    }

    async fn mark_completed(
        &self,
        user_id: i64,
        guild_id: i64,
        challenge_id: &str,
        at: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let mut progress = self.progress.lock().unwrap();
        let key = (user_id, guild_id, challenge_id.to_string());
        match progress.get_mut(&key) {
            Some(record) if !record.completed => {
                record.completed = true;
                record.completed_at = Some(at);
                record.completion_count += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_completed_by(&self, challenge_id: &str) -> DatabaseResult<()> {
        *self
            .completed_by
            .lock()
            .unwrap()
            .entry(challenge_id.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn upsert_instance(&self, challenge: &Challenge) -> DatabaseResult<()> {
        let mut instances = self.instances.lock().unwrap();
        match instances.iter_mut().find(|c| c.id == challenge.id) {
            Some(existing) => *existing = challenge.clone(),
            None => instances.push(challenge.clone()),
        }
        Ok(())
    }

    async fn delete_expired(
        &self,
        types: &[ChallengeType],
        now: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        let mut instances = self.instances.lock().unwrap();
        let before = instances.len();
        instances.retain(|c| !types.contains(&c.challenge_type) || !c.is_expired(now));
        Ok((before - instances.len()) as u64)
    }
}

/// Role reward store over a fixed list.
#[derive(Default)]
pub struct MemoryRoleRewardStore(pub Mutex<Vec<RoleReward>>);

#[async_trait]
impl RoleRewardStore for MemoryRoleRewardStore {
    async fn list_for_guild(&self, guild_id: i64) -> DatabaseResult<Vec<RoleReward>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .copied()
            .collect())
    }

    async fn upsert(&self, reward: &RoleReward) -> DatabaseResult<()> {
        let mut rewards = self.0.lock().unwrap();
        match rewards
            .iter_mut()
            .find(|r| r.guild_id == reward.guild_id && r.level == reward.level)
        {
            Some(existing) => *existing = *reward,
            None => rewards.push(*reward),
        }
        Ok(())
    }
}

/// Sink that records everything it is handed.
#[derive(Default)]
pub struct RecordingSink(pub Mutex<Vec<Notification>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<Notification> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, event: Notification) {
        self.0.lock().unwrap().push(event);
    }
}

/// Sanity check used by several tests.
pub fn assert_level_consistent(profile: &Profile) {
    assert_eq!(profile.level, level_from_xp(profile.xp));
}
