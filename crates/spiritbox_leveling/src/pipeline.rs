//! The per-message XP award flow.
//!
//! Stage order is load-bearing: the multiplier sees pre-award state,
//! the achievement and challenge checks see post-award state, and a
//! failure in the best-effort stages never rolls back the award.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use spiritbox_cache::{CooldownTracker, TtlCache, TtlCacheConfig};
use spiritbox_core::{
    ChallengeAction, LevelUpCheck, Notification, Profile, check_level_up,
};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::{MessageAward, NotificationSink, ProfileStore};
use spiritbox_social::{RoleRewardStore, resolve_crossed_rewards};

use crate::achievements::{AchievementManager, Unlock};
use crate::challenges::{ChallengeCompletion, ChallengeManager};
use crate::multiplier::{
    MultiplierBreakdown, MultiplierOptions, XpMultiplierEngine, compute_multiplier,
};

/// Pipeline tuning knobs.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct PipelineConfig {
    /// Seconds a member must wait between counted messages
    cooldown_secs: u64,
    /// Inclusive lower bound of the base XP roll
    base_xp_min: i64,
    /// Inclusive upper bound of the base XP roll
    base_xp_max: i64,
    /// Profile cache entry lifetime in seconds
    cache_ttl_secs: u64,
    /// Profile cache bound
    cache_max_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 60,
            base_xp_min: 15,
            base_xp_max: 25,
            cache_ttl_secs: 300,
            cache_max_size: 5_000,
        }
    }
}

impl PipelineConfig {
    /// Set the cooldown window in seconds.
    pub fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    /// Set the inclusive base XP roll range.
    pub fn with_base_xp_range(mut self, min: i64, max: i64) -> Self {
        self.base_xp_min = min;
        self.base_xp_max = max;
        self
    }
}

/// An inbound chat message, as delivered by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessageEvent {
    /// Discord user id
    pub user_id: i64,
    /// Discord guild id
    pub guild_id: i64,
    /// Message length in characters
    pub content_length: usize,
    /// Gateway timestamp
    pub timestamp: DateTime<Utc>,
}

/// What one counted message produced.
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    /// XP granted after the multiplier
    pub xp_gained: i64,
    /// The multiplier breakdown used
    pub multiplier: MultiplierBreakdown,
    /// Level comparison across the award
    pub level_up: Option<LevelUpCheck>,
    /// Achievements unlocked by this message
    pub unlocked: Vec<Unlock>,
    /// Challenges completed by this message
    pub completed: Vec<ChallengeCompletion>,
}

/// Composes the progression engine for each inbound chat message.
pub struct MessagePipeline {
    config: PipelineConfig,
    profiles: Arc<dyn ProfileStore>,
    achievements: Arc<AchievementManager>,
    challenges: Arc<ChallengeManager>,
    boosters: XpMultiplierEngine,
    role_rewards: Arc<dyn RoleRewardStore>,
    sink: Arc<dyn NotificationSink>,
    cooldowns: Mutex<CooldownTracker>,
    cache: Mutex<TtlCache<(i64, i64), Profile>>,
}

impl MessagePipeline {
    /// Wire up the pipeline.
    pub fn new(
        config: PipelineConfig,
        profiles: Arc<dyn ProfileStore>,
        achievements: Arc<AchievementManager>,
        challenges: Arc<ChallengeManager>,
        role_rewards: Arc<dyn RoleRewardStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let cooldowns = CooldownTracker::new(Duration::from_secs(config.cooldown_secs));
        let cache = TtlCache::new(
            TtlCacheConfig::default()
                .with_default_ttl(config.cache_ttl_secs)
                .with_max_size(config.cache_max_size),
        );
        Self {
            boosters: XpMultiplierEngine::new(profiles.clone()),
            config,
            profiles,
            achievements,
            challenges,
            role_rewards,
            sink,
            cooldowns: Mutex::new(cooldowns),
            cache: Mutex::new(cache),
        }
    }

    /// Handle one inbound message.
    ///
    /// Returns `None` when the member is inside their cooldown window
    /// (no side effects happened). Errors from the critical path
    /// (fetch, award, persist) propagate; the notification, achievement,
    /// and challenge stages are each best-effort.
    #[instrument(skip(self, event), fields(user_id = event.user_id, guild_id = event.guild_id))]
    pub async fn handle_message(
        &self,
        event: &MessageEvent,
    ) -> DatabaseResult<Option<MessageOutcome>> {
        let now = event.timestamp;

        // Stage 1: cooldown gate, before any I/O.
        if !self
            .cooldowns
            .lock()
            .expect("cooldown lock")
            .check_and_touch(event.user_id, event.guild_id)
        {
            return Ok(None);
        }

        // Stage 2: profile resolution, cache first. The guard drops
        // before any await.
        let cached = self
            .cache
            .lock()
            .expect("profile cache lock")
            .get(&(event.user_id, event.guild_id))
            .cloned();
        let profile = match cached {
            Some(profile) => profile,
            None => {
                self.profiles
                    .get_or_create(event.user_id, event.guild_id)
                    .await?
            }
        };

        // Stage 3: streak, computed against pre-award state.
        let streak = profile.next_streak(now);

        // Stage 4: multiplier over pre-award state.
        let options = MultiplierOptions {
            message_length: Some(event.content_length),
        };
        let multiplier = compute_multiplier(&profile, now, &options);

        // Stage 5: XP roll.
        let base_xp =
            rand::thread_rng().gen_range(self.config.base_xp_min..=self.config.base_xp_max);
        let xp_gained = (base_xp as f64 * multiplier.total).floor() as i64;

        // Stage 6: single combined atomic write.
        let award = MessageAward {
            xp_gained,
            streak: streak.streak,
            day_number: streak.day_number,
        };
        let updated = self
            .profiles
            .apply_message_award(event.user_id, event.guild_id, &award)
            .await?;
        self.cache
            .lock()
            .expect("profile cache lock")
            .insert((event.user_id, event.guild_id), updated.clone(), None);

        debug!(xp_gained, total_multiplier = multiplier.total, "XP awarded");

        // Booster maintenance rides behind the award so the multiplier
        // read path itself never writes.
        if profile.has_expired_boosters(now) {
            if let Err(error) = self
                .boosters
                .prune_expired_boosters(event.user_id, event.guild_id, now)
                .await
            {
                warn!(%error, "Booster pruning failed");
            }
        }

        // Stage 7: level-up side effects, best-effort.
        let check = check_level_up(profile.xp, updated.xp);
        let level_up = check.leveled_up.then_some(check);
        if check.leveled_up {
            self.announce_level_up(event, &check, xp_gained).await;
        }

        // Stage 8: achievement check over post-award state, best-effort
        // and isolated from stage 9.
        let unlocked = match self
            .achievements
            .check_achievements(event.user_id, event.guild_id, &updated, now)
            .await
        {
            Ok(unlocks) => unlocks,
            Err(error) => {
                warn!(%error, "Achievement check failed");
                Vec::new()
            }
        };
        for unlock in &unlocked {
            self.sink
                .notify(Notification::AchievementUnlocked {
                    user_id: event.user_id,
                    guild_id: event.guild_id,
                    achievement: unlock.achievement.clone(),
                })
                .await;
        }

        // Stage 9: challenge progress, best-effort.
        let completed = self.advance_challenges(event, xp_gained, now).await;
        for completion in &completed {
            self.sink
                .notify(Notification::ChallengeCompleted {
                    user_id: event.user_id,
                    guild_id: event.guild_id,
                    challenge: completion.challenge.clone(),
                })
                .await;
        }

        // Rewards from the later stages invalidate the cached copy.
        if !unlocked.is_empty() || !completed.is_empty() {
            self.cache
                .lock()
                .expect("profile cache lock")
                .invalidate(&(event.user_id, event.guild_id));
        }

        Ok(Some(MessageOutcome {
            xp_gained,
            multiplier,
            level_up,
            unlocked,
            completed,
        }))
    }

    /// Drop expired cache entries and stale cooldown stamps. Called on
    /// a timer by the host; the hot path never pays for the sweep.
    pub fn sweep_caches(&self) {
        let expired = self
            .cache
            .lock()
            .expect("profile cache lock")
            .cleanup_expired();
        let stale = self.cooldowns.lock().expect("cooldown lock").sweep();
        if expired > 0 || stale > 0 {
            debug!(expired, stale, "Swept pipeline caches");
        }
    }

    async fn announce_level_up(&self, event: &MessageEvent, check: &LevelUpCheck, xp_gained: i64) {
        let role_rewards = match self.role_rewards.list_for_guild(event.guild_id).await {
            Ok(rewards) => resolve_crossed_rewards(&rewards, check.old_level, check.new_level),
            Err(error) => {
                warn!(%error, "Role reward lookup failed");
                Vec::new()
            }
        };

        self.sink
            .notify(Notification::LevelUp {
                user_id: event.user_id,
                guild_id: event.guild_id,
                old_level: check.old_level,
                new_level: check.new_level,
                xp_gained,
                role_rewards,
            })
            .await;
    }

    async fn advance_challenges(
        &self,
        event: &MessageEvent,
        xp_gained: i64,
        now: DateTime<Utc>,
    ) -> Vec<ChallengeCompletion> {
        let mut completed = Vec::new();

        match self
            .challenges
            .update_progress(event.user_id, event.guild_id, ChallengeAction::SendMessage, 1, now)
            .await
        {
            Ok(completions) => completed.extend(completions),
            Err(error) => warn!(%error, "Challenge progress (send_message) failed"),
        }

        if xp_gained > 0 {
            match self
                .challenges
                .update_progress(
                    event.user_id,
                    event.guild_id,
                    ChallengeAction::GainXp,
                    xp_gained,
                    now,
                )
                .await
            {
                Ok(completions) => completed.extend(completions),
                Err(error) => warn!(%error, "Challenge progress (gain_xp) failed"),
            }
        }

        completed
    }
}
