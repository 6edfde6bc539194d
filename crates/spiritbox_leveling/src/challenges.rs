//! Time-windowed challenges: incremental progress, single-fire
//! completion, and periodic regeneration from a template library.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

use spiritbox_core::{
    Challenge, ChallengeAction, ChallengeType, RewardBundle, UserChallenge,
};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::{ChallengeStore, InsertOutcome, ProfileStore, RewardGrant};

/// An immutable view of the challenge catalog.
#[derive(Debug, Clone)]
pub struct ChallengeCatalogSnapshot {
    instances: Arc<Vec<Challenge>>,
    loaded_at: DateTime<Utc>,
}

impl ChallengeCatalogSnapshot {
    /// Empty snapshot, used before the first load.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            instances: Arc::new(Vec::new()),
            loaded_at: now,
        }
    }

    /// Build a snapshot, admitting only instances that validate.
    pub fn from_instances(instances: Vec<Challenge>, now: DateTime<Utc>) -> Self {
        let mut admitted = Vec::with_capacity(instances.len());
        for instance in instances {
            match instance.validate() {
                Ok(()) => admitted.push(instance),
                Err(error) => warn!(%error, "Rejected challenge instance"),
            }
        }
        Self {
            instances: Arc::new(admitted),
            loaded_at: now,
        }
    }

    /// Instances active for evaluation in a guild at `now`.
    pub fn active_for(&self, guild_id: i64, now: DateTime<Utc>) -> Vec<&Challenge> {
        self.instances
            .iter()
            .filter(|c| c.is_active(guild_id, now))
            .collect()
    }

    /// Number of admitted instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the snapshot holds no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// When this snapshot was built.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// A challenge completed by one `update_progress` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeCompletion {
    /// The completed instance
    pub challenge: Challenge,
    /// The progress record as of completion
    pub record: UserChallenge,
}

/// A generation template for periodic challenges.
///
/// Regeneration samples a subset of the library each period and stamps
/// out instances with deterministic ids, so re-running a generation job
/// for the same period recreates the same set.
#[derive(Debug, Clone)]
pub struct ChallengeTemplate {
    /// Id fragment, unique within the library
    pub slug: &'static str,
    /// Display name
    pub name: &'static str,
    /// Display description
    pub description: &'static str,
    /// The single action this template tracks
    pub action: ChallengeAction,
    /// Target count
    pub target: i64,
    /// Completion rewards
    pub rewards: RewardBundle,
}

impl ChallengeTemplate {
    fn instantiate(
        &self,
        challenge_type: ChallengeType,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Challenge {
        Challenge {
            id: format!(
                "{}-{}-{}",
                challenge_type,
                starts_at.date_naive(),
                self.slug
            ),
            name: self.name.to_string(),
            description: self.description.to_string(),
            challenge_type,
            starts_at,
            ends_at,
            requirements: [(self.action.requirement_key().to_string(), self.target)]
                .into_iter()
                .collect(),
            rewards: self.rewards.clone(),
            guild_id: None,
            max_completions: 1,
            enabled: true,
        }
    }
}

fn bundle(xp: i64, money: i64) -> RewardBundle {
    RewardBundle {
        xp,
        money,
        ..Default::default()
    }
}

/// Stock daily templates.
pub fn default_daily_templates() -> Vec<ChallengeTemplate> {
    vec![
        ChallengeTemplate {
            slug: "ghost-stories",
            name: "Ghost Stories",
            description: "Send 20 messages",
            action: ChallengeAction::SendMessage,
            target: 20,
            rewards: bundle(150, 100),
        },
        ChallengeTemplate {
            slug: "restless-spirit",
            name: "Restless Spirit",
            description: "Earn 300 XP",
            action: ChallengeAction::GainXp,
            target: 300,
            rewards: bundle(100, 150),
        },
        ChallengeTemplate {
            slug: "night-shift",
            name: "Night Shift",
            description: "Complete 2 investigations",
            action: ChallengeAction::CompleteInvestigation,
            target: 2,
            rewards: bundle(200, 200),
        },
        ChallengeTemplate {
            slug: "scavenger",
            name: "Scavenger",
            description: "Find 3 items",
            action: ChallengeAction::FindItem,
            target: 3,
            rewards: bundle(120, 120),
        },
        ChallengeTemplate {
            slug: "gear-up",
            name: "Gear Up",
            description: "Spend 500 on equipment",
            action: ChallengeAction::SpendMoney,
            target: 500,
            rewards: bundle(100, 250),
        },
    ]
}

/// Stock weekly templates.
pub fn default_weekly_templates() -> Vec<ChallengeTemplate> {
    vec![
        ChallengeTemplate {
            slug: "marathon-medium",
            name: "Marathon Medium",
            description: "Send 150 messages this week",
            action: ChallengeAction::SendMessage,
            target: 150,
            rewards: bundle(750, 500),
        },
        ChallengeTemplate {
            slug: "soul-harvest",
            name: "Soul Harvest",
            description: "Earn 2,500 XP this week",
            action: ChallengeAction::GainXp,
            target: 2_500,
            rewards: bundle(500, 750),
        },
        ChallengeTemplate {
            slug: "hunt-survivor",
            name: "Hunt Survivor",
            description: "Complete 5 hunts this week",
            action: ChallengeAction::CompleteHunt,
            target: 5,
            rewards: bundle(1_000, 800),
        },
        ChallengeTemplate {
            slug: "bankroll",
            name: "Bankroll",
            description: "Earn 5,000 this week",
            action: ChallengeAction::EarnMoney,
            target: 5_000,
            rewards: bundle(600, 400),
        },
    ]
}

/// Stock monthly templates.
pub fn default_monthly_templates() -> Vec<ChallengeTemplate> {
    vec![
        ChallengeTemplate {
            slug: "pillar-of-the-community",
            name: "Pillar of the Community",
            description: "Send 600 messages this month",
            action: ChallengeAction::SendMessage,
            target: 600,
            rewards: bundle(3_000, 2_000),
        },
        ChallengeTemplate {
            slug: "ascendant",
            name: "Ascendant",
            description: "Earn 12,000 XP this month",
            action: ChallengeAction::GainXp,
            target: 12_000,
            rewards: bundle(2_000, 3_000),
        },
    ]
}

/// How many templates each period samples.
fn sample_size(challenge_type: ChallengeType, library_len: usize, rng: &mut StdRng) -> usize {
    use rand::Rng;
    let wanted = match challenge_type {
        ChallengeType::Daily => rng.gen_range(2..=3),
        ChallengeType::Weekly => 2,
        ChallengeType::Monthly => 1,
        ChallengeType::Special | ChallengeType::Event => 0,
    };
    wanted.min(library_len)
}

/// The period window containing `now` for a cadence class.
fn period_window(
    challenge_type: ChallengeType,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let day_start = |date: NaiveDate| date.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
    let today = now.date_naive();
    match challenge_type {
        ChallengeType::Daily => {
            let start = day_start(today);
            Some((start, start + Duration::days(1)))
        }
        ChallengeType::Weekly => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            let start = day_start(monday);
            Some((start, start + Duration::days(7)))
        }
        ChallengeType::Monthly => {
            let first = today.with_day(1).expect("first of month");
            let next_first = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            }
            .expect("first of next month");
            Some((day_start(first), day_start(next_first)))
        }
        ChallengeType::Special | ChallengeType::Event => None,
    }
}

/// Rule engine and lifecycle owner for challenges.
pub struct ChallengeManager {
    store: Arc<dyn ChallengeStore>,
    profiles: Arc<dyn ProfileStore>,
    snapshot: RwLock<ChallengeCatalogSnapshot>,
    daily_templates: Vec<ChallengeTemplate>,
    weekly_templates: Vec<ChallengeTemplate>,
    monthly_templates: Vec<ChallengeTemplate>,
}

impl ChallengeManager {
    /// Create a manager with the stock template library and an empty
    /// catalog; call [`reload`] to fill it.
    ///
    /// [`reload`]: ChallengeManager::reload
    pub fn new(store: Arc<dyn ChallengeStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self::with_templates(
            store,
            profiles,
            default_daily_templates(),
            default_weekly_templates(),
            default_monthly_templates(),
        )
    }

    /// Create a manager with a custom template library.
    pub fn with_templates(
        store: Arc<dyn ChallengeStore>,
        profiles: Arc<dyn ProfileStore>,
        daily_templates: Vec<ChallengeTemplate>,
        weekly_templates: Vec<ChallengeTemplate>,
        monthly_templates: Vec<ChallengeTemplate>,
    ) -> Self {
        Self {
            store,
            profiles,
            snapshot: RwLock::new(ChallengeCatalogSnapshot::empty(Utc::now())),
            daily_templates,
            weekly_templates,
            monthly_templates,
        }
    }

    /// Replace the in-memory catalog with the enabled instances from the
    /// store.
    #[instrument(skip(self))]
    pub async fn reload(&self, now: DateTime<Utc>) -> DatabaseResult<usize> {
        let instances = self.store.list_enabled().await?;
        let snapshot = ChallengeCatalogSnapshot::from_instances(instances, now);
        let admitted = snapshot.len();
        *self.snapshot.write().expect("challenge catalog lock") = snapshot;
        info!(admitted, "Challenge catalog reloaded");
        Ok(admitted)
    }

    /// The current catalog snapshot.
    pub fn snapshot(&self) -> ChallengeCatalogSnapshot {
        self.snapshot.read().expect("challenge catalog lock").clone()
    }

    /// Advance progress for one action and return the challenges
    /// completed by *this* call.
    ///
    /// Progress persists regardless of completion. Once a record is
    /// completed its counters may keep growing for audit, but it can
    /// never re-enter the returned list: the completion flip is a
    /// compare-and-set at the store.
    #[instrument(skip(self), fields(action = %action))]
    pub async fn update_progress(
        &self,
        user_id: i64,
        guild_id: i64,
        action: ChallengeAction,
        amount: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<ChallengeCompletion>> {
        let catalog = self.snapshot();
        let key = action.requirement_key();

        let mut completions = Vec::new();
        for challenge in catalog.active_for(guild_id, now) {
            if !challenge.requirements.contains_key(key) {
                continue;
            }

            let mut record = self.load_or_create(user_id, guild_id, &challenge.id).await?;
            let already_completed = record.completed;
            *record.progress.entry(key.to_string()).or_insert(0) += amount;
            self.store.save_progress(&record).await?;

            if already_completed || !record.meets(&challenge.requirements) {
                continue;
            }

            if self
                .store
                .mark_completed(user_id, guild_id, &challenge.id, now)
                .await?
            {
                record.completed = true;
                record.completed_at = Some(now);
                record.completion_count += 1;

                let mut grant = RewardGrant::from_bundle(&challenge.rewards, now);
                grant.completed_challenge = true;
                self.profiles.apply_rewards(user_id, guild_id, &grant).await?;
                self.store.increment_completed_by(&challenge.id).await?;

                info!(user_id, guild_id, challenge = %challenge.id, "Challenge completed");
                completions.push(ChallengeCompletion {
                    challenge: challenge.clone(),
                    record,
                });
            } else {
                debug!(
                    user_id,
                    guild_id,
                    challenge = %challenge.id,
                    "Lost completion race, skipping rewards"
                );
            }
        }
        Ok(completions)
    }

    /// A member's view of the currently active challenges: each active
    /// instance for the guild paired with their progress, if any.
    ///
    /// Derived on demand rather than denormalized onto the profile, so
    /// the hot path never maintains a second list.
    pub async fn active_challenges(
        &self,
        user_id: i64,
        guild_id: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<(Challenge, Option<UserChallenge>)>> {
        let catalog = self.snapshot();
        let mut progress = self.store.list_progress(user_id, guild_id).await?;

        Ok(catalog
            .active_for(guild_id, now)
            .into_iter()
            .map(|challenge| {
                let record = progress
                    .iter()
                    .position(|r| r.challenge_id == challenge.id)
                    .map(|index| progress.swap_remove(index));
                (challenge.clone(), record)
            })
            .collect())
    }

    async fn load_or_create(
        &self,
        user_id: i64,
        guild_id: i64,
        challenge_id: &str,
    ) -> DatabaseResult<UserChallenge> {
        if let Some(record) = self
            .store
            .find_progress(user_id, guild_id, challenge_id)
            .await?
        {
            return Ok(record);
        }

        let fresh = UserChallenge::new(user_id, guild_id, challenge_id);
        match self.store.insert_progress_if_absent(&fresh).await? {
            InsertOutcome::Inserted => Ok(fresh),
            InsertOutcome::AlreadyExists => Ok(self
                .store
                .find_progress(user_id, guild_id, challenge_id)
                .await?
                .unwrap_or(fresh)),
        }
    }

    /// Delete expired periodic instances and generate the period's set
    /// for one cadence class. Idempotent: the template sample is seeded
    /// by the period, and instance ids are deterministic, so re-running
    /// after a partial failure upserts the same instances.
    #[instrument(skip(self))]
    pub async fn rotate(
        &self,
        challenge_type: ChallengeType,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Challenge>> {
        let Some((starts_at, ends_at)) = period_window(challenge_type, now) else {
            debug!(challenge_type = %challenge_type, "Cadence class is hand-scheduled, nothing to rotate");
            return Ok(Vec::new());
        };

        let expired = self.store.delete_expired(&[challenge_type], now).await?;
        if expired > 0 {
            info!(expired, challenge_type = %challenge_type, "Deleted expired challenges");
        }

        let library = match challenge_type {
            ChallengeType::Daily => &self.daily_templates,
            ChallengeType::Weekly => &self.weekly_templates,
            ChallengeType::Monthly => &self.monthly_templates,
            ChallengeType::Special | ChallengeType::Event => unreachable!("no period window"),
        };

        let mut hasher = DefaultHasher::new();
        (challenge_type.to_string(), starts_at.date_naive()).hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let count = sample_size(challenge_type, library.len(), &mut rng);
        let mut instances = Vec::with_capacity(count);
        for template in library.choose_multiple(&mut rng, count) {
            let instance = template.instantiate(challenge_type, starts_at, ends_at);
            self.store.upsert_instance(&instance).await?;
            instances.push(instance);
        }

        info!(
            challenge_type = %challenge_type,
            generated = instances.len(),
            "Challenge rotation complete"
        );
        Ok(instances)
    }
}
