//! Achievement evaluation and exactly-once unlocking.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

use spiritbox_core::{Achievement, Profile, UserAchievement};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::{AchievementStore, InsertOutcome, ProfileStore, RewardGrant};

/// An immutable view of the achievement catalog.
///
/// Evaluators take one snapshot at the start of a call and never touch
/// the live catalog mid-evaluation, so a concurrent reload cannot change
/// the rules under them.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    definitions: Arc<HashMap<String, Achievement>>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Empty snapshot, used before the first load.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            definitions: Arc::new(HashMap::new()),
            loaded_at: now,
        }
    }

    /// Build a snapshot, admitting only definitions that validate.
    ///
    /// Invalid definitions are logged and skipped; a typo in one seed
    /// must not take the whole catalog down.
    pub fn from_definitions(definitions: Vec<Achievement>, now: DateTime<Utc>) -> Self {
        let mut admitted = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            match definition.validate() {
                Ok(()) => {
                    admitted.insert(definition.id.clone(), definition);
                }
                Err(error) => warn!(%error, "Rejected achievement definition"),
            }
        }
        Self {
            definitions: Arc::new(admitted),
            loaded_at: now,
        }
    }

    /// Look up a definition by id.
    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.definitions.get(id)
    }

    /// Iterate over admitted definitions.
    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.definitions.values()
    }

    /// Number of admitted definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the snapshot holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// When this snapshot was built.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// An achievement unlocked by one `check_achievements` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Unlock {
    /// The unlocked definition
    pub achievement: Achievement,
    /// The created join record
    pub record: UserAchievement,
}

/// Rule engine over the achievement catalog.
pub struct AchievementManager {
    store: Arc<dyn AchievementStore>,
    profiles: Arc<dyn ProfileStore>,
    snapshot: RwLock<CatalogSnapshot>,
}

impl AchievementManager {
    /// Create a manager with an empty catalog; call [`reload`] to fill it.
    ///
    /// [`reload`]: AchievementManager::reload
    pub fn new(store: Arc<dyn AchievementStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            profiles,
            snapshot: RwLock::new(CatalogSnapshot::empty(Utc::now())),
        }
    }

    /// Replace the in-memory catalog with the enabled definitions from
    /// the store. Safe to call while evaluations are in flight; they
    /// keep the snapshot they started with.
    #[instrument(skip(self))]
    pub async fn reload(&self, now: DateTime<Utc>) -> DatabaseResult<usize> {
        let definitions = self.store.list_enabled().await?;
        let snapshot = CatalogSnapshot::from_definitions(definitions, now);
        let admitted = snapshot.len();
        *self.snapshot.write().expect("achievement catalog lock") = snapshot;
        info!(admitted, "Achievement catalog reloaded");
        Ok(admitted)
    }

    /// The current catalog snapshot.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.snapshot.read().expect("achievement catalog lock").clone()
    }

    /// Determine which not-yet-unlocked achievements the snapshot now
    /// qualifies for, unlock them, and apply their rewards.
    ///
    /// Returns only the achievements unlocked by *this* call. Losing the
    /// insert race to a concurrent evaluation is silent: the winner
    /// applied the rewards, this call applies nothing.
    #[instrument(skip(self, profile), fields(user_id, guild_id))]
    pub async fn check_achievements(
        &self,
        user_id: i64,
        guild_id: i64,
        profile: &Profile,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Unlock>> {
        let catalog = self.snapshot();
        let unlocked = self.store.unlocked_ids(user_id, guild_id).await?;

        let mut unlocks = Vec::new();
        for achievement in catalog.iter() {
            if unlocked.contains(&achievement.id) || !achievement.applies_to(guild_id) {
                continue;
            }
            if !achievement.requirements.satisfied_by(profile, now) {
                continue;
            }

            let record = UserAchievement {
                user_id,
                guild_id,
                achievement_id: achievement.id.clone(),
                unlocked_at: now,
            };
            match self.store.insert_if_absent(&record).await? {
                InsertOutcome::Inserted => {
                    self.apply_unlock(user_id, guild_id, achievement, now).await?;
                    info!(user_id, guild_id, achievement = %achievement.id, "Achievement unlocked");
                    unlocks.push(Unlock {
                        achievement: achievement.clone(),
                        record,
                    });
                }
                InsertOutcome::AlreadyExists => {
                    debug!(
                        user_id,
                        guild_id,
                        achievement = %achievement.id,
                        "Lost unlock race, skipping rewards"
                    );
                }
            }
        }
        Ok(unlocks)
    }

    async fn apply_unlock(
        &self,
        user_id: i64,
        guild_id: i64,
        achievement: &Achievement,
        now: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        let mut grant = RewardGrant::from_bundle(&achievement.rewards, now);
        grant.achievement = Some((achievement.id.clone(), achievement.points));
        self.profiles.apply_rewards(user_id, guild_id, &grant).await?;
        self.store.increment_unlock_count(&achievement.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiritbox_core::{
        AchievementCategory, AchievementRequirements, Rarity, RewardBundle,
    };
    use chrono::TimeZone;

    fn definition(id: &str, condition: Option<&str>) -> Achievement {
        Achievement {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            category: AchievementCategory::Special,
            requirements: AchievementRequirements {
                custom_condition: condition.map(Into::into),
                ..Default::default()
            },
            rewards: RewardBundle::default(),
            rarity: Rarity::Common,
            points: 10,
            guild_id: None,
            enabled: true,
        }
    }

    #[test]
    fn test_snapshot_rejects_bad_condition() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let snapshot = CatalogSnapshot::from_definitions(
            vec![
                definition("good", Some("low_sanity")),
                definition("typo", Some("lowsanity")),
                definition("plain", None),
            ],
            now,
        );
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("good").is_some());
        assert!(snapshot.get("typo").is_none());
        assert_eq!(snapshot.loaded_at(), now);
    }

    #[test]
    fn test_empty_snapshot() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert!(CatalogSnapshot::empty(now).is_empty());
    }
}
