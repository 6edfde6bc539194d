//! Challenge catalog definitions and per-user progress records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spiritbox_error::{CatalogError, CatalogErrorKind, CatalogResult};
use std::collections::BTreeMap;

use crate::action::action_for_requirement;
use crate::rewards::RewardBundle;

/// Requirement bag for a challenge: requirement key → target count.
///
/// Keys come from the closed [`crate::ChallengeAction`] vocabulary.
pub type ChallengeRequirements = BTreeMap<String, i64>;

/// Cadence class of a challenge instance.
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
pub enum ChallengeType {
    /// Regenerated every UTC day
    Daily,
    /// Regenerated every UTC week
    Weekly,
    /// Regenerated every UTC month
    Monthly,
    /// Hand-scheduled one-offs
    Special,
    /// Tied to a server event
    Event,
}

/// A time-windowed, incrementally-tracked objective with rewards.
///
/// Active means `enabled && starts_at <= now < ends_at` and the guild
/// scope matches. Unlike achievements, progress accumulates per action
/// rather than being re-derived from a profile snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Stable instance id; regeneration uses deterministic ids so
    /// re-running a generation job upserts instead of duplicating
    pub id: String,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Cadence class
    pub challenge_type: ChallengeType,
    /// Inclusive start of the validity window
    pub starts_at: DateTime<Utc>,
    /// Exclusive end of the validity window
    pub ends_at: DateTime<Utc>,
    /// Requirement key → target count
    pub requirements: ChallengeRequirements,
    /// What completing grants
    #[serde(default)]
    pub rewards: RewardBundle,
    /// Some: only this guild; None: global
    #[serde(default)]
    pub guild_id: Option<i64>,
    /// Completion cap per user (informational; 1 for generated instances)
    pub max_completions: i32,
    /// Disabled instances are never evaluated
    pub enabled: bool,
}

impl Challenge {
    /// Whether the instance is active for evaluation at `now` in `guild_id`.
    pub fn is_active(&self, guild_id: i64, now: DateTime<Utc>) -> bool {
        self.enabled
            && self.starts_at <= now
            && now < self.ends_at
            && self.guild_id.is_none_or(|scoped| scoped == guild_id)
    }

    /// Whether the validity window has passed entirely.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }

    /// Validate the definition for catalog admission.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.requirements.is_empty() {
            return Err(CatalogError::new(CatalogErrorKind::InvalidDefinition {
                definition: self.id.clone(),
                reason: "empty requirement bag".into(),
            }));
        }
        if self.ends_at <= self.starts_at {
            return Err(CatalogError::new(CatalogErrorKind::InvalidDefinition {
                definition: self.id.clone(),
                reason: "window ends before it starts".into(),
            }));
        }
        for key in self.requirements.keys() {
            if action_for_requirement(key).is_none() {
                return Err(CatalogError::new(CatalogErrorKind::UnknownAction {
                    definition: self.id.clone(),
                    requirement: key.clone(),
                }));
            }
        }
        Ok(())
    }
}

/// One user's progress against one challenge instance in one guild.
///
/// Progress counters only increase. `completed` is set exactly once;
/// later progress may keep accumulating for audit but never re-fires
/// rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserChallenge {
    /// Discord user id
    pub user_id: i64,
    /// Discord guild id
    pub guild_id: i64,
    /// Challenge instance id
    pub challenge_id: String,
    /// Requirement key → accumulated count
    pub progress: BTreeMap<String, i64>,
    /// Single-fire completion flag
    pub completed: bool,
    /// Instant the flag was set
    pub completed_at: Option<DateTime<Utc>>,
    /// Times completed (for repeatable special challenges)
    pub completion_count: i32,
}

impl UserChallenge {
    /// Fresh, empty progress record.
    pub fn new(user_id: i64, guild_id: i64, challenge_id: impl Into<String>) -> Self {
        Self {
            user_id,
            guild_id,
            challenge_id: challenge_id.into(),
            progress: BTreeMap::new(),
            completed: false,
            completed_at: None,
            completion_count: 0,
        }
    }

    /// Whether accumulated progress meets every requirement in the bag.
    pub fn meets(&self, requirements: &ChallengeRequirements) -> bool {
        requirements
            .iter()
            .all(|(key, target)| self.progress.get(key).copied().unwrap_or(0) >= *target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap(),
        )
    }

    fn challenge() -> Challenge {
        let (starts_at, ends_at) = window();
        Challenge {
            id: "daily-2026-03-10-chatter".into(),
            name: "Chatterbox".into(),
            description: "Send 20 messages".into(),
            challenge_type: ChallengeType::Daily,
            starts_at,
            ends_at,
            requirements: BTreeMap::from([("send_messages".to_string(), 20)]),
            rewards: RewardBundle::default(),
            guild_id: None,
            max_completions: 1,
            enabled: true,
        }
    }

    #[test]
    fn test_window_half_open() {
        let c = challenge();
        let (starts_at, ends_at) = window();
        assert!(c.is_active(1, starts_at));
        assert!(!c.is_active(1, ends_at));
        assert!(c.is_expired(ends_at));
        assert!(!c.is_expired(starts_at));
    }

    #[test]
    fn test_guild_scope() {
        let mut c = challenge();
        c.guild_id = Some(5);
        let (starts_at, _) = window();
        assert!(c.is_active(5, starts_at));
        assert!(!c.is_active(6, starts_at));
    }

    #[test]
    fn test_validate_rejects_unknown_requirement() {
        let mut c = challenge();
        c.requirements.insert("summon_demons".into(), 3);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_and_inverted() {
        let mut empty = challenge();
        empty.requirements.clear();
        assert!(empty.validate().is_err());

        let mut inverted = challenge();
        inverted.ends_at = inverted.starts_at;
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_progress_meets() {
        let c = challenge();
        let mut record = UserChallenge::new(1, 2, c.id.clone());
        assert!(!record.meets(&c.requirements));
        record.progress.insert("send_messages".into(), 19);
        assert!(!record.meets(&c.requirements));
        record.progress.insert("send_messages".into(), 20);
        assert!(record.meets(&c.requirements));
    }
}
