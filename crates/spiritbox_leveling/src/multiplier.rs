//! Composite XP multiplier computation and booster maintenance.
//!
//! `compute_multiplier` is pure: it reads a profile snapshot and the
//! clock and never writes. Dropping expired boosters is the separate
//! `prune_expired_boosters` maintenance operation so the hot read path
//! never implicitly mutates.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use spiritbox_core::{Profile, XpBooster};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::ProfileStore;

/// Where a factor in the breakdown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierSource {
    /// The constant 1.0 floor
    Base,
    /// Per-level bonus
    Level,
    /// Consecutive-day streak bonus
    Streak,
    /// Active premium status
    Premium,
    /// A timed booster
    Booster,
    /// Unlocked achievement count
    Achievements,
    /// Weekend or peak-hour window
    Calendar,
    /// Message length modifier
    MessageLength,
}

/// One factor in the human-readable breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveMultiplier {
    /// Display name
    pub name: String,
    /// Multiplicative value
    pub value: f64,
    /// Origin of the factor
    pub source: MultiplierSource,
    /// Optional flavor text
    pub description: Option<String>,
}

/// The combined multiplier and its breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierBreakdown {
    /// Product of every factor, rounded to two decimals
    pub total: f64,
    /// Every applicable factor, base first
    pub active: Vec<ActiveMultiplier>,
    /// `round((total - 1) * 100)`, for display
    pub bonus_percentage: i64,
}

/// Per-event inputs that are not profile state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultiplierOptions {
    /// Length of the triggering message, when known
    pub message_length: Option<usize>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Combine every applicable bonus into one multiplier.
///
/// Multiplication commutes, so the breakdown order is cosmetic; the
/// arithmetic is the same under any permutation. Absent or null-ish
/// profile fields mean "no bonus", never an error.
pub fn compute_multiplier(
    profile: &Profile,
    now: DateTime<Utc>,
    options: &MultiplierOptions,
) -> MultiplierBreakdown {
    let mut active = vec![ActiveMultiplier {
        name: "Base rate".to_string(),
        value: 1.0,
        source: MultiplierSource::Base,
        description: None,
    }];

    if profile.level > 0 {
        active.push(ActiveMultiplier {
            name: format!("Level {}", profile.level),
            value: 1.0 + profile.level as f64 * 0.005,
            source: MultiplierSource::Level,
            description: Some("0.5% per level".to_string()),
        });
    }

    if profile.message_streak >= 7 {
        let bonus = (profile.message_streak as f64 * 0.01).min(0.5);
        active.push(ActiveMultiplier {
            name: format!("{}-day streak", profile.message_streak),
            value: 1.0 + bonus,
            source: MultiplierSource::Streak,
            description: Some("1% per day, capped at +50%".to_string()),
        });
    }

    if profile.is_premium(now) {
        active.push(ActiveMultiplier {
            name: "Premium".to_string(),
            value: 2.0,
            source: MultiplierSource::Premium,
            description: None,
        });
    }

    for booster in profile.active_boosters(now) {
        active.push(ActiveMultiplier {
            name: booster.name.clone(),
            value: booster.multiplier,
            source: MultiplierSource::Booster,
            description: Some(booster.description.clone()),
        });
    }

    if !profile.achievements.is_empty() {
        active.push(ActiveMultiplier {
            name: format!("{} achievements", profile.achievements.len()),
            value: 1.0 + profile.achievements.len() as f64 * 0.002,
            source: MultiplierSource::Achievements,
            description: Some("0.2% per unlock".to_string()),
        });
    }

    if matches!(now.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun) {
        active.push(ActiveMultiplier {
            name: "Weekend".to_string(),
            value: 1.25,
            source: MultiplierSource::Calendar,
            description: None,
        });
    }

    if (18..22).contains(&now.hour()) {
        active.push(ActiveMultiplier {
            name: "Peak hours".to_string(),
            value: 1.15,
            source: MultiplierSource::Calendar,
            description: None,
        });
    }

    if let Some(length) = options.message_length {
        if length > 100 {
            active.push(ActiveMultiplier {
                name: "Long message".to_string(),
                value: 1.1,
                source: MultiplierSource::MessageLength,
                description: None,
            });
        } else if length < 10 {
            active.push(ActiveMultiplier {
                name: "Short message".to_string(),
                value: 0.8,
                source: MultiplierSource::MessageLength,
                description: None,
            });
        }
    }

    let total = round2(active.iter().map(|m| m.value).product());
    MultiplierBreakdown {
        total,
        bonus_percentage: ((total - 1.0) * 100.0).round() as i64,
        active,
    }
}

/// Booster management over the profile store.
///
/// All operations are persistence round-trips; a missing profile is a
/// `false`/empty result, never an error.
pub struct XpMultiplierEngine {
    profiles: Arc<dyn ProfileStore>,
}

impl XpMultiplierEngine {
    /// Create an engine over a profile store.
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Add a booster, replacing the expiry of any booster with the same
    /// name. Returns `false` when the profile does not exist.
    #[instrument(skip(self, booster), fields(booster = %booster.name))]
    pub async fn add_booster(
        &self,
        user_id: i64,
        guild_id: i64,
        booster: XpBooster,
    ) -> DatabaseResult<bool> {
        let Some(profile) = self.profiles.find(user_id, guild_id).await? else {
            return Ok(false);
        };

        let mut boosters = profile.boosters;
        match boosters.iter_mut().find(|b| b.name == booster.name) {
            Some(existing) => *existing = booster,
            None => boosters.push(booster),
        }
        self.profiles.set_boosters(user_id, guild_id, &boosters).await
    }

    /// Remove a booster by exact name. Returns `false` when nothing
    /// matched (including a missing profile).
    #[instrument(skip(self))]
    pub async fn remove_booster(
        &self,
        user_id: i64,
        guild_id: i64,
        name: &str,
    ) -> DatabaseResult<bool> {
        let Some(profile) = self.profiles.find(user_id, guild_id).await? else {
            return Ok(false);
        };

        let before = profile.boosters.len();
        let boosters: Vec<_> = profile
            .boosters
            .into_iter()
            .filter(|b| b.name != name)
            .collect();
        if boosters.len() == before {
            return Ok(false);
        }
        self.profiles.set_boosters(user_id, guild_id, &boosters).await
    }

    /// Boosters still applying at `now`. Empty for a missing profile.
    pub async fn list_active_boosters(
        &self,
        user_id: i64,
        guild_id: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<XpBooster>> {
        let Some(profile) = self.profiles.find(user_id, guild_id).await? else {
            return Ok(Vec::new());
        };
        Ok(profile
            .boosters
            .into_iter()
            .filter(|b| b.is_active(now))
            .collect())
    }

    /// Drop expired boosters from the stored list. Returns the number
    /// removed. This is the only write in the multiplier subsystem.
    #[instrument(skip(self))]
    pub async fn prune_expired_boosters(
        &self,
        user_id: i64,
        guild_id: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<usize> {
        let Some(profile) = self.profiles.find(user_id, guild_id).await? else {
            return Ok(0);
        };
        if !profile.has_expired_boosters(now) {
            return Ok(0);
        }

        let before = profile.boosters.len();
        let boosters: Vec<_> = profile
            .boosters
            .into_iter()
            .filter(|b| b.is_active(now))
            .collect();
        let removed = before - boosters.len();
        self.profiles.set_boosters(user_id, guild_id, &boosters).await?;
        debug!(user_id, guild_id, removed, "Pruned expired boosters");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2026-03-10 is a Tuesday; noon avoids every calendar window.
    fn quiet_hour() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn profile() -> Profile {
        Profile::new(1, 2, quiet_hour())
    }

    #[test]
    fn test_bare_profile_gets_base_only() {
        let breakdown = compute_multiplier(&profile(), quiet_hour(), &Default::default());
        assert_eq!(breakdown.total, 1.0);
        assert_eq!(breakdown.active.len(), 1);
        assert_eq!(breakdown.active[0].source, MultiplierSource::Base);
        assert_eq!(breakdown.bonus_percentage, 0);
    }

    #[test]
    fn test_level_bonus() {
        let mut p = profile();
        p.level = 20;
        let breakdown = compute_multiplier(&p, quiet_hour(), &Default::default());
        assert_eq!(breakdown.total, 1.1);
        assert_eq!(breakdown.bonus_percentage, 10);
    }

    #[test]
    fn test_streak_below_seven_ignored() {
        let mut p = profile();
        p.message_streak = 6;
        let breakdown = compute_multiplier(&p, quiet_hour(), &Default::default());
        assert_eq!(breakdown.total, 1.0);
    }

    #[test]
    fn test_streak_bonus_capped() {
        let mut p = profile();
        p.message_streak = 80;
        let breakdown = compute_multiplier(&p, quiet_hour(), &Default::default());
        assert_eq!(breakdown.total, 1.5);
    }

    #[test]
    fn test_premium_doubles() {
        let mut p = profile();
        p.premium_until = Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
        let breakdown = compute_multiplier(&p, quiet_hour(), &Default::default());
        assert_eq!(breakdown.total, 2.0);
        assert_eq!(breakdown.bonus_percentage, 100);
    }

    #[test]
    fn test_expired_booster_not_counted() {
        let mut p = profile();
        p.boosters.push(XpBooster {
            name: "stale".into(),
            description: String::new(),
            multiplier: 3.0,
            expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            added_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        });
        let breakdown = compute_multiplier(&p, quiet_hour(), &Default::default());
        assert_eq!(breakdown.total, 1.0);
    }

    #[test]
    fn test_weekend_and_peak_hour_stack() {
        // 2026-03-13 is a Friday; 19:00 is inside peak hours.
        let friday_evening = Utc.with_ymd_and_hms(2026, 3, 13, 19, 0, 0).unwrap();
        let breakdown = compute_multiplier(&profile(), friday_evening, &Default::default());
        assert_eq!(breakdown.total, round2(1.25 * 1.15));
    }

    #[test]
    fn test_message_length_modifiers() {
        let long = MultiplierOptions {
            message_length: Some(150),
        };
        let short = MultiplierOptions {
            message_length: Some(5),
        };
        let medium = MultiplierOptions {
            message_length: Some(50),
        };
        assert_eq!(compute_multiplier(&profile(), quiet_hour(), &long).total, 1.1);
        assert_eq!(compute_multiplier(&profile(), quiet_hour(), &short).total, 0.8);
        assert_eq!(compute_multiplier(&profile(), quiet_hour(), &medium).total, 1.0);
    }

    #[test]
    fn test_achievement_count_bonus() {
        let mut p = profile();
        p.achievements = vec!["a".into(), "b".into(), "c".into()];
        let breakdown = compute_multiplier(&p, quiet_hour(), &Default::default());
        assert_eq!(breakdown.total, round2(1.006));
    }

    #[test]
    fn test_composition_matches_manual_product() {
        let mut p = profile();
        p.level = 10;
        p.message_streak = 10;
        p.premium_until = Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
        p.achievements = vec!["a".into(); 5];
        let breakdown = compute_multiplier(&p, quiet_hour(), &Default::default());

        let expected: f64 = [1.0, 1.05, 1.1, 2.0, 1.01]
            .iter()
            .product();
        assert!((breakdown.total - round2(expected)).abs() < 1e-9);

        // The factors multiply to the same total under any permutation.
        let mut values: Vec<f64> = breakdown.active.iter().map(|m| m.value).collect();
        values.reverse();
        let reversed: f64 = values.iter().product();
        assert!((round2(reversed) - breakdown.total).abs() < 1e-9);
    }
}
