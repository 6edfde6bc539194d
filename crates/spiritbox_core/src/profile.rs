//! Per-user-per-guild progression and economy record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::level::level_from_xp;

/// A time-boxed multiplicative XP bonus attached to a profile.
///
/// Boosters are transient: anything past its `expires_at` is dead weight
/// and gets dropped by the explicit pruning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpBooster {
    /// Display name, unique within one profile's booster list
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Multiplicative factor, greater than 1.0
    pub multiplier: f64,
    /// Instant the booster stops applying
    pub expires_at: DateTime<Utc>,
    /// Instant the booster was granted
    pub added_at: DateTime<Utc>,
}

impl XpBooster {
    /// Whether the booster still applies at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Outcome of applying the consecutive-day streak rule to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    /// Streak value after this message
    pub streak: i32,
    /// UTC day number stamped as the last message day
    pub day_number: i32,
}

/// UTC day number for an instant: whole days since the Unix epoch.
///
/// Day arithmetic on these integers is exact, so "same day" is equality
/// and "yesterday" is a difference of one. No formatted date strings.
pub fn utc_day_number(at: DateTime<Utc>) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch date");
    (at.date_naive() - epoch).num_days() as i32
}

/// Per-user-per-guild progression and economy record.
///
/// The `(user_id, guild_id)` pair is the identity and is immutable after
/// creation. `level` is derived state: it must equal
/// `level_from_xp(xp)` after every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Discord user id
    pub user_id: i64,
    /// Discord guild id
    pub guild_id: i64,

    // Progression
    /// Total XP, non-negative; only the prestige transform lowers it
    pub xp: i64,
    /// Cached level, recomputed from `xp` on every write
    pub level: i32,
    /// Prestige tier counter, never decreases
    pub prestige: i32,
    /// Permanent prestige XP pool, never decreases
    pub prestige_xp: i64,

    // Activity
    /// Lifetime message count
    pub message_count: i64,
    /// Consecutive-day message streak
    pub message_streak: i32,
    /// UTC day number of the most recent counted message
    pub last_message_day: Option<i32>,
    /// XP earned since the last daily reset
    pub daily_xp: i64,
    /// XP earned since the last weekly reset
    pub weekly_xp: i64,
    /// XP earned since the last monthly reset
    pub monthly_xp: i64,

    // Economy
    /// Spendable balance
    pub balance: i64,
    /// Lifetime earnings
    pub total_earnings: i64,
    /// Lifetime spending
    pub money_spent: i64,

    // Investigation stats (read by achievement requirements)
    /// Current sanity, 0..=100
    pub sanity: i32,
    /// Investigations started
    pub total_investigations: i32,
    /// Investigations with a correct ghost identification
    pub successful_investigations: i32,
    /// Hunts survived or not
    pub total_hunts: i32,
    /// Hunts survived
    pub successful_hunts: i32,
    /// Consecutive survived hunts
    pub hunt_streak: i32,
    /// Hunts survived on nightmare difficulty
    pub nightmare_hunts: i32,
    /// Equipment uses
    pub items_used: i32,
    /// Ghost photos taken
    pub photos_taken: i32,
    /// Ghosts exorcised
    pub ghosts_exorcised: i32,

    // Boosters and premium
    /// Timed XP boosters, pruned of expired entries by maintenance
    pub boosters: Vec<XpBooster>,
    /// Premium multiplier applies while this is in the future
    pub premium_until: Option<DateTime<Utc>>,

    // Achievements
    /// Unlocked achievement ids, append-only
    pub achievements: Vec<String>,
    /// Sum of unlocked achievement point values
    pub achievement_points: i32,

    // Challenges
    /// Lifetime completed challenge count
    pub completed_challenges: i32,

    // Inventory and cosmetics granted by rewards
    /// Item name → quantity
    pub inventory: BTreeMap<String, i64>,
    /// Earned titles
    pub titles: Vec<String>,
    /// Currently displayed title
    pub active_title: Option<String>,

    /// Creation instant, basis for account-age requirements
    pub created_at: DateTime<Utc>,
    /// Last write instant
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Fresh profile for a user/guild pair.
    pub fn new(user_id: i64, guild_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            guild_id,
            xp: 0,
            level: 0,
            prestige: 0,
            prestige_xp: 0,
            message_count: 0,
            message_streak: 0,
            last_message_day: None,
            daily_xp: 0,
            weekly_xp: 0,
            monthly_xp: 0,
            balance: 0,
            total_earnings: 0,
            money_spent: 0,
            sanity: 100,
            total_investigations: 0,
            successful_investigations: 0,
            total_hunts: 0,
            successful_hunts: 0,
            hunt_streak: 0,
            nightmare_hunts: 0,
            items_used: 0,
            photos_taken: 0,
            ghosts_exorcised: 0,
            boosters: Vec::new(),
            premium_until: None,
            achievements: Vec::new(),
            achievement_points: 0,
            completed_challenges: 0,
            inventory: BTreeMap::new(),
            titles: Vec::new(),
            active_title: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether premium status is active at `now`.
    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }

    /// Boosters still applying at `now`.
    pub fn active_boosters(&self, now: DateTime<Utc>) -> Vec<&XpBooster> {
        self.boosters.iter().filter(|b| b.is_active(now)).collect()
    }

    /// Whether any stored booster has expired by `now`.
    pub fn has_expired_boosters(&self, now: DateTime<Utc>) -> bool {
        self.boosters.iter().any(|b| !b.is_active(now))
    }

    /// Whole days since the profile was created.
    pub fn account_age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }

    /// Apply the consecutive-day streak rule for a message at `now`.
    ///
    /// Same day: streak unchanged. Exactly yesterday: streak + 1.
    /// Anything else (including first message): streak resets to 1.
    pub fn next_streak(&self, now: DateTime<Utc>) -> StreakUpdate {
        let today = utc_day_number(now);
        let streak = match self.last_message_day {
            Some(day) if day == today => self.message_streak,
            Some(day) if day == today - 1 => self.message_streak + 1,
            _ => 1,
        };
        StreakUpdate {
            streak,
            day_number: today,
        }
    }

    /// Re-derive the cached level from XP.
    pub fn recompute_level(&mut self) {
        self.level = level_from_xp(self.xp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_day_number_adjacency() {
        let yesterday = utc_day_number(at(2026, 3, 9, 23));
        let today = utc_day_number(at(2026, 3, 10, 0));
        assert_eq!(today - yesterday, 1);
        assert_eq!(utc_day_number(at(2026, 3, 10, 23)), today);
    }

    #[test]
    fn test_streak_first_message() {
        let profile = Profile::new(1, 2, at(2026, 3, 1, 12));
        let update = profile.next_streak(at(2026, 3, 1, 12));
        assert_eq!(update.streak, 1);
    }

    #[test]
    fn test_streak_same_day_unchanged() {
        let now = at(2026, 3, 10, 18);
        let mut profile = Profile::new(1, 2, now);
        profile.message_streak = 4;
        profile.last_message_day = Some(utc_day_number(now));
        let update = profile.next_streak(at(2026, 3, 10, 23));
        assert_eq!(update.streak, 4);
    }

    #[test]
    fn test_streak_consecutive_day_increments() {
        let mut profile = Profile::new(1, 2, at(2026, 3, 1, 0));
        profile.message_streak = 4;
        profile.last_message_day = Some(utc_day_number(at(2026, 3, 9, 12)));
        let update = profile.next_streak(at(2026, 3, 10, 0));
        assert_eq!(update.streak, 5);
    }

    #[test]
    fn test_streak_gap_resets() {
        let mut profile = Profile::new(1, 2, at(2026, 3, 1, 0));
        profile.message_streak = 30;
        profile.last_message_day = Some(utc_day_number(at(2026, 3, 7, 12)));
        let update = profile.next_streak(at(2026, 3, 10, 0));
        assert_eq!(update.streak, 1);
    }

    #[test]
    fn test_premium_window() {
        let now = at(2026, 3, 10, 12);
        let mut profile = Profile::new(1, 2, now);
        assert!(!profile.is_premium(now));
        profile.premium_until = Some(at(2026, 4, 1, 0));
        assert!(profile.is_premium(now));
        assert!(!profile.is_premium(at(2026, 4, 1, 0)));
    }

    #[test]
    fn test_active_boosters_filter() {
        let now = at(2026, 3, 10, 12);
        let mut profile = Profile::new(1, 2, now);
        profile.boosters = vec![
            XpBooster {
                name: "live".into(),
                description: String::new(),
                multiplier: 1.5,
                expires_at: at(2026, 3, 11, 0),
                added_at: now,
            },
            XpBooster {
                name: "dead".into(),
                description: String::new(),
                multiplier: 2.0,
                expires_at: at(2026, 3, 9, 0),
                added_at: now,
            },
        ];
        let active = profile.active_boosters(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "live");
        assert!(profile.has_expired_boosters(now));
    }
}
