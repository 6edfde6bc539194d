//! Achievement requirement bags and custom conditions.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::profile::Profile;

/// Named boolean predicates selectable from achievement definitions.
///
/// The set is closed: a definition naming anything else is rejected at
/// catalog load. Evaluation of a condition that somehow failed to parse
/// fails closed to `false`.
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
pub enum CustomCondition {
    /// Sanity is exactly 100
    PerfectSanity,
    /// Sanity has dropped to 10 or below
    LowSanity,
    /// Message sent between midnight and 06:00 UTC
    NightOwl,
    /// Message sent between 06:00 and 09:00 UTC
    EarlyBird,
    /// Message sent on Saturday or Sunday UTC
    WeekendWarrior,
}

impl CustomCondition {
    /// Evaluate against a profile snapshot and the wall clock.
    pub fn evaluate(&self, profile: &Profile, now: DateTime<Utc>) -> bool {
        match self {
            CustomCondition::PerfectSanity => profile.sanity == 100,
            CustomCondition::LowSanity => profile.sanity <= 10,
            CustomCondition::NightOwl => now.hour() < 6,
            CustomCondition::EarlyBird => (6..9).contains(&now.hour()),
            CustomCondition::WeekendWarrior => {
                matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
            }
        }
    }
}

/// Sparse bag of thresholds an achievement requires.
///
/// Only present fields are evaluated; absent fields are vacuously
/// satisfied. Each present numeric field requires the matching profile
/// value to be greater than or equal to the threshold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AchievementRequirements {
    /// Minimum level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    /// Minimum total XP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_xp: Option<i64>,
    /// Minimum lifetime message count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<i64>,
    /// Minimum consecutive-day streak
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_streak: Option<i32>,
    /// Minimum spendable balance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    /// Minimum lifetime earnings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_earnings: Option<i64>,
    /// Minimum lifetime spending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money_spent: Option<i64>,
    /// Minimum investigations started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_investigations: Option<i32>,
    /// Minimum correct ghost identifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_investigations: Option<i32>,
    /// Minimum hunts encountered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hunts: Option<i32>,
    /// Minimum hunts survived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_hunts: Option<i32>,
    /// Minimum consecutive survived hunts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hunt_streak: Option<i32>,
    /// Minimum nightmare-difficulty hunts survived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nightmare_hunts: Option<i32>,
    /// Minimum equipment uses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_used: Option<i32>,
    /// Minimum ghost photos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos_taken: Option<i32>,
    /// Minimum ghosts exorcised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghosts_exorcised: Option<i32>,
    /// Minimum account age in whole days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_age_days: Option<i64>,
    /// Named predicate, stored as its string name; parsed and validated
    /// at catalog load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_condition: Option<String>,
}

impl AchievementRequirements {
    /// Parse the custom condition name, if one is set.
    pub fn parsed_condition(&self) -> Option<Result<CustomCondition, String>> {
        self.custom_condition
            .as_deref()
            .map(|name| CustomCondition::from_str(name).map_err(|_| name.to_string()))
    }

    /// Whether every present requirement is satisfied by the snapshot.
    ///
    /// An unparseable custom condition evaluates to `false` (and warns);
    /// catalog validation is supposed to have rejected it already.
    pub fn satisfied_by(&self, profile: &Profile, now: DateTime<Utc>) -> bool {
        let numeric = self.level.is_none_or(|t| profile.level >= t)
            && self.total_xp.is_none_or(|t| profile.xp >= t)
            && self.message_count.is_none_or(|t| profile.message_count >= t)
            && self
                .message_streak
                .is_none_or(|t| profile.message_streak >= t)
            && self.balance.is_none_or(|t| profile.balance >= t)
            && self
                .total_earnings
                .is_none_or(|t| profile.total_earnings >= t)
            && self.money_spent.is_none_or(|t| profile.money_spent >= t)
            && self
                .total_investigations
                .is_none_or(|t| profile.total_investigations >= t)
            && self
                .successful_investigations
                .is_none_or(|t| profile.successful_investigations >= t)
            && self.total_hunts.is_none_or(|t| profile.total_hunts >= t)
            && self
                .successful_hunts
                .is_none_or(|t| profile.successful_hunts >= t)
            && self.hunt_streak.is_none_or(|t| profile.hunt_streak >= t)
            && self
                .nightmare_hunts
                .is_none_or(|t| profile.nightmare_hunts >= t)
            && self.items_used.is_none_or(|t| profile.items_used >= t)
            && self.photos_taken.is_none_or(|t| profile.photos_taken >= t)
            && self
                .ghosts_exorcised
                .is_none_or(|t| profile.ghosts_exorcised >= t)
            && self
                .account_age_days
                .is_none_or(|t| profile.account_age_days(now) >= t);

        if !numeric {
            return false;
        }

        match self.parsed_condition() {
            None => true,
            Some(Ok(condition)) => condition.evaluate(profile, now),
            Some(Err(name)) => {
                warn!(condition = %name, "Unknown custom condition, failing closed");
                false
            }
        }
    }
}
