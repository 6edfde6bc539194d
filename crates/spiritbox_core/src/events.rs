//! Notification events emitted by the progression engine.
//!
//! These are plain data; the presentation layer renders and delivers
//! them. Nothing here knows about embeds or transport.

use serde::{Deserialize, Serialize};

use crate::achievement::Achievement;
use crate::challenge::Challenge;

/// Whether a greeting marks an arrival or a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreetingKind {
    /// Member joined the guild
    Welcome,
    /// Member left the guild
    Farewell,
}

/// Events the engine hands to the notification sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A member crossed at least one level boundary.
    LevelUp {
        /// Discord user id
        user_id: i64,
        /// Discord guild id
        guild_id: i64,
        /// Level before the award
        old_level: i32,
        /// Level after the award
        new_level: i32,
        /// XP granted by the triggering message
        xp_gained: i64,
        /// Role ids granted for every crossed threshold
        role_rewards: Vec<i64>,
    },
    /// A member unlocked an achievement.
    AchievementUnlocked {
        /// Discord user id
        user_id: i64,
        /// Discord guild id
        guild_id: i64,
        /// The unlocked definition
        achievement: Achievement,
    },
    /// A member completed a challenge.
    ChallengeCompleted {
        /// Discord user id
        user_id: i64,
        /// Discord guild id
        guild_id: i64,
        /// The completed instance
        challenge: Challenge,
    },
    /// A rendered welcome or farewell message for a configured channel.
    MemberGreeting {
        /// Discord guild id
        guild_id: i64,
        /// Channel configured to receive the greeting
        channel_id: i64,
        /// Rendered message text
        content: String,
        /// Arrival or departure
        kind: GreetingKind,
    },
}
