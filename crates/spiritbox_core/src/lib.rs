//! Domain types and level math for the Spiritbox community bot.
//!
//! This crate holds the pure, I/O-free heart of the progression system:
//! the XP ↔ level curve, the per-user-per-guild profile record, the
//! achievement and challenge catalog definitions with their requirement
//! bags, the reward bundle shape, and the notification events the engine
//! emits. Persistence and orchestration live in sibling crates.

mod achievement;
mod action;
mod challenge;
mod events;
mod level;
mod profile;
mod requirements;
mod rewards;

pub use achievement::{Achievement, AchievementCategory, Rarity, UserAchievement};
pub use action::{ChallengeAction, action_for_requirement};
pub use challenge::{Challenge, ChallengeRequirements, ChallengeType, UserChallenge};
pub use events::{GreetingKind, Notification};
pub use level::{
    LevelProgress, LevelUpCheck, check_level_up, level_from_xp, level_progress,
    xp_for_level, xp_needed_for_level,
};
pub use profile::{Profile, StreakUpdate, XpBooster, utc_day_number};
pub use requirements::{AchievementRequirements, CustomCondition};
pub use rewards::{BoosterGrant, RewardBundle};
