//! Store and notification trait seams for the Spiritbox community bot.
//!
//! The progression engine talks to persistence exclusively through these
//! traits. The database crate provides the PostgreSQL implementations;
//! tests substitute in-memory ones.

mod notify;
mod store;

pub use notify::{NotificationSink, TracingSink};
pub use store::{
    AchievementStore, ChallengeStore, InsertOutcome, MessageAward, PrestigeUpdate, ProfileStore,
    ResetPeriod, RewardGrant,
};
