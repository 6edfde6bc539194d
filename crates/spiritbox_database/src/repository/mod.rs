//! Repository implementations of the store traits.

mod achievements;
mod challenges;
mod profiles;
mod social;

pub use achievements::AchievementRepository;
pub use challenges::ChallengeRepository;
pub use profiles::ProfileRepository;
pub use social::{GreetingRepository, RoleRewardRepository};
