//! PostgreSQL persistence for the Spiritbox community bot.
//!
//! Diesel schema, row types, and the repository implementations of the
//! store traits from `spiritbox_interface`. Blocking diesel work runs on
//! the tokio blocking pool; every repository method is async.
//!
//! Concurrency contract: racing counters are written as SQL increments,
//! and the exactly-once guarantees (achievement unlocks, challenge
//! completion) rest on composite primary keys plus
//! `ON CONFLICT DO NOTHING` / guarded-update row counts, not on
//! application-side reads.

mod connection;
mod models;
mod repository;
pub mod schema;

pub use connection::{PgPool, create_pool, establish_connection, run_blocking};
pub use models::{
    AchievementRow, ChallengeRow, GreetingConfigRow, NewProfile, NewUserAchievement,
    NewUserChallenge, ProfileRow, RoleRewardRow, UserAchievementRow, UserChallengeRow,
};
pub use repository::{
    AchievementRepository, ChallengeRepository, GreetingRepository, ProfileRepository,
    RoleRewardRepository,
};
