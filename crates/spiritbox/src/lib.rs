//! Facade crate for the Spiritbox community bot.
//!
//! Re-exports the workspace surface and provides configuration loading
//! and catalog seed parsing for the `spiritbox` binary.

mod bot_config;
mod seeds;

pub use bot_config::BotConfig;
pub use seeds::{SeedCatalog, load_seed_catalog};

pub use spiritbox_cache::{CooldownTracker, TtlCache, TtlCacheConfig};
pub use spiritbox_core::{
    Achievement, Challenge, ChallengeAction, ChallengeType, Notification, Profile, RewardBundle,
    level_from_xp, level_progress, xp_for_level,
};
pub use spiritbox_database::{
    AchievementRepository, ChallengeRepository, GreetingRepository, ProfileRepository,
    RoleRewardRepository, create_pool,
};
pub use spiritbox_error::{SpiritboxError, SpiritboxResult};
pub use spiritbox_interface::{NotificationSink, ResetPeriod, TracingSink};
pub use spiritbox_leveling::{
    AchievementManager, ChallengeManager, MessageEvent, MessagePipeline, PipelineConfig,
    PrestigeManager,
};
pub use spiritbox_scheduler::{
    CatalogRefreshJob, ChallengeRotationJob, CounterResetJob, JobRunner, ScheduleType,
};
pub use spiritbox_social::{GreetingConfig, GreetingService, MemberEvent};
