//! XP, prestige, achievement, and challenge engine for the Spiritbox
//! community bot.
//!
//! The modules here compose into the per-message award flow:
//!
//! 1. [`multiplier`] — combines level, streak, premium, booster,
//!    achievement-count, calendar, and message-length bonuses into one
//!    factor. Pure; booster maintenance is a separate explicit call.
//! 2. [`prestige`] — the one-way reset-and-multiply transform at the
//!    level cap.
//! 3. [`achievements`] — snapshot-evaluated, exactly-once unlocks.
//! 4. [`challenges`] — time-windowed, incrementally-tracked objectives.
//! 5. [`pipeline`] — the strictly-ordered orchestration of all of the
//!    above for each counted chat message.

pub mod achievements;
pub mod challenges;
pub mod multiplier;
pub mod pipeline;
pub mod prestige;

pub use achievements::{AchievementManager, CatalogSnapshot, Unlock};
pub use challenges::{
    ChallengeCatalogSnapshot, ChallengeCompletion, ChallengeManager, ChallengeTemplate,
    default_daily_templates, default_monthly_templates, default_weekly_templates,
};
pub use multiplier::{
    ActiveMultiplier, MultiplierBreakdown, MultiplierOptions, MultiplierSource,
    XpMultiplierEngine, compute_multiplier,
};
pub use pipeline::{MessageEvent, MessageOutcome, MessagePipeline, PipelineConfig};
pub use prestige::{PrestigeBonuses, PrestigeManager, PrestigeOutcome, PrestigeStanding};
