//! Periodic job scheduling for the Spiritbox community bot.
//!
//! Challenge rotation, periodic XP counter resets, and catalog
//! refreshes are out-of-band batch operations. The runner here owns the
//! wall clock; the operations themselves are idempotent, so a job that
//! fails partway is safe to run again at the next tick.

mod jobs;
mod schedule;

pub use jobs::{
    CatalogRefreshJob, ChallengeRotationJob, CounterResetJob, JobRunner, ScheduledJob,
};
pub use schedule::{Schedule, ScheduleCheck, ScheduleType};
