//! The bot's periodic jobs and their runner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use spiritbox_core::ChallengeType;
use spiritbox_error::SpiritboxResult;
use spiritbox_interface::{ProfileStore, ResetPeriod};
use spiritbox_leveling::{AchievementManager, ChallengeManager};

use crate::schedule::{Schedule, ScheduleType};

/// A named unit of periodic work.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Stable job name for logs.
    fn name(&self) -> &str;

    /// When the job wants to run.
    fn schedule(&self) -> &ScheduleType;

    /// Execute one invocation. Must be idempotent: the runner will call
    /// again after a partial failure.
    async fn run(&self, now: DateTime<Utc>) -> SpiritboxResult<()>;
}

/// Deletes expired periodic challenges and generates the next set.
pub struct ChallengeRotationJob {
    manager: Arc<ChallengeManager>,
    challenge_type: ChallengeType,
    name: String,
    schedule: ScheduleType,
}

impl ChallengeRotationJob {
    /// Rotation job for one cadence class.
    pub fn new(
        manager: Arc<ChallengeManager>,
        challenge_type: ChallengeType,
        schedule: ScheduleType,
    ) -> Self {
        Self {
            manager,
            challenge_type,
            name: format!("challenge-rotation-{}", challenge_type),
            schedule,
        }
    }
}

#[async_trait]
impl ScheduledJob for ChallengeRotationJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> &ScheduleType {
        &self.schedule
    }

    async fn run(&self, now: DateTime<Utc>) -> SpiritboxResult<()> {
        let generated = self.manager.rotate(self.challenge_type, now).await?;
        self.manager.reload(now).await?;
        info!(
            challenge_type = %self.challenge_type,
            generated = generated.len(),
            "Rotated challenges"
        );
        Ok(())
    }
}

/// Zeros one periodic XP counter across all profiles.
pub struct CounterResetJob {
    profiles: Arc<dyn ProfileStore>,
    period: ResetPeriod,
    name: String,
    schedule: ScheduleType,
}

impl CounterResetJob {
    /// Reset job for one boundary.
    pub fn new(profiles: Arc<dyn ProfileStore>, period: ResetPeriod, schedule: ScheduleType) -> Self {
        Self {
            profiles,
            period,
            name: format!("counter-reset-{}", period),
            schedule,
        }
    }
}

#[async_trait]
impl ScheduledJob for CounterResetJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> &ScheduleType {
        &self.schedule
    }

    async fn run(&self, _now: DateTime<Utc>) -> SpiritboxResult<()> {
        let touched = self.profiles.reset_periodic_counters(self.period).await?;
        info!(period = %self.period, touched, "Reset periodic counters");
        Ok(())
    }
}

/// Reloads both catalogs from the store.
pub struct CatalogRefreshJob {
    achievements: Arc<AchievementManager>,
    challenges: Arc<ChallengeManager>,
    schedule: ScheduleType,
}

impl CatalogRefreshJob {
    /// Refresh job over both managers.
    pub fn new(
        achievements: Arc<AchievementManager>,
        challenges: Arc<ChallengeManager>,
        schedule: ScheduleType,
    ) -> Self {
        Self {
            achievements,
            challenges,
            schedule,
        }
    }
}

#[async_trait]
impl ScheduledJob for CatalogRefreshJob {
    fn name(&self) -> &str {
        "catalog-refresh"
    }

    fn schedule(&self) -> &ScheduleType {
        &self.schedule
    }

    async fn run(&self, now: DateTime<Utc>) -> SpiritboxResult<()> {
        let achievements = self.achievements.reload(now).await?;
        let challenges = self.challenges.reload(now).await?;
        debug!(achievements, challenges, "Catalogs refreshed");
        Ok(())
    }
}

struct JobEntry {
    job: Arc<dyn ScheduledJob>,
    last_run: Option<DateTime<Utc>>,
    // One invocation at a time per job; a tick that finds the guard
    // held skips instead of stacking.
    guard: Arc<Mutex<()>>,
}

/// Drives registered jobs from a single tick loop.
pub struct JobRunner {
    entries: Vec<JobEntry>,
}

impl JobRunner {
    /// Empty runner.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a job.
    pub fn register(&mut self, job: Arc<dyn ScheduledJob>) {
        info!(job = job.name(), "Registered job");
        self.entries.push(JobEntry {
            job,
            last_run: None,
            guard: Arc::new(Mutex::new(())),
        });
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no jobs are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every job whose schedule says it is due. Returns the number
    /// of jobs that ran.
    #[instrument(skip(self))]
    pub async fn tick(&mut self, now: DateTime<Utc>) -> usize {
        let mut ran = 0;
        for entry in &mut self.entries {
            let check = entry.job.schedule().check(entry.last_run);
            if !check.should_run {
                continue;
            }

            let Ok(_held) = entry.guard.clone().try_lock_owned() else {
                warn!(job = entry.job.name(), "Previous invocation still running, skipping");
                continue;
            };

            debug!(job = entry.job.name(), "Running job");
            entry.last_run = Some(now);
            match entry.job.run(now).await {
                Ok(()) => ran += 1,
                Err(e) => error!(job = entry.job.name(), error = %e, "Job failed"),
            }
        }
        ran
    }

    /// Tick forever at the given cadence.
    pub async fn run_loop(mut self, tick_interval: std::time::Duration) {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.tick(Utc::now()).await;
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
