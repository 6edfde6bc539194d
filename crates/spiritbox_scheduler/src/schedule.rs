//! Schedule types for periodic jobs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Result of checking if a job should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCheck {
    /// Whether the job should run now
    pub should_run: bool,
    /// When the job should run next (if applicable)
    pub next_run: Option<DateTime<Utc>>,
}

impl ScheduleCheck {
    /// Create a new schedule check result.
    pub fn new(should_run: bool, next_run: Option<DateTime<Utc>>) -> Self {
        Self {
            should_run,
            next_run,
        }
    }

    /// Job should run immediately with no future schedule.
    pub fn run_once() -> Self {
        Self {
            should_run: true,
            next_run: None,
        }
    }

    /// Job should not run yet, schedule for a future time.
    pub fn wait_until(next_run: DateTime<Utc>) -> Self {
        Self {
            should_run: false,
            next_run: Some(next_run),
        }
    }

    /// Job should run now and again at a future time.
    pub fn run_and_schedule(next_run: DateTime<Utc>) -> Self {
        Self {
            should_run: true,
            next_run: Some(next_run),
        }
    }
}

/// Trait for schedule types that can determine when jobs should run.
pub trait Schedule {
    /// Check if a job should run now based on its last execution time.
    fn check(&self, last_run: Option<DateTime<Utc>>) -> ScheduleCheck;

    /// Calculate the next execution time after a reference time, or
    /// `None` if the schedule is exhausted.
    fn next_execution(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// The schedule shapes the job runner supports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ScheduleType {
    /// Cron expression (7 fields: sec min hour day month weekday year)
    ///
    /// Example: "0 5 0 * * * *" = five minutes past midnight daily
    Cron {
        /// Cron expression string
        expression: String,
    },

    /// Fixed interval in seconds
    Interval {
        /// Interval duration in seconds
        seconds: u64,
    },

    /// Execute once on startup, then never again
    Immediate,
}

impl ScheduleType {
    /// Daily at five minutes past midnight UTC, the challenge rotation
    /// cadence.
    pub fn daily() -> Self {
        ScheduleType::Cron {
            expression: "0 5 0 * * * *".to_string(),
        }
    }

    /// Mondays at ten minutes past midnight UTC.
    pub fn weekly() -> Self {
        ScheduleType::Cron {
            expression: "0 10 0 * * Mon *".to_string(),
        }
    }

    /// The first of the month at fifteen minutes past midnight UTC.
    pub fn monthly() -> Self {
        ScheduleType::Cron {
            expression: "0 15 0 1 * * *".to_string(),
        }
    }
}

impl Schedule for ScheduleType {
    fn check(&self, last_run: Option<DateTime<Utc>>) -> ScheduleCheck {
        let now = Utc::now();

        match self {
            ScheduleType::Immediate => {
                if last_run.is_none() {
                    ScheduleCheck::run_once()
                } else {
                    ScheduleCheck::new(false, None)
                }
            }
            ScheduleType::Interval { seconds } => {
                let interval = Duration::seconds(*seconds as i64);
                match last_run {
                    None => ScheduleCheck::run_and_schedule(now + interval),
                    Some(last) => {
                        let next = last + interval;
                        if now >= next {
                            ScheduleCheck::run_and_schedule(next + interval)
                        } else {
                            ScheduleCheck::wait_until(next)
                        }
                    }
                }
            }
            ScheduleType::Cron { expression } => match cron::Schedule::from_str(expression) {
                Ok(schedule) => {
                    let after = last_run.unwrap_or(now);
                    if let Some(next) = schedule.after(&after).next() {
                        if now >= next {
                            if let Some(future) = schedule.after(&now).next() {
                                ScheduleCheck::run_and_schedule(future)
                            } else {
                                ScheduleCheck::run_once()
                            }
                        } else {
                            ScheduleCheck::wait_until(next)
                        }
                    } else {
                        ScheduleCheck::new(false, None)
                    }
                }
                Err(_) => ScheduleCheck::new(false, None),
            },
        }
    }

    fn next_execution(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ScheduleType::Immediate => None,
            ScheduleType::Interval { seconds } => Some(after + Duration::seconds(*seconds as i64)),
            ScheduleType::Cron { expression } => {
                if let Ok(schedule) = cron::Schedule::from_str(expression) {
                    schedule.after(&after).next()
                } else {
                    None
                }
            }
        }
    }
}
