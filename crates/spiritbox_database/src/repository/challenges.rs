//! Challenge catalog and progress repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::instrument;

use spiritbox_core::{Challenge, ChallengeType, UserChallenge};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::{ChallengeStore, InsertOutcome};

use crate::connection::{PgPool, run_blocking};
use crate::models::{ChallengeRow, NewUserChallenge, UserChallengeRow};
use crate::schema::challenges::dsl as c;
use crate::schema::user_challenges::dsl as uc;

/// PostgreSQL-backed [`ChallengeStore`].
#[derive(Clone)]
pub struct ChallengeRepository {
    pool: PgPool,
}

impl ChallengeRepository {
    /// Create a repository over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChallengeStore for ChallengeRepository {
    #[instrument(skip(self))]
    async fn list_enabled(&self) -> DatabaseResult<Vec<Challenge>> {
        run_blocking(&self.pool, move |conn| {
            let rows = c::challenges
                .filter(c::enabled.eq(true))
                .select(ChallengeRow::as_select())
                .load::<ChallengeRow>(conn)?;
            rows.into_iter().map(Challenge::try_from).collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_progress(
        &self,
        user_id: i64,
        guild_id: i64,
        challenge_id: &str,
    ) -> DatabaseResult<Option<UserChallenge>> {
        let challenge_id = challenge_id.to_string();
        run_blocking(&self.pool, move |conn| {
            let row = uc::user_challenges
                .find((user_id, guild_id, challenge_id))
                .select(UserChallengeRow::as_select())
                .first::<UserChallengeRow>(conn)
                .optional()?;
            row.map(UserChallenge::try_from).transpose()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_progress(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> DatabaseResult<Vec<UserChallenge>> {
        run_blocking(&self.pool, move |conn| {
            let rows = uc::user_challenges
                .filter(uc::user_id.eq(user_id))
                .filter(uc::guild_id.eq(guild_id))
                .select(UserChallengeRow::as_select())
                .load::<UserChallengeRow>(conn)?;
            rows.into_iter().map(UserChallenge::try_from).collect()
        })
        .await
    }

    #[instrument(skip(self, record), fields(challenge = %record.challenge_id))]
    async fn insert_progress_if_absent(
        &self,
        record: &UserChallenge,
    ) -> DatabaseResult<InsertOutcome> {
        let row = NewUserChallenge::from_record(record, Utc::now())?;
        run_blocking(&self.pool, move |conn| {
            let inserted = diesel::insert_into(uc::user_challenges)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(if inserted > 0 {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::AlreadyExists
            })
        })
        .await
    }

    #[instrument(skip(self, record), fields(challenge = %record.challenge_id))]
    async fn save_progress(&self, record: &UserChallenge) -> DatabaseResult<()> {
        let key = (
            record.user_id,
            record.guild_id,
            record.challenge_id.clone(),
        );
        let progress = serde_json::to_value(&record.progress)?;
        run_blocking(&self.pool, move |conn| {
            diesel::update(uc::user_challenges.find(key))
                .set((uc::progress.eq(progress), uc::updated_at.eq(Utc::now())))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn mark_completed(
        &self,
        user_id: i64,
        guild_id: i64,
        challenge_id: &str,
        at: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let challenge_id = challenge_id.to_string();
        run_blocking(&self.pool, move |conn| {
            // Guarded flip: only one caller sees a row transition from
            // false to true, and only that caller applies rewards.
            let affected = diesel::update(
                uc::user_challenges
                    .find((user_id, guild_id, challenge_id))
                    .filter(uc::completed.eq(false)),
            )
            .set((
                uc::completed.eq(true),
                uc::completed_at.eq(Some(at)),
                uc::completion_count.eq(uc::completion_count + 1),
                uc::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
            Ok(affected > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn increment_completed_by(&self, challenge_id: &str) -> DatabaseResult<()> {
        let challenge_id = challenge_id.to_string();
        run_blocking(&self.pool, move |conn| {
            diesel::update(c::challenges.find(challenge_id))
                .set(c::completed_by.eq(c::completed_by + 1))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, challenge), fields(challenge = %challenge.id))]
    async fn upsert_instance(&self, challenge: &Challenge) -> DatabaseResult<()> {
        let row = ChallengeRow::from_instance(challenge)?;
        run_blocking(&self.pool, move |conn| {
            // Regeneration re-runs land here; keep the completion tally.
            diesel::insert_into(c::challenges)
                .values(&row)
                .on_conflict(c::id)
                .do_update()
                .set((
                    c::name.eq(&row.name),
                    c::description.eq(&row.description),
                    c::challenge_type.eq(&row.challenge_type),
                    c::starts_at.eq(row.starts_at),
                    c::ends_at.eq(row.ends_at),
                    c::guild_id.eq(row.guild_id),
                    c::max_completions.eq(row.max_completions),
                    c::enabled.eq(row.enabled),
                    c::requirements.eq(&row.requirements),
                    c::rewards.eq(&row.rewards),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_expired(
        &self,
        types: &[ChallengeType],
        now: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        let names: Vec<String> = types.iter().map(|t| t.to_string()).collect();
        run_blocking(&self.pool, move |conn| {
            let deleted = diesel::delete(
                c::challenges
                    .filter(c::challenge_type.eq_any(names))
                    .filter(c::ends_at.le(now)),
            )
            .execute(conn)?;
            Ok(deleted as u64)
        })
        .await
    }
}
