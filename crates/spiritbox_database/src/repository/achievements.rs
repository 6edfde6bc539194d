//! Achievement catalog and unlock repository.

use async_trait::async_trait;
use diesel::prelude::*;
use std::collections::HashSet;
use tracing::instrument;

use spiritbox_core::{Achievement, UserAchievement};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::{AchievementStore, InsertOutcome};

use crate::connection::{PgPool, run_blocking};
use crate::models::{AchievementRow, NewUserAchievement, UserAchievementRow};
use crate::schema::achievements::dsl as a;
use crate::schema::user_achievements::dsl as ua;

/// PostgreSQL-backed [`AchievementStore`].
#[derive(Clone)]
pub struct AchievementRepository {
    pool: PgPool,
}

impl AchievementRepository {
    /// Create a repository over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AchievementStore for AchievementRepository {
    #[instrument(skip(self))]
    async fn list_enabled(&self) -> DatabaseResult<Vec<Achievement>> {
        run_blocking(&self.pool, move |conn| {
            let rows = a::achievements
                .filter(a::enabled.eq(true))
                .select(AchievementRow::as_select())
                .load::<AchievementRow>(conn)?;
            rows.into_iter().map(Achievement::try_from).collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn unlocked_ids(&self, user_id: i64, guild_id: i64) -> DatabaseResult<HashSet<String>> {
        run_blocking(&self.pool, move |conn| {
            let ids = ua::user_achievements
                .filter(ua::user_id.eq(user_id))
                .filter(ua::guild_id.eq(guild_id))
                .select(ua::achievement_id)
                .load::<String>(conn)?;
            Ok(ids.into_iter().collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_unlock(
        &self,
        user_id: i64,
        guild_id: i64,
        achievement_id: &str,
    ) -> DatabaseResult<Option<UserAchievement>> {
        let achievement_id = achievement_id.to_string();
        run_blocking(&self.pool, move |conn| {
            let row = ua::user_achievements
                .find((user_id, guild_id, achievement_id))
                .select(UserAchievementRow::as_select())
                .first::<UserAchievementRow>(conn)
                .optional()?;
            Ok(row.map(UserAchievement::from))
        })
        .await
    }

    #[instrument(skip(self, record), fields(achievement = %record.achievement_id))]
    async fn insert_if_absent(&self, record: &UserAchievement) -> DatabaseResult<InsertOutcome> {
        let row = NewUserAchievement::from(record);
        run_blocking(&self.pool, move |conn| {
            // The composite primary key arbitrates the race; zero rows
            // affected means another evaluation won.
            let inserted = diesel::insert_into(ua::user_achievements)
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

    #[instrument(skip(self))]
    async fn increment_unlock_count(&self, achievement_id: &str) -> DatabaseResult<()> {
        let achievement_id = achievement_id.to_string();
        run_blocking(&self.pool, move |conn| {
            diesel::update(a::achievements.find(achievement_id))
                .set(a::unlock_count.eq(a::unlock_count + 1))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, definition), fields(achievement = %definition.id))]
    async fn upsert_definition(&self, definition: &Achievement) -> DatabaseResult<()> {
        let row = AchievementRow::from_definition(definition)?;
        run_blocking(&self.pool, move |conn| {
            // Replacing a definition keeps its accumulated unlock count.
            diesel::insert_into(a::achievements)
                .values(&row)
                .on_conflict(a::id)
                .do_update()
                .set((
                    a::name.eq(&row.name),
                    a::description.eq(&row.description),
                    a::category.eq(&row.category),
                    a::rarity.eq(&row.rarity),
                    a::points.eq(row.points),
                    a::guild_id.eq(row.guild_id),
                    a::enabled.eq(row.enabled),
                    a::requirements.eq(&row.requirements),
                    a::rewards.eq(&row.rewards),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}
