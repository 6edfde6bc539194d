//! Greeting configuration and role reward repositories.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use tracing::instrument;

use spiritbox_error::DatabaseResult;
use spiritbox_social::{GreetingConfig, GreetingStore, RoleReward, RoleRewardStore};

use crate::connection::{PgPool, run_blocking};
use crate::models::{GreetingConfigRow, RoleRewardRow};
use crate::schema::greeting_configs::dsl as gc;
use crate::schema::role_rewards::dsl as rr;

/// PostgreSQL-backed [`GreetingStore`].
#[derive(Clone)]
pub struct GreetingRepository {
    pool: PgPool,
}

impl GreetingRepository {
    /// Create a repository over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GreetingStore for GreetingRepository {
    #[instrument(skip(self))]
    async fn find(&self, guild_id: i64) -> DatabaseResult<Option<GreetingConfig>> {
        run_blocking(&self.pool, move |conn| {
            let row = gc::greeting_configs
                .find(guild_id)
                .select(GreetingConfigRow::as_select())
                .first::<GreetingConfigRow>(conn)
                .optional()?;
            Ok(row.map(GreetingConfig::from))
        })
        .await
    }

    #[instrument(skip(self, config), fields(guild_id = config.guild_id))]
    async fn upsert(&self, config: &GreetingConfig) -> DatabaseResult<()> {
        let row = GreetingConfigRow::from_config(config, Utc::now());
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(gc::greeting_configs)
                .values(&row)
                .on_conflict(gc::guild_id)
                .do_update()
                .set((
                    gc::welcome_enabled.eq(row.welcome_enabled),
                    gc::welcome_channel_id.eq(row.welcome_channel_id),
                    gc::welcome_template.eq(&row.welcome_template),
                    gc::farewell_enabled.eq(row.farewell_enabled),
                    gc::farewell_channel_id.eq(row.farewell_channel_id),
                    gc::farewell_template.eq(&row.farewell_template),
                    gc::updated_at.eq(row.updated_at),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}

/// PostgreSQL-backed [`RoleRewardStore`].
#[derive(Clone)]
pub struct RoleRewardRepository {
    pool: PgPool,
}

impl RoleRewardRepository {
    /// Create a repository over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRewardStore for RoleRewardRepository {
    #[instrument(skip(self))]
    async fn list_for_guild(&self, guild_id: i64) -> DatabaseResult<Vec<RoleReward>> {
        run_blocking(&self.pool, move |conn| {
            let rows = rr::role_rewards
                .filter(rr::guild_id.eq(guild_id))
                .order(rr::level.asc())
                .select(RoleRewardRow::as_select())
                .load::<RoleRewardRow>(conn)?;
            Ok(rows.into_iter().map(RoleReward::from).collect())
        })
        .await
    }

    #[instrument(skip(self, reward), fields(guild_id = reward.guild_id, level = reward.level))]
    async fn upsert(&self, reward: &RoleReward) -> DatabaseResult<()> {
        let row = RoleRewardRow::from(reward);
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(rr::role_rewards)
                .values(row)
                .on_conflict((rr::guild_id, rr::level))
                .do_update()
                .set(rr::role_id.eq(row.role_id))
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}
