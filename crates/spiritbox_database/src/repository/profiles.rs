//! Profile repository.
//!
//! The message-award write is a single UPDATE built from SQL increments
//! so two racing messages from one user cannot lose counters. Jsonb
//! list fields are read-modify-write; those writes are serialized by
//! the unlock/completion uniqueness upstream.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use tracing::instrument;

use spiritbox_core::{Profile, XpBooster, level_from_xp};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::{MessageAward, PrestigeUpdate, ProfileStore, ResetPeriod, RewardGrant};

use crate::connection::{PgPool, run_blocking};
use crate::models::{NewProfile, ProfileRow};
use crate::schema::profiles::dsl as p;

/// PostgreSQL-backed [`ProfileStore`].
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a repository over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn load(
        conn: &mut PgConnection,
        user_id: i64,
        guild_id: i64,
    ) -> DatabaseResult<Option<Profile>> {
        let row = p::profiles
            .find((user_id, guild_id))
            .select(ProfileRow::as_select())
            .first::<ProfileRow>(conn)
            .optional()?;
        row.map(Profile::try_from).transpose()
    }

    /// Re-derive the cached level column when an XP write moved it.
    fn fix_level(
        conn: &mut PgConnection,
        user_id: i64,
        guild_id: i64,
        xp: i64,
        stored_level: i32,
    ) -> DatabaseResult<i32> {
        let level = level_from_xp(xp);
        if level != stored_level {
            diesel::update(p::profiles.find((user_id, guild_id)))
                .set(p::level.eq(level))
                .execute(conn)?;
        }
        Ok(level)
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: i64, guild_id: i64) -> DatabaseResult<Option<Profile>> {
        run_blocking(&self.pool, move |conn| Self::load(conn, user_id, guild_id)).await
    }

    #[instrument(skip(self))]
    async fn get_or_create(&self, user_id: i64, guild_id: i64) -> DatabaseResult<Profile> {
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(p::profiles)
                .values(NewProfile::fresh(user_id, guild_id, Utc::now()))
                .on_conflict((p::user_id, p::guild_id))
                .do_nothing()
                .execute(conn)?;
            let row = p::profiles
                .find((user_id, guild_id))
                .select(ProfileRow::as_select())
                .first::<ProfileRow>(conn)?;
            row.try_into()
        })
        .await
    }

    #[instrument(skip(self, award), fields(xp_gained = award.xp_gained))]
    async fn apply_message_award(
        &self,
        user_id: i64,
        guild_id: i64,
        award: &MessageAward,
    ) -> DatabaseResult<Profile> {
        let award = *award;
        run_blocking(&self.pool, move |conn| {
            let row = diesel::update(p::profiles.find((user_id, guild_id)))
                .set((
                    p::xp.eq(p::xp + award.xp_gained),
                    p::message_count.eq(p::message_count + 1),
                    p::daily_xp.eq(p::daily_xp + award.xp_gained),
                    p::weekly_xp.eq(p::weekly_xp + award.xp_gained),
                    p::monthly_xp.eq(p::monthly_xp + award.xp_gained),
                    p::message_streak.eq(award.streak),
                    p::last_message_day.eq(Some(award.day_number)),
                    p::updated_at.eq(Utc::now()),
                ))
                .returning(ProfileRow::as_returning())
                .get_result::<ProfileRow>(conn)?;

            let level = Self::fix_level(conn, user_id, guild_id, row.xp, row.level)?;
            let mut profile: Profile = row.try_into()?;
            profile.level = level;
            Ok(profile)
        })
        .await
    }

    #[instrument(skip(self, grant))]
    async fn apply_rewards(
        &self,
        user_id: i64,
        guild_id: i64,
        grant: &RewardGrant,
    ) -> DatabaseResult<Profile> {
        let grant = grant.clone();
        run_blocking(&self.pool, move |conn| {
            let earnings = grant.money.max(0);
            let points = grant
                .achievement
                .as_ref()
                .map(|(_, points)| *points)
                .unwrap_or(0);
            let completed = i32::from(grant.completed_challenge);

            let row = diesel::update(p::profiles.find((user_id, guild_id)))
                .set((
                    p::xp.eq(p::xp + grant.xp),
                    p::balance.eq(p::balance + grant.money),
                    p::total_earnings.eq(p::total_earnings + earnings),
                    p::achievement_points.eq(p::achievement_points + points),
                    p::completed_challenges.eq(p::completed_challenges + completed),
                    p::updated_at.eq(Utc::now()),
                ))
                .returning(ProfileRow::as_returning())
                .get_result::<ProfileRow>(conn)?;

            let mut profile: Profile = row.try_into()?;

            // List-shaped rewards merge in memory; the caller holds the
            // unique-constraint win that serializes this write.
            for (item, quantity) in &grant.items {
                *profile.inventory.entry(item.clone()).or_insert(0) += quantity;
            }
            if let Some(booster) = &grant.booster {
                match profile.boosters.iter_mut().find(|b| b.name == booster.name) {
                    Some(existing) => *existing = booster.clone(),
                    None => profile.boosters.push(booster.clone()),
                }
            }
            if let Some(title) = &grant.title {
                if !profile.titles.contains(title) {
                    profile.titles.push(title.clone());
                }
            }
            if let Some((id, _)) = &grant.achievement {
                profile.achievements.push(id.clone());
            }
            profile.level = level_from_xp(profile.xp);

            diesel::update(p::profiles.find((user_id, guild_id)))
                .set((
                    p::level.eq(profile.level),
                    p::inventory.eq(serde_json::to_value(&profile.inventory)?),
                    p::boosters.eq(serde_json::to_value(&profile.boosters)?),
                    p::titles.eq(serde_json::to_value(&profile.titles)?),
                    p::achievements.eq(serde_json::to_value(&profile.achievements)?),
                ))
                .execute(conn)?;
            Ok(profile)
        })
        .await
    }

    #[instrument(skip(self, boosters))]
    async fn set_boosters(
        &self,
        user_id: i64,
        guild_id: i64,
        boosters: &[XpBooster],
    ) -> DatabaseResult<bool> {
        let value = serde_json::to_value(boosters)?;
        run_blocking(&self.pool, move |conn| {
            let affected = diesel::update(p::profiles.find((user_id, guild_id)))
                .set((p::boosters.eq(value), p::updated_at.eq(Utc::now())))
                .execute(conn)?;
            Ok(affected > 0)
        })
        .await
    }

    #[instrument(skip(self, update), fields(prestige = update.prestige))]
    async fn apply_prestige(
        &self,
        user_id: i64,
        guild_id: i64,
        update: &PrestigeUpdate,
    ) -> DatabaseResult<Profile> {
        let update = update.clone();
        run_blocking(&self.pool, move |conn| {
            let row = diesel::update(p::profiles.find((user_id, guild_id)))
                .set((
                    p::xp.eq(update.xp),
                    p::level.eq(update.level),
                    p::prestige.eq(update.prestige),
                    p::prestige_xp.eq(p::prestige_xp + update.prestige_xp_gain),
                    p::balance.eq(p::balance + update.money_bonus),
                    p::total_earnings.eq(p::total_earnings + update.money_bonus),
                    p::updated_at.eq(Utc::now()),
                ))
                .returning(ProfileRow::as_returning())
                .get_result::<ProfileRow>(conn)?;

            let mut profile: Profile = row.try_into()?;
            for (item, quantity) in &update.items {
                *profile.inventory.entry(item.clone()).or_insert(0) += quantity;
            }
            for title in &update.titles {
                if !profile.titles.contains(title) {
                    profile.titles.push(title.clone());
                }
            }
            diesel::update(p::profiles.find((user_id, guild_id)))
                .set((
                    p::inventory.eq(serde_json::to_value(&profile.inventory)?),
                    p::titles.eq(serde_json::to_value(&profile.titles)?),
                ))
                .execute(conn)?;
            Ok(profile)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn top_by_xp(&self, guild_id: i64, limit: i64) -> DatabaseResult<Vec<Profile>> {
        run_blocking(&self.pool, move |conn| {
            let rows = p::profiles
                .filter(p::guild_id.eq(guild_id))
                .order(p::xp.desc())
                .limit(limit)
                .select(ProfileRow::as_select())
                .load::<ProfileRow>(conn)?;
            rows.into_iter().map(Profile::try_from).collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn top_by_prestige(&self, guild_id: i64, limit: i64) -> DatabaseResult<Vec<Profile>> {
        run_blocking(&self.pool, move |conn| {
            let rows = p::profiles
                .filter(p::guild_id.eq(guild_id))
                .order((p::prestige.desc(), p::prestige_xp.desc(), p::xp.desc()))
                .limit(limit)
                .select(ProfileRow::as_select())
                .load::<ProfileRow>(conn)?;
            rows.into_iter().map(Profile::try_from).collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn reset_periodic_counters(&self, period: ResetPeriod) -> DatabaseResult<u64> {
        run_blocking(&self.pool, move |conn| {
            let affected = match period {
                ResetPeriod::Daily => diesel::update(p::profiles)
                    .set(p::daily_xp.eq(0_i64))
                    .execute(conn)?,
                ResetPeriod::Weekly => diesel::update(p::profiles)
                    .set(p::weekly_xp.eq(0_i64))
                    .execute(conn)?,
                ResetPeriod::Monthly => diesel::update(p::profiles)
                    .set(p::monthly_xp.eq(0_i64))
                    .execute(conn)?,
            };
            Ok(affected as u64)
        })
        .await
    }
}
