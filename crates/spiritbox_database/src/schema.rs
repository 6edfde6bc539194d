//! Diesel table definitions.
//!
//! Composite primary keys on the join tables are the storage-level
//! idempotency guarantee: a duplicate unlock or progress row cannot
//! exist, so racing evaluators resolve at the database.

diesel::table! {
    /// Per-user-per-guild progression and economy records.
    profiles (user_id, guild_id) {
        user_id -> Int8,
        guild_id -> Int8,

        xp -> Int8,
        level -> Int4,
        prestige -> Int4,
        prestige_xp -> Int8,

        message_count -> Int8,
        message_streak -> Int4,
        last_message_day -> Nullable<Int4>,
        daily_xp -> Int8,
        weekly_xp -> Int8,
        monthly_xp -> Int8,

        balance -> Int8,
        total_earnings -> Int8,
        money_spent -> Int8,

        sanity -> Int4,
        total_investigations -> Int4,
        successful_investigations -> Int4,
        total_hunts -> Int4,
        successful_hunts -> Int4,
        hunt_streak -> Int4,
        nightmare_hunts -> Int4,
        items_used -> Int4,
        photos_taken -> Int4,
        ghosts_exorcised -> Int4,

        boosters -> Jsonb,
        premium_until -> Nullable<Timestamptz>,

        achievements -> Jsonb,
        achievement_points -> Int4,
        completed_challenges -> Int4,

        inventory -> Jsonb,
        titles -> Jsonb,
        active_title -> Nullable<Text>,

        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Achievement catalog definitions.
    achievements (id) {
        id -> Text,
        name -> Text,
        description -> Text,
        category -> Text,
        rarity -> Text,
        points -> Int4,
        guild_id -> Nullable<Int8>,
        enabled -> Bool,
        requirements -> Jsonb,
        rewards -> Jsonb,
        unlock_count -> Int8,
    }
}

diesel::table! {
    /// Exactly-once unlock records.
    user_achievements (user_id, guild_id, achievement_id) {
        user_id -> Int8,
        guild_id -> Int8,
        achievement_id -> Text,
        unlocked_at -> Timestamptz,
    }
}

diesel::table! {
    /// Challenge catalog instances.
    challenges (id) {
        id -> Text,
        name -> Text,
        description -> Text,
        challenge_type -> Text,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        guild_id -> Nullable<Int8>,
        max_completions -> Int4,
        enabled -> Bool,
        requirements -> Jsonb,
        rewards -> Jsonb,
        completed_by -> Int8,
    }
}

diesel::table! {
    /// Per-user challenge progress.
    user_challenges (user_id, guild_id, challenge_id) {
        user_id -> Int8,
        guild_id -> Int8,
        challenge_id -> Text,
        progress -> Jsonb,
        completed -> Bool,
        completed_at -> Nullable<Timestamptz>,
        completion_count -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-guild welcome/farewell configuration.
    greeting_configs (guild_id) {
        guild_id -> Int8,
        welcome_enabled -> Bool,
        welcome_channel_id -> Nullable<Int8>,
        welcome_template -> Text,
        farewell_enabled -> Bool,
        farewell_channel_id -> Nullable<Int8>,
        farewell_template -> Text,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Level-threshold role rewards.
    role_rewards (guild_id, level) {
        guild_id -> Int8,
        level -> Int4,
        role_id -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    profiles,
    achievements,
    user_achievements,
    challenges,
    user_challenges,
    greeting_configs,
    role_rewards,
);
