//! Level-threshold role rewards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use spiritbox_error::DatabaseResult;

/// One configured reward: reaching `level` in `guild_id` grants `role_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleReward {
    /// Discord guild id
    pub guild_id: i64,
    /// Level threshold
    pub level: i32,
    /// Role granted at the threshold
    pub role_id: i64,
}

/// Role reward configuration persistence.
#[async_trait]
pub trait RoleRewardStore: Send + Sync {
    /// All configured rewards for a guild.
    async fn list_for_guild(&self, guild_id: i64) -> DatabaseResult<Vec<RoleReward>>;

    /// Insert or replace the reward at `(guild_id, level)`.
    async fn upsert(&self, reward: &RoleReward) -> DatabaseResult<()>;
}

/// Role ids whose thresholds fall in `(old_level, new_level]`.
///
/// A multi-level jump grants every intermediate reward, not just the
/// final level's.
pub fn resolve_crossed_rewards(
    rewards: &[RoleReward],
    old_level: i32,
    new_level: i32,
) -> Vec<i64> {
    let mut crossed: Vec<_> = rewards
        .iter()
        .filter(|reward| reward.level > old_level && reward.level <= new_level)
        .collect();
    crossed.sort_by_key(|reward| reward.level);
    crossed.into_iter().map(|reward| reward.role_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewards() -> Vec<RoleReward> {
        vec![
            RoleReward {
                guild_id: 1,
                level: 5,
                role_id: 100,
            },
            RoleReward {
                guild_id: 1,
                level: 10,
                role_id: 200,
            },
            RoleReward {
                guild_id: 1,
                level: 25,
                role_id: 300,
            },
        ]
    }

    #[test]
    fn test_single_threshold_crossed() {
        assert_eq!(resolve_crossed_rewards(&rewards(), 9, 10), vec![200]);
    }

    #[test]
    fn test_multi_level_jump_grants_all_intermediate() {
        assert_eq!(resolve_crossed_rewards(&rewards(), 4, 25), vec![100, 200, 300]);
    }

    #[test]
    fn test_no_thresholds_crossed() {
        assert!(resolve_crossed_rewards(&rewards(), 10, 24).is_empty());
        assert!(resolve_crossed_rewards(&rewards(), 5, 5).is_empty());
    }

    #[test]
    fn test_threshold_at_old_level_excluded() {
        // Already held: level 5 reward is not re-granted when leaving 5.
        assert_eq!(resolve_crossed_rewards(&rewards(), 5, 10), vec![200]);
    }
}
