//! Reward bundles attached to achievements, challenges, and prestige tiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A timed XP booster granted as part of a reward.
///
/// The expiry is relative at definition time and resolved to an absolute
/// instant when the reward is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterGrant {
    /// Booster name, used for upsert-by-name on the profile
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Multiplicative factor, greater than 1.0
    pub multiplier: f64,
    /// Lifetime in hours from the moment of the grant
    pub duration_hours: i64,
}

/// The reward side of an achievement, challenge, or prestige tier.
///
/// All fields default to "nothing" so definitions only spell out what
/// they actually grant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardBundle {
    /// Flat XP added to the profile
    #[serde(default)]
    pub xp: i64,
    /// Flat balance added, tracked in total earnings too
    #[serde(default)]
    pub money: i64,
    /// Inventory items granted, name → quantity
    #[serde(default)]
    pub items: BTreeMap<String, i64>,
    /// Timed XP booster, upserted by name
    #[serde(default)]
    pub booster: Option<BoosterGrant>,
    /// Cosmetic title appended to the profile
    #[serde(default)]
    pub title: Option<String>,
}

impl RewardBundle {
    /// Whether the bundle grants nothing at all.
    pub fn is_empty(&self) -> bool {
        self.xp == 0
            && self.money == 0
            && self.items.is_empty()
            && self.booster.is_none()
            && self.title.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bundle_is_empty() {
        assert!(RewardBundle::default().is_empty());
    }

    #[test]
    fn test_sparse_deserialization() {
        let bundle: RewardBundle = serde_json::from_str(r#"{"xp": 250}"#).unwrap();
        assert_eq!(bundle.xp, 250);
        assert_eq!(bundle.money, 0);
        assert!(bundle.booster.is_none());
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_booster_grant_round_trip() {
        let bundle = RewardBundle {
            booster: Some(BoosterGrant {
                name: "ectoplasm_rush".into(),
                description: "Double XP from the other side".into(),
                multiplier: 2.0,
                duration_hours: 24,
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&bundle).unwrap();
        let back: RewardBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(bundle, back);
    }
}
