//! Challenge action vocabulary.

use serde::{Deserialize, Serialize};

/// Discrete actions that advance challenge progress.
///
/// Each action maps to exactly one requirement key in a challenge's
/// requirement bag. The vocabulary is closed; requirement keys with no
/// matching action are rejected when the catalog is validated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChallengeAction {
    /// A counted chat message
    SendMessage,
    /// XP earned, advanced by the amount gained
    GainXp,
    /// Money earned, advanced by the amount
    EarnMoney,
    /// Money spent, advanced by the amount
    SpendMoney,
    /// An investigation finished
    CompleteInvestigation,
    /// A hunt finished
    CompleteHunt,
    /// An item found
    FindItem,
    /// A ghost correctly identified
    IdentifyGhost,
    /// A bot command used
    UseCommand,
    /// A day with any activity
    BeActive,
}

impl ChallengeAction {
    /// The requirement key this action advances.
    pub fn requirement_key(&self) -> &'static str {
        match self {
            ChallengeAction::SendMessage => "send_messages",
            ChallengeAction::GainXp => "gain_xp",
            ChallengeAction::EarnMoney => "earn_money",
            ChallengeAction::SpendMoney => "spend_money",
            ChallengeAction::CompleteInvestigation => "complete_investigations",
            ChallengeAction::CompleteHunt => "complete_hunts",
            ChallengeAction::FindItem => "find_items",
            ChallengeAction::IdentifyGhost => "identify_ghosts",
            ChallengeAction::UseCommand => "use_commands",
            ChallengeAction::BeActive => "be_active",
        }
    }
}

/// Resolve a requirement key back to its action, if any.
pub fn action_for_requirement(key: &str) -> Option<ChallengeAction> {
    use strum::IntoEnumIterator;
    ChallengeAction::iter().find(|action| action.requirement_key() == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_requirement_keys_are_unique() {
        let keys: Vec<_> = ChallengeAction::iter()
            .map(|a| a.requirement_key())
            .collect();
        let mut deduped = keys.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(keys.len(), deduped.len());
    }

    #[test]
    fn test_round_trip_through_requirement_key() {
        for action in ChallengeAction::iter() {
            assert_eq!(action_for_requirement(action.requirement_key()), Some(action));
        }
    }

    #[test]
    fn test_unknown_requirement_key() {
        assert_eq!(action_for_requirement("summon_demons"), None);
    }

    #[test]
    fn test_snake_case_names() {
        assert_eq!(
            ChallengeAction::from_str("send_message").unwrap(),
            ChallengeAction::SendMessage
        );
        assert_eq!(ChallengeAction::GainXp.to_string(), "gain_xp");
    }
}
