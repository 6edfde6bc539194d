//! Guild-facing social features for the Spiritbox community bot.
//!
//! Two features live here: per-guild welcome/farewell messaging (a
//! string-templating feature over stored configuration; no embeds, no
//! transport) and level-threshold role rewards consumed by the message
//! pipeline's level-up stage.

mod greeting;
mod role_rewards;

pub use greeting::{GreetingConfig, GreetingService, GreetingStore, MemberEvent, render_template};
pub use role_rewards::{RoleReward, RoleRewardStore, resolve_crossed_rewards};
