//! Notification sink seam.

use async_trait::async_trait;
use spiritbox_core::Notification;
use tracing::info;

/// Receiver for engine events.
///
/// Delivery is best-effort: the engine never fails a pipeline stage
/// because a sink misbehaved, so implementations should swallow their
/// own transport errors.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one event.
    async fn notify(&self, event: Notification);
}

/// Sink that logs events instead of delivering them anywhere.
///
/// Useful for headless operation and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, event: Notification) {
        match &event {
            Notification::LevelUp {
                user_id,
                guild_id,
                new_level,
                ..
            } => info!(user_id, guild_id, new_level, "Level up"),
            Notification::AchievementUnlocked {
                user_id,
                guild_id,
                achievement,
            } => info!(
                user_id,
                guild_id,
                achievement = %achievement.id,
                "Achievement unlocked"
            ),
            Notification::ChallengeCompleted {
                user_id,
                guild_id,
                challenge,
            } => info!(
                user_id,
                guild_id,
                challenge = %challenge.id,
                "Challenge completed"
            ),
            Notification::MemberGreeting {
                guild_id,
                channel_id,
                kind,
                ..
            } => info!(guild_id, channel_id, kind = ?kind, "Member greeting"),
        }
    }
}
